// src/services.rs

// Regras puras (sem banco, sem relógio)
pub mod folio_validator;
pub mod overstay;
pub mod payment_rules;
pub mod payment_status;
pub mod reservation_conflict;
pub mod tax_calculator;

// Orquestração com o banco
pub mod auth;
pub mod events;
pub mod folio_service;
pub mod payment_service;
pub mod reservation_service;
