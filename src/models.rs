// src/models.rs

pub mod auth;
pub mod billing;
pub mod folio;
pub mod payments;
pub mod reservations;
pub mod settings;
