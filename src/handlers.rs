// src/handlers.rs

pub mod billing;
pub mod events;
pub mod folios;
pub mod payments;
pub mod reservations;
pub mod settings;
