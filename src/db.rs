// src/db.rs

pub mod folio_repo;
pub use folio_repo::FolioRepository;
pub mod payment_repo;
pub use payment_repo::PaymentRepository;
pub mod reservation_repo;
pub use reservation_repo::ReservationRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
