//! Repository implementations for database access.

pub mod hub;
pub mod medication;
pub mod profile;

pub use hub::HubRepository;
pub use medication::MedicationRepository;
pub use profile::ProfileRepository;
