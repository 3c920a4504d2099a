//! Domain model definitions.

pub mod assistant;
pub mod hub;
pub mod medication;
pub mod profile;

pub use hub::Hub;
pub use medication::MedicationEntry;
pub use profile::AccountProfile;
