//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod hub;
pub mod medication;
pub mod profile;

pub use hub::HubEntity;
pub use medication::MedicationEntity;
pub use profile::ProfileEntity;
