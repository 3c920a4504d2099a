//! Domain layer for the MedTrack backend.
//!
//! This crate contains:
//! - Domain models (AccountProfile, Hub, MedicationEntry, assistant DTOs)
//! - The hub membership state machine and navigation redirect policy
//! - The capability policy engine

pub mod models;
pub mod services;
