//! Persistence layer for the medication tracker backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - The in-process change feed that backs live sync

pub mod changes;
pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
