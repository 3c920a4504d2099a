//! Shared utilities and common types for the MedTrack backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (token hashing and generation)
//! - Password hashing with Argon2id
//! - JWT token issuance and validation
//! - Hub join-code generation and validation

pub mod crypto;
pub mod join_code;
pub mod jwt;
pub mod password;
