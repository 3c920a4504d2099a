//! HTTP route handlers.

pub mod assistant;
pub mod auth;
pub mod health;
pub mod hubs;
pub mod medications;
pub mod navigation;
pub mod profiles;
pub mod sync;
