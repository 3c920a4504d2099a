//! HTTP middleware components.

pub mod logging;
pub mod metrics;
pub mod user_auth;

pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
pub use user_auth::{require_user_auth, UserAuth};
