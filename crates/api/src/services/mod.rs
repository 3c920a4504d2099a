pub mod assistant;
pub mod auth;
pub mod hub_ops;
pub mod sync;

pub use assistant::{AssistantService, CareLineCache, CompletionApi};
pub use auth::AuthService;
pub use hub_ops::HubOperations;
pub use sync::{SyncSession, SyncUpdate};
