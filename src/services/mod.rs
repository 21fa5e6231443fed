// src/services/mod.rs
pub mod admin_auth;
pub mod analytics;
pub mod bootstrap;
pub mod conversation;
pub mod export;
pub mod session_registry;
pub mod speech;

pub use admin_auth::AdminAuth;
pub use conversation::ConversationOrchestrator;
pub use session_registry::SessionRegistry;
pub use speech::SpeechTasks;
