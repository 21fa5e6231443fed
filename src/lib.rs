// lib.rs - UniAssist admissions chatbot service
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod gemini_client;
pub mod handlers;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

use axum::{Extension, Router};
use chrono::FixedOffset;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::llm::{SpeechEngine, TextGenerator};
use crate::middleware::rate_limit::RateLimiter;
use crate::services::admin_auth::AdminAuth;
use crate::services::conversation::ConversationOrchestrator;
use crate::services::session_registry::SessionRegistry;
use crate::services::speech::SpeechTasks;
use crate::store::Store;

/// Shared state handed to every handler through an `Extension`.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: SessionRegistry,
    pub conversation: ConversationOrchestrator,
    pub admin_auth: AdminAuth,
    pub speech: SpeechTasks,
    pub login_limiter: RateLimiter,
    pub timezone: FixedOffset,
    pub model_name: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        generator: Arc<dyn TextGenerator>,
        speech_engine: Arc<dyn SpeechEngine>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            sessions: SessionRegistry::new(store.clone()),
            conversation: ConversationOrchestrator::new(store.clone(), generator, config::campus_timezone()),
            admin_auth: AdminAuth::new(store.clone()),
            speech: SpeechTasks::new(speech_engine),
            login_limiter: RateLimiter::new(10, 60),
            timezone: config::campus_timezone(),
            model_name: model_name.into(),
            store,
        }
    }

    /// Swap the admin authenticator, mostly to lower the bcrypt cost in tests.
    pub fn with_admin_auth(mut self, admin_auth: AdminAuth) -> Self {
        self.admin_auth = admin_auth;
        self
    }

    pub fn with_login_limiter(mut self, limiter: RateLimiter) -> Self {
        self.login_limiter = limiter;
        self
    }
}

/// Build the full application router with logging, CORS and shared state layers.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(handlers::ui::ui_routes())
        .merge(handlers::chat::chat_routes())
        .merge(handlers::speech::speech_routes())
        .merge(handlers::auth::auth_routes())
        .merge(handlers::admin::admin_routes())
        .route("/api/status", axum::routing::get(handlers::status::api_status))
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}
