use crate::AppState;
use axum::{response::Json, Extension};
use serde_json::json;
use std::sync::Arc;

pub async fn api_status(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    let db_status = match state.store.ping().await {
        Ok(()) => "healthy",
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            "unhealthy"
        }
    };

    Json(json!({
        "status": if db_status == "healthy" { "operational" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "database": db_status,
            "model": state.model_name,
        },
        "live_sessions": state.sessions.live_sessions().await,
        "endpoints": {
            "chat": "/",
            "admin": "/admin",
            "status": "/api/status"
        }
    }))
}
