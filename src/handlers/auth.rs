// src/handlers/auth.rs
use crate::error::AppError;
use crate::middleware::admin::{admin_session_middleware, bearer_token};
use crate::middleware::rate_limit::login_rate_limit_middleware;
use crate::models::admin::AdminIdentity;
use crate::models::auth::{AdminLoginRequest, AdminLoginResponse};
use crate::AppState;
use axum::{
    extract::Extension,
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

pub fn auth_routes() -> Router {
    let login = Router::new()
        .route("/api/admin/login", post(login))
        .route_layer(axum::middleware::from_fn(login_rate_limit_middleware));

    let session = Router::new()
        .route("/api/admin/verify", get(verify))
        .route_layer(axum::middleware::from_fn(admin_session_middleware));

    login
        .merge(session)
        .route("/api/admin/logout", post(logout))
}

async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, AppError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::InvalidCredentials);
    }

    let token = state
        .admin_auth
        .verify_admin(payload.username.trim(), &payload.password, Utc::now())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    Ok(Json(AdminLoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
    }))
}

async fn logout(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    if state.admin_auth.logout(token).await? {
        tracing::info!("Admin logged out");
    }

    Ok(Json(json!({
        "success": true,
        "message": "Logged out",
    })))
}

async fn verify(Extension(identity): Extension<AdminIdentity>) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "username": identity.username,
    }))
}
