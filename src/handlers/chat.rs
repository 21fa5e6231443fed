// src/handlers/chat.rs
use crate::context::EXAMPLE_QUESTIONS;
use crate::error::AppError;
use crate::handlers::presented_session;
use crate::models::chat::{ChatRequest, ChatResponse, DraftRequest, ThemeRequest};
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

pub fn chat_routes() -> Router {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/session/draft", post(set_draft))
        .route("/api/session/theme", post(set_theme))
        .route("/api/examples", get(example_questions))
        .route("/api/chat", post(chat))
}

/// Page load: counts a visit and returns everything the chat page renders.
async fn get_session(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let identified = state.sessions.visit(presented_session(&headers), Utc::now()).await?;
    let snapshot = identified.context.lock().await.snapshot();

    Ok(Json(json!({
        "success": true,
        "is_new": identified.is_new,
        "session": snapshot,
    })))
}

async fn set_draft(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<DraftRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let identified = state.sessions.current(presented_session(&headers), Utc::now()).await?;
    let mut ctx = identified.context.lock().await;
    ctx.set_draft(&payload.question);

    Ok(Json(json!({
        "success": true,
        "session_id": identified.user_id,
        "draft_question": ctx.draft_question,
    })))
}

async fn set_theme(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ThemeRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let identified = state.sessions.current(presented_session(&headers), Utc::now()).await?;
    let dark_mode = identified.context.lock().await.set_theme(payload.dark_mode);

    Ok(Json(json!({
        "success": true,
        "session_id": identified.user_id,
        "dark_mode": dark_mode,
    })))
}

async fn example_questions() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "examples": EXAMPLE_QUESTIONS,
    }))
}

async fn chat(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if payload.message.trim().is_empty() {
        return Err(AppError::BadRequest("Please enter a question".to_string()));
    }

    let identified = state.sessions.for_exchange(presented_session(&headers), Utc::now()).await?;

    // Held for the whole turn so one session's turns never interleave.
    let mut ctx = identified.context.lock().await;
    let reply = state.conversation.reply(&mut ctx, &payload.message, Utc::now()).await?;

    Ok(Json(ChatResponse {
        success: true,
        session_id: identified.user_id,
        reply: reply.reply,
        timestamp: reply.timestamp,
        notice: reply.notice,
    }))
}
