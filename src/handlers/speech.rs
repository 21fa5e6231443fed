// src/handlers/speech.rs
use crate::error::AppError;
use crate::handlers::presented_session;
use crate::services::speech::SpeechStatus;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Extension, Path},
    http::{header, HeaderMap},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

const MAX_RECORDING_BYTES: usize = 10 * 1024 * 1024;

pub fn speech_routes() -> Router {
    Router::new()
        .route("/api/speech", post(start_speech))
        .route("/api/speech/:id", get(speech_status).delete(cancel_speech))
        .route("/api/speech/:id/audio", get(speech_audio))
        .route(
            "/api/speech/transcribe",
            post(transcribe).layer(DefaultBodyLimit::max(MAX_RECORDING_BYTES)),
        )
}

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
struct SpeechTaskResponse {
    success: bool,
    job_id: Uuid,
    #[serde(flatten)]
    status: SpeechStatus,
}

async fn start_speech(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SpeakRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let identified = state.sessions.current(presented_session(&headers), Utc::now()).await?;
    let job_id = state.speech.speak(identified.user_id, &payload.text, Utc::now()).await?;

    Ok(Json(json!({
        "success": true,
        "job_id": job_id,
        "session_id": identified.user_id,
    })))
}

async fn speech_status(
    Extension(state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<SpeechTaskResponse>, AppError> {
    let status = state
        .speech
        .status(job_id)
        .await
        .ok_or_else(|| AppError::NotFound("Speech task not found".to_string()))?;

    Ok(Json(SpeechTaskResponse { success: true, job_id, status }))
}

async fn cancel_speech(
    Extension(state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<SpeechTaskResponse>, AppError> {
    let status = state
        .speech
        .cancel(job_id)
        .await
        .ok_or_else(|| AppError::NotFound("Speech task not found".to_string()))?;

    Ok(Json(SpeechTaskResponse { success: true, job_id, status }))
}

async fn speech_audio(
    Extension(state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let audio = state
        .speech
        .audio(job_id)
        .await
        .ok_or_else(|| AppError::NotFound("Audio not ready".to_string()))?;

    Ok(([(header::CONTENT_TYPE, "audio/wav")], audio.as_ref().clone()).into_response())
}

/// Raw recording in the body; its `Content-Type` is passed on as the mime type.
async fn transcribe(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with("audio/"))
        .unwrap_or("audio/wav");

    let text = state.speech.transcribe(&body, mime_type).await?;

    Ok(Json(json!({
        "success": true,
        "text": text,
    })))
}
