// src/models/chat.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One persisted chat exchange. Never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ChatRecord {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub user_id: Uuid,
    pub user_message: String,
    pub bot_response: String,
    pub course_inquiry: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub session_id: Uuid,
    pub reply: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    pub dark_mode: Option<bool>,
}
