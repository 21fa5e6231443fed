// src/error.rs
use crate::models::auth::ErrorResponse;
use crate::services::admin_auth::AuthError;
use crate::services::conversation::{ConversationError, LLM_FAILURE_MESSAGE};
use crate::services::speech::{SpeechError, TRANSCRIPTION_FAILURE_MESSAGE};
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

/// Handler-level error. The display text is what the user sees, so internal
/// detail stays in the logs and never in the variant message.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Authentication required")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,
    #[error("{0}")]
    Upstream(String),
    #[error("Internal server error")]
    Store(#[from] StoreError),
    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(e) => AppError::Store(e),
            AuthError::Hash(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<ConversationError> for AppError {
    fn from(err: ConversationError) -> Self {
        match err {
            ConversationError::EmptyInput => AppError::BadRequest(err.to_string()),
            ConversationError::Catalog(e) => AppError::Store(e),
            ConversationError::Generation(_) => AppError::Upstream(LLM_FAILURE_MESSAGE.to_string()),
        }
    }
}

impl From<SpeechError> for AppError {
    fn from(err: SpeechError) -> Self {
        match err {
            SpeechError::EmptyText | SpeechError::EmptyAudio => AppError::BadRequest(err.to_string()),
            SpeechError::Transcription(e) => {
                tracing::error!("Transcription failed: {}", e);
                AppError::Upstream(TRANSCRIPTION_FAILURE_MESSAGE.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Store(e) => tracing::error!("Storage error: {}", e),
            AppError::Internal(detail) => tracing::error!("Internal error: {}", detail),
            AppError::Upstream(message) => tracing::warn!("Upstream failure reported to user: {}", message),
            _ => {}
        }

        (
            self.status(),
            Json(ErrorResponse {
                success: false,
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_hide_detail() {
        let err = AppError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn test_credentials_message_is_generic() {
        assert_eq!(AppError::InvalidCredentials.to_string(), "Invalid credentials");
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
    }
}
