use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Admin credentials plus the single active session slot.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminAccount {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// SHA-256 hex digest of the issued token, never the token itself.
    #[serde(skip_serializing)]
    pub session_token_hash: Option<String>,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Inserted into request extensions once the bearer token checks out.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start: Option<chrono::NaiveDate>,
    pub end: Option<chrono::NaiveDate>,
}
