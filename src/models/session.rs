// src/models/session.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Activity metadata for one browser-session visitor.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct UserSession {
    pub user_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_active: chrono::DateTime<chrono::Utc>,
    pub access_count: i64,
}

impl UserSession {
    pub fn new(user_id: Uuid, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            user_id,
            created_at: now,
            last_active: now,
            access_count: 1,
        }
    }

    pub fn touch(&mut self, now: chrono::DateTime<chrono::Utc>) {
        self.access_count += 1;
        if now > self.last_active {
            self.last_active = now;
        }
    }

    pub fn is_returning(&self) -> bool {
        self.access_count > 1
    }
}
