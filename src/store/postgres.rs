// src/store/postgres.rs
use super::{Store, StoreError};
use crate::models::{
    admin::AdminAccount, analytics::InquiryCount, catalog::Catalog, chat::ChatRecord, session::UserSession,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ADMIN_COLUMNS: &str = "username, password_hash, session_token_hash, last_login, created_at";

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn load_catalog(&self) -> Result<Catalog, StoreError> {
        let stored = sqlx::query_scalar::<_, Json<Value>>("SELECT courses FROM course_catalog WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        match stored {
            Some(Json(value)) => Ok(Catalog::from_value(value)?),
            None => Ok(Catalog::default()),
        }
    }

    async fn save_catalog(&self, catalog: &Catalog) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO course_catalog (id, courses, updated_at) VALUES (1, $1, NOW())
             ON CONFLICT (id) DO UPDATE SET courses = EXCLUDED.courses, updated_at = NOW()",
        )
        .bind(Json(catalog.to_value()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn seed_catalog(&self, catalog: &Catalog) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO course_catalog (id, courses, updated_at) VALUES (1, $1, NOW())
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(Json(catalog.to_value()))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn create_user_session(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<UserSession, StoreError> {
        let session = sqlx::query_as::<_, UserSession>(
            "INSERT INTO user_sessions (user_id, created_at, last_active, access_count)
             VALUES ($1, $2, $2, 1)
             RETURNING user_id, created_at, last_active, access_count",
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    async fn touch_user_session(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Option<UserSession>, StoreError> {
        let session = sqlx::query_as::<_, UserSession>(
            "UPDATE user_sessions
             SET access_count = access_count + 1, last_active = GREATEST(last_active, $2)
             WHERE user_id = $1
             RETURNING user_id, created_at, last_active, access_count",
        )
        .bind(user_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn find_user_session(&self, user_id: Uuid) -> Result<Option<UserSession>, StoreError> {
        let session = sqlx::query_as::<_, UserSession>(
            "SELECT user_id, created_at, last_active, access_count FROM user_sessions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn user_sessions(&self) -> Result<Vec<UserSession>, StoreError> {
        let sessions = sqlx::query_as::<_, UserSession>(
            "SELECT user_id, created_at, last_active, access_count FROM user_sessions",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    async fn record_exchange(&self, record: &ChatRecord) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO user_sessions (user_id, created_at, last_active, access_count)
             VALUES ($1, $2, $2, 1)
             ON CONFLICT (user_id) DO UPDATE
             SET access_count = user_sessions.access_count + 1,
                 last_active = GREATEST(user_sessions.last_active, EXCLUDED.last_active)",
        )
        .bind(record.user_id)
        .bind(record.timestamp)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO chat_records (timestamp, user_id, user_message, bot_response, course_inquiry)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(record.timestamp)
        .bind(record.user_id)
        .bind(&record.user_message)
        .bind(&record.bot_response)
        .bind(&record.course_inquiry)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn chat_records_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<ChatRecord>, StoreError> {
        let records = sqlx::query_as::<_, ChatRecord>(
            "SELECT timestamp, user_id, user_message, bot_response, course_inquiry
             FROM chat_records
             WHERE timestamp >= $1 AND timestamp < $2
             ORDER BY timestamp DESC",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn course_inquiry_counts(&self) -> Result<Vec<InquiryCount>, StoreError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT course_inquiry, COUNT(*) FROM chat_records
             WHERE course_inquiry IS NOT NULL
             GROUP BY course_inquiry",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(course, count)| InquiryCount { course, count })
            .collect())
    }

    async fn admin_count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_accounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn upsert_admin(&self, username: &str, password_hash: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO admin_accounts (username, password_hash, created_at) VALUES ($1, $2, $3)
             ON CONFLICT (username) DO UPDATE
             SET password_hash = EXCLUDED.password_hash, session_token_hash = NULL",
        )
        .bind(username)
        .bind(password_hash)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_admin(&self, username: &str) -> Result<Option<AdminAccount>, StoreError> {
        let admin = sqlx::query_as::<_, AdminAccount>(&format!(
            "SELECT {} FROM admin_accounts WHERE username = $1",
            ADMIN_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    async fn find_admin_by_token(&self, token_hash: &str) -> Result<Option<AdminAccount>, StoreError> {
        let admin = sqlx::query_as::<_, AdminAccount>(&format!(
            "SELECT {} FROM admin_accounts WHERE session_token_hash = $1",
            ADMIN_COLUMNS
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    async fn start_admin_session(&self, username: &str, token_hash: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE admin_accounts SET session_token_hash = $2, last_login = $3 WHERE username = $1")
            .bind(username)
            .bind(token_hash)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn refresh_admin_session(&self, token_hash: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE admin_accounts SET last_login = $2 WHERE session_token_hash = $1")
            .bind(token_hash)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn end_admin_session(&self, token_hash: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE admin_accounts SET session_token_hash = NULL WHERE session_token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
