// src/store/mod.rs
//! Persistence seam. `PgStore` backs the running service; `MemoryStore`
//! backs tests and local experiments without a database.

use crate::models::{
    admin::AdminAccount,
    analytics::InquiryCount,
    catalog::{Catalog, CatalogError},
    chat::ChatRecord,
    session::UserSession,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Stored catalog is invalid: {0}")]
    Catalog(#[from] CatalogError),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    // Course catalog
    async fn load_catalog(&self) -> Result<Catalog, StoreError>;
    async fn save_catalog(&self, catalog: &Catalog) -> Result<(), StoreError>;
    /// Store `catalog` only when no catalog document exists yet. Returns true if it was stored.
    async fn seed_catalog(&self, catalog: &Catalog) -> Result<bool, StoreError>;

    // User session registry
    async fn create_user_session(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<UserSession, StoreError>;
    /// Increment access_count and move last_active forward. `None` when the id is unknown.
    async fn touch_user_session(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Option<UserSession>, StoreError>;
    async fn find_user_session(&self, user_id: Uuid) -> Result<Option<UserSession>, StoreError>;
    async fn user_sessions(&self) -> Result<Vec<UserSession>, StoreError>;

    // Chat log
    /// Touch (or create) the sender's session and append the record as one atomic write.
    async fn record_exchange(&self, record: &ChatRecord) -> Result<(), StoreError>;
    /// Records with `start <= timestamp < end`, newest first.
    async fn chat_records_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<ChatRecord>, StoreError>;
    /// Per-course counts of non-null inquiries, unordered.
    async fn course_inquiry_counts(&self) -> Result<Vec<InquiryCount>, StoreError>;

    // Admin credentials
    async fn admin_count(&self) -> Result<i64, StoreError>;
    /// Create the account or reset its password; either way any open session is dropped.
    async fn upsert_admin(&self, username: &str, password_hash: &str, now: DateTime<Utc>) -> Result<(), StoreError>;
    async fn find_admin(&self, username: &str) -> Result<Option<AdminAccount>, StoreError>;
    async fn find_admin_by_token(&self, token_hash: &str) -> Result<Option<AdminAccount>, StoreError>;
    async fn start_admin_session(&self, username: &str, token_hash: &str, now: DateTime<Utc>) -> Result<(), StoreError>;
    async fn refresh_admin_session(&self, token_hash: &str, now: DateTime<Utc>) -> Result<(), StoreError>;
    /// Clear the slot holding `token_hash`. Returns false when no account held it.
    async fn end_admin_session(&self, token_hash: &str) -> Result<bool, StoreError>;
}
