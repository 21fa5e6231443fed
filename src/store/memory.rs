// src/store/memory.rs
use super::{Store, StoreError};
use crate::models::{
    admin::AdminAccount, analytics::InquiryCount, catalog::Catalog, chat::ChatRecord, session::UserSession,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    catalog: Option<Catalog>,
    sessions: HashMap<Uuid, UserSession>,
    chats: Vec<ChatRecord>,
    admins: Vec<AdminAccount>,
}

/// Process-local store. Every multi-step write happens under one lock.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored chat record in insertion order.
    pub async fn chat_records(&self) -> Vec<ChatRecord> {
        self.state.read().await.chats.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn load_catalog(&self) -> Result<Catalog, StoreError> {
        Ok(self.state.read().await.catalog.clone().unwrap_or_default())
    }

    async fn save_catalog(&self, catalog: &Catalog) -> Result<(), StoreError> {
        self.state.write().await.catalog = Some(catalog.clone());
        Ok(())
    }

    async fn seed_catalog(&self, catalog: &Catalog) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        if state.catalog.is_some() {
            return Ok(false);
        }
        state.catalog = Some(catalog.clone());
        Ok(true)
    }

    async fn create_user_session(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<UserSession, StoreError> {
        let session = UserSession::new(user_id, now);
        self.state.write().await.sessions.insert(user_id, session.clone());
        Ok(session)
    }

    async fn touch_user_session(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Option<UserSession>, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.sessions.get_mut(&user_id).map(|session| {
            session.touch(now);
            session.clone()
        }))
    }

    async fn find_user_session(&self, user_id: Uuid) -> Result<Option<UserSession>, StoreError> {
        Ok(self.state.read().await.sessions.get(&user_id).cloned())
    }

    async fn user_sessions(&self) -> Result<Vec<UserSession>, StoreError> {
        Ok(self.state.read().await.sessions.values().cloned().collect())
    }

    async fn record_exchange(&self, record: &ChatRecord) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state
            .sessions
            .entry(record.user_id)
            .and_modify(|s| s.touch(record.timestamp))
            .or_insert_with(|| UserSession::new(record.user_id, record.timestamp));
        state.chats.push(record.clone());
        Ok(())
    }

    async fn chat_records_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<ChatRecord>, StoreError> {
        let state = self.state.read().await;
        let mut records: Vec<ChatRecord> = state
            .chats
            .iter()
            .filter(|r| r.timestamp >= start && r.timestamp < end)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    async fn course_inquiry_counts(&self) -> Result<Vec<InquiryCount>, StoreError> {
        let state = self.state.read().await;
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for course in state.chats.iter().filter_map(|r| r.course_inquiry.as_deref()) {
            *counts.entry(course).or_insert(0) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(course, count)| InquiryCount { course: course.to_string(), count })
            .collect())
    }

    async fn admin_count(&self) -> Result<i64, StoreError> {
        Ok(self.state.read().await.admins.len() as i64)
    }

    async fn upsert_admin(&self, username: &str, password_hash: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        match state.admins.iter_mut().find(|a| a.username == username) {
            Some(admin) => {
                admin.password_hash = password_hash.to_string();
                admin.session_token_hash = None;
            }
            None => state.admins.push(AdminAccount {
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                session_token_hash: None,
                last_login: None,
                created_at: now,
            }),
        }
        Ok(())
    }

    async fn find_admin(&self, username: &str) -> Result<Option<AdminAccount>, StoreError> {
        Ok(self.state.read().await.admins.iter().find(|a| a.username == username).cloned())
    }

    async fn find_admin_by_token(&self, token_hash: &str) -> Result<Option<AdminAccount>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .admins
            .iter()
            .find(|a| a.session_token_hash.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn start_admin_session(&self, username: &str, token_hash: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(admin) = state.admins.iter_mut().find(|a| a.username == username) {
            admin.session_token_hash = Some(token_hash.to_string());
            admin.last_login = Some(now);
        }
        Ok(())
    }

    async fn refresh_admin_session(&self, token_hash: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(admin) = state
            .admins
            .iter_mut()
            .find(|a| a.session_token_hash.as_deref() == Some(token_hash))
        {
            admin.last_login = Some(now);
        }
        Ok(())
    }

    async fn end_admin_session(&self, token_hash: &str) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        match state
            .admins
            .iter_mut()
            .find(|a| a.session_token_hash.as_deref() == Some(token_hash))
        {
            Some(admin) => {
                admin.session_token_hash = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(user_id: Uuid, at: DateTime<Utc>, course: Option<&str>) -> ChatRecord {
        ChatRecord {
            timestamp: at,
            user_id,
            user_message: "hello".to_string(),
            bot_response: "hi".to_string(),
            course_inquiry: course.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_record_exchange_touches_or_creates_session() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let known = Uuid::new_v4();
        store.create_user_session(known, now).await.unwrap();

        store.record_exchange(&record(known, now + Duration::minutes(1), None)).await.unwrap();
        let stranger = Uuid::new_v4();
        store.record_exchange(&record(stranger, now, None)).await.unwrap();

        assert_eq!(store.find_user_session(known).await.unwrap().unwrap().access_count, 2);
        assert_eq!(store.find_user_session(stranger).await.unwrap().unwrap().access_count, 1);
        assert_eq!(store.chat_records().await.len(), 2);
    }

    #[tokio::test]
    async fn test_chat_records_between_is_half_open_and_newest_first() {
        let store = MemoryStore::new();
        let base = Utc::now();
        let user = Uuid::new_v4();
        for minutes in [0, 10, 20] {
            store.record_exchange(&record(user, base + Duration::minutes(minutes), None)).await.unwrap();
        }

        let records = store
            .chat_records_between(base, base + Duration::minutes(20))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].timestamp > records[1].timestamp);
    }

    #[tokio::test]
    async fn test_seed_catalog_only_once() {
        let store = MemoryStore::new();
        assert!(store.seed_catalog(&Catalog::default_seed()).await.unwrap());
        assert!(!store.seed_catalog(&Catalog::default()).await.unwrap());
        assert_eq!(store.load_catalog().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_upsert_admin_drops_open_session() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.upsert_admin("admin", "hash-1", now).await.unwrap();
        store.start_admin_session("admin", "token-digest", now).await.unwrap();
        assert!(store.find_admin_by_token("token-digest").await.unwrap().is_some());

        store.upsert_admin("admin", "hash-2", now).await.unwrap();
        assert!(store.find_admin_by_token("token-digest").await.unwrap().is_none());
        assert_eq!(store.admin_count().await.unwrap(), 1);
    }
}
