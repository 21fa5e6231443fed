// src/services/session_registry.rs
use crate::context::{SessionContexts, SharedContext};
use crate::store::{Store, StoreError};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Result of resolving the caller's session identifier.
pub struct Identified {
    pub user_id: Uuid,
    pub context: SharedContext,
    pub is_new: bool,
}

/// How a request accounts for the caller's session row.
#[derive(Clone, Copy, PartialEq)]
enum Contact {
    /// Count a visit now.
    Visit,
    /// Resolve only; a minted session gets its row immediately.
    Quiet,
    /// Resolve only; a minted session's row is written by the request's own
    /// atomic exchange, which counts it once.
    Exchange,
}

/// Maps presented session identifiers to registry rows and live contexts.
pub struct SessionRegistry {
    store: Arc<dyn Store>,
    contexts: SessionContexts,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            contexts: SessionContexts::new(),
        }
    }

    /// A visit: known identifiers are touched, anything else mints a new session.
    pub async fn visit(&self, presented: Option<Uuid>, now: DateTime<Utc>) -> Result<Identified, StoreError> {
        self.resolve(presented, now, Contact::Visit).await
    }

    /// Resolve without counting a visit. Used by requests that only adjust context.
    pub async fn current(&self, presented: Option<Uuid>, now: DateTime<Utc>) -> Result<Identified, StoreError> {
        self.resolve(presented, now, Contact::Quiet).await
    }

    /// Resolve for a chat turn. The turn's `record_exchange` inserts or touches
    /// the registry row, so a first contact through chat counts exactly one visit.
    pub async fn for_exchange(&self, presented: Option<Uuid>, now: DateTime<Utc>) -> Result<Identified, StoreError> {
        self.resolve(presented, now, Contact::Exchange).await
    }

    async fn resolve(&self, presented: Option<Uuid>, now: DateTime<Utc>, contact: Contact) -> Result<Identified, StoreError> {
        if let Some(user_id) = presented {
            let known = match contact {
                Contact::Visit => {
                    if self.store.touch_user_session(user_id, now).await?.is_some() {
                        true
                    } else if self.contexts.get(&user_id, now).await.is_some() {
                        // Minted by a chat turn that never reached its exchange write.
                        self.store.create_user_session(user_id, now).await?;
                        true
                    } else {
                        false
                    }
                }
                Contact::Quiet | Contact::Exchange => {
                    self.contexts.get(&user_id, now).await.is_some()
                        || self.store.find_user_session(user_id).await?.is_some()
                }
            };

            if known {
                let context = self.contexts.get_or_insert(user_id, now).await;
                return Ok(Identified { user_id, context, is_new: false });
            }

            tracing::debug!("Unknown session id {} presented, minting a new one", user_id);
        }

        let user_id = Uuid::new_v4();
        if contact != Contact::Exchange {
            self.store.create_user_session(user_id, now).await?;
        }
        let context = self.contexts.get_or_insert(user_id, now).await;
        tracing::info!("🆕 New user session: {}", user_id);

        Ok(Identified { user_id, context, is_new: true })
    }

    /// Forget contexts idle longer than `max_idle`. Their registry rows stay,
    /// so a returning id is resumed with a fresh context.
    pub async fn evict_idle(&self, max_idle: Duration, now: DateTime<Utc>) -> usize {
        self.contexts.evict_idle(max_idle, now).await
    }

    pub async fn live_sessions(&self) -> usize {
        self.contexts.len().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::ChatRecord;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_first_visit_creates_session_with_count_one() {
        let store = Arc::new(MemoryStore::new());
        let registry = SessionRegistry::new(store.clone());
        let now = Utc::now();

        let first = registry.visit(None, now).await.unwrap();
        assert!(first.is_new);
        let session = store.find_user_session(first.user_id).await.unwrap().unwrap();
        assert_eq!(session.access_count, 1);
        assert_eq!(session.created_at, now);
    }

    #[tokio::test]
    async fn test_n_visits_count_n_and_track_last_visit() {
        let store = Arc::new(MemoryStore::new());
        let registry = SessionRegistry::new(store.clone());
        let start = Utc::now();

        let id = registry.visit(None, start).await.unwrap().user_id;
        let mut last = start;
        for i in 1..5 {
            last = start + Duration::minutes(i);
            let again = registry.visit(Some(id), last).await.unwrap();
            assert_eq!(again.user_id, id);
            assert!(!again.is_new);
        }

        let session = store.find_user_session(id).await.unwrap().unwrap();
        assert_eq!(session.access_count, 5);
        assert_eq!(session.last_active, last);
        assert_eq!(session.created_at, start);
    }

    #[tokio::test]
    async fn test_unknown_identifier_gets_fresh_session() {
        let store = Arc::new(MemoryStore::new());
        let registry = SessionRegistry::new(store.clone());
        let forged = Uuid::new_v4();

        let identified = registry.visit(Some(forged), Utc::now()).await.unwrap();
        assert!(identified.is_new);
        assert_ne!(identified.user_id, forged);
        assert!(store.find_user_session(forged).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_registry_row_without_live_context_is_resumed() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        let id = Uuid::new_v4();
        store.create_user_session(id, now).await.unwrap();

        // Fresh registry, as after a restart.
        let registry = SessionRegistry::new(store.clone());
        let identified = registry.visit(Some(id), now).await.unwrap();
        assert_eq!(identified.user_id, id);
        assert!(!identified.is_new);
        assert_eq!(store.find_user_session(id).await.unwrap().unwrap().access_count, 2);
    }

    #[tokio::test]
    async fn test_current_does_not_count_a_visit() {
        let store = Arc::new(MemoryStore::new());
        let registry = SessionRegistry::new(store.clone());
        let now = Utc::now();
        let id = registry.visit(None, now).await.unwrap().user_id;

        registry.current(Some(id), now).await.unwrap();
        assert_eq!(store.find_user_session(id).await.unwrap().unwrap().access_count, 1);
    }

    #[tokio::test]
    async fn test_first_contact_chat_counts_one_visit() {
        let store = Arc::new(MemoryStore::new());
        let registry = SessionRegistry::new(store.clone());
        let now = Utc::now();

        let identified = registry.for_exchange(None, now).await.unwrap();
        assert!(identified.is_new);
        assert!(store.find_user_session(identified.user_id).await.unwrap().is_none());

        store
            .record_exchange(&ChatRecord {
                timestamp: now,
                user_id: identified.user_id,
                user_message: "Hi".to_string(),
                bot_response: "Hello!".to_string(),
                course_inquiry: None,
            })
            .await
            .unwrap();
        assert_eq!(store.find_user_session(identified.user_id).await.unwrap().unwrap().access_count, 1);

        // The live context keeps the id resolvable before and after the write.
        let again = registry.for_exchange(Some(identified.user_id), now).await.unwrap();
        assert!(!again.is_new);
    }

    #[tokio::test]
    async fn test_page_load_after_failed_first_chat_keeps_id() {
        let store = Arc::new(MemoryStore::new());
        let registry = SessionRegistry::new(store.clone());
        let now = Utc::now();
        let id = registry.for_exchange(None, now).await.unwrap().user_id;

        let visited = registry.visit(Some(id), now).await.unwrap();
        assert_eq!(visited.user_id, id);
        assert_eq!(store.find_user_session(id).await.unwrap().unwrap().access_count, 1);
    }

    #[tokio::test]
    async fn test_evicted_session_is_resumed_from_registry() {
        let store = Arc::new(MemoryStore::new());
        let registry = SessionRegistry::new(store.clone());
        let start = Utc::now();
        let id = registry.visit(None, start).await.unwrap().user_id;

        let later = start + Duration::hours(3);
        assert_eq!(registry.evict_idle(Duration::hours(2), later).await, 1);
        assert_eq!(registry.live_sessions().await, 0);

        let resumed = registry.visit(Some(id), later).await.unwrap();
        assert_eq!(resumed.user_id, id);
        assert!(!resumed.is_new);
        assert_eq!(registry.live_sessions().await, 1);
    }
}
