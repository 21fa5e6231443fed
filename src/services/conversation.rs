// src/services/conversation.rs
use crate::context::{HistoryEntry, SessionContext};
use crate::llm::{LlmError, TextGenerator};
use crate::models::{catalog::Catalog, chat::ChatRecord};
use crate::store::{Store, StoreError};
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use thiserror::Error;

pub const LLM_FAILURE_MESSAGE: &str =
    "I apologize, but I'm having trouble answering right now. Please try again in a moment.";
pub const SAVE_FAILURE_NOTICE: &str = "An error occurred while saving the chat. Please try again.";

const INSTRUCTIONS: &str = r#"You are a helpful university admission counselor chatbot. You have information about the following courses:
{catalog}

Key points to remember:
1. Always be polite and professional
2. Provide accurate information about courses based on the data provided
3. Handle general queries and greetings naturally
4. If asked about information not in the data, politely say you can only provide information about the listed courses
5. Keep responses concise but informative
6. Use appropriate emojis to make responses engaging
7. Format responses using markdown for better readability

Example interactions:
- Greet users warmly
- Answer questions about course duration, fees, and subjects
- Provide guidance on admission process
- Handle small talk naturally
- Stay focused on academic and admission related queries"#;

#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("Please enter a question")]
    EmptyInput,
    #[error("Failed to load course data: {0}")]
    Catalog(#[from] StoreError),
    #[error("Text generation failed: {0}")]
    Generation(#[from] LlmError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub reply: String,
    pub timestamp: String,
    /// Set when the reply was produced but could not be saved.
    pub notice: Option<String>,
}

/// Instruction block with the catalog document embedded.
pub fn build_context(catalog: &Catalog) -> String {
    let document = serde_json::to_string_pretty(&catalog.document()).unwrap_or_else(|_| "{}".to_string());
    INSTRUCTIONS.replace("{catalog}", &document)
}

pub fn build_prompt(catalog: &Catalog, user_input: &str) -> String {
    format!("Context: {}\n\nUser: {}\n\nResponse:", build_context(catalog), user_input)
}

/// First catalog course (in catalog order) named anywhere in the message, ignoring case.
pub fn detect_course_inquiry(catalog: &Catalog, message: &str) -> Option<String> {
    let haystack = message.to_lowercase();
    catalog
        .course_names()
        .find(|name| haystack.contains(&name.to_lowercase()))
        .map(str::to_string)
}

pub struct ConversationOrchestrator {
    store: Arc<dyn Store>,
    generator: Arc<dyn TextGenerator>,
    timezone: FixedOffset,
}

impl ConversationOrchestrator {
    pub fn new(store: Arc<dyn Store>, generator: Arc<dyn TextGenerator>, timezone: FixedOffset) -> Self {
        Self { store, generator, timezone }
    }

    /// Run one chat turn for `ctx`. Generation failures leave both the
    /// history and the chat log untouched; save failures only add a notice.
    pub async fn reply(
        &self,
        ctx: &mut SessionContext,
        user_input: &str,
        now: DateTime<Utc>,
    ) -> Result<ChatReply, ConversationError> {
        let user_input = user_input.trim();
        if user_input.is_empty() {
            return Err(ConversationError::EmptyInput);
        }

        let catalog = self.store.load_catalog().await?;
        let prompt = build_prompt(&catalog, user_input);

        let reply = match self.generator.generate(&ctx.turns(), &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(user_id = %ctx.user_id, "Error getting AI response: {}", e);
                return Err(ConversationError::Generation(e));
            }
        };

        let record = ChatRecord {
            timestamp: now,
            user_id: ctx.user_id,
            user_message: user_input.to_string(),
            bot_response: reply.clone(),
            course_inquiry: detect_course_inquiry(&catalog, user_input),
        };

        let notice = match self.store.record_exchange(&record).await {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(user_id = %ctx.user_id, "Error saving chat: {}", e);
                Some(SAVE_FAILURE_NOTICE.to_string())
            }
        };

        let timestamp = now.with_timezone(&self.timezone).format("%H:%M:%S").to_string();
        ctx.history.push(HistoryEntry {
            user_message: user_input.to_string(),
            reply: reply.clone(),
            prompt,
            timestamp: timestamp.clone(),
        });
        ctx.draft_question.clear();

        Ok(ChatReply { reply, timestamp, notice })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatTurn;
    use crate::models::{admin::AdminAccount, analytics::InquiryCount, session::UserSession};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Echoes the history length and records what it was asked.
    struct ScriptedGenerator {
        fail: bool,
        seen: Mutex<Vec<(usize, String)>>,
    }

    impl ScriptedGenerator {
        fn new(fail: bool) -> Self {
            Self { fail, seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, history: &[ChatTurn], prompt: &str) -> Result<String, LlmError> {
            self.seen.lock().unwrap().push((history.len(), prompt.to_string()));
            if self.fail {
                Err(LlmError::Api { status: 503, body: "overloaded".to_string() })
            } else {
                Ok(format!("reply #{}", history.len() + 1))
            }
        }
    }

    /// Delegates to a MemoryStore but refuses to record exchanges.
    struct BrokenLog(MemoryStore);

    #[async_trait]
    impl Store for BrokenLog {
        async fn ping(&self) -> Result<(), StoreError> { self.0.ping().await }
        async fn load_catalog(&self) -> Result<Catalog, StoreError> { self.0.load_catalog().await }
        async fn save_catalog(&self, c: &Catalog) -> Result<(), StoreError> { self.0.save_catalog(c).await }
        async fn seed_catalog(&self, c: &Catalog) -> Result<bool, StoreError> { self.0.seed_catalog(c).await }
        async fn create_user_session(&self, id: Uuid, now: DateTime<Utc>) -> Result<UserSession, StoreError> {
            self.0.create_user_session(id, now).await
        }
        async fn touch_user_session(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<UserSession>, StoreError> {
            self.0.touch_user_session(id, now).await
        }
        async fn find_user_session(&self, id: Uuid) -> Result<Option<UserSession>, StoreError> {
            self.0.find_user_session(id).await
        }
        async fn user_sessions(&self) -> Result<Vec<UserSession>, StoreError> { self.0.user_sessions().await }
        async fn record_exchange(&self, _record: &ChatRecord) -> Result<(), StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn chat_records_between(&self, s: DateTime<Utc>, e: DateTime<Utc>) -> Result<Vec<ChatRecord>, StoreError> {
            self.0.chat_records_between(s, e).await
        }
        async fn course_inquiry_counts(&self) -> Result<Vec<InquiryCount>, StoreError> {
            self.0.course_inquiry_counts().await
        }
        async fn admin_count(&self) -> Result<i64, StoreError> { self.0.admin_count().await }
        async fn upsert_admin(&self, u: &str, h: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
            self.0.upsert_admin(u, h, now).await
        }
        async fn find_admin(&self, u: &str) -> Result<Option<AdminAccount>, StoreError> { self.0.find_admin(u).await }
        async fn find_admin_by_token(&self, t: &str) -> Result<Option<AdminAccount>, StoreError> {
            self.0.find_admin_by_token(t).await
        }
        async fn start_admin_session(&self, u: &str, t: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
            self.0.start_admin_session(u, t, now).await
        }
        async fn refresh_admin_session(&self, t: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
            self.0.refresh_admin_session(t, now).await
        }
        async fn end_admin_session(&self, t: &str) -> Result<bool, StoreError> { self.0.end_admin_session(t).await }
    }

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.seed_catalog(&Catalog::default_seed()).await.unwrap();
        store
    }

    fn ist() -> FixedOffset {
        crate::config::campus_timezone()
    }

    #[test]
    fn test_detects_course_case_insensitively() {
        let catalog = Catalog::default_seed();
        assert_eq!(detect_course_inquiry(&catalog, "Tell me about BCA fees"), Some("BCA".to_string()));
        assert_eq!(detect_course_inquiry(&catalog, "how long is b.tech?"), Some("B.Tech".to_string()));
        assert_eq!(detect_course_inquiry(&catalog, "What is the admission process?"), None);
    }

    #[test]
    fn test_detection_follows_catalog_order() {
        let catalog = Catalog::default_seed();
        assert_eq!(
            detect_course_inquiry(&catalog, "Compare BCA and B.Tech"),
            Some("B.Tech".to_string())
        );
    }

    #[test]
    fn test_prompt_embeds_catalog_and_question() {
        let prompt = build_prompt(&Catalog::default_seed(), "What courses do you offer?");
        assert!(prompt.starts_with("Context: You are a helpful university admission counselor chatbot."));
        assert!(prompt.contains("\"courses\": {"));
        assert!(prompt.contains("\"fees\": \"50,000 INR per semester\""));
        assert!(prompt.ends_with("User: What courses do you offer?\n\nResponse:"));
    }

    #[tokio::test]
    async fn test_successful_turn_records_and_extends_history() {
        let store = seeded_store().await;
        let generator = Arc::new(ScriptedGenerator::new(false));
        let orchestrator = ConversationOrchestrator::new(store.clone(), generator.clone(), ist());
        let mut ctx = SessionContext::new(Uuid::new_v4());
        ctx.set_draft("Tell me about BCA fees");

        let first = orchestrator.reply(&mut ctx, "  Tell me about BCA fees ", Utc::now()).await.unwrap();
        let second = orchestrator.reply(&mut ctx, "And admissions?", Utc::now()).await.unwrap();

        assert_eq!(first.reply, "reply #1");
        assert_eq!(second.reply, "reply #2");
        assert!(first.notice.is_none());
        assert_eq!(ctx.history.len(), 2);
        assert!(ctx.draft_question.is_empty());

        let seen = generator.seen.lock().unwrap().clone();
        assert_eq!(seen[1].0, 1, "second call replays the first turn");

        let records = store.chat_records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].user_message, "Tell me about BCA fees");
        assert_eq!(records[0].course_inquiry.as_deref(), Some("BCA"));
        assert_eq!(records[1].course_inquiry, None);
        assert_eq!(store.find_user_session(ctx.user_id).await.unwrap().unwrap().access_count, 2);
    }

    #[tokio::test]
    async fn test_generation_failure_discards_turn() {
        let store = seeded_store().await;
        let orchestrator = ConversationOrchestrator::new(store.clone(), Arc::new(ScriptedGenerator::new(true)), ist());
        let mut ctx = SessionContext::new(Uuid::new_v4());

        let err = orchestrator.reply(&mut ctx, "What is BCA?", Utc::now()).await.unwrap_err();
        assert!(matches!(err, ConversationError::Generation(_)));
        assert!(ctx.history.is_empty());
        assert!(store.chat_records().await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_input_never_reaches_generator() {
        let store = seeded_store().await;
        let generator = Arc::new(ScriptedGenerator::new(false));
        let orchestrator = ConversationOrchestrator::new(store, generator.clone(), ist());
        let mut ctx = SessionContext::new(Uuid::new_v4());

        let err = orchestrator.reply(&mut ctx, "   ", Utc::now()).await.unwrap_err();
        assert!(matches!(err, ConversationError::EmptyInput));
        assert!(generator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_still_replies_with_notice() {
        let inner = MemoryStore::new();
        inner.seed_catalog(&Catalog::default_seed()).await.unwrap();
        let orchestrator =
            ConversationOrchestrator::new(Arc::new(BrokenLog(inner)), Arc::new(ScriptedGenerator::new(false)), ist());
        let mut ctx = SessionContext::new(Uuid::new_v4());

        let reply = orchestrator.reply(&mut ctx, "Hi!", Utc::now()).await.unwrap();
        assert_eq!(reply.notice.as_deref(), Some(SAVE_FAILURE_NOTICE));
        assert_eq!(ctx.history.len(), 1);
    }
}
