// src/context.rs
//! Per-browser-session state, handed explicitly to chat handlers.

use crate::llm::ChatTurn;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub const EXAMPLE_QUESTIONS: [&str; 10] = [
    "Hi! Can you help me with course information?",
    "What courses do you offer?",
    "Tell me about B.Tech program",
    "What is the fee structure for BCA?",
    "What subjects are taught in B.Sc first semester?",
    "How long is the B.Tech program?",
    "What are the subjects in BCA?",
    "Tell me about admission process",
    "What is the duration of B.Sc?",
    "Can you compare B.Tech and BCA programs?",
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryEntry {
    pub user_message: String,
    pub reply: String,
    /// Exact prompt sent to the model for this turn.
    #[serde(skip_serializing)]
    pub prompt: String,
    /// Local wall-clock time of the exchange, `HH:MM:SS`.
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub history: Vec<HistoryEntry>,
    pub draft_question: String,
    pub dark_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub history: Vec<HistoryEntry>,
    pub draft_question: String,
    pub dark_mode: bool,
    pub example_questions: Vec<&'static str>,
}

impl SessionContext {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            history: Vec::new(),
            draft_question: String::new(),
            dark_mode: false,
        }
    }

    /// History in the shape the text generator replays.
    pub fn turns(&self) -> Vec<ChatTurn> {
        self.history
            .iter()
            .map(|entry| ChatTurn {
                prompt: entry.prompt.clone(),
                reply: entry.reply.clone(),
            })
            .collect()
    }

    pub fn set_draft(&mut self, question: &str) {
        self.draft_question = question.to_string();
    }

    /// Flip the theme unless an explicit value is given. Returns the new value.
    pub fn set_theme(&mut self, dark_mode: Option<bool>) -> bool {
        self.dark_mode = dark_mode.unwrap_or(!self.dark_mode);
        self.dark_mode
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.user_id,
            history: self.history.clone(),
            draft_question: self.draft_question.clone(),
            dark_mode: self.dark_mode,
            example_questions: EXAMPLE_QUESTIONS.to_vec(),
        }
    }
}

pub type SharedContext = Arc<Mutex<SessionContext>>;

struct LiveContext {
    context: SharedContext,
    last_seen: DateTime<Utc>,
}

/// Live contexts keyed by session identifier. A chat turn holds its session's
/// mutex for the whole exchange, so turns within one session never interleave.
#[derive(Default)]
pub struct SessionContexts {
    inner: RwLock<HashMap<Uuid, LiveContext>>,
}

impl SessionContexts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a live context and mark it seen at `now`.
    pub async fn get(&self, user_id: &Uuid, now: DateTime<Utc>) -> Option<SharedContext> {
        let mut inner = self.inner.write().await;
        let live = inner.get_mut(user_id)?;
        live.last_seen = live.last_seen.max(now);
        Some(live.context.clone())
    }

    /// Insert a fresh context, or return the one another request created first.
    pub async fn get_or_insert(&self, user_id: Uuid, now: DateTime<Utc>) -> SharedContext {
        let mut inner = self.inner.write().await;
        let live = inner.entry(user_id).or_insert_with(|| LiveContext {
            context: Arc::new(Mutex::new(SessionContext::new(user_id))),
            last_seen: now,
        });
        live.last_seen = live.last_seen.max(now);
        live.context.clone()
    }

    /// Drop contexts nobody has touched since `now - max_idle`. Contexts a
    /// request still holds are kept. Returns how many went.
    pub async fn evict_idle(&self, max_idle: Duration, now: DateTime<Utc>) -> usize {
        let cutoff = now - max_idle;
        let mut inner = self.inner.write().await;
        let before = inner.len();
        inner.retain(|_, live| live.last_seen >= cutoff || Arc::strong_count(&live.context) > 1);
        before - inner.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
