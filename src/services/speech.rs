// src/services/speech.rs
//! Text-to-speech tasks and transcription. Each synthesis runs as its own
//! tokio task whose handle is kept so it can be aborted; a new request from
//! a session supersedes that session's unfinished one.

use crate::llm::{LlmError, SpeechEngine};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub const TRANSCRIPTION_FAILURE_MESSAGE: &str = "Sorry, I couldn't understand. Please try again.";

pub type SpeechTaskId = Uuid;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SpeechStatus {
    Pending,
    Ready { bytes: usize },
    Failed { error: String },
    Cancelled,
}

impl SpeechStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, SpeechStatus::Pending)
    }
}

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Nothing to read aloud")]
    EmptyText,
    #[error("No audio received")]
    EmptyAudio,
    #[error("Transcription failed: {0}")]
    Transcription(#[from] LlmError),
}

struct SpeechTask {
    session_id: Uuid,
    created_at: DateTime<Utc>,
    status: SpeechStatus,
    audio: Option<Arc<Vec<u8>>>,
    handle: Option<JoinHandle<()>>,
}

type TaskTable = Arc<RwLock<HashMap<SpeechTaskId, SpeechTask>>>;

pub struct SpeechTasks {
    engine: Arc<dyn SpeechEngine>,
    tasks: TaskTable,
}

impl SpeechTasks {
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        Self {
            engine,
            tasks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start synthesizing `text` for `session_id` and return the task id.
    pub async fn speak(&self, session_id: Uuid, text: &str, now: DateTime<Utc>) -> Result<SpeechTaskId, SpeechError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let task_id = Uuid::new_v4();
        {
            let mut tasks = self.tasks.write().await;
            for (id, task) in tasks.iter_mut() {
                if task.session_id == session_id && !task.status.is_finished() {
                    tracing::debug!("Superseding speech task {} for session {}", id, session_id);
                    stop(task);
                }
            }
            tasks.insert(
                task_id,
                SpeechTask {
                    session_id,
                    created_at: now,
                    status: SpeechStatus::Pending,
                    audio: None,
                    handle: None,
                },
            );
        }

        let engine = self.engine.clone();
        let tasks = self.tasks.clone();
        let text = text.to_string();
        let handle = tokio::spawn(async move {
            let outcome = engine.synthesize(&text).await;
            let mut tasks = tasks.write().await;
            let Some(task) = tasks.get_mut(&task_id) else {
                return;
            };
            if task.status != SpeechStatus::Pending {
                return;
            }
            match outcome {
                Ok(audio) => {
                    task.status = SpeechStatus::Ready { bytes: audio.len() };
                    task.audio = Some(Arc::new(audio));
                }
                Err(e) => {
                    tracing::error!("Speech synthesis {} failed: {}", task_id, e);
                    task.status = SpeechStatus::Failed { error: e.to_string() };
                }
            }
            task.handle = None;
        });

        attach_handle(&mut *self.tasks.write().await, task_id, handle);

        Ok(task_id)
    }

    pub async fn status(&self, task_id: SpeechTaskId) -> Option<SpeechStatus> {
        self.tasks.read().await.get(&task_id).map(|t| t.status.clone())
    }

    /// WAV bytes of a finished task; `None` until the task is ready.
    pub async fn audio(&self, task_id: SpeechTaskId) -> Option<Arc<Vec<u8>>> {
        self.tasks.read().await.get(&task_id).and_then(|t| t.audio.clone())
    }

    /// Stop a task. Pending work is aborted and ready audio is discarded;
    /// failed tasks keep their status. `None` for unknown ids.
    pub async fn cancel(&self, task_id: SpeechTaskId) -> Option<SpeechStatus> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&task_id)?;
        stop(task);
        Some(task.status.clone())
    }

    pub async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, SpeechError> {
        if audio.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        let text = self.engine.transcribe(audio, mime_type).await?;
        Ok(text.trim().to_string())
    }

    /// Drop finished tasks created before `now - max_age`. Returns how many went.
    pub async fn cleanup_finished(&self, max_age: Duration, now: DateTime<Utc>) -> usize {
        let cutoff = now - max_age;
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, t| !(t.status.is_finished() && t.created_at < cutoff));
        before - tasks.len()
    }
}

/// Keep the handle of a still-pending task. A task cancelled or superseded
/// before its handle arrived has no owner left, so its work is aborted.
fn attach_handle(tasks: &mut HashMap<SpeechTaskId, SpeechTask>, task_id: SpeechTaskId, handle: JoinHandle<()>) {
    match tasks.get_mut(&task_id) {
        Some(task) if !task.status.is_finished() => task.handle = Some(handle),
        _ => handle.abort(),
    }
}

fn stop(task: &mut SpeechTask) {
    if let Some(handle) = task.handle.take() {
        handle.abort();
    }
    if !matches!(task.status, SpeechStatus::Failed { .. }) {
        task.status = SpeechStatus::Cancelled;
        task.audio = None;
    }
}
