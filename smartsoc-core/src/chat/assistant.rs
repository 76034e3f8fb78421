//! The SOC chat assistant: conversation assembly, single in-flight request,
//! and transcript bookkeeping.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::client::ChatBackend;
use super::transcript::{ChatTurn, TranscriptStore};
use crate::config::ChatConfig;
use crate::error::ChatError;

/// Stored when the service answers without any content.
pub const EMPTY_REPLY_FALLBACK: &str =
    "Sorry, I could not get a response right now. Please try again.";

/// Stored when the service cannot be reached or its reply cannot be read.
pub const UNREACHABLE_APOLOGY: &str =
    "I'm having trouble reaching the AI service. Please try again.";

const DEFAULT_CONTEXT: &str = "Dashboard view - monitoring overall security posture";

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// The service answered; the text was stored.
    Answer,
    /// The service rejected the request; the text is display-only.
    ServiceError,
    /// The service could not be reached; the apology was stored.
    Unreachable,
}

/// Text to show the user for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub text: String,
    pub kind: ReplyKind,
}

/// Clears the busy flag on every exit path.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ChatAssistant {
    backend: Arc<dyn ChatBackend>,
    store: TranscriptStore,
    history: Mutex<Vec<ChatTurn>>,
    busy: AtomicBool,
    system_prompt: String,
    max_turns: usize,
    context: std::sync::Mutex<String>,
}

impl ChatAssistant {
    /// Create an assistant, loading any stored transcript.
    pub fn new(config: &ChatConfig, backend: Arc<dyn ChatBackend>, store: TranscriptStore) -> Self {
        let history = store.load();
        Self {
            backend,
            store,
            history: Mutex::new(history),
            busy: AtomicBool::new(false),
            system_prompt: config.system_prompt.clone(),
            max_turns: config.max_turns,
            context: std::sync::Mutex::new(DEFAULT_CONTEXT.to_string()),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Replace the situational summary sent with each request.
    pub fn set_context(&self, context: impl Into<String>) {
        let mut guard = self.context.lock().unwrap_or_else(|e| e.into_inner());
        *guard = context.into();
    }

    /// The SOC context line as sent to the service.
    pub fn context_line(&self) -> String {
        let context = self
            .context
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|e| e.into_inner().clone());
        format!(
            "Current SmartSOC context as of {}: {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            context
        )
    }

    /// Copy of the transcript.
    pub async fn history(&self) -> Vec<ChatTurn> {
        self.history.lock().await.clone()
    }

    /// Empty the transcript and persist the empty state.
    pub async fn clear(&self) {
        let mut history = self.history.lock().await;
        history.clear();
        self.store.save_or_log(&history);
        info!("Chat transcript cleared");
    }

    /// Build the request: system prompt, context line, the most recent
    /// `max_turns` prior turns, then the new user message.
    pub fn build_conversation(&self, prior: &[ChatTurn], query: &str) -> Vec<ChatTurn> {
        let start = prior.len().saturating_sub(self.max_turns);
        let mut messages = Vec::with_capacity(prior.len() - start + 3);
        messages.push(ChatTurn::system(self.system_prompt.clone()));
        messages.push(ChatTurn::system(self.context_line()));
        messages.extend(prior[start..].iter().cloned());
        messages.push(ChatTurn::user(query));
        messages
    }

    /// Ask one question. Service problems come back as a displayable reply;
    /// only an overlapping request or an empty query is an error.
    pub async fn ask(&self, query: &str) -> Result<ChatReply, ChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatError::EmptyQuery);
        }
        let _busy = BusyGuard::acquire(&self.busy).ok_or(ChatError::Busy)?;

        let messages = {
            let mut history = self.history.lock().await;
            let messages = self.build_conversation(&history, query);
            history.push(ChatTurn::user(query));
            self.store.save_or_log(&history);
            messages
        };

        let reply = match self.backend.complete(&messages).await {
            Ok(text) => {
                let text = if text.trim().is_empty() {
                    EMPTY_REPLY_FALLBACK.to_string()
                } else {
                    text
                };
                self.append(ChatTurn::assistant(text.clone())).await;
                ChatReply {
                    text,
                    kind: ReplyKind::Answer,
                }
            }
            Err(ChatError::Http { status, message }) => {
                warn!(status, message = %message, "Chat service returned an error");
                ChatReply {
                    text: message,
                    kind: ReplyKind::ServiceError,
                }
            }
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                self.append(ChatTurn::assistant(UNREACHABLE_APOLOGY)).await;
                ChatReply {
                    text: UNREACHABLE_APOLOGY.to_string(),
                    kind: ReplyKind::Unreachable,
                }
            }
        };
        Ok(reply)
    }

    async fn append(&self, turn: ChatTurn) {
        let mut history = self.history.lock().await;
        history.push(turn);
        self.store.save_or_log(&history);
    }
}
