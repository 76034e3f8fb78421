//! Chat assistant collaborator.
//!
//! - `transcript`: persisted `{role, content}` history
//! - `client`: OpenAI-compatible `/chat/completions` backend
//! - `assistant`: conversation assembly and the single in-flight request

pub mod assistant;
pub mod client;
pub mod transcript;

pub use assistant::{
    ChatAssistant, ChatReply, EMPTY_REPLY_FALLBACK, ReplyKind, UNREACHABLE_APOLOGY,
};
pub use client::{ChatBackend, DEFAULT_SERVICE_ERROR, OpenAiCompatClient, extract_error_message};
pub use transcript::{ChatRole, ChatTurn, TranscriptStore};
