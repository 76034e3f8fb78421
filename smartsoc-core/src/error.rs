//! Error types for the SmartSOC core library.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering the chat collaborator, transcript storage, configuration, the
//! simulation engine, and display sinks.

use std::path::PathBuf;

/// Top-level error type for the SmartSOC core library.
#[derive(Debug, thiserror::Error)]
pub enum SmartSocError {
    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the chat-completions collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The service answered with a non-success status. `message` is the
    /// text meant for display.
    #[error("Chat service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Chat transport failed: {message}")]
    Transport { message: String },

    #[error("Chat response parse error: {message}")]
    ResponseParse { message: String },

    #[error("A chat request is already in flight")]
    Busy,

    #[error("Chat query is empty")]
    EmptyQuery,

    #[error("No API key configured (set {var})")]
    MissingApiKey { var: String },
}

/// Errors from reading or writing persisted state.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("Corrupt data in {path}: {message}")]
    Corrupt { path: PathBuf, message: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Invalid delay range for {name}: min {min_ms}ms exceeds max {max_ms}ms")]
    InvalidRange {
        name: String,
        min_ms: u64,
        max_ms: u64,
    },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// Errors from the simulation engine handle.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Simulation engine has shut down")]
    ShutDown,

    #[error("Simulation engine dropped the reply")]
    NoReply,

    #[error("Event {id} is already in the event log")]
    DuplicateEvent { id: String },
}

/// Errors a display sink may report. The dispatcher logs and swallows these.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The sink's render target is not attached; expected and silent.
    #[error("Sink target is not attached")]
    Detached,

    #[error("Sink '{sink}' failed: {message}")]
    Failed { sink: String, message: String },
}

/// A type alias for results using the top-level `SmartSocError`.
pub type Result<T> = std::result::Result<T, SmartSocError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_chat() {
        let err = SmartSocError::Chat(ChatError::Http {
            status: 500,
            message: "rate limited".into(),
        });
        assert_eq!(
            err.to_string(),
            "Chat error: Chat service returned HTTP 500: rate limited"
        );
    }

    #[test]
    fn test_error_display_config_range() {
        let err = SmartSocError::Config(ConfigError::InvalidRange {
            name: "brute_force".into(),
            min_ms: 9000,
            max_ms: 1000,
        });
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid delay range for brute_force: min 9000ms exceeds max 1000ms"
        );
    }

    #[test]
    fn test_error_display_engine() {
        let err = SmartSocError::Engine(EngineError::ShutDown);
        assert_eq!(err.to_string(), "Engine error: Simulation engine has shut down");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SmartSocError = io_err.into();
        assert!(matches!(err, SmartSocError::Io(_)));
    }

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: SmartSocError = serde_err.into();
        assert!(matches!(err, SmartSocError::Serialization(_)));
    }

    #[test]
    fn test_sink_error_variants() {
        let err = SinkError::Failed {
            sink: "feed".into(),
            message: "closed".into(),
        };
        assert_eq!(err.to_string(), "Sink 'feed' failed: closed");
        assert_eq!(SinkError::Detached.to_string(), "Sink target is not attached");
    }
}
