//! # SmartSOC Core
//!
//! Threat simulation engine for the SmartSOC demo dashboard.
//! Synthesizes security events on jittered per-category timers, fans them out
//! to display sinks, derives incidents, auto-resolves events, aggregates by
//! origin and attack vector, and hosts the chat assistant collaborator.

pub mod aggregator;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod feed;
pub mod generator;
pub mod incident;
pub mod resolver;
pub mod scheduler;
pub mod server;
pub mod sinks;
pub mod stats;
pub mod types;

// Re-export commonly used types at the crate root.
pub use aggregator::{AggregateSnapshot, OriginBucket, ThreatAggregator, VectorBucket};
pub use chat::{ChatAssistant, ChatBackend, ChatReply, ChatTurn, OpenAiCompatClient, TranscriptStore};
pub use config::{SmartSocConfig, load_config};
pub use dispatch::{EventSink, FanOut};
pub use engine::{EngineHandle, EngineStatus, SimulationEngine, SimulationState};
pub use error::{Result, SmartSocError};
pub use feed::BoundedLog;
pub use generator::EventGenerator;
pub use incident::Incident;
pub use sinks::{FeedView, IncidentBoard, StatsPanel};
pub use stats::{DashboardSnapshot, RunState, SimulationStats};
pub use types::{Actor, Asset, Category, EventRecord, EventStatus, Severity};
