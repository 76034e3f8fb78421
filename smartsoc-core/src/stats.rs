//! Running counters and the periodic dashboard snapshot.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Whether the category timers are running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Stopped,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Running => write!(f, "Running"),
            RunState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Simulation counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub total_events: u64,
    pub blocked_events: u64,
    pub incidents_created: u64,
    /// Always zero; nothing resolves incidents in the simulator.
    pub resolved_incidents: u64,
    /// Records in the event log still `Active`.
    pub active_events: usize,
}

impl SimulationStats {
    /// One-line summary handed to the chat assistant as its SOC context.
    pub fn context_summary(&self) -> String {
        format!(
            "Dashboard view - {} events generated, {} active, {} blocked, {} incidents open",
            self.total_events, self.active_events, self.blocked_events, self.incidents_created
        )
    }
}

/// Simulated host utilization, in percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub cpu: u8,
    pub memory: u8,
    pub network: u8,
    pub storage: u8,
}

impl SystemHealth {
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            cpu: rng.gen_range(40..70),
            memory: rng.gen_range(60..80),
            network: rng.gen_range(30..70),
            storage: rng.gen_range(45..60),
        }
    }
}

/// Simulated service performance gauges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub response_time_ms: u32,
    /// Requests per second.
    pub throughput: u32,
    /// Percent, two decimals.
    pub error_rate: f64,
    /// Percent, two decimals.
    pub availability: f64,
    /// Mean time to respond to an incident, in seconds.
    pub mean_response_secs: f64,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl PerformanceMetrics {
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            response_time_ms: rng.gen_range(50..150),
            throughput: rng.gen_range(500..1500),
            error_rate: round2(rng.gen_range(0.0..2.0)),
            availability: round2(rng.gen_range(99.9..=100.0)),
            mean_response_secs: round2(rng.gen_range(2.0..6.0)),
        }
    }
}

/// What the dashboard shows on each refresh tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub state: RunState,
    pub stats: SimulationStats,
    pub system_health: SystemHealth,
    pub performance: PerformanceMetrics,
}

impl DashboardSnapshot {
    pub fn sample<R: Rng + ?Sized>(state: RunState, stats: SimulationStats, rng: &mut R) -> Self {
        Self {
            generated_at: Utc::now(),
            state,
            stats,
            system_health: SystemHealth::sample(rng),
            performance: PerformanceMetrics::sample(rng),
        }
    }
}
