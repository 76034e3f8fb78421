//! Running counts of events by attacker origin and attack vector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{self, ORIGINS, VECTORS};
use crate::dispatch::EventSink;
use crate::error::SinkError;
use crate::feed::BoundedLog;
use crate::types::{EventRecord, Severity};

/// Records kept in the recent-activity window.
pub const RECENT_ACTIVITY_LEN: usize = 10;

/// Origins shown on the dashboard map panel.
pub const DEFAULT_TOP_ORIGINS: usize = 8;

/// One origin bucket as displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginBucket {
    pub name: String,
    pub code: String,
    pub threat_level: String,
    pub color: String,
    pub count: u64,
    pub percentage: f64,
}

/// One attack-vector bucket as displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorBucket {
    pub name: String,
    pub color: String,
    pub count: u64,
    pub percentage: f64,
}

/// Condensed view of a recently seen record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub event_id: String,
    pub event_type: String,
    pub origin: String,
    pub target: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

/// Everything the aggregate panels display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub total: u64,
    pub origins: Vec<OriginBucket>,
    pub vectors: Vec<VectorBucket>,
    pub recent: Vec<RecentActivity>,
}

/// Origin and vector counters over every record seen.
///
/// `total` counts all records, including those whose origin is not in the
/// origin table, so origin percentages may sum to less than 100.
#[derive(Debug, Clone)]
pub struct ThreatAggregator {
    origin_counts: [u64; ORIGINS.len()],
    vector_counts: [u64; VECTORS.len()],
    total: u64,
    recent: BoundedLog<RecentActivity>,
}

impl Default for ThreatAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreatAggregator {
    pub fn new() -> Self {
        Self {
            origin_counts: [0; ORIGINS.len()],
            vector_counts: [0; VECTORS.len()],
            total: 0,
            recent: BoundedLog::new(RECENT_ACTIVITY_LEN),
        }
    }

    /// Count one record.
    pub fn record(&mut self, record: &EventRecord) {
        self.total += 1;
        if let Some(idx) = ORIGINS.iter().position(|o| o.name == record.actor.origin) {
            self.origin_counts[idx] += 1;
        }
        let vector = catalog::vector_for(record.category);
        if let Some(idx) = VECTORS.iter().position(|v| v.name == vector) {
            self.vector_counts[idx] += 1;
        }
        self.recent.push_front(RecentActivity {
            event_id: record.id.clone(),
            event_type: record.category.display_name().to_string(),
            origin: record.actor.origin.clone(),
            target: record.asset.name.clone(),
            severity: record.severity,
            created_at: record.created_at,
        });
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn origin_count(&self, name: &str) -> u64 {
        ORIGINS
            .iter()
            .position(|o| o.name == name)
            .map_or(0, |idx| self.origin_counts[idx])
    }

    pub fn vector_count(&self, name: &str) -> u64 {
        VECTORS
            .iter()
            .position(|v| v.name == name)
            .map_or(0, |idx| self.vector_counts[idx])
    }

    /// `count / total * 100`, or 0 before any record is seen.
    pub fn percentage(&self, count: u64) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }

    /// All origin buckets in table order.
    pub fn origins(&self) -> Vec<OriginBucket> {
        ORIGINS
            .iter()
            .zip(self.origin_counts.iter())
            .map(|(info, &count)| OriginBucket {
                name: info.name.to_string(),
                code: info.code.to_string(),
                threat_level: info.threat_level.to_string(),
                color: info.color.to_string(),
                count,
                percentage: self.percentage(count),
            })
            .collect()
    }

    /// All vector buckets in table order.
    pub fn vectors(&self) -> Vec<VectorBucket> {
        VECTORS
            .iter()
            .zip(self.vector_counts.iter())
            .map(|(info, &count)| VectorBucket {
                name: info.name.to_string(),
                color: info.color.to_string(),
                count,
                percentage: self.percentage(count),
            })
            .collect()
    }

    /// Top `k` origins by count. Ties keep table order.
    pub fn top_origins(&self, k: usize) -> Vec<OriginBucket> {
        let mut buckets = self.origins();
        buckets.sort_by(|a, b| b.count.cmp(&a.count));
        buckets.truncate(k);
        buckets
    }

    /// Top `k` vectors by count. Ties keep table order.
    pub fn top_vectors(&self, k: usize) -> Vec<VectorBucket> {
        let mut buckets = self.vectors();
        buckets.sort_by(|a, b| b.count.cmp(&a.count));
        buckets.truncate(k);
        buckets
    }

    /// Newest-first window of the last records seen.
    pub fn recent(&self) -> Vec<RecentActivity> {
        self.recent.to_vec()
    }

    pub fn snapshot(&self) -> AggregateSnapshot {
        AggregateSnapshot {
            total: self.total,
            origins: self.top_origins(DEFAULT_TOP_ORIGINS),
            vectors: self.top_vectors(VECTORS.len()),
            recent: self.recent(),
        }
    }

    /// Reset every count and the recent window.
    pub fn clear(&mut self) {
        self.origin_counts = [0; ORIGINS.len()];
        self.vector_counts = [0; VECTORS.len()];
        self.total = 0;
        self.recent.clear();
    }
}

impl EventSink for ThreatAggregator {
    fn name(&self) -> &str {
        "aggregator"
    }

    fn on_event(&mut self, record: &EventRecord) -> Result<(), SinkError> {
        self.record(record);
        Ok(())
    }
}
