//! Built-in display sinks: the scrolling threat feed, the incident board and
//! the stats panel.
//!
//! Each sink keeps its own capped render model and, when attached to a
//! writer, prints one line per update. A sink without a writer still updates
//! its model and reports `SinkError::Detached`, which the dispatcher ignores.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::dispatch::EventSink;
use crate::error::SinkError;
use crate::feed::BoundedLog;
use crate::incident::{Incident, IncidentStatus};
use crate::stats::DashboardSnapshot;
use crate::types::{EventRecord, EventStatus, Severity};

type Target = Box<dyn Write + Send>;

fn emit(target: &mut Option<Target>, sink: &str, line: &str) -> Result<(), SinkError> {
    let Some(out) = target.as_mut() else {
        return Err(SinkError::Detached);
    };
    writeln!(out, "{line}")
        .and_then(|_| out.flush())
        .map_err(|e| SinkError::Failed {
            sink: sink.to_string(),
            message: e.to_string(),
        })
}

/// One row of the threat feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedRow {
    pub id: String,
    pub event_type: String,
    pub severity: Severity,
    pub status: EventStatus,
    pub actor: String,
    pub target: String,
    pub source_ip: String,
    pub time: DateTime<Utc>,
}

impl FeedRow {
    fn from_record(record: &EventRecord) -> Self {
        Self {
            id: record.id.clone(),
            event_type: record.category.display_name().to_string(),
            severity: record.severity,
            status: record.status(),
            actor: record.actor.name.clone(),
            target: record.asset.name.clone(),
            source_ip: record.source_ip.clone(),
            time: record.created_at,
        }
    }

    fn line(&self) -> String {
        format!(
            "[{}] {:<16} {:<20} {:<8} {:<9} {} -> {} ({})",
            self.time.format("%H:%M:%S"),
            self.id,
            self.event_type,
            self.severity,
            self.status,
            self.actor,
            self.target,
            self.source_ip
        )
    }
}

/// Scrolling threat feed capped at the render limit.
pub struct FeedView {
    rows: BoundedLog<FeedRow>,
    target: Option<Target>,
}

impl FeedView {
    pub fn new(limit: usize) -> Self {
        Self {
            rows: BoundedLog::new(limit),
            target: None,
        }
    }

    pub fn attached(limit: usize, target: Target) -> Self {
        Self {
            rows: BoundedLog::new(limit),
            target: Some(target),
        }
    }

    /// Newest-first rows.
    pub fn rows(&self) -> Vec<FeedRow> {
        self.rows.to_vec()
    }
}

impl EventSink for FeedView {
    fn name(&self) -> &str {
        "feed"
    }

    fn on_event(&mut self, record: &EventRecord) -> Result<(), SinkError> {
        let row = FeedRow::from_record(record);
        let line = row.line();
        self.rows.push_front(row);
        emit(&mut self.target, "feed", &line)
    }

    fn on_status_change(&mut self, record: &EventRecord) -> Result<(), SinkError> {
        // Rows already scrolled off are not re-added.
        let Some(row) = self.rows.find_mut(|r| r.id == record.id) else {
            return Ok(());
        };
        row.status = record.status();
        let line = format!("[{}] {:<16} status -> {}", Utc::now().format("%H:%M:%S"), row.id, row.status);
        emit(&mut self.target, "feed", &line)
    }
}

/// One row of the incident board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentRow {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub assignee: String,
    pub created_at: DateTime<Utc>,
}

/// Incident list capped at the render limit.
pub struct IncidentBoard {
    rows: BoundedLog<IncidentRow>,
    target: Option<Target>,
}

impl IncidentBoard {
    pub fn new(limit: usize) -> Self {
        Self {
            rows: BoundedLog::new(limit),
            target: None,
        }
    }

    pub fn attached(limit: usize, target: Target) -> Self {
        Self {
            rows: BoundedLog::new(limit),
            target: Some(target),
        }
    }

    pub fn rows(&self) -> Vec<IncidentRow> {
        self.rows.to_vec()
    }
}

impl EventSink for IncidentBoard {
    fn name(&self) -> &str {
        "incidents"
    }

    fn on_event(&mut self, _record: &EventRecord) -> Result<(), SinkError> {
        Ok(())
    }

    fn on_incident(&mut self, incident: &Incident) -> Result<(), SinkError> {
        let line = format!(
            "!! {} [{}] {} ({}, {})",
            incident.id, incident.severity, incident.title, incident.status, incident.assignee
        );
        self.rows.push_front(IncidentRow {
            id: incident.id.clone(),
            title: incident.title.clone(),
            severity: incident.severity,
            status: incident.status,
            assignee: incident.assignee.clone(),
            created_at: incident.created_at,
        });
        emit(&mut self.target, "incidents", &line)
    }
}

/// Counter panel refreshed from dashboard snapshots.
pub struct StatsPanel {
    latest: Option<DashboardSnapshot>,
    events_seen: u64,
    target: Option<Target>,
}

impl StatsPanel {
    pub fn new() -> Self {
        Self {
            latest: None,
            events_seen: 0,
            target: None,
        }
    }

    pub fn attached(target: Target) -> Self {
        Self {
            latest: None,
            events_seen: 0,
            target: Some(target),
        }
    }

    pub fn latest(&self) -> Option<&DashboardSnapshot> {
        self.latest.as_ref()
    }

    /// Records seen through `on_event` since registration.
    pub fn events_seen(&self) -> u64 {
        self.events_seen
    }
}

impl Default for StatsPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for StatsPanel {
    fn name(&self) -> &str {
        "stats"
    }

    fn on_event(&mut self, _record: &EventRecord) -> Result<(), SinkError> {
        self.events_seen += 1;
        Ok(())
    }

    fn on_snapshot(&mut self, snapshot: &DashboardSnapshot) -> Result<(), SinkError> {
        let s = &snapshot.stats;
        let h = &snapshot.system_health;
        let line = format!(
            "== {} | events {} active {} blocked {} incidents {} | cpu {}% mem {}% net {}% disk {}% | {}ms",
            snapshot.state,
            s.total_events,
            s.active_events,
            s.blocked_events,
            s.incidents_created,
            h.cpu,
            h.memory,
            h.network,
            h.storage,
            snapshot.performance.response_time_ms
        );
        self.latest = Some(snapshot.clone());
        emit(&mut self.target, "stats", &line)
    }
}
