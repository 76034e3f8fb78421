//! Incidents derived from high-severity events, each carrying the fixed
//! six-step response checklist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EventRecord, Severity};

/// Placeholder owner assigned to every synthesized incident.
pub const DEFAULT_ASSIGNEE: &str = "Security Team";

/// Incident lifecycle status. Nothing in the simulator closes an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncidentStatus {
    Open,
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentStatus::Open => write!(f, "Open"),
        }
    }
}

/// Status of a checklist step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Completed,
    #[serde(rename = "In Progress")]
    InProgress,
    Pending,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Completed => write!(f, "Completed"),
            StepStatus::InProgress => write!(f, "In Progress"),
            StepStatus::Pending => write!(f, "Pending"),
        }
    }
}

/// One step of the response checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentStep {
    pub order: u8,
    pub title: String,
    pub status: StepStatus,
    /// Nominal elapsed-time label, e.g. "5m".
    pub elapsed: String,
}

/// An entry in the incident timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub actor: String,
    pub details: String,
}

/// An incident synthesized from a High or Critical event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    /// Id of the generating event.
    pub event_id: String,
    pub title: String,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub assignee: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub description: String,
    pub steps: Vec<IncidentStep>,
    pub timeline: Vec<TimelineEntry>,
}

impl Incident {
    /// Derive an incident from a qualifying event. Returns `None` for Low and
    /// Medium events.
    pub fn from_event(id: String, event: &EventRecord) -> Option<Self> {
        if !event.severity.warrants_incident() {
            return None;
        }
        let now = Utc::now();
        Some(Self {
            id,
            event_id: event.id.clone(),
            title: format!("{} - {}", event.category.display_name(), event.asset.name),
            severity: event.severity,
            status: IncidentStatus::Open,
            assignee: DEFAULT_ASSIGNEE.to_string(),
            created_at: now,
            updated_at: now,
            description: event.description.clone(),
            steps: response_checklist(),
            timeline: vec![TimelineEntry {
                timestamp: now,
                action: "Incident Created".to_string(),
                actor: "System".to_string(),
                details: "Automated incident creation".to_string(),
            }],
        })
    }
}

/// The fixed six-step checklist every incident starts with.
pub fn response_checklist() -> Vec<IncidentStep> {
    [
        ("Initial Assessment", StepStatus::Completed, "0m"),
        ("Threat Analysis", StepStatus::InProgress, "2m"),
        ("Containment", StepStatus::Pending, "5m"),
        ("Eradication", StepStatus::Pending, "10m"),
        ("Recovery", StepStatus::Pending, "15m"),
        ("Lessons Learned", StepStatus::Pending, "20m"),
    ]
    .into_iter()
    .enumerate()
    .map(|(idx, (title, status, elapsed))| IncidentStep {
        order: idx as u8 + 1,
        title: title.to_string(),
        status,
        elapsed: elapsed.to_string(),
    })
    .collect()
}
