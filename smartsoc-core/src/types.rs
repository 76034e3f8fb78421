//! Fundamental types: event categories, severities, statuses, reference data,
//! and the synthesized `EventRecord`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category of a synthesized security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    BruteForce,
    Malware,
    Phishing,
    Insider,
    Ddos,
    Exfiltration,
}

impl Category {
    /// All categories, in the order their timers are started.
    pub const ALL: [Category; 6] = [
        Category::BruteForce,
        Category::Malware,
        Category::Phishing,
        Category::Insider,
        Category::Ddos,
        Category::Exfiltration,
    ];

    /// Two-letter id prefix, e.g. `BF` for brute force.
    pub fn prefix(&self) -> &'static str {
        match self {
            Category::BruteForce => "BF",
            Category::Malware => "MW",
            Category::Phishing => "PH",
            Category::Insider => "IT",
            Category::Ddos => "DD",
            Category::Exfiltration => "DE",
        }
    }

    /// Human-readable event type shown in the feed.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::BruteForce => "Brute Force Attack",
            Category::Malware => "Malware Detection",
            Category::Phishing => "Phishing Attempt",
            Category::Insider => "Insider Threat",
            Category::Ddos => "DDoS Attack",
            Category::Exfiltration => "Data Exfiltration",
        }
    }

    /// Key used in configuration tables.
    pub fn config_key(&self) -> &'static str {
        match self {
            Category::BruteForce => "brute_force",
            Category::Malware => "malware",
            Category::Phishing => "phishing",
            Category::Insider => "insider",
            Category::Ddos => "ddos",
            Category::Exfiltration => "exfiltration",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// High and Critical events get an incident.
    pub fn warrants_incident(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

/// Display status of an event. `Active` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventStatus {
    Active,
    Blocked,
    Contained,
    Mitigated,
    Resolved,
}

impl EventStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EventStatus::Active)
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Active => write!(f, "Active"),
            EventStatus::Blocked => write!(f, "Blocked"),
            EventStatus::Contained => write!(f, "Contained"),
            EventStatus::Mitigated => write!(f, "Mitigated"),
            EventStatus::Resolved => write!(f, "Resolved"),
        }
    }
}

/// Rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status transition for {id}: {from} -> {to}")]
pub struct TransitionError {
    pub id: String,
    pub from: EventStatus,
    pub to: EventStatus,
}

/// A fictitious attacker template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    /// Origin label used by the geographic aggregator.
    pub origin: String,
    /// Actor type, e.g. "Nation State" or "Ransomware".
    pub kind: String,
    pub sophistication: String,
}

/// A fictitious target system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub ip: String,
    pub kind: String,
    pub criticality: String,
}

/// A synthesized security event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub category: Category,
    pub severity: Severity,
    pub actor: Actor,
    pub asset: Asset,
    pub created_at: DateTime<Utc>,
    status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resolved_at: Option<DateTime<Utc>>,
    pub description: String,
    pub source_ip: String,
    pub destination_ip: String,
    /// Category-specific fields (attempt counts, malware family, ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl EventRecord {
    /// Create a new record in the `Active` state.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        category: Category,
        severity: Severity,
        actor: Actor,
        asset: Asset,
        description: String,
        source_ip: String,
        destination_ip: String,
    ) -> Self {
        Self {
            id,
            category,
            severity,
            actor,
            asset,
            created_at: Utc::now(),
            status: EventStatus::Active,
            resolved_at: None,
            description,
            source_ip,
            destination_ip,
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute insertion.
    pub fn with_attribute(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Move from `Active` to a terminal status. Transitions are one-way:
    /// a record that already left `Active` cannot move again.
    pub fn transition(&mut self, to: EventStatus) -> Result<(), TransitionError> {
        if self.status.is_terminal() || !to.is_terminal() {
            return Err(TransitionError {
                id: self.id.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.resolved_at = Some(Utc::now());
        Ok(())
    }

    /// Brute-force attempt count, if this record carries one.
    pub fn attempts(&self) -> Option<u64> {
        self.attributes.get("attempts").and_then(|v| v.as_u64())
    }

    /// String-valued attribute lookup.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_str())
    }
}
