//! Fixed reference data: attacker and asset templates, the origin table used
//! by the geographic aggregator, and the attack-vector table.

use crate::types::{Actor, Asset, Category};

fn actor(id: &str, name: &str, origin: &str, kind: &str, sophistication: &str) -> Actor {
    Actor {
        id: id.into(),
        name: name.into(),
        origin: origin.into(),
        kind: kind.into(),
        sophistication: sophistication.into(),
    }
}

fn asset(id: &str, name: &str, ip: &str, kind: &str, criticality: &str) -> Asset {
    Asset {
        id: id.into(),
        name: name.into(),
        ip: ip.into(),
        kind: kind.into(),
        criticality: criticality.into(),
    }
}

/// The eight attacker templates.
pub fn actors() -> Vec<Actor> {
    vec![
        actor("APT1", "APT-29 (Cozy Bear)", "Russia", "Nation State", "High"),
        actor("APT2", "Lazarus Group", "North Korea", "Nation State", "High"),
        actor("APT3", "FIN7", "Unknown", "Cybercrime", "Medium"),
        actor("APT4", "Maze Ransomware", "Unknown", "Ransomware", "High"),
        actor("APT5", "REvil", "Unknown", "Ransomware", "High"),
        actor("APT6", "Emotet", "Unknown", "Botnet", "Medium"),
        actor("APT7", "TrickBot", "Unknown", "Banking Trojan", "Medium"),
        actor("APT8", "Ryuk", "Unknown", "Ransomware", "High"),
    ]
}

/// The actor attributed to every insider-threat event.
pub fn insider_actor() -> Actor {
    actor("INSIDER", "Internal User", "Internal", "Insider", "Medium")
}

/// The eight target templates.
pub fn assets() -> Vec<Asset> {
    vec![
        asset("V1", "Web Server-01", "192.168.1.10", "Web Server", "High"),
        asset("V2", "Database-02", "192.168.1.20", "Database", "Critical"),
        asset("V3", "File Server-03", "192.168.1.30", "File Server", "High"),
        asset("V4", "Mail Server-04", "192.168.1.40", "Mail Server", "Medium"),
        asset("V5", "Workstation-05", "192.168.1.50", "Workstation", "Low"),
        asset("V6", "Workstation-06", "192.168.1.51", "Workstation", "Low"),
        asset("V7", "IoT Device-07", "192.168.1.60", "IoT Device", "Medium"),
        asset("V8", "Cloud Instance-08", "10.0.0.10", "Cloud Server", "High"),
    ]
}

/// Display metadata for an attacker-origin bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginInfo {
    pub name: &'static str,
    pub code: &'static str,
    pub threat_level: &'static str,
    pub color: &'static str,
}

const HIGH: &str = "#ef4444";
const ELEVATED: &str = "#f97316";
const MEDIUM: &str = "#eab308";
const LOW: &str = "#22c55e";

/// Origin table in declaration order. Ties in rankings fall back to this order.
pub const ORIGINS: [OriginInfo; 20] = [
    OriginInfo { name: "Russia", code: "RU", threat_level: "High", color: HIGH },
    OriginInfo { name: "China", code: "CN", threat_level: "High", color: ELEVATED },
    OriginInfo { name: "North Korea", code: "KP", threat_level: "Medium", color: MEDIUM },
    OriginInfo { name: "Iran", code: "IR", threat_level: "Medium", color: MEDIUM },
    OriginInfo { name: "United States", code: "US", threat_level: "Low", color: LOW },
    OriginInfo { name: "Germany", code: "DE", threat_level: "Low", color: LOW },
    OriginInfo { name: "United Kingdom", code: "GB", threat_level: "Low", color: LOW },
    OriginInfo { name: "France", code: "FR", threat_level: "Low", color: LOW },
    OriginInfo { name: "Japan", code: "JP", threat_level: "Low", color: LOW },
    OriginInfo { name: "Brazil", code: "BR", threat_level: "Low", color: LOW },
    OriginInfo { name: "India", code: "IN", threat_level: "Low", color: LOW },
    OriginInfo { name: "Australia", code: "AU", threat_level: "Low", color: LOW },
    OriginInfo { name: "Canada", code: "CA", threat_level: "Low", color: LOW },
    OriginInfo { name: "South Korea", code: "KR", threat_level: "Low", color: LOW },
    OriginInfo { name: "Italy", code: "IT", threat_level: "Low", color: LOW },
    OriginInfo { name: "Spain", code: "ES", threat_level: "Low", color: LOW },
    OriginInfo { name: "Netherlands", code: "NL", threat_level: "Low", color: LOW },
    OriginInfo { name: "Sweden", code: "SE", threat_level: "Low", color: LOW },
    OriginInfo { name: "Norway", code: "NO", threat_level: "Low", color: LOW },
    OriginInfo { name: "Finland", code: "FI", threat_level: "Low", color: LOW },
];

/// Display metadata for an attack-vector bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorInfo {
    pub name: &'static str,
    pub color: &'static str,
}

/// Attack-vector table in declaration order.
pub const VECTORS: [VectorInfo; 6] = [
    VectorInfo { name: "Phishing", color: "#ef4444" },
    VectorInfo { name: "Malware", color: "#f97316" },
    VectorInfo { name: "DDoS", color: "#eab308" },
    VectorInfo { name: "Brute Force", color: "#8b5cf6" },
    VectorInfo { name: "Insider Threat", color: "#06b6d4" },
    VectorInfo { name: "Data Exfiltration", color: "#10b981" },
];

/// Map an event type display name onto its attack-vector bucket.
pub fn vector_name(event_type: &str) -> &'static str {
    match event_type {
        "Brute Force Attack" => "Brute Force",
        "Malware Detection" => "Malware",
        "Phishing Attempt" => "Phishing",
        "DDoS Attack" => "DDoS",
        "Insider Threat" => "Insider Threat",
        "Data Exfiltration" => "Data Exfiltration",
        _ => "Other",
    }
}

/// Attack-vector bucket for a category.
pub fn vector_for(category: Category) -> &'static str {
    vector_name(category.display_name())
}
