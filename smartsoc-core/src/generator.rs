//! Synthetic event generation.
//!
//! Each category has its own synthesis rule: one actor and one asset are drawn
//! uniformly from the fixed catalogs, category fields come from small fixed
//! vocabularies, and severity follows a per-category rule.

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::debug;

use crate::catalog;
use crate::types::{Actor, Asset, Category, EventRecord, Severity};

const MALWARE_TYPES: [&str; 5] = ["Trojan", "Ransomware", "Backdoor", "Keylogger", "Botnet"];
const PHISHING_CHANNELS: [&str; 4] = ["Email", "SMS", "Voice", "Social Media"];
const INSIDER_ACTIONS: [&str; 4] = [
    "Privilege Escalation",
    "Data Access",
    "Unauthorized Download",
    "Suspicious Login",
];
const DDOS_TYPES: [&str; 4] = ["SYN Flood", "UDP Flood", "HTTP Flood", "DNS Amplification"];
const DATA_TYPES: [&str; 4] = [
    "Customer Data",
    "Financial Records",
    "Intellectual Property",
    "Personal Information",
];

/// Brute-force severity becomes High above this many attempts.
pub const BRUTE_FORCE_HIGH_ATTEMPTS: u64 = 30;

/// Time-based id source. Millisecond stamps are forced strictly increasing so
/// two records created in the same millisecond still get distinct ids.
#[derive(Debug, Default)]
pub struct IdClock {
    last_ms: i64,
}

impl IdClock {
    pub fn next(&mut self, prefix: &str) -> String {
        let now = Utc::now().timestamp_millis();
        self.last_ms = now.max(self.last_ms + 1);
        format!("{}-{}", prefix, self.last_ms)
    }
}

fn pick<'a, T, R: Rng + ?Sized>(items: &'a [T], rng: &mut R) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

fn random_ip<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{}.{}.{}.{}",
        rng.gen_range(0..255),
        rng.gen_range(0..255),
        rng.gen_range(0..255),
        rng.gen_range(0..255)
    )
}

fn random_token<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

/// Synthesizes `EventRecord`s from the fixed catalogs.
pub struct EventGenerator {
    actors: Vec<Actor>,
    assets: Vec<Asset>,
    insider: Actor,
    event_ids: IdClock,
    incident_ids: IdClock,
}

impl EventGenerator {
    pub fn new() -> Self {
        Self {
            actors: catalog::actors(),
            assets: catalog::assets(),
            insider: catalog::insider_actor(),
            event_ids: IdClock::default(),
            incident_ids: IdClock::default(),
        }
    }

    /// Synthesize one record for `category`.
    pub fn generate<R: Rng + ?Sized>(&mut self, category: Category, rng: &mut R) -> EventRecord {
        let record = match category {
            Category::BruteForce => {
                let attempts = rng.gen_range(10..60);
                self.brute_force(attempts, rng)
            }
            Category::Malware => self.malware(rng),
            Category::Phishing => self.phishing(rng),
            Category::Insider => self.insider(rng),
            Category::Ddos => self.ddos(rng),
            Category::Exfiltration => self.exfiltration(rng),
        };
        debug!(
            id = %record.id,
            category = %record.category,
            severity = %record.severity,
            "Generated event"
        );
        record
    }

    /// Next incident id (`INC-<millis>`).
    pub fn next_incident_id(&mut self) -> String {
        self.incident_ids.next("INC")
    }

    /// Brute-force record with an explicit attempt count.
    pub fn brute_force<R: Rng + ?Sized>(&mut self, attempts: u64, rng: &mut R) -> EventRecord {
        let actor = pick(&self.actors, rng).clone();
        let asset = pick(&self.assets, rng).clone();
        let severity = if attempts > BRUTE_FORCE_HIGH_ATTEMPTS {
            Severity::High
        } else {
            Severity::Medium
        };
        let description = format!(
            "Multiple failed login attempts detected from {} targeting {}",
            actor.name, asset.name
        );
        let destination = asset.ip.clone();
        EventRecord::new(
            self.event_ids.next(Category::BruteForce.prefix()),
            Category::BruteForce,
            severity,
            actor,
            asset,
            description,
            random_ip(rng),
            destination,
        )
        .with_attribute("attempts", attempts)
        .with_attribute("port", 22)
        .with_attribute("protocol", "SSH")
    }

    fn malware<R: Rng + ?Sized>(&mut self, rng: &mut R) -> EventRecord {
        let actor = pick(&self.actors, rng).clone();
        let asset = pick(&self.assets, rng).clone();
        let malware_type = *pick(&MALWARE_TYPES, rng);
        let severity = if malware_type == "Ransomware" {
            Severity::Critical
        } else {
            Severity::High
        };
        let description = format!("{} detected on {}", malware_type, asset.name);
        let destination = asset.ip.clone();
        let signature = format!("Malware.{}.{}", malware_type, rng.gen_range(0..1000));
        EventRecord::new(
            self.event_ids.next(Category::Malware.prefix()),
            Category::Malware,
            severity,
            actor,
            asset,
            description,
            random_ip(rng),
            destination,
        )
        .with_attribute("malware_type", malware_type)
        .with_attribute("hash", random_token(rng, 16))
        .with_attribute("signature", signature)
    }

    fn phishing<R: Rng + ?Sized>(&mut self, rng: &mut R) -> EventRecord {
        let actor = pick(&self.actors, rng).clone();
        let asset = pick(&self.assets, rng).clone();
        let channel = *pick(&PHISHING_CHANNELS, rng);
        let description = format!("{} phishing attempt targeting {}", channel, asset.name);
        let destination = asset.ip.clone();
        let url = format!("https://fake-{}.com", random_token(rng, 9));
        EventRecord::new(
            self.event_ids.next(Category::Phishing.prefix()),
            Category::Phishing,
            Severity::Medium,
            actor,
            asset,
            description,
            random_ip(rng),
            destination,
        )
        .with_attribute("channel", channel)
        .with_attribute("url", url)
        .with_attribute("subject", "Urgent: Verify Your Account")
    }

    fn insider<R: Rng + ?Sized>(&mut self, rng: &mut R) -> EventRecord {
        let asset = pick(&self.assets, rng).clone();
        let action = *pick(&INSIDER_ACTIONS, rng);
        let severity = if action == "Data Access" {
            Severity::High
        } else {
            Severity::Medium
        };
        let description = format!(
            "Suspicious {} activity detected",
            action.to_lowercase()
        );
        let ip = asset.ip.clone();
        let user = format!("user{}", rng.gen_range(0..100));
        EventRecord::new(
            self.event_ids.next(Category::Insider.prefix()),
            Category::Insider,
            severity,
            self.insider.clone(),
            asset,
            description,
            ip.clone(),
            ip,
        )
        .with_attribute("action", action)
        .with_attribute("user", user)
        .with_attribute("department", "IT")
    }

    fn ddos<R: Rng + ?Sized>(&mut self, rng: &mut R) -> EventRecord {
        let actor = pick(&self.actors, rng).clone();
        let asset = pick(&self.assets, rng).clone();
        let attack_type = *pick(&DDOS_TYPES, rng);
        let description = format!("{} DDoS attack targeting {}", attack_type, asset.name);
        let destination = asset.ip.clone();
        let packets: u64 = rng.gen_range(1000..11000);
        let bandwidth: u64 = rng.gen_range(100..1100);
        EventRecord::new(
            self.event_ids.next(Category::Ddos.prefix()),
            Category::Ddos,
            Severity::High,
            actor,
            asset,
            description,
            random_ip(rng),
            destination,
        )
        .with_attribute("attack_type", attack_type)
        .with_attribute("packets_per_second", packets)
        .with_attribute("bandwidth", bandwidth)
    }

    fn exfiltration<R: Rng + ?Sized>(&mut self, rng: &mut R) -> EventRecord {
        let actor = pick(&self.actors, rng).clone();
        let asset = pick(&self.assets, rng).clone();
        let data_type = *pick(&DATA_TYPES, rng);
        let description = format!(
            "Large data transfer detected - possible {} exfiltration",
            data_type.to_lowercase()
        );
        let source = asset.ip.clone();
        let data_size: u64 = rng.gen_range(100..1100);
        let destination = random_ip(rng);
        EventRecord::new(
            self.event_ids.next(Category::Exfiltration.prefix()),
            Category::Exfiltration,
            Severity::Critical,
            actor,
            asset,
            description,
            source,
            destination,
        )
        .with_attribute("data_type", data_type)
        .with_attribute("data_size", data_size)
        .with_attribute("protocol", "HTTPS")
        .with_attribute("port", 443)
    }
}

impl Default for EventGenerator {
    fn default() -> Self {
        Self::new()
    }
}
