//! Configuration system for SmartSOC.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> environment -> explicit overrides.
//! Configuration is loaded from `~/.config/smartsoc/config.toml` and/or
//! `.smartsoc/config.toml` in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::Category;

/// Storage key of the persisted chat transcript.
pub const CHAT_HISTORY_KEY: &str = "smartsoc_chat_history_v1";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmartSocConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl SmartSocConfig {
    /// Check cross-field constraints figment cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.chat.validate()
    }
}

/// A uniform random delay drawn from `[min_ms, max_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn from_secs(min: u64, max: u64) -> Self {
        Self {
            min_ms: min * 1000,
            max_ms: max * 1000,
        }
    }

    /// Draw one delay. A degenerate range always yields `min_ms`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min_ms >= self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rng.gen_range(self.min_ms..self.max_ms))
    }

    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.min_ms > self.max_ms {
            return Err(ConfigError::InvalidRange {
                name: name.to_string(),
                min_ms: self.min_ms,
                max_ms: self.max_ms,
            });
        }
        Ok(())
    }
}

/// Per-category re-arm delay ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryIntervals {
    pub brute_force: DelayRange,
    pub malware: DelayRange,
    pub phishing: DelayRange,
    pub insider: DelayRange,
    pub ddos: DelayRange,
    pub exfiltration: DelayRange,
}

impl Default for CategoryIntervals {
    fn default() -> Self {
        Self {
            brute_force: DelayRange::from_secs(5, 15),
            malware: DelayRange::from_secs(8, 23),
            phishing: DelayRange::from_secs(6, 18),
            insider: DelayRange::from_secs(10, 30),
            ddos: DelayRange::from_secs(15, 40),
            exfiltration: DelayRange::from_secs(20, 50),
        }
    }
}

impl CategoryIntervals {
    pub fn for_category(&self, category: Category) -> DelayRange {
        match category {
            Category::BruteForce => self.brute_force,
            Category::Malware => self.malware,
            Category::Phishing => self.phishing,
            Category::Insider => self.insider,
            Category::Ddos => self.ddos,
            Category::Exfiltration => self.exfiltration,
        }
    }
}

/// Simulation engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Maximum events retained in memory.
    pub event_capacity: usize,
    /// Maximum incidents retained in memory.
    pub incident_capacity: usize,
    /// Rows kept by the rendered threat feed.
    pub feed_render_limit: usize,
    /// Rows kept by the rendered incident list.
    pub incident_render_limit: usize,
    /// Dashboard refresh period in milliseconds.
    pub refresh_interval_ms: u64,
    /// Delay before auto-resolution fires.
    pub resolution_delay: DelayRange,
    /// Brute-force events above this attempt count get blocked.
    pub block_attempts_threshold: u64,
    pub intervals: CategoryIntervals,
    /// Fixed RNG seed for reproducible runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            event_capacity: 100,
            incident_capacity: 50,
            feed_render_limit: 20,
            incident_render_limit: 10,
            refresh_interval_ms: 2000,
            resolution_delay: DelayRange::from_secs(2, 7),
            block_attempts_threshold: 20,
            intervals: CategoryIntervals::default(),
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("event_capacity", self.event_capacity),
            ("incident_capacity", self.incident_capacity),
            ("feed_render_limit", self.feed_render_limit),
            ("incident_render_limit", self.incident_render_limit),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    message: format!("simulation.{name} must be greater than zero"),
                });
            }
        }
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                message: "simulation.refresh_interval_ms must be greater than zero".into(),
            });
        }
        self.resolution_delay.validate("resolution_delay")?;
        for category in Category::ALL {
            let range = self.intervals.for_category(category);
            range.validate(category.config_key())?;
            if range.max_ms == 0 {
                return Err(ConfigError::Invalid {
                    message: format!(
                        "simulation.intervals.{} must allow a non-zero delay",
                        category.config_key()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Chat assistant configuration (OpenAI-compatible endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub base_url: String,
    pub model: String,
    /// Inline API key; prefer `api_key_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Previous turns included in each request.
    pub max_turns: usize,
    pub timeout_secs: u64,
    pub system_prompt: String,
    /// Transcript location; defaults to the project data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_path: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "openai/gpt-oss-120b".to_string(),
            api_key: None,
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: 0.6,
            max_tokens: 512,
            max_turns: 10,
            timeout_secs: 30,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            history_path: None,
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are the SmartSOC Assistant embedded in the SmartSOC \
Incident Response System. You help security analysts with SOC operations: interpreting alerts, \
incident triage, phishing analysis, threat intelligence, and safe remediation guidance. Respond \
in concise markdown with short headings, bold labels, bullet points, and numbered steps for \
playbooks. Avoid giving instructions that could enable harm. When information is missing, ask \
a brief clarifying question before proceeding.";

impl ChatConfig {
    /// Resolve the API key from the inline value or the configured env var.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// Where the transcript is persisted.
    pub fn history_file(&self) -> PathBuf {
        self.history_path
            .clone()
            .unwrap_or_else(|| data_dir().join(format!("{CHAT_HISTORY_KEY}.json")))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "chat.base_url must not be empty".into(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid {
                message: format!("chat.temperature {} is outside 0.0..=2.0", self.temperature),
            });
        }
        Ok(())
    }
}

/// HTTP dashboard API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8088,
        }
    }
}

/// Project data directory (logs, chat transcript).
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "smartsoc", "smartsoc")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".smartsoc"))
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `SMARTSOC_`)
/// 3. Workspace-local config (`.smartsoc/config.toml`)
/// 4. User config (`~/.config/smartsoc/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&SmartSocConfig>,
) -> Result<SmartSocConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(SmartSocConfig::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "smartsoc", "smartsoc") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".smartsoc").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // SMARTSOC_SIMULATION__EVENT_CAPACITY, SMARTSOC_CHAT__MODEL, etc.
    figment = figment.merge(Env::prefixed("SMARTSOC_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// Check whether any SmartSOC config file exists.
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "smartsoc", "smartsoc")
        && config_dir.config_dir().join("config.toml").exists()
    {
        return true;
    }
    workspace.is_some_and(|ws| ws.join(".smartsoc").join("config.toml").exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SmartSocConfig::default();
        assert_eq!(config.simulation.event_capacity, 100);
        assert_eq!(config.simulation.incident_capacity, 50);
        assert_eq!(config.simulation.feed_render_limit, 20);
        assert_eq!(config.simulation.incident_render_limit, 10);
        assert_eq!(config.simulation.refresh_interval_ms, 2000);
        assert_eq!(config.chat.max_turns, 10);
        assert_eq!(config.chat.max_tokens, 512);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_intervals_match_categories() {
        let intervals = CategoryIntervals::default();
        assert_eq!(
            intervals.for_category(Category::BruteForce),
            DelayRange::from_secs(5, 15)
        );
        assert_eq!(
            intervals.for_category(Category::Exfiltration),
            DelayRange::from_secs(20, 50)
        );
    }

    #[test]
    fn test_delay_range_sample_within_bounds() {
        let range = DelayRange::from_secs(2, 7);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let d = range.sample(&mut rng);
            assert!(d >= range.min() && d < range.max());
        }
    }

    #[test]
    fn test_degenerate_range_yields_min() {
        let range = DelayRange {
            min_ms: 300,
            max_ms: 300,
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(range.sample(&mut rng), Duration::from_millis(300));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut config = SmartSocConfig::default();
        config.simulation.intervals.malware = DelayRange {
            min_ms: 9000,
            max_ms: 1000,
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRange { ref name, .. } if name == "malware"));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = SmartSocConfig::default();
        config.simulation.event_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut config = SmartSocConfig::default();
        config.chat.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_workspace_config_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg_dir = dir.path().join(".smartsoc");
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(
            cfg_dir.join("config.toml"),
            "[simulation]\nevent_capacity = 42\n\n[server]\nport = 9999\n",
        )
        .unwrap();

        let config = load_config(Some(dir.path()), None).unwrap();
        assert_eq!(config.simulation.event_capacity, 42);
        assert_eq!(config.server.port, 9999);
        // Untouched keys keep their defaults.
        assert_eq!(config.simulation.incident_capacity, 50);
    }

    #[test]
    fn test_history_file_uses_fixed_key() {
        let config = ChatConfig::default();
        let path = config.history_file();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "smartsoc_chat_history_v1.json"
        );
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let config = SmartSocConfig::default();
        let text = toml::to_string(&config).unwrap();
        let back: SmartSocConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.simulation.event_capacity, config.simulation.event_capacity);
        assert_eq!(back.chat.model, config.chat.model);
    }
}
