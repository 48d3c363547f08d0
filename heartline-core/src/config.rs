//! Configuration for the heartline engine.
//!
//! Maps directly to `heartline.toml`. Every section is optional and falls
//! back to the tuned defaults baked into the engine.

use serde::{Deserialize, Serialize};

/// Top-level heartline configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeartlineConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Message impact tuning.
    #[serde(default)]
    pub impact: ImpactConfig,
    /// Session and working-memory settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Event evaluator settings.
    #[serde(default)]
    pub events: EventsConfig,
    /// Persistence / save settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl HeartlineConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `HeartlineError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::HeartlineError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Heuristic message-impact tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactConfig {
    /// Symmetric multiplicative variance applied to affection and trust (0.2 = ±20%).
    #[serde(default = "default_variance")]
    pub variance: f64,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self { variance: 0.2 }
    }
}

/// Session lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Capacity of the working-memory ring buffer.
    #[serde(default = "default_working_memory_turns")]
    pub working_memory_turns: usize,
    /// How many recent turns are handed to prompt assembly.
    #[serde(default = "default_recent_turn_window")]
    pub recent_turn_window: usize,
    /// Local UTC offset (minutes) used for time-of-day and weekday conditions.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            working_memory_turns: 20,
            recent_turn_window: 10,
            utc_offset_minutes: 0,
        }
    }
}

/// Event evaluator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Near-trigger progress (percent, exclusive) above which an event is reported.
    #[serde(default = "default_near_trigger")]
    pub near_trigger_min_progress: u32,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            near_trigger_min_progress: 50,
        }
    }
}

/// Persistence and save settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Enable SQLite WAL mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Store and verify a CRC-32 checksum of every state blob.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            wal_mode: true,
            checksum_enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_variance() -> f64 { 0.2 }
fn default_working_memory_turns() -> usize { 20 }
fn default_recent_turn_window() -> usize { 10 }
fn default_near_trigger() -> u32 { 50 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = HeartlineConfig::from_toml("").expect("parse");
        assert_eq!(config.general.log_level, "info");
        assert!((config.impact.variance - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.session.working_memory_turns, 20);
        assert_eq!(config.events.near_trigger_min_progress, 50);
        assert!(config.persistence.wal_mode);
    }

    #[test]
    fn partial_sections_override_only_named_keys() {
        let config = HeartlineConfig::from_toml(
            r#"
            [impact]
            variance = 0.0

            [session]
            utc_offset_minutes = -300
            "#,
        )
        .expect("parse");
        assert!(config.impact.variance.abs() < f64::EPSILON);
        assert_eq!(config.session.utc_offset_minutes, -300);
        assert_eq!(config.session.recent_turn_window, 10);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = HeartlineConfig::from_toml("[impact\nvariance = ").expect_err("must fail");
        assert!(matches!(err, crate::HeartlineError::Config(_)));
    }
}
