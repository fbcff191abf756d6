//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Timer cadence and threshold matching
//! - Notification preferences
//! - Default settings for new meetings
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::meeting::MeetingSettings;
use crate::notify::ThresholdMode;
use crate::timer::EngineOptions;

/// Timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// How often hosts should call `tick()`.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub threshold_mode: ThresholdMode,
    #[serde(default = "default_auto_transition_delay_ms")]
    pub auto_transition_delay_ms: u64,
    #[serde(default = "default_warning_threshold_secs")]
    pub warning_threshold_secs: u64,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Sound name passed to the notification sink. Empty means no sound.
    #[serde(default = "default_sound")]
    pub sound: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    /// Settings copied into every new meeting.
    #[serde(default)]
    pub defaults: MeetingSettings,
}

// Default functions
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_auto_transition_delay_ms() -> u64 {
    1000
}
fn default_warning_threshold_secs() -> u64 {
    300
}
fn default_true() -> bool {
    true
}
fn default_sound() -> String {
    "bell".into()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            threshold_mode: ThresholdMode::default(),
            auto_transition_delay_ms: default_auto_transition_delay_ms(),
            warning_threshold_secs: default_warning_threshold_secs(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: default_sound(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let unknown = || invalid("unknown config key".to_string());

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(invalid("config key is empty".to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing the defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
                .into()
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Returns error if the key is
    /// unknown or the value does not fit the field.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    /// Engine tunables derived from this config.
    ///
    /// # Errors
    ///
    /// Returns an error if a duration does not fit the engine's signed range.
    pub fn engine_options(&self) -> Result<EngineOptions> {
        let signed = |key: &str, value: u64| {
            i64::try_from(value).map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{value} is out of range"),
            })
        };
        let sound = Some(self.notifications.sound.clone()).filter(|s| !s.is_empty());
        Ok(EngineOptions {
            threshold_mode: self.timer.threshold_mode,
            warning_threshold_secs: signed(
                "timer.warning_threshold_secs",
                self.timer.warning_threshold_secs,
            )?,
            auto_transition_delay_ms: signed(
                "timer.auto_transition_delay_ms",
                self.timer.auto_transition_delay_ms,
            )?,
            notifications_enabled: self.notifications.enabled,
            sound,
            default_settings: self.defaults,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.timer.tick_interval_ms, 1000);
        assert_eq!(parsed.timer.threshold_mode, ThresholdMode::Crossed);
        assert!(parsed.defaults.bells.warning);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [timer]
            threshold_mode = "exact"

            [defaults]
            auto_transition = true
            "#,
        )
        .unwrap();
        assert_eq!(parsed.timer.threshold_mode, ThresholdMode::Exact);
        assert_eq!(parsed.timer.warning_threshold_secs, 300);
        assert!(parsed.defaults.auto_transition);
        assert!(parsed.defaults.bells.end);
        assert_eq!(parsed.notifications.sound, "bell");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.threshold_mode").as_deref(), Some("crossed"));
        assert_eq!(cfg.get("defaults.bells.start").as_deref(), Some("true"));
        assert!(cfg.get("timer.missing_key").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("defaults.silent_mode", "true").unwrap();
        cfg.apply("timer.auto_transition_delay_ms", "2500").unwrap();
        cfg.apply("timer.threshold_mode", "exact").unwrap();
        assert!(cfg.defaults.silent_mode);
        assert_eq!(cfg.timer.auto_transition_delay_ms, 2500);
        assert_eq!(cfg.timer.threshold_mode, ThresholdMode::Exact);
    }

    #[test]
    fn apply_rejects_bad_input() {
        let mut cfg = Config::default();
        assert!(cfg.apply("timer.nonexistent", "1").is_err());
        assert!(cfg.apply("defaults.silent_mode", "maybe").is_err());
        assert!(cfg.apply("timer.tick_interval_ms", "-5").is_err());
        assert!(cfg.apply("timer.threshold_mode", "sometimes").is_err());
        assert_eq!(cfg.timer.threshold_mode, ThresholdMode::Crossed);
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.timer.tick_interval_ms, 1000);

        let mut cfg = cfg;
        cfg.apply("notifications.sound", "").unwrap();
        cfg.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert!(reloaded.engine_options().unwrap().sound.is_none());
    }

    #[test]
    fn engine_options_follow_config() {
        let mut cfg = Config::default();
        cfg.apply("notifications.enabled", "false").unwrap();
        cfg.apply("defaults.auto_transition", "true").unwrap();
        let opts = cfg.engine_options().unwrap();
        assert!(!opts.notifications_enabled);
        assert!(opts.default_settings.auto_transition);
        assert_eq!(opts.sound.as_deref(), Some("bell"));
        assert_eq!(opts.auto_transition_delay_ms, 1000);
    }

    #[test]
    fn engine_options_reject_out_of_range_durations() {
        let mut cfg = Config::default();
        cfg.timer.warning_threshold_secs = u64::MAX;
        let err = cfg.engine_options().unwrap_err();
        assert!(err.to_string().contains("timer.warning_threshold_secs"));

        let mut cfg = Config::default();
        cfg.timer.auto_transition_delay_ms = i64::MAX as u64 + 1;
        assert!(cfg.engine_options().is_err());

        cfg.timer.auto_transition_delay_ms = i64::MAX as u64;
        assert_eq!(cfg.engine_options().unwrap().auto_transition_delay_ms, i64::MAX);
    }
}
