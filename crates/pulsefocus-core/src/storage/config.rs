//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Baseline focus/rest durations and the adaptive mode switch
//! - Simulated-vitals toggle for machines without a heart-rate source
//! - Remote coach endpoint settings
//!
//! Configuration is stored at `~/.config/pulsefocus/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::session::{FocusMode, SessionConfig};

/// Timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_rest_minutes")]
    pub rest_minutes: u32,
    #[serde(default = "default_mode")]
    pub mode: FocusMode,
    /// Generate heart-rate readings locally when no sensor is paired.
    #[serde(default = "default_true")]
    pub simulated_vitals: bool,
}

/// Remote coach endpoint configuration.
///
/// The API key itself never lives here; it is kept in the OS keychain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_coach_base_url")]
    pub base_url: String,
    #[serde(default = "default_coach_path")]
    pub path: String,
    #[serde(default = "default_coach_model")]
    pub model: String,
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
    #[serde(default = "default_api_key_prefix")]
    pub api_key_prefix: String,
    /// Refuse to call the endpoint without a stored key.
    #[serde(default)]
    pub require_key: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pulsefocus/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub coach: CoachConfig,
}

// Default functions
fn default_focus_minutes() -> u32 {
    25
}
fn default_rest_minutes() -> u32 {
    5
}
fn default_mode() -> FocusMode {
    FocusMode::Adaptive
}
fn default_true() -> bool {
    true
}
fn default_coach_base_url() -> String {
    "https://api.moonshot.cn".into()
}
fn default_coach_path() -> String {
    "/v1/chat/completions".into()
}
fn default_coach_model() -> String {
    "kimi-k2-turbo-preview".into()
}
fn default_api_key_header() -> String {
    "Authorization".into()
}
fn default_api_key_prefix() -> String {
    "Bearer ".into()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            rest_minutes: default_rest_minutes(),
            mode: FocusMode::Adaptive,
            simulated_vitals: true,
        }
    }
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_coach_base_url(),
            path: default_coach_path(),
            model: default_coach_model(),
            api_key_header: default_api_key_header(),
            api_key_prefix: default_api_key_prefix(),
            require_key: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timer: TimerConfig::default(),
            coach: CoachConfig::default(),
        }
    }
}

impl TimerConfig {
    /// Session parameters with the duration clamps applied.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.focus_minutes, self.rest_minutes, self.mode)
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
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err("config key is empty".into());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| format!("unknown config key: {key}"))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| format!("unknown config key: {key}"))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(value.parse::<bool>()?),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| format!("cannot parse '{value}' as number"))?
                        } else {
                            return Err(format!("cannot parse '{value}' as number").into());
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value)?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| format!("unknown config key: {key}"))?;
        }

        Err(format!("unknown config key: {key}").into())
    }

    fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
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

    /// Set a config value by key. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        self.save()?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
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
        assert_eq!(parsed.timer.focus_minutes, 25);
        assert_eq!(parsed.timer.rest_minutes, 5);
        assert!(parsed.timer.simulated_vitals);
        assert!(!parsed.coach.enabled);
    }

    #[test]
    fn empty_toml_fills_every_default() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.timer.mode, FocusMode::Adaptive);
        assert_eq!(parsed.coach.model, "kimi-k2-turbo-preview");
        assert_eq!(parsed.coach.api_key_prefix, "Bearer ");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.focus_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("coach.enabled").as_deref(), Some("false"));
        assert!(cfg.get("timer.missing_key").is_none());
    }

    #[test]
    fn set_json_value_by_path_updates_nested_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "timer.focus_minutes", "40").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "timer.focus_minutes").unwrap(),
            &serde_json::Value::Number(40.into())
        );
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "timer.nonexistent_key", "1");
        assert!(result.is_err());
    }

    #[test]
    fn set_json_value_by_path_rejects_invalid_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "coach.enabled", "not_a_bool");
        assert!(result.is_err());
    }

    #[test]
    fn session_config_applies_clamps() {
        let timer = TimerConfig {
            focus_minutes: 90,
            rest_minutes: 1,
            mode: FocusMode::Fixed,
            simulated_vitals: false,
        };
        let sc = timer.session_config();
        assert_eq!(sc.focus_minutes, 60);
        assert_eq!(sc.rest_minutes, 3);
    }
}
