//! Scheduler configuration.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding the poll interval.
pub const ENV_POLL_INTERVAL_MS: &str = "SIDEFLOW_POLL_INTERVAL_MS";
/// Environment variable selecting the render mode.
pub const ENV_RENDER: &str = "SIDEFLOW_RENDER";
/// Environment variable enabling debug reporting.
pub const ENV_DEBUG: &str = "SIDEFLOW_DEBUG";

/// How the scheduler displays progress while sides run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// One terminal progress bar per side.
    #[default]
    Bars,
    /// Progress changes written to the log.
    Log,
    /// No progress output.
    Off,
}

impl std::str::FromStr for RenderMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bars" | "bar" => Ok(Self::Bars),
            "log" => Ok(Self::Log),
            "off" | "none" => Ok(Self::Off),
            _ => Err(ConfigError::invalid_value(ENV_RENDER, value)),
        }
    }
}

/// Configuration of a [`SideScheduler`](crate::scheduler::SideScheduler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Delay between two progress polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Progress display mode.
    #[serde(default)]
    pub render: RenderMode,
    /// Report full error chains instead of the top-level message.
    #[serde(default)]
    pub debug: bool,
}

fn default_poll_interval_ms() -> u64 {
    10
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            render: RenderMode::default(),
            debug: false,
        }
    }
}

impl SchedulerConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval_ms(mut self, millis: u64) -> Self {
        self.poll_interval_ms = millis;
        self
    }

    /// Sets the render mode.
    #[must_use]
    pub fn with_render(mut self, render: RenderMode) -> Self {
        self.render = render;
        self
    }

    /// Enables or disables debug reporting.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Parses a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds a configuration from `SIDEFLOW_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_POLL_INTERVAL_MS) {
            config.poll_interval_ms = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_value(ENV_POLL_INTERVAL_MS, value.as_str()))?;
        }
        if let Some(value) = lookup(ENV_RENDER) {
            config.render = value.parse()?;
        }
        if let Some(value) = lookup(ENV_DEBUG) {
            config.debug = parse_flag(&value)
                .ok_or_else(|| ConfigError::invalid_value(ENV_DEBUG, value.as_str()))?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks value constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if the poll interval is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Constraint(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the poll interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(10));
        assert_eq!(config.render, RenderMode::Bars);
        assert!(!config.debug);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = SchedulerConfig::from_json_str(r#"{"render": "log"}"#).unwrap();
        assert_eq!(
            config,
            SchedulerConfig::new().with_render(RenderMode::Log)
        );
    }

    #[test]
    fn test_from_json_rejects_zero_interval() {
        let err = SchedulerConfig::from_json_str(r#"{"poll_interval_ms": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Constraint(_)));
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        let err = SchedulerConfig::from_json_str("{poll").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_POLL_INTERVAL_MS, "25"),
            (ENV_RENDER, "off"),
            (ENV_DEBUG, "true"),
        ]
        .into_iter()
        .collect();

        let config = SchedulerConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_string())).unwrap();
        assert_eq!(config.poll_interval_ms, 25);
        assert_eq!(config.render, RenderMode::Off);
        assert!(config.debug);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = SchedulerConfig::from_lookup(|key| {
            (key == ENV_POLL_INTERVAL_MS).then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains(ENV_POLL_INTERVAL_MS));

        let err = SchedulerConfig::from_lookup(|key| (key == ENV_DEBUG).then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_render_mode_parse() {
        assert_eq!("Bars".parse::<RenderMode>().unwrap(), RenderMode::Bars);
        assert_eq!("none".parse::<RenderMode>().unwrap(), RenderMode::Off);
        assert!("fancy".parse::<RenderMode>().is_err());
    }
}
