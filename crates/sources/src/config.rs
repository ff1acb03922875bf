//! Provider configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wx_common::time::{parse_cycles, DEFAULT_CYCLES};
use wx_common::WxResult;

/// Provider types understood by the registry.
pub const PROVIDER_TYPES: &[&str] = &["file", "http"];

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// One configured data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Backend type: `file` or `http`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Display name; the registry key is used when absent.
    #[serde(default)]
    pub name: Option<String>,

    /// Location template with `{date}`, `{cycle}`, `{variable}` and `{fhour}`
    /// placeholders.
    pub base_url: String,

    /// Standard variable name to provider variable name.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    /// Forecast hours on offer; empty accepts any hour.
    #[serde(default)]
    pub forecast_hours: Vec<u32>,

    /// Model cycles as two-digit hours.
    #[serde(default = "default_cycles")]
    pub cycles: Vec<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// HTTP request timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_cycles() -> Vec<String> {
    DEFAULT_CYCLES.iter().map(|c| format!("{:02}", c)).collect()
}

fn default_enabled() -> bool {
    true
}

impl ProviderConfig {
    /// Minimal enabled config for `kind` reading from `base_url`.
    pub fn new(kind: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: None,
            base_url: base_url.into(),
            variables: BTreeMap::new(),
            forecast_hours: Vec::new(),
            cycles: default_cycles(),
            enabled: true,
            timeout_secs: None,
        }
    }

    pub fn with_variable(mut self, standard: impl Into<String>, provider: impl Into<String>) -> Self {
        self.variables.insert(standard.into(), provider.into());
        self
    }

    pub fn with_forecast_hours(mut self, hours: Vec<u32>) -> Self {
        self.forecast_hours = hours;
        self
    }

    /// Cycle hours parsed from the configured strings.
    pub fn cycle_hours(&self) -> WxResult<Vec<u32>> {
        Ok(parse_cycles(&self.cycles)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !PROVIDER_TYPES.contains(&self.kind.as_str()) {
            return Err(format!(
                "unknown provider type '{}', expected one of {:?}",
                self.kind, PROVIDER_TYPES
            ));
        }
        if self.base_url.trim().is_empty() {
            return Err("base_url must not be empty".to_string());
        }
        if self.cycles.is_empty() {
            return Err("at least one cycle is required".to_string());
        }
        parse_cycles(&self.cycles).map_err(|e| e.to_string())?;
        if self.timeout_secs == Some(0) {
            return Err("timeout_secs must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_yaml() {
        let config: ProviderConfig = serde_yaml::from_str("type: http\nbase_url: https://example.test/{date}").unwrap();
        assert_eq!(config.kind, "http");
        assert!(config.enabled);
        assert_eq!(config.cycles, vec!["00", "06", "12", "18"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        assert!(ProviderConfig::new("ftp", "x").validate().is_err());
        assert!(ProviderConfig::new("file", " ").validate().is_err());

        let mut config = ProviderConfig::new("file", "/data/{date}.json");
        config.cycles = vec!["25".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cycle_hours() {
        let mut config = ProviderConfig::new("file", "x");
        config.cycles = vec!["00".to_string(), "12".to_string()];
        assert_eq!(config.cycle_hours().unwrap(), vec![0, 12]);
    }
}
