//! Tool configuration.
//!
//! A single YAML file holds named regions, reference grids, data providers,
//! defaults for the subcommands and optional regridder settings. Values may
//! reference the environment with `${VAR}` or `${VAR:-default}`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use grid_regrid::{GridCatalog, RegridConfig, RegridMethod};
use serde::{Deserialize, Serialize};
use sources::ProviderConfig;

/// Default configuration path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/wxtool.yaml";

// ============================================================================
// Configuration types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(flatten)]
    pub grids: GridCatalog,

    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub regrid: RegridConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub region: Option<String>,
    pub reference_grid: Option<String>,
    pub regrid_method: RegridMethod,
    pub forecast_hour: u32,
    /// Directory for downloads written without an explicit `--output`.
    pub output_dir: PathBuf,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            region: None,
            reference_grid: None,
            regrid_method: RegridMethod::Bilinear,
            forecast_hour: 0,
            output_dir: PathBuf::from("data/raw"),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load, expand and validate the configuration at `path`.
///
/// `WX_*` environment overrides are applied to the regrid section.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration from {:?}", path))?;

    let mut config = parse_config(&content)
        .with_context(|| format!("Failed to load configuration from {:?}", path))?;
    config.regrid = config.regrid.with_env_overrides();

    validate_config(&config)?;
    Ok(config)
}

/// Parse configuration text after environment expansion.
pub fn parse_config(content: &str) -> Result<AppConfig> {
    let expanded = expand_env_vars(content)?;
    serde_yaml::from_str(&expanded).context("Failed to parse configuration YAML")
}

/// Replace `${VAR}` and `${VAR:-default}` with values from the environment.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut expr = String::new();
            let mut depth = 1;
            while depth > 0 {
                match chars.next() {
                    Some('{') => {
                        depth += 1;
                        expr.push('{');
                    }
                    Some('}') => {
                        depth -= 1;
                        if depth > 0 {
                            expr.push('}');
                        }
                    }
                    Some(c) => expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", expr),
                }
            }

            result.push_str(&resolve_var_expr(&expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve `VAR` or `VAR:-default`.
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((name, default)) = expr.split_once(":-") {
        match std::env::var(name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

// ============================================================================
// Validation
// ============================================================================

pub fn validate_config(config: &AppConfig) -> Result<()> {
    for (name, bbox) in &config.grids.regions {
        bbox.validate().with_context(|| format!("Invalid region {}", name))?;
    }

    for (name, spec) in &config.grids.reference_grids {
        anyhow::ensure!(
            spec.resolution.is_finite() && spec.resolution > 0.0,
            "Reference grid {} has invalid resolution {}",
            name,
            spec.resolution
        );
    }

    for (name, provider) in &config.providers {
        provider
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid provider {}: {}", name, e))?;
    }

    if let Some(region) = &config.defaults.region {
        config.grids.region(region).context("Invalid defaults.region")?;
    }
    if let Some(grid) = &config.defaults.reference_grid {
        config.grids.reference_grid(grid).context("Invalid defaults.reference_grid")?;
    }

    config
        .regrid
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid regrid settings: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::SAMPLE_CONFIG_YAML;

    #[test]
    fn test_expand_env_vars_simple() {
        std::env::set_var("WXTOOL_TEST_VAR", "value");
        let result = expand_env_vars("prefix_${WXTOOL_TEST_VAR}_suffix").unwrap();
        assert_eq!(result, "prefix_value_suffix");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("WXTOOL_UNSET_VAR");
        let result = expand_env_vars("dir=${WXTOOL_UNSET_VAR:-/tmp/wx}").unwrap();
        assert_eq!(result, "dir=/tmp/wx");
    }

    #[test]
    fn test_expand_env_vars_missing_required() {
        std::env::remove_var("WXTOOL_REQUIRED_VAR");
        assert!(expand_env_vars("${WXTOOL_REQUIRED_VAR}").is_err());
        assert!(expand_env_vars("${UNCLOSED").is_err());
    }

    #[test]
    fn test_parse_sample_config() {
        let config = parse_config(SAMPLE_CONFIG_YAML).unwrap();

        assert_eq!(config.grids.regions.len(), 2);
        assert_eq!(config.grids.reference_grids["coarse_2p0"].resolution, 2.0);
        assert_eq!(config.providers.len(), 2);
        assert!(!config.providers["archived"].enabled);
        assert_eq!(config.defaults.region.as_deref(), Some("test_box"));
        assert_eq!(config.defaults.regrid_method, RegridMethod::Bilinear);
        assert_eq!(config.regrid, RegridConfig::default());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_default_region() {
        let mut config = parse_config(SAMPLE_CONFIG_YAML).unwrap();
        config.defaults.region = Some("atlantis".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_provider() {
        let mut config = parse_config(SAMPLE_CONFIG_YAML).unwrap();
        config
            .providers
            .insert("bad".to_string(), ProviderConfig::new("ftp", "ftp://example"));
        assert!(validate_config(&config).is_err());
    }
}
