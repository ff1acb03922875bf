//! The data source contract and behaviour shared by every backend.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use wx_common::time::{cycle_hour, format_run_date, latest_run_time};
use wx_common::{infer_coordinates, Field, WxError, WxResult};

use crate::config::ProviderConfig;

/// Opens forecast fields from one provider.
pub trait DataSource: Send + Sync {
    /// Display name of the provider.
    fn name(&self) -> &str;

    /// Open `variable` (standard name) at `forecast_hour` from the run at
    /// `run_time`, or from the latest available run when `None`.
    ///
    /// The returned field holds only `variable`, under its standard name,
    /// with no time axis.
    fn open(&self, variable: &str, forecast_hour: u32, run_time: Option<DateTime<Utc>>) -> WxResult<Field>;
}

/// Resolved provider settings used by the backends.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    name: String,
    template: String,
    variables: BTreeMap<String, String>,
    forecast_hours: Vec<u32>,
    cycles: Vec<u32>,
    enabled: bool,
}

impl SourceSpec {
    /// Build from a config; `id` names the provider when the config does not.
    pub fn from_config(id: &str, config: &ProviderConfig) -> WxResult<Self> {
        config
            .validate()
            .map_err(|e| WxError::InvalidConfig(format!("provider {}: {}", id, e)))?;

        Ok(Self {
            name: config.name.clone().unwrap_or_else(|| id.to_string()),
            template: config.base_url.clone(),
            variables: config.variables.clone(),
            forecast_hours: config.forecast_hours.clone(),
            cycles: config.cycle_hours()?,
            enabled: config.enabled,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ensure_enabled(&self) -> WxResult<()> {
        if self.enabled {
            Ok(())
        } else {
            Err(WxError::ProviderUnavailable(self.name.clone()))
        }
    }

    /// Provider-specific name of a standard variable.
    pub fn provider_variable(&self, standard: &str) -> WxResult<&str> {
        self.variables.get(standard).map(String::as_str).ok_or_else(|| {
            WxError::variable_not_found(
                standard,
                format!(
                    "provider {} (available: {:?})",
                    self.name,
                    self.variables.keys().collect::<Vec<_>>()
                ),
            )
        })
    }

    /// Reject hours outside the configured list (an empty list allows all).
    pub fn validate_forecast_hour(&self, hour: u32) -> WxResult<()> {
        if self.forecast_hours.is_empty() || self.forecast_hours.contains(&hour) {
            Ok(())
        } else {
            Err(WxError::ForecastHourUnavailable {
                provider: self.name.clone(),
                hour,
                available: self.forecast_hours.clone(),
            })
        }
    }

    /// The requested run, or the latest run available at `now`.
    pub fn resolve_run_time(&self, run_time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
        run_time.unwrap_or_else(|| {
            let run = latest_run_time(now, &self.cycles);
            info!(provider = %self.name, run = %run, "Using latest run");
            run
        })
    }

    /// Fill the location template.
    ///
    /// `{date}` is `YYYYMMDD`, `{cycle}` the two-digit run hour, `{variable}`
    /// the provider variable name and `{fhour}` the three-digit forecast hour.
    pub fn location(&self, provider_var: &str, run_time: &DateTime<Utc>, forecast_hour: u32) -> String {
        self.template
            .replace("{date}", &format_run_date(run_time))
            .replace("{cycle}", &cycle_hour(run_time))
            .replace("{variable}", provider_var)
            .replace("{fhour}", &format!("{:03}", forecast_hour))
    }

    /// Common pre-flight for `open`: enabled check, variable mapping, hour
    /// validation and run resolution.
    pub fn prepare(
        &self,
        variable: &str,
        forecast_hour: u32,
        run_time: Option<DateTime<Utc>>,
    ) -> WxResult<Request> {
        self.ensure_enabled()?;
        self.validate_forecast_hour(forecast_hour)?;
        let provider_var = self.provider_variable(variable)?.to_string();
        let run_time = self.resolve_run_time(run_time, Utc::now());
        let location = self.location(&provider_var, &run_time, forecast_hour);

        Ok(Request {
            variable: variable.to_string(),
            provider_var,
            forecast_hour,
            run_time,
            location,
        })
    }

    /// Reduce a loaded field to the requested variable and time slice, under
    /// the standard name.
    pub fn finish(&self, field: Field, request: &Request) -> WxResult<Field> {
        if !field.has_variable(&request.provider_var) {
            return Err(WxError::variable_not_found(
                &request.provider_var,
                format!(
                    "{} (available: {:?})",
                    request.location,
                    field.variable_names().into_iter().take(10).collect::<Vec<_>>()
                ),
            ));
        }

        let field = field.retain_variables(&[request.provider_var.as_str()]);
        let field = self.select_forecast_hour(field, request.forecast_hour)?;
        let field = field
            .rename_variable(&request.provider_var, &request.variable)?
            .with_attr("source", self.name.as_str())
            .with_attr("run_time", request.run_time.to_rfc3339())
            .with_attr("forecast_hour", request.forecast_hour.to_string());

        info!(provider = %self.name, sizes = ?field.sizes(), "Opened field");
        Ok(field)
    }

    /// Drop the time axis, keeping the slice whose lead time (hours) matches.
    fn select_forecast_hour(&self, field: Field, hour: u32) -> WxResult<Field> {
        let Some(time) = infer_coordinates(&field).time else {
            return Ok(field);
        };
        let Some(values) = field.coord(&time) else {
            return Ok(field);
        };

        let index = match values.iter().position(|&v| (v - hour as f64).abs() < 1e-6) {
            Some(i) => i,
            None if values.len() == 1 => 0,
            None => {
                return Err(WxError::ForecastHourUnavailable {
                    provider: self.name.clone(),
                    hour,
                    available: values.iter().map(|&v| v.round().max(0.0) as u32).collect(),
                })
            }
        };

        debug!(axis = %time, index, "Selecting forecast hour");
        field.select_index(&time, index)
    }
}

/// A prepared `open` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Standard variable name.
    pub variable: String,
    pub provider_var: String,
    pub forecast_hour: u32,
    pub run_time: DateTime<Utc>,
    /// Filled location template (path or URL).
    pub location: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_utils::{grid_field, time_series_field};

    fn spec() -> SourceSpec {
        let config = ProviderConfig::new("file", "/data/gfs/{date}/{cycle}/{variable}_f{fhour}.json")
            .with_variable("t2m", "TMP_2m")
            .with_forecast_hours(vec![0, 6, 12]);
        SourceSpec::from_config("local_gfs", &config).unwrap()
    }

    fn run() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap()
    }

    #[test]
    fn test_location_template() {
        assert_eq!(
            spec().location("TMP_2m", &run(), 6),
            "/data/gfs/20240115/06/TMP_2m_f006.json"
        );
    }

    #[test]
    fn test_variable_mapping() {
        let spec = spec();
        assert_eq!(spec.provider_variable("t2m").unwrap(), "TMP_2m");
        assert!(matches!(spec.provider_variable("msl"), Err(WxError::VariableNotFound { .. })));
    }

    #[test]
    fn test_forecast_hour_validation() {
        match spec().validate_forecast_hour(9) {
            Err(WxError::ForecastHourUnavailable { provider, hour, available }) => {
                assert_eq!(provider, "local_gfs");
                assert_eq!(hour, 9);
                assert_eq!(available, vec![0, 6, 12]);
            }
            other => panic!("expected ForecastHourUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_run_time() {
        let spec = spec();
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap();
        assert_eq!(spec.resolve_run_time(Some(run()), now), run());
        assert_eq!(
            spec.resolve_run_time(None, now),
            Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_finish_selects_hour_and_renames() {
        let spec = spec();
        let field = time_series_field(vec![0.0, 6.0], vec![0.0, 1.0], vec![0.0, 1.0], "TMP_2m", (0..8).map(|v| v as f32).collect());
        let request = Request {
            variable: "t2m".to_string(),
            provider_var: "TMP_2m".to_string(),
            forecast_hour: 6,
            run_time: run(),
            location: "memory".to_string(),
        };

        let out = spec.finish(field, &request).unwrap();
        let var = out.variable("t2m").unwrap();
        assert_eq!(var.values(), &[4.0, 5.0, 6.0, 7.0]);
        assert!(!out.has_axis("time"));
        assert_eq!(out.attr("source"), Some("local_gfs"));
        assert_eq!(out.attr("forecast_hour"), Some("6"));
    }

    #[test]
    fn test_finish_missing_hour() {
        let spec = spec();
        let field = time_series_field(vec![0.0, 6.0], vec![0.0], vec![0.0], "TMP_2m", vec![1.0, 2.0]);
        let request = Request {
            variable: "t2m".to_string(),
            provider_var: "TMP_2m".to_string(),
            forecast_hour: 12,
            run_time: run(),
            location: "memory".to_string(),
        };
        assert!(matches!(
            spec.finish(field, &request),
            Err(WxError::ForecastHourUnavailable { .. })
        ));
    }

    #[test]
    fn test_finish_missing_provider_variable() {
        let spec = spec();
        let field = grid_field(vec![0.0], vec![0.0], "OTHER", vec![1.0]);
        let request = Request {
            variable: "t2m".to_string(),
            provider_var: "TMP_2m".to_string(),
            forecast_hour: 0,
            run_time: run(),
            location: "memory".to_string(),
        };
        assert!(matches!(spec.finish(field, &request), Err(WxError::VariableNotFound { .. })));
    }
}
