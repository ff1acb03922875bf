//! HTTP provider.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use tracing::{debug, info, instrument};
use wx_common::{codec, Field, WxError, WxResult};

use crate::config::{ProviderConfig, DEFAULT_TIMEOUT_SECS};
use crate::source::{DataSource, SourceSpec};

/// Fetches JSON-encoded fields from a URL template.
#[derive(Debug, Clone)]
pub struct HttpSource {
    spec: SourceSpec,
    client: Client,
}

impl HttpSource {
    pub fn new(spec: SourceSpec, timeout: Duration) -> WxResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wxtool/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WxError::provider(spec.name(), format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { spec, client })
    }

    pub fn from_config(id: &str, config: &ProviderConfig) -> WxResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        Self::new(SourceSpec::from_config(id, config)?, timeout)
    }

    pub fn spec(&self) -> &SourceSpec {
        &self.spec
    }

    fn fetch(&self, url: &str) -> WxResult<String> {
        let fail = |e: reqwest::Error| WxError::provider(self.spec.name(), format!("{}: {}", url, e));

        let response = self.client.get(url).send().map_err(fail)?;
        let status = response.status();
        debug!(%status, "Response received");

        let body = response.error_for_status().map_err(fail)?.text().map_err(fail)?;
        info!(bytes = body.len(), "Downloaded");
        Ok(body)
    }
}

impl DataSource for HttpSource {
    fn name(&self) -> &str {
        self.spec.name()
    }

    #[instrument(skip(self, run_time), fields(provider = %self.spec.name()))]
    fn open(&self, variable: &str, forecast_hour: u32, run_time: Option<DateTime<Utc>>) -> WxResult<Field> {
        let request = self.spec.prepare(variable, forecast_hour, run_time)?;
        let body = self.fetch(&request.location)?;
        let field = codec::from_json(&body)?;
        self.spec.finish(field, &request)
    }
}
