//! Local file provider.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::instrument;
use wx_common::{load_field, Field, WxError, WxResult};

use crate::config::ProviderConfig;
use crate::source::{DataSource, SourceSpec};

/// Reads fields saved with [`wx_common::save_field`] from a path template.
#[derive(Debug, Clone)]
pub struct FileSource {
    spec: SourceSpec,
}

impl FileSource {
    pub fn new(spec: SourceSpec) -> Self {
        Self { spec }
    }

    pub fn from_config(id: &str, config: &ProviderConfig) -> WxResult<Self> {
        Ok(Self::new(SourceSpec::from_config(id, config)?))
    }

    pub fn spec(&self) -> &SourceSpec {
        &self.spec
    }
}

impl DataSource for FileSource {
    fn name(&self) -> &str {
        self.spec.name()
    }

    #[instrument(skip(self, run_time), fields(provider = %self.spec.name()))]
    fn open(&self, variable: &str, forecast_hour: u32, run_time: Option<DateTime<Utc>>) -> WxResult<Field> {
        let request = self.spec.prepare(variable, forecast_hour, run_time)?;
        let path = PathBuf::from(&request.location);

        if !path.is_file() {
            return Err(WxError::provider(
                self.spec.name(),
                format!("file not found: {}", path.display()),
            ));
        }

        let field = load_field(&path)?;
        self.spec.finish(field, &request)
    }
}
