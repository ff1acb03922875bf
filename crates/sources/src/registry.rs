//! Provider lookup by name.

use std::collections::BTreeMap;

use tracing::debug;
use wx_common::{WxError, WxResult};

use crate::config::{ProviderConfig, PROVIDER_TYPES};
use crate::file::FileSource;
use crate::http::HttpSource;
use crate::source::DataSource;

/// Configured providers, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, ProviderConfig>,
}

impl ProviderRegistry {
    pub fn new(providers: BTreeMap<String, ProviderConfig>) -> Self {
        Self { providers }
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    pub fn config(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Instantiate the named provider.
    ///
    /// Unknown names and types fail with `UnknownProvider`; disabled
    /// providers with `ProviderUnavailable`.
    pub fn get(&self, name: &str) -> WxResult<Box<dyn DataSource>> {
        let config = self.providers.get(name).ok_or_else(|| WxError::UnknownProvider {
            name: name.to_string(),
            available: self.names(),
        })?;

        if !config.enabled {
            return Err(WxError::ProviderUnavailable(name.to_string()));
        }

        debug!(provider = name, kind = %config.kind, "Creating data source");
        match config.kind.as_str() {
            "file" => Ok(Box::new(FileSource::from_config(name, config)?)),
            "http" => Ok(Box::new(HttpSource::from_config(name, config)?)),
            other => Err(WxError::UnknownProvider {
                name: other.to_string(),
                available: PROVIDER_TYPES.iter().map(|t| t.to_string()).collect(),
            }),
        }
    }
}
