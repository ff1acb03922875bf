//! Error types for wx-ensemble operations.

use thiserror::Error;

/// Result type alias using WxError.
pub type WxResult<T> = Result<T, WxError>;

/// Broad failure class an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Validation,
    Provider,
    Regrid,
    Io,
}

/// Primary error type for grid alignment and ensemble analysis.
#[derive(Debug, Error)]
pub enum WxError {
    // === Configuration Errors ===
    #[error("Grid {name} not found. Available: {available:?}")]
    UnknownGrid { name: String, available: Vec<String> },

    #[error("Region {name} not found. Available: {available:?}")]
    UnknownRegion { name: String, available: Vec<String> },

    #[error("Provider {name} not found. Available: {available:?}")]
    UnknownProvider { name: String, available: Vec<String> },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Validation Errors ===
    #[error("Invalid bounds: lat=[{lat_min}, {lat_max}], lon=[{lon_min}, {lon_max}]")]
    InvalidBounds {
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
    },

    #[error("Invalid grid resolution: {0}")]
    InvalidResolution(f64),

    #[error("Selection lat=[{lat_min}, {lat_max}], lon=[{lon_min}, {lon_max}] is empty ({axis} axis has no points)")]
    EmptySelection {
        axis: String,
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
    },

    #[error("Forecast hour {hour} not available for {provider}. Available: {available:?}")]
    ForecastHourUnavailable {
        provider: String,
        hour: u32,
        available: Vec<u32>,
    },

    #[error("Grid mismatch: {0}")]
    GridMismatch(String),

    #[error("Variable {variable} not found in {context}")]
    VariableNotFound { variable: String, context: String },

    #[error("Need at least 2 members to compute spread, got {0}")]
    InsufficientMembers(usize),

    #[error("Number of labels ({labels}) must match number of fields ({fields})")]
    LabelMismatch { labels: usize, fields: usize },

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    // === Provider Errors ===
    #[error("Provider {0} is not available")]
    ProviderUnavailable(String),

    #[error("Provider {provider} failed: {context}")]
    Provider { provider: String, context: String },

    // === Regrid Errors ===
    #[error("Unsupported regrid method: {0}. Expected one of bilinear, conservative, nearest_s2d, nearest_d2s")]
    UnsupportedMethod(String),

    #[error("Regridding with {method} from {source_shape:?} to {target_shape:?} failed: {reason}")]
    RegridFailure {
        method: String,
        source_shape: (usize, usize),
        target_shape: (usize, usize),
        reason: String,
    },

    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Rendering failed: {0}")]
    Render(String),
}

impl WxError {
    /// Create a VariableNotFound error.
    pub fn variable_not_found(variable: impl Into<String>, context: impl Into<String>) -> Self {
        Self::VariableNotFound {
            variable: variable.into(),
            context: context.into(),
        }
    }

    /// Create a Provider error.
    pub fn provider(provider: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            context: context.into(),
        }
    }

    /// Get the taxonomy class for this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            WxError::UnknownGrid { .. }
            | WxError::UnknownRegion { .. }
            | WxError::UnknownProvider { .. }
            | WxError::InvalidConfig(_) => ErrorCategory::Configuration,

            WxError::InvalidBounds { .. }
            | WxError::InvalidResolution(_)
            | WxError::EmptySelection { .. }
            | WxError::ForecastHourUnavailable { .. }
            | WxError::GridMismatch(_)
            | WxError::VariableNotFound { .. }
            | WxError::InsufficientMembers(_)
            | WxError::LabelMismatch { .. }
            | WxError::InvalidGrid(_)
            | WxError::InvalidField(_) => ErrorCategory::Validation,

            WxError::ProviderUnavailable(_) | WxError::Provider { .. } => ErrorCategory::Provider,

            WxError::UnsupportedMethod(_) | WxError::RegridFailure { .. } => ErrorCategory::Regrid,

            WxError::Io(_) | WxError::Serialization(_) | WxError::Render(_) => ErrorCategory::Io,
        }
    }
}

impl From<serde_json::Error> for WxError {
    fn from(err: serde_json::Error) -> Self {
        WxError::Serialization(format!("JSON error: {}", err))
    }
}
