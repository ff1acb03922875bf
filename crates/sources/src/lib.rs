//! Forecast data providers.
//!
//! Every provider maps standard variable names to its own names, fills a
//! location template for the requested run and forecast hour, and returns a
//! single-variable field without a time axis.
//!
//! ```text
//! ┌──────────────────┐  get(name)  ┌────────────┐  open(var, fhour, run)
//! │ ProviderRegistry │────────────>│ DataSource │──────────────────────┐
//! └──────────────────┘             └────────────┘                      │
//!                                   │          │                       v
//!                            FileSource    HttpSource          Field (std name)
//!                         {path template}  {URL template}
//! ```

pub mod config;
pub mod file;
pub mod http;
pub mod registry;
pub mod source;

pub use config::{ProviderConfig, DEFAULT_TIMEOUT_SECS, PROVIDER_TYPES};
pub use file::FileSource;
pub use http::HttpSource;
pub use registry::ProviderRegistry;
pub use source::{DataSource, Request, SourceSpec};
