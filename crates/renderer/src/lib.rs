//! Report rendering for ensemble analysis.
//!
//! - [`colormap`]: sequential colour ramps (YlOrRd) applied to scalar grids
//! - [`png`]: in-house PNG encoder (indexed when possible, RGBA otherwise)
//! - [`sink`]: the [`ReportSink`] trait and its file-backed implementation

pub mod colormap;
pub mod png;
pub mod sink;

pub use colormap::{Color, ColorRamp};
pub use sink::{FileReportSink, ReportSink, SpreadMapOptions};
