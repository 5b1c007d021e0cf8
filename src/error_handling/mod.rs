//! Error handling and pipeline statistics.
//!
//! Errors are split into:
//! - **Fatal**: [`MapError`], which aborts the run with a non-zero exit code
//! - **Recoverable**: [`PipelineEvent`]s, counted in [`PipelineStats`] and
//!   reported as "fewer points plotted"

mod stats;
mod types;

// Re-export public API
pub use stats::PipelineStats;
pub use types::{InitializationError, MapError, PipelineEvent, TileError};
