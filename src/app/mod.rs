//! Reporting helpers used by the run driver and the binary.

pub mod exit;
pub mod statistics;

pub use exit::{exit_code, EXIT_FAILURE, EXIT_SUCCESS, EXIT_USAGE};
pub use statistics::{print_pipeline_statistics, summary_line};
