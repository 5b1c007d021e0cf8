//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (defaults, limits, map extent)
//! - CLI option types and parsing
//! - Validation of the library configuration

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{
    Config, ConfigValidationError, LogFormat, LogLevel, Opt, TileFailurePolicy,
};
