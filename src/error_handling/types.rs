//! Error type definitions.
//!
//! This module defines the fatal error types of the pipeline and the
//! recoverable events that are only counted.

use std::path::PathBuf;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the tile HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Failures of the optional tile background.
#[derive(Error, Debug)]
pub enum TileError {
    /// The request could not be sent or timed out.
    #[error("Tile request to {url} failed: {source}")]
    Request {
        /// Tile URL that was requested
        url: String,
        /// Underlying client error
        #[source]
        source: ReqwestError,
    },

    /// The provider answered with a non-success status.
    #[error("Tile provider returned HTTP {status} for {url}")]
    Status {
        /// Tile URL that was requested
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The body was not a decodable image.
    #[error("Tile {z}/{x}/{y} could not be decoded: {reason}")]
    Decode {
        /// Zoom level
        z: u8,
        /// Tile column
        x: u32,
        /// Tile row
        y: u32,
        /// Decoder message
        reason: String,
    },
}

/// Fatal pipeline errors.
///
/// Any of these terminates the run with a non-zero exit code. Recoverable
/// conditions (a malformed relay entry, an address missing from the database)
/// are not errors; they are counted as [`PipelineEvent`]s.
#[derive(Error, Debug)]
pub enum MapError {
    /// An input file is missing or unreadable.
    #[error("File read error: cannot read {path:?}: {source}")]
    FileRead {
        /// File that could not be read
        path: PathBuf,
        /// I/O error from the read
        #[source]
        source: std::io::Error,
    },

    /// The geolocation database is malformed or of the wrong format.
    #[error("Database open error: {path:?} is not a usable MaxMind database: {reason}")]
    DatabaseOpen {
        /// Database or archive path
        path: PathBuf,
        /// Why the reader rejected it
        reason: String,
    },

    /// The consensus yielded no relay entries at all.
    #[error("No relay entries found in consensus {path:?}")]
    NoRelays {
        /// Consensus that was read
        path: PathBuf,
    },

    /// Drawing, encoding or writing the output image failed.
    #[error("Render error: cannot write map to {path:?}: {reason}")]
    Render {
        /// Requested output path
        path: PathBuf,
        /// Encoder or I/O message
        reason: String,
    },

    /// The tile background failed and the policy is to abort.
    #[error("Tile background unavailable: {0}")]
    Tile(#[from] TileError),

    /// The configuration was rejected before any work started.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigValidationError),
}

/// Recoverable events counted during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum PipelineEvent {
    /// A consensus `r` line had too few fields or an unparsable address
    ParseSkip,
    /// An `a` line appeared before any `r` line or held a bad address
    OrphanAddressLine,
    /// The address is not in the geolocation database
    LookupMiss,
    /// The database record carried no usable latitude/longitude
    MissingLocation,
    /// Relay was located through its IPv6 OR address
    Ipv6Lookup,
    /// The tile background failed and the built-in basemap was drawn
    TileFallback,
}

impl std::fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PipelineEvent {
    /// Label used in the end-of-run statistics.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineEvent::ParseSkip => "Malformed relay entry skipped",
            PipelineEvent::OrphanAddressLine => "Unattached address line skipped",
            PipelineEvent::LookupMiss => "Address not in database",
            PipelineEvent::MissingLocation => "Database record without location",
            PipelineEvent::Ipv6Lookup => "Located via IPv6 address",
            PipelineEvent::TileFallback => "Tile background fell back to basemap",
        }
    }

    /// Whether the event dropped data (as opposed to being informational).
    pub fn is_loss(&self) -> bool {
        !matches!(self, PipelineEvent::Ipv6Lookup | PipelineEvent::TileFallback)
    }
}
