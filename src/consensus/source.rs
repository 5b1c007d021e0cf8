//! Relay sources.

use std::path::{Path, PathBuf};

use log::info;

use super::parse::{parse_consensus, ParsedConsensus};
use crate::error_handling::MapError;

/// Something that yields the relays of a consensus.
///
/// The pipeline only depends on this capability, so tests can feed it
/// in-memory documents and other consensus formats can be plugged in.
pub trait RelaySource {
    /// Human-readable origin of the relays, used in log and error messages.
    fn describe(&self) -> String;

    /// Reads and parses all relay entries.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::FileRead`] when the underlying document cannot be
    /// read. Malformed entries are counted in the result, not reported here.
    fn read_relays(&self) -> Result<ParsedConsensus, MapError>;
}

/// A consensus document on disk.
#[derive(Debug, Clone)]
pub struct ConsensusFile {
    path: PathBuf,
}

impl ConsensusFile {
    /// Refers to a consensus file; nothing is read until [`RelaySource::read_relays`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RelaySource for ConsensusFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_relays(&self) -> Result<ParsedConsensus, MapError> {
        info!("Reading consensus file {}", self.path.display());
        let bytes = std::fs::read(&self.path).map_err(|source| MapError::FileRead {
            path: self.path.clone(),
            source,
        })?;
        // Consensus documents are ASCII; stray bytes only affect the lines
        // that contain them
        let text = String::from_utf8_lossy(&bytes);
        Ok(parse_consensus(&text))
    }
}

/// An in-memory consensus, mainly for tests and embedding.
impl RelaySource for str {
    fn describe(&self) -> String {
        "<in-memory consensus>".to_string()
    }

    fn read_relays(&self) -> Result<ParsedConsensus, MapError> {
        Ok(parse_consensus(self))
    }
}

/// A consensus that was already read, e.g. to fail fast before other inputs
/// are opened.
impl RelaySource for ParsedConsensus {
    fn describe(&self) -> String {
        format!("<parsed {} consensus>", self.flavor.as_str())
    }

    fn read_relays(&self) -> Result<ParsedConsensus, MapError> {
        Ok(self.clone())
    }
}
