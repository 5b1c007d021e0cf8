//! Tor consensus reading.
//!
//! This module turns a network-status consensus document into [`RelayRecord`]s.
//! Only `r` lines (and the `a` lines attached to them) are interpreted; every
//! other keyword is ignored.
//!
//! [`RelayRecord`]: crate::models::RelayRecord

mod parse;
mod source;

// Re-export public API
pub(crate) use parse::parse_address;
pub use parse::{parse_consensus, ConsensusFlavor, ParsedConsensus};
pub use source::{ConsensusFile, RelaySource};
