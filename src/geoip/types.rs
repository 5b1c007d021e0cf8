//! GeoIP data structures.

use serde::{Deserialize, Serialize};

/// Metadata about the opened GeoIP database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoIpMetadata {
    /// Source path
    pub source: String,
    /// Database type, e.g. `GeoLite2-City`
    pub database_type: String,
    /// Database build date/version (extracted from database)
    pub version: String,
    /// Highest IP version the database covers (4 or 6)
    pub ip_version: u16,
    /// Number of nodes in the search tree
    pub node_count: u32,
}

impl GeoIpMetadata {
    /// Whether the database can contain coordinates at all.
    ///
    /// ASN and Country databases open fine but never yield a location.
    pub fn has_locations(&self) -> bool {
        let kind = self.database_type.to_ascii_lowercase();
        kind.contains("city") || kind.contains("location")
    }
}
