//! GeoIP lookup using a local MaxMind GeoLite2 City database.
//!
//! The database is supplied by the operator as a `.mmdb` file or as the
//! `.tar.gz` archive MaxMind distributes; nothing is downloaded.

mod extract;
mod lookup;
mod open;
mod test_helpers;
mod types;

// Re-export public API
pub use lookup::{Geolocate, Lookup, MaxMindGeolocator, StaticGeolocator};
pub use types::GeoIpMetadata;
