//! IP address lookup.
//!
//! [`Geolocate`] is the capability the pipeline depends on;
//! [`MaxMindGeolocator`] implements it over a GeoLite2 City database.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;

use maxminddb::Reader;

use super::open::load_from_file;
use super::types::GeoIpMetadata;
use crate::consensus::parse_address;
use crate::error_handling::MapError;
use crate::models::Coordinate;

/// Outcome of resolving one address.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup {
    /// The record has a valid coordinate
    Found(Coordinate),
    /// No record for the address
    NotFound,
    /// A record exists but has no usable latitude/longitude
    NoLocation,
}

impl Lookup {
    /// The coordinate, if one was found.
    pub fn coordinate(self) -> Option<Coordinate> {
        match self {
            Lookup::Found(coordinate) => Some(coordinate),
            Lookup::NotFound | Lookup::NoLocation => None,
        }
    }
}

/// Resolves IP addresses to coordinates.
///
/// Implementations never fail per address: anything that cannot be resolved
/// is reported as [`Lookup::NotFound`] or [`Lookup::NoLocation`].
pub trait Geolocate {
    /// Resolves one address.
    fn locate(&self, address: IpAddr) -> Lookup;

    /// Resolves a textual address; unparsable input is `None`.
    fn lookup_ip(&self, ip: &str) -> Option<Coordinate> {
        let address = parse_address(ip)?;
        self.locate(address).coordinate()
    }
}

/// Geolocator backed by a MaxMind City database held in memory.
///
/// The database is read once in [`MaxMindGeolocator::open`] and released when
/// the geolocator is dropped.
pub struct MaxMindGeolocator {
    reader: Reader<Vec<u8>>,
    metadata: GeoIpMetadata,
}

impl MaxMindGeolocator {
    /// Opens a `.mmdb` file or a MaxMind `.tar.gz` archive.
    ///
    /// # Errors
    ///
    /// [`MapError::FileRead`] if the file cannot be read, and
    /// [`MapError::DatabaseOpen`] if it is not a usable database.
    pub fn open(path: &Path) -> Result<Self, MapError> {
        let (reader, metadata) = load_from_file(path)?;
        log::info!(
            "Opened {} database (built {}, IPv{} tree, {} nodes)",
            metadata.database_type,
            metadata.version,
            metadata.ip_version,
            metadata.node_count
        );
        Ok(Self { reader, metadata })
    }

    /// Metadata read when the database was opened.
    pub fn metadata(&self) -> &GeoIpMetadata {
        &self.metadata
    }
}

impl Geolocate for MaxMindGeolocator {
    fn locate(&self, address: IpAddr) -> Lookup {
        // An IPv4-only tree cannot answer IPv6 queries
        if address.is_ipv6() && self.metadata.ip_version == 4 {
            return Lookup::NotFound;
        }

        // maxminddb 0.27 API: lookup() returns Result<LookupResult, MaxMindDbError>
        let city_lookup = match self.reader.lookup(address) {
            Ok(result) => result,
            Err(e) => {
                log::debug!("GeoIP lookup for {} failed: {}", address, e);
                return Lookup::NotFound;
            }
        };

        if !city_lookup.has_data() {
            return Lookup::NotFound;
        }

        let city: maxminddb::geoip2::City = match city_lookup.decode() {
            Ok(Some(city)) => city,
            Ok(None) => return Lookup::NotFound,
            Err(e) => {
                log::debug!("GeoIP record for {} could not be decoded: {}", address, e);
                return Lookup::NoLocation;
            }
        };

        match (city.location.latitude, city.location.longitude) {
            (Some(latitude), Some(longitude)) => Coordinate::new(latitude, longitude)
                .map_or(Lookup::NoLocation, Lookup::Found),
            _ => Lookup::NoLocation,
        }
    }
}

/// Fixed address table, useful for tests and offline fixtures.
#[derive(Debug, Clone, Default)]
pub struct StaticGeolocator {
    entries: HashMap<IpAddr, Option<Coordinate>>,
}

impl StaticGeolocator {
    /// An empty table: every address is [`Lookup::NotFound`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an address that resolves to the given coordinate.
    pub fn with(mut self, address: IpAddr, coordinate: Coordinate) -> Self {
        self.entries.insert(address, Some(coordinate));
        self
    }

    /// Adds an address whose record has no location.
    pub fn without_location(mut self, address: IpAddr) -> Self {
        self.entries.insert(address, None);
        self
    }
}

impl Geolocate for StaticGeolocator {
    fn locate(&self, address: IpAddr) -> Lookup {
        match self.entries.get(&address) {
            Some(Some(coordinate)) => Lookup::Found(*coordinate),
            Some(None) => Lookup::NoLocation,
            None => Lookup::NotFound,
        }
    }
}
