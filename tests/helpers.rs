// Shared test helpers for consensus fixtures and output locations.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use tor_relay_map::geoip::StaticGeolocator;
use tor_relay_map::models::Coordinate;
use tor_relay_map::Config;

/// Builds an `ns`-flavor consensus with one `r` line per address.
#[allow(dead_code)] // Used by other test files
pub fn consensus_text(addresses: &[&str]) -> String {
    let mut text = String::from("network-status-version 3\nvote-status consensus\n");
    for (i, address) in addresses.iter().enumerate() {
        text.push_str(&format!(
            "r relay{} AAAAAAAAAAAAAAAAAAAAAAAAAAA{} BBBBBBBBBBBBBBBBBBBBBBBBBBB 2024-05-01 12:00:00 {} 9001 0\n",
            i, i, address
        ));
        text.push_str("s Fast Running Stable Valid\n");
    }
    text.push_str("directory-footer\n");
    text
}

/// Writes a consensus fixture and returns its path.
#[allow(dead_code)]
pub fn write_consensus(dir: &Path, addresses: &[&str]) -> PathBuf {
    let path = dir.join("cached-consensus");
    std::fs::write(&path, consensus_text(addresses)).expect("Failed to write consensus");
    path
}

/// Geolocator knowing the given (address, latitude, longitude) triples.
#[allow(dead_code)]
pub fn geolocator(entries: &[(&str, f64, f64)]) -> StaticGeolocator {
    entries
        .iter()
        .fold(StaticGeolocator::new(), |table, (address, lat, lon)| {
            let address: IpAddr = address.parse().expect("Invalid test address");
            let coordinate = Coordinate::new(*lat, *lon).expect("Invalid test coordinate");
            table.with(address, coordinate)
        })
}

/// Small-image configuration writing into `dir`.
#[allow(dead_code)]
pub fn test_config(dir: &Path) -> Config {
    Config {
        consensus_file: dir.join("cached-consensus"),
        geoip_db: dir.join("GeoLite2-City.mmdb"),
        output: dir.join("map.png"),
        width: 700,
        ..Config::default()
    }
}

/// Value types understood by the MaxMind DB data section.
#[allow(dead_code)]
pub enum MmdbValue {
    Str(&'static str),
    Double(f64),
    U16(u16),
    U32(u32),
    U64(u64),
    Map(Vec<(&'static str, MmdbValue)>),
    Array(Vec<MmdbValue>),
}

#[allow(dead_code)]
#[derive(Clone, Copy)]
enum Record {
    Empty,
    Node(usize),
    Data(usize),
}

/// Writes small MaxMind DB files with 24-bit records.
///
/// In an IPv6 tree, IPv4 networks sit under `::/96`, where readers start
/// IPv4 lookups.
#[allow(dead_code)]
pub struct MmdbBuilder {
    ip_version: u16,
    database_type: &'static str,
    nodes: Vec<[Record; 2]>,
    data: Vec<u8>,
}

#[allow(dead_code)]
impl MmdbBuilder {
    pub fn new(ip_version: u16) -> Self {
        Self {
            ip_version,
            database_type: "GeoLite2-City",
            nodes: vec![[Record::Empty; 2]],
            data: Vec::new(),
        }
    }

    /// Stores `record` for a CIDR network such as `192.0.2.0/24`.
    pub fn insert(mut self, network: &str, record: MmdbValue) -> Self {
        let (bits, prefix_len) = self.network_bits(network);
        let offset = self.data.len();
        encode_value(&record, &mut self.data);

        let mut node = 0;
        for depth in 0..prefix_len {
            let bit = ((bits >> (127 - depth)) & 1) as usize;
            if depth + 1 == prefix_len {
                self.nodes[node][bit] = Record::Data(offset);
                break;
            }
            node = match self.nodes[node][bit] {
                Record::Node(next) => next,
                Record::Empty | Record::Data(_) => {
                    self.nodes.push([Record::Empty; 2]);
                    let next = self.nodes.len() - 1;
                    self.nodes[node][bit] = Record::Node(next);
                    next
                }
            };
        }
        self
    }

    /// Returns the network as left-aligned 128 bits plus a prefix length in
    /// tree bits.
    fn network_bits(&self, network: &str) -> (u128, u32) {
        let (address, len) = network.split_once('/').expect("Network needs a prefix length");
        let len: u32 = len.parse().expect("Invalid prefix length");
        match address.parse::<IpAddr>().expect("Invalid network address") {
            IpAddr::V4(v4) if self.ip_version == 4 => (u128::from(u32::from(v4)) << 96, len),
            IpAddr::V4(v4) => (u128::from(u32::from(v4)), 96 + len),
            IpAddr::V6(v6) => {
                assert_eq!(self.ip_version, 6, "IPv6 network in an IPv4 tree");
                (u128::from(v6), len)
            }
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let node_count = self.nodes.len();
        let mut out = Vec::new();
        for node in &self.nodes {
            for record in node {
                let value = match *record {
                    Record::Empty => node_count,
                    Record::Node(next) => next,
                    Record::Data(offset) => node_count + 16 + offset,
                };
                out.extend_from_slice(&(value as u32).to_be_bytes()[1..]);
            }
        }
        out.extend_from_slice(&[0u8; 16]);
        out.extend_from_slice(&self.data);
        out.extend_from_slice(b"\xab\xcd\xefMaxMind.com");

        let metadata = MmdbValue::Map(vec![
            ("binary_format_major_version", MmdbValue::U16(2)),
            ("binary_format_minor_version", MmdbValue::U16(0)),
            ("build_epoch", MmdbValue::U64(1_714_521_600)),
            ("database_type", MmdbValue::Str(self.database_type)),
            (
                "description",
                MmdbValue::Map(vec![("en", MmdbValue::Str("tor_relay_map fixture"))]),
            ),
            ("ip_version", MmdbValue::U16(self.ip_version)),
            ("languages", MmdbValue::Array(vec![MmdbValue::Str("en")])),
            ("node_count", MmdbValue::U32(node_count as u32)),
            ("record_size", MmdbValue::U16(24)),
        ]);
        encode_value(&metadata, &mut out);
        out
    }

    /// Builds and writes the database, returning its path.
    pub fn write(&self, path: &Path) -> PathBuf {
        std::fs::write(path, self.build()).expect("Failed to write database");
        path.to_path_buf()
    }
}

#[allow(dead_code)]
fn encode_control(type_num: u8, size: usize, out: &mut Vec<u8>) {
    let (size_bits, extra): (u8, Vec<u8>) = if size < 29 {
        (size as u8, Vec::new())
    } else if size < 285 {
        (29, vec![(size - 29) as u8])
    } else {
        let rest = size - 285;
        (30, vec![(rest >> 8) as u8, rest as u8])
    };
    if type_num <= 7 {
        out.push((type_num << 5) | size_bits);
    } else {
        out.push(size_bits);
        out.push(type_num - 7);
    }
    out.extend(extra);
}

#[allow(dead_code)]
fn encode_value(value: &MmdbValue, out: &mut Vec<u8>) {
    match value {
        MmdbValue::Str(text) => {
            encode_control(2, text.len(), out);
            out.extend_from_slice(text.as_bytes());
        }
        MmdbValue::Double(number) => {
            encode_control(3, 8, out);
            out.extend_from_slice(&number.to_be_bytes());
        }
        MmdbValue::U16(number) => {
            encode_control(5, 2, out);
            out.extend_from_slice(&number.to_be_bytes());
        }
        MmdbValue::U32(number) => {
            encode_control(6, 4, out);
            out.extend_from_slice(&number.to_be_bytes());
        }
        MmdbValue::Map(entries) => {
            encode_control(7, entries.len(), out);
            for (key, entry) in entries {
                encode_value(&MmdbValue::Str(*key), out);
                encode_value(entry, out);
            }
        }
        MmdbValue::U64(number) => {
            encode_control(9, 8, out);
            out.extend_from_slice(&number.to_be_bytes());
        }
        MmdbValue::Array(items) => {
            encode_control(11, items.len(), out);
            for item in items {
                encode_value(item, out);
            }
        }
    }
}

/// GeoIP2 City record with a country and a location.
#[allow(dead_code)]
pub fn city_record(latitude: f64, longitude: f64) -> MmdbValue {
    MmdbValue::Map(vec![
        (
            "country",
            MmdbValue::Map(vec![("iso_code", MmdbValue::Str("NL"))]),
        ),
        (
            "location",
            MmdbValue::Map(vec![
                ("accuracy_radius", MmdbValue::U16(20)),
                ("latitude", MmdbValue::Double(latitude)),
                ("longitude", MmdbValue::Double(longitude)),
            ]),
        ),
    ])
}

/// GeoIP2 City record that only knows the country.
#[allow(dead_code)]
pub fn country_only_record() -> MmdbValue {
    MmdbValue::Map(vec![(
        "country",
        MmdbValue::Map(vec![("iso_code", MmdbValue::Str("ZZ"))]),
    )])
}

/// IPv6 City database covering the documentation networks.
///
/// - 192.0.2.0/24: Amsterdam
/// - 198.51.100.0/24: Berlin
/// - 203.0.113.0/24: New York
/// - 100.64.0.0/10: record without a location
/// - 2001:db8::/32: Sydney
#[allow(dead_code)]
pub fn documentation_city_db() -> MmdbBuilder {
    MmdbBuilder::new(6)
        .insert("192.0.2.0/24", city_record(52.37, 4.90))
        .insert("198.51.100.0/24", city_record(52.52, 13.40))
        .insert("203.0.113.0/24", city_record(40.71, -74.00))
        .insert("100.64.0.0/10", country_only_record())
        .insert("2001:db8::/32", city_record(-33.87, 151.21))
}
