//! Relay and coordinate records shared by the pipeline stages.

use std::net::IpAddr;

use serde::Serialize;

/// A relay parsed from one `r` entry of a consensus document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayRecord {
    /// Relay nickname (not unique)
    pub nickname: String,
    /// Base64 identity fingerprint as it appears in the consensus.
    pub identity: String,
    /// IPv4 OR address from the `r` line
    pub address: IpAddr,
    /// OR port, when it parses
    pub or_port: Option<u16>,
    /// First IPv6 OR address from a following `a` line.
    pub ipv6_address: Option<IpAddr>,
}

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    /// Degrees north, in [-90, 90]
    pub latitude: f64,
    /// Degrees east, in [-180, 180]
    pub longitude: f64,
}

impl Coordinate {
    /// Returns `None` unless both values are finite and within
    /// [-90, 90] x [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        (lat_ok && lon_ok).then_some(Coordinate {
            latitude,
            longitude,
        })
    }

    /// Euclidean distance in the (longitude, latitude) plane, in degrees.
    pub fn planar_distance(&self, other: &Coordinate) -> f64 {
        (self.longitude - other.longitude).hypot(self.latitude - other.latitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_accepts_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_some());
        assert!(Coordinate::new(-90.0, -180.0).is_some());
        assert!(Coordinate::new(0.0, 0.0).is_some());
    }

    #[test]
    fn test_coordinate_rejects_out_of_range() {
        assert!(Coordinate::new(90.1, 0.0).is_none());
        assert!(Coordinate::new(0.0, -180.5).is_none());
        assert!(Coordinate::new(f64::NAN, 0.0).is_none());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_none());
    }

    #[test]
    fn test_planar_distance() {
        let a = Coordinate::new(0.0, 0.0).unwrap();
        let b = Coordinate::new(3.0, 4.0).unwrap();
        assert!((a.planar_distance(&b) - 5.0).abs() < 1e-12);
    }
}
