//! Plate Carrée projection between degrees and canvas pixels.

use crate::config::MAP_EXTENT;
use crate::models::Coordinate;

/// Geographic window drawn on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapExtent {
    /// Western edge, degrees east
    pub west: f64,
    /// Eastern edge, degrees east
    pub east: f64,
    /// Southern edge, degrees north
    pub south: f64,
    /// Northern edge, degrees north
    pub north: f64,
}

impl Default for MapExtent {
    fn default() -> Self {
        let (west, east, south, north) = MAP_EXTENT;
        Self {
            west,
            east,
            south,
            north,
        }
    }
}

impl MapExtent {
    /// Width in degrees.
    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    /// Height in degrees.
    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    /// Whether a position lies inside the window, edges included.
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        (self.west..=self.east).contains(&longitude) && (self.south..=self.north).contains(&latitude)
    }
}

/// Equirectangular mapping of an extent onto a `width x height` pixel area.
///
/// One degree has the same pixel length on both axes.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    extent: MapExtent,
    width: u32,
    height: u32,
}

impl Projection {
    /// Height follows from the width and the extent's aspect ratio.
    pub fn new(extent: MapExtent, width: u32) -> Self {
        let height = (f64::from(width) * extent.lat_span() / extent.lon_span()).round() as u32;
        Self {
            extent,
            width,
            height: height.max(1),
        }
    }

    /// The projected window.
    pub fn extent(&self) -> &MapExtent {
        &self.extent
    }

    /// Map width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Map height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Scale, identical on both axes.
    pub fn pixels_per_degree(&self) -> f64 {
        f64::from(self.width) / self.extent.lon_span()
    }

    /// Pixel position of a longitude/latitude pair (may fall off-canvas).
    pub fn to_pixel(&self, longitude: f64, latitude: f64) -> (f32, f32) {
        let scale = self.pixels_per_degree();
        let x = (longitude - self.extent.west) * scale;
        let y = (self.extent.north - latitude) * scale;
        (x as f32, y as f32)
    }

    /// [`Projection::to_pixel`] for a [`Coordinate`].
    pub fn coordinate_to_pixel(&self, coordinate: &Coordinate) -> (f32, f32) {
        self.to_pixel(coordinate.longitude, coordinate.latitude)
    }

    /// Longitude/latitude at the centre of pixel `(x, y)`.
    pub fn to_lon_lat(&self, x: u32, y: u32) -> (f64, f64) {
        let scale = self.pixels_per_degree();
        let longitude = self.extent.west + (f64::from(x) + 0.5) / scale;
        let latitude = self.extent.north - (f64::from(y) + 0.5) / scale;
        (longitude, latitude)
    }
}
