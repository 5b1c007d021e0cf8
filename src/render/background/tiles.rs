//! XYZ web-mercator tile background.
//!
//! Tiles are fetched once per run, then resampled (nearest neighbour) onto the
//! Plate Carrée canvas.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use log::{debug, info};
use reqwest::blocking::Client;

use super::BackgroundProvider;
use crate::config::{MERCATOR_MAX_LAT, TILE_CONNECT_TIMEOUT, TILE_USER_AGENT};
use crate::error_handling::{InitializationError, TileError};
use crate::render::projection::Projection;

/// Colour used outside the mercator latitude band.
const POLAR_FILL: Rgba<u8> = Rgba([200, 200, 200, 255]);

/// A provider of map tiles addressed by zoom/x/y.
pub trait TileSource {
    /// Fetches and decodes one tile.
    fn fetch(&self, z: u8, x: u32, y: u32) -> Result<RgbaImage, TileError>;
}

/// Tile source over HTTP(S), using a `{z}/{x}/{y}` URL template.
pub struct HttpTileSource {
    client: Client,
    template: String,
}

impl HttpTileSource {
    /// Builds the blocking client with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if the TLS backend
    /// cannot be initialized.
    pub fn new(template: impl Into<String>, timeout: Duration) -> Result<Self, InitializationError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(TILE_CONNECT_TIMEOUT.min(timeout))
            .user_agent(TILE_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            template: template.into(),
        })
    }

    /// Expands the template for one tile.
    pub fn tile_url(&self, z: u8, x: u32, y: u32) -> String {
        expand_template(&self.template, z, x, y)
    }
}

pub(crate) fn expand_template(template: &str, z: u8, x: u32, y: u32) -> String {
    template
        .replace("{z}", &z.to_string())
        .replace("{x}", &x.to_string())
        .replace("{y}", &y.to_string())
        .replace("{r}", "")
}

impl TileSource for HttpTileSource {
    fn fetch(&self, z: u8, x: u32, y: u32) -> Result<RgbaImage, TileError> {
        let url = self.tile_url(z, x, y);
        debug!("Fetching tile {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|source| TileError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TileError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(|source| TileError::Request {
            url: url.clone(),
            source,
        })?;

        image::load_from_memory(&bytes)
            .map(|decoded| decoded.to_rgba8())
            .map_err(|e| TileError::Decode {
                z,
                x,
                y,
                reason: e.to_string(),
            })
    }
}

/// Background drawn from an external tile provider.
pub struct TileBackground<S> {
    source: S,
    zoom: u8,
    attribution: Option<String>,
}

impl<S: TileSource> TileBackground<S> {
    /// Tiles from `source` at a fixed zoom level.
    pub fn new(source: S, zoom: u8, attribution: Option<String>) -> Self {
        Self {
            source,
            zoom,
            attribution,
        }
    }
}

/// Global web-mercator position in tile units at `zoom`.
pub(crate) fn mercator_tile_position(longitude: f64, latitude: f64, zoom: u8) -> (f64, f64) {
    let n = f64::from(1u32 << zoom);
    let lat_rad = latitude.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
    let x = (longitude + 180.0) / 360.0 * n;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;
    (x, y)
}

impl<S: TileSource> BackgroundProvider for TileBackground<S> {
    fn name(&self) -> &str {
        "tile provider"
    }

    fn attribution(&self) -> Option<&str> {
        self.attribution.as_deref()
    }

    fn paint(&self, canvas: &mut RgbaImage, projection: &Projection) -> Result<(), TileError> {
        let extent = *projection.extent();
        let zoom = self.zoom;
        let max_index = (1u32 << zoom) - 1;

        let (x_min, y_min) = mercator_tile_position(extent.west, extent.north, zoom);
        let (x_max, y_max) = mercator_tile_position(extent.east, extent.south, zoom);
        let tile_x = (x_min.floor() as u32).min(max_index)..=(x_max.ceil() as u32).saturating_sub(1).min(max_index);
        let tile_y = (y_min.floor() as u32).min(max_index)..=(y_max.ceil() as u32).saturating_sub(1).min(max_index);

        let tile_count = tile_x.clone().count() * tile_y.clone().count();
        info!("Fetching {} tiles at zoom {}", tile_count, zoom);

        let mut tiles: HashMap<(u32, u32), RgbaImage> = HashMap::with_capacity(tile_count);
        for x in tile_x {
            for y in tile_y.clone() {
                let tile = self.source.fetch(zoom, x, y)?;
                if tile.width() == 0 || tile.height() == 0 {
                    return Err(TileError::Decode {
                        z: zoom,
                        x,
                        y,
                        reason: "empty image".to_string(),
                    });
                }
                tiles.insert((x, y), tile);
            }
        }

        let height = projection.height().min(canvas.height());
        let width = projection.width().min(canvas.width());
        for py in 0..height {
            for px in 0..width {
                let (lon, lat) = projection.to_lon_lat(px, py);
                if lat.abs() > MERCATOR_MAX_LAT {
                    canvas.put_pixel(px, py, POLAR_FILL);
                    continue;
                }
                let (gx, gy) = mercator_tile_position(lon, lat, zoom);
                let tx = (gx.floor() as u32).min(max_index);
                let ty = (gy.floor() as u32).min(max_index);
                let pixel = tiles.get(&(tx, ty)).map_or(POLAR_FILL, |tile| {
                    let sx = (((gx - f64::from(tx)) * f64::from(tile.width())) as u32).min(tile.width() - 1);
                    let sy = (((gy - f64::from(ty)) * f64::from(tile.height())) as u32).min(tile.height() - 1);
                    let mut sample = *tile.get_pixel(sx, sy);
                    sample.0[3] = 255;
                    sample
                });
                canvas.put_pixel(px, py, pixel);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::projection::MapExtent;
    use std::cell::RefCell;

    /// Serves solid tiles whose red channel encodes the tile x index.
    struct SolidTiles {
        requests: RefCell<Vec<(u8, u32, u32)>>,
    }

    impl TileSource for SolidTiles {
        fn fetch(&self, z: u8, x: u32, y: u32) -> Result<RgbaImage, TileError> {
            self.requests.borrow_mut().push((z, x, y));
            Ok(RgbaImage::from_pixel(8, 8, Rgba([x as u8 * 10, y as u8, 0, 255])))
        }
    }

    struct Unreachable;

    impl TileSource for Unreachable {
        fn fetch(&self, z: u8, x: u32, y: u32) -> Result<RgbaImage, TileError> {
            Err(TileError::Status {
                url: expand_template("https://tiles.invalid/{z}/{x}/{y}.png", z, x, y),
                status: 503,
            })
        }
    }

    #[test]
    fn test_expand_template() {
        assert_eq!(
            expand_template("https://t.example/{z}/{x}/{y}{r}.png", 3, 5, 2),
            "https://t.example/3/5/2.png"
        );
    }

    #[test]
    fn test_mercator_tile_position() {
        let (x, y) = mercator_tile_position(0.0, 0.0, 1);
        assert!((x - 1.0).abs() < 1e-12);
        assert!((y - 1.0).abs() < 1e-12);

        let (x, y) = mercator_tile_position(-180.0, MERCATOR_MAX_LAT, 2);
        assert!(x.abs() < 1e-12);
        assert!(y.abs() < 1e-6);
    }

    #[test]
    fn test_paint_requests_covering_tiles() {
        let source = SolidTiles {
            requests: RefCell::new(Vec::new()),
        };
        let background = TileBackground::new(source, 1, Some("© Test".to_string()));
        let projection = Projection::new(MapExtent::default(), 140);
        let mut canvas = RgbaImage::new(projection.width(), projection.height());

        background.paint(&mut canvas, &projection).unwrap();

        let requests = background.source.requests.borrow();
        assert_eq!(requests.len(), 4);
        assert!(requests.iter().all(|(z, _, _)| *z == 1));
        assert_eq!(background.attribution(), Some("© Test"));

        // East of the antimeridian split comes from tile x = 1
        let (px, py) = projection.to_pixel(90.0, 45.0);
        assert_eq!(canvas.get_pixel(px as u32, py as u32).0[0], 10);
        let (px, py) = projection.to_pixel(-90.0, 45.0);
        assert_eq!(canvas.get_pixel(px as u32, py as u32).0[0], 0);
    }

    #[test]
    fn test_paint_propagates_fetch_failure() {
        let background = TileBackground::new(Unreachable, 2, None);
        let projection = Projection::new(MapExtent::default(), 140);
        let mut canvas = RgbaImage::new(projection.width(), projection.height());

        let err = background.paint(&mut canvas, &projection).unwrap_err();
        assert!(matches!(err, TileError::Status { status: 503, .. }));
    }

    #[test]
    fn test_http_source_builds() {
        let source =
            HttpTileSource::new("https://t.example/{z}/{x}/{y}.png", Duration::from_secs(1)).unwrap();
        assert_eq!(source.tile_url(0, 0, 0), "https://t.example/0/0/0.png");
    }
}
