//! Map backgrounds drawn beneath the relay layers.
//!
//! Two providers exist: the built-in vector basemap, which needs no network,
//! and an XYZ tile provider configured with `--tile-url`.

mod outlines;
mod stock;
mod tiles;

use std::time::Duration;

use image::RgbaImage;
use log::info;

use crate::config::Config;
use crate::error_handling::{InitializationError, TileError};
use crate::render::projection::Projection;

pub use stock::StockBasemap;
pub use tiles::{HttpTileSource, TileBackground, TileSource};

/// Something that can fill the map area of the canvas.
pub trait BackgroundProvider {
    /// Short label used in logs and the run report.
    fn name(&self) -> &str;

    /// Attribution text required by the provider, if any.
    fn attribution(&self) -> Option<&str> {
        None
    }

    /// Paints the `projection.width() x projection.height()` area starting at
    /// the canvas origin.
    fn paint(&self, canvas: &mut RgbaImage, projection: &Projection) -> Result<(), TileError>;
}

/// Chooses the background from the configuration.
///
/// # Errors
///
/// Returns an `InitializationError` if the tile HTTP client cannot be built.
pub fn select_background(config: &Config) -> Result<Box<dyn BackgroundProvider>, InitializationError> {
    match &config.tile_url {
        Some(template) => {
            info!("Using tile background {} at zoom {}", template, config.tile_zoom);
            let source =
                HttpTileSource::new(template.clone(), Duration::from_secs(config.tile_timeout_seconds))?;
            Ok(Box::new(TileBackground::new(
                source,
                config.tile_zoom,
                config.tile_attribution.clone(),
            )))
        }
        None => Ok(Box::new(StockBasemap)),
    }
}
