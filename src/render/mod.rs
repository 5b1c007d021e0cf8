//! Map rendering.
//!
//! The canvas is a Plate Carrée view of the configured extent with a colour
//! bar strip below it. Layers are drawn bottom-up:
//! 1. background (tiles or the built-in basemap)
//! 2. density heat
//! 3. cluster markers
//! 4. colour bar
//!
//! The finished image is written as PNG with its labels in text chunks.

pub mod background;
pub mod colormap;
mod output;
mod overlay;
pub mod projection;

use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use log::{info, warn};

use crate::config::{TileFailurePolicy, LEGEND_HEIGHT_RATIO};
use crate::density::DensityModel;
use crate::error_handling::MapError;
use background::{BackgroundProvider, StockBasemap};
use colormap::LogNorm;
use projection::{MapExtent, Projection};

pub use output::{encode_png, ImageMetadata};
pub use overlay::{marker_points, marker_radius_px};

/// Label of the colour bar.
pub const COLORBAR_LABEL: &str = "Number of relays";

/// Image-level settings for one render.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Map width in pixels; the height follows from the extent
    pub width: u32,
    /// Geographic window drawn
    pub extent: MapExtent,
    /// PNG `Title` text
    pub title: String,
    /// What to do when the background cannot be painted
    pub tile_failure: TileFailurePolicy,
}

impl RenderSettings {
    /// Settings for the default extent and title.
    pub fn new(width: u32, tile_failure: TileFailurePolicy) -> Self {
        Self {
            width,
            extent: MapExtent::default(),
            title: "Tor relay density".to_string(),
            tile_failure,
        }
    }
}

/// What was drawn and where it went.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    /// Where the PNG was written
    pub output_path: PathBuf,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels, colour bar strip included
    pub height: u32,
    /// Name of the background that was actually painted
    pub background: String,
    /// The tile background failed and the built-in basemap was used instead
    pub fell_back: bool,
    /// Cluster markers drawn
    pub markers: usize,
}

/// Renders the density model over `background` and writes the PNG.
///
/// # Errors
///
/// [`MapError::Tile`] if the background fails under the `fail` policy, and
/// [`MapError::Render`] if the image cannot be encoded or written. No output
/// file exists after an error.
pub fn render_map(
    background: &dyn BackgroundProvider,
    model: &DensityModel,
    settings: &RenderSettings,
    output: &Path,
) -> Result<RenderOutcome, MapError> {
    let projection = Projection::new(settings.extent, settings.width);
    let legend_height = (f64::from(settings.width) * LEGEND_HEIGHT_RATIO).round() as u32;
    let mut canvas = RgbaImage::from_pixel(
        projection.width(),
        projection.height() + legend_height,
        Rgba([255, 255, 255, 255]),
    );

    let mut background_name = background.name().to_string();
    let mut attribution = background.attribution().map(str::to_string);
    let mut fell_back = false;

    if let Err(e) = background.paint(&mut canvas, &projection) {
        match settings.tile_failure {
            TileFailurePolicy::Fail => return Err(MapError::Tile(e)),
            TileFailurePolicy::Fallback => {
                warn!("{}; drawing the built-in basemap instead", e);
                let stock = StockBasemap;
                stock.paint(&mut canvas, &projection)?;
                background_name = stock.name().to_string();
                attribution = None;
                fell_back = true;
            }
        }
    }

    if let Some(surface) = &model.surface {
        overlay::paint_heat(&mut canvas, &projection, surface);
    }

    let (vmin, vmax) = model.count_range().unwrap_or((1, 1));
    let norm = LogNorm::new(vmin, vmax);
    overlay::paint_clusters(&mut canvas, &projection, &model.clusters, &norm);
    overlay::paint_colorbar(&mut canvas, projection.height(), &norm);

    let (low, high) = norm.bounds();
    let relays: usize = model.clusters.iter().map(|c| c.count).sum();
    let metadata = ImageMetadata {
        title: settings.title.clone(),
        description: format!(
            "{} relays in {} clusters. Colour bar: {} (log scale, {} to {})",
            relays,
            model.clusters.len(),
            COLORBAR_LABEL,
            low,
            high
        ),
        copyright: attribution,
    };

    info!("Saving map as {}", output.display());
    output::write_png(&canvas, &metadata, output)?;

    Ok(RenderOutcome {
        output_path: output.to_path_buf(),
        width: canvas.width(),
        height: canvas.height(),
        background: background_name,
        fell_back,
        markers: model.clusters.len(),
    })
}
