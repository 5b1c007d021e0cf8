//! Configuration constants.
//!
//! This module defines the defaults and limits used throughout the pipeline,
//! including the map extent, image sizing and tile-fetching parameters.

use std::time::Duration;

/// Default density (bandwidth) parameter, in degrees.
pub const DEFAULT_DENSITY: f64 = 1.5;
/// Smallest accepted density. Below this every relay is its own cluster anyway.
pub const MIN_DENSITY: f64 = 1e-3;
/// Largest accepted density: half the globe.
pub const MAX_DENSITY: f64 = 180.0;

/// Default output image path.
pub const DEFAULT_OUTPUT: &str = "map.png";

/// Default output image width in pixels (10 inches at 300 dpi).
pub const DEFAULT_WIDTH: u32 = 3000;
/// Smallest accepted output width.
pub const MIN_WIDTH: u32 = 320;
/// Largest accepted output width.
pub const MAX_WIDTH: u32 = 12_000;

/// Map extent in degrees: west, east, south, north.
pub const MAP_EXTENT: (f64, f64, f64, f64) = (-170.0, 180.0, -60.0, 85.0);

/// Resolution recorded in the output PNG, matching the default width.
pub const OUTPUT_DPI: u32 = 300;

/// Marker sizes are specified in typographic points on a figure this many
/// inches wide, then scaled to the requested pixel width.
pub const FIGURE_WIDTH_INCHES: f64 = 10.0;

/// Height of the colour-bar strip below the map, as a fraction of the width.
pub const LEGEND_HEIGHT_RATIO: f64 = 0.05;

/// Cell size of the density grid in degrees.
pub const DENSITY_CELL_DEG: f64 = 0.5;

/// Gaussian kernels are truncated at this many standard deviations.
pub const KERNEL_CUTOFF_SIGMAS: f64 = 3.0;

/// Minimum number of points per DBSCAN neighbourhood.
pub const CLUSTER_MIN_SAMPLES: usize = 1;

/// Default tile zoom level for the optional tile background.
pub const DEFAULT_TILE_ZOOM: u8 = 3;
/// Highest tile zoom accepted (4096 tiles).
pub const MAX_TILE_ZOOM: u8 = 6;

/// Default per-tile request timeout in seconds.
pub const DEFAULT_TILE_TIMEOUT_SECS: u64 = 10;

/// Connect timeout for the tile HTTP client.
pub const TILE_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// User-Agent sent to tile providers.
pub const TILE_USER_AGENT: &str = concat!("tor_relay_map/", env!("CARGO_PKG_VERSION"));

/// Web-mercator latitude limit in degrees.
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_78;
