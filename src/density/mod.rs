//! Density estimation for the map overlay.
//!
//! A single density parameter (degrees) drives both outputs:
//! - the standard deviation of the Gaussian kernel surface
//! - the DBSCAN `eps` used to merge nearby relays into markers
//!
//! Raising it widens the surface and merges more relays; it is a smoothing
//! knob, not a cluster count.

mod cluster;
mod kde;

pub use cluster::{cluster_coordinates, Cluster};
pub use kde::DensitySurface;

use log::debug;

use crate::config::CLUSTER_MIN_SAMPLES;
use crate::models::Coordinate;

/// Everything the renderer needs to draw the overlay.
#[derive(Debug, Clone, Default)]
pub struct DensityModel {
    /// Kernel surface; absent for fewer than two coordinates
    pub surface: Option<DensitySurface>,
    /// One entry per marker; counts sum to the number of coordinates
    pub clusters: Vec<Cluster>,
}

impl DensityModel {
    /// Smallest and largest cluster sizes, for colour normalization.
    pub fn count_range(&self) -> Option<(usize, usize)> {
        let min = self.clusters.iter().map(|c| c.count).min()?;
        let max = self.clusters.iter().map(|c| c.count).max()?;
        Some((min, max))
    }

    /// Nothing to draw over the background.
    pub fn is_empty(&self) -> bool {
        self.surface.is_none() && self.clusters.is_empty()
    }
}

/// Builds the surface and the clusters for a coordinate set.
pub fn estimate(coordinates: &[Coordinate], density: f64) -> DensityModel {
    let surface = DensitySurface::estimate(coordinates, density);
    let clusters = cluster_coordinates(coordinates, density, CLUSTER_MIN_SAMPLES);
    debug!(
        "Density estimate: {} points -> {} clusters, surface {}",
        coordinates.len(),
        clusters.len(),
        if surface.is_some() { "present" } else { "absent" }
    );
    DensityModel { surface, clusters }
}
