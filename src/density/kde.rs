//! Gaussian kernel density surface over longitude/latitude.

use crate::config::{DENSITY_CELL_DEG, KERNEL_CUTOFF_SIGMAS};
use crate::models::Coordinate;

/// Regular grid of normalized kernel sums covering the whole globe.
///
/// Cell `(col, row)` is centred on
/// `(-180 + (col + 0.5) * cell_deg, -90 + (row + 0.5) * cell_deg)`.
#[derive(Debug, Clone)]
pub struct DensitySurface {
    cell_deg: f64,
    cols: usize,
    rows: usize,
    bandwidth_deg: f64,
    values: Vec<f64>,
}

impl DensitySurface {
    /// Builds the surface, or `None` when fewer than two coordinates are given.
    ///
    /// `bandwidth_deg` is the kernel standard deviation. Values are scaled so
    /// the highest cell is exactly 1.0.
    pub fn estimate(coordinates: &[Coordinate], bandwidth_deg: f64) -> Option<Self> {
        if coordinates.len() < 2 || !bandwidth_deg.is_finite() || bandwidth_deg <= 0.0 {
            return None;
        }

        let cell_deg = DENSITY_CELL_DEG;
        let cols = (360.0 / cell_deg).round() as usize;
        let rows = (180.0 / cell_deg).round() as usize;

        // Points are binned to cell centres, then the Gaussian is applied as
        // two 1-D passes over the grid.
        let mut counts = vec![0.0; cols * rows];
        for point in coordinates {
            let (col, row) = cell_of(point.longitude, point.latitude, cell_deg, cols, rows);
            counts[row * cols + col] += 1.0;
        }

        let reach = ((KERNEL_CUTOFF_SIGMAS * bandwidth_deg / cell_deg).ceil() as usize)
            .clamp(1, cols.max(rows));
        let kernel = gaussian_weights(reach, cell_deg, bandwidth_deg);

        let mut horizontal = vec![0.0; cols * rows];
        for row in 0..rows {
            for col in 0..cols {
                let count = counts[row * cols + col];
                if count == 0.0 {
                    continue;
                }
                let first = col.saturating_sub(reach);
                let last = (col + reach).min(cols - 1);
                for target in first..=last {
                    horizontal[row * cols + target] += count * kernel[target + reach - col];
                }
            }
        }

        let mut values = vec![0.0; cols * rows];
        for row in 0..rows {
            let source = &horizontal[row * cols..(row + 1) * cols];
            if source.iter().all(|v| *v == 0.0) {
                continue;
            }
            let first = row.saturating_sub(reach);
            let last = (row + reach).min(rows - 1);
            for target in first..=last {
                let weight = kernel[target + reach - row];
                let dest = &mut values[target * cols..(target + 1) * cols];
                for (value, contribution) in dest.iter_mut().zip(source) {
                    *value += weight * contribution;
                }
            }
        }

        let peak = values.iter().copied().fold(0.0_f64, f64::max);
        if peak <= 0.0 {
            return None;
        }
        for value in &mut values {
            *value /= peak;
        }

        Some(Self {
            cell_deg,
            cols,
            rows,
            bandwidth_deg,
            values,
        })
    }

    /// Kernel standard deviation in degrees.
    pub fn bandwidth_deg(&self) -> f64 {
        self.bandwidth_deg
    }

    /// Grid cell size in degrees.
    pub fn cell_deg(&self) -> f64 {
        self.cell_deg
    }

    /// Grid size as (columns, rows).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Bilinearly interpolated value in [0, 1] at a position.
    pub fn value_at(&self, longitude: f64, latitude: f64) -> f64 {
        // Continuous grid coordinates, with cell centres at integer + 0.5
        let gx = (longitude + 180.0) / self.cell_deg - 0.5;
        let gy = (latitude + 90.0) / self.cell_deg - 0.5;
        if !gx.is_finite() || !gy.is_finite() {
            return 0.0;
        }

        let max_col = (self.cols - 1) as f64;
        let max_row = (self.rows - 1) as f64;
        let gx = gx.clamp(0.0, max_col);
        let gy = gy.clamp(0.0, max_row);

        let c0 = gx.floor() as usize;
        let r0 = gy.floor() as usize;
        let c1 = (c0 + 1).min(self.cols - 1);
        let r1 = (r0 + 1).min(self.rows - 1);
        let fx = gx - c0 as f64;
        let fy = gy - r0 as f64;

        let v00 = self.cell(c0, r0);
        let v10 = self.cell(c1, r0);
        let v01 = self.cell(c0, r1);
        let v11 = self.cell(c1, r1);

        let top = v00 + (v10 - v00) * fx;
        let bottom = v01 + (v11 - v01) * fx;
        top + (bottom - top) * fy
    }

    /// Number of cells whose value is at least `threshold`.
    ///
    /// A wider kernel spreads mass over more cells, so this grows with the
    /// bandwidth for a fixed point set.
    pub fn cells_above(&self, threshold: f64) -> usize {
        self.values.iter().filter(|v| **v >= threshold).count()
    }

    fn cell(&self, col: usize, row: usize) -> f64 {
        self.values[row * self.cols + col]
    }
}

/// Grid cell containing a position. The 180° and 90° edges fall into the
/// last column and row.
fn cell_of(longitude: f64, latitude: f64, cell_deg: f64, cols: usize, rows: usize) -> (usize, usize) {
    let col = ((longitude + 180.0) / cell_deg).floor().clamp(0.0, (cols - 1) as f64);
    let row = ((latitude + 90.0) / cell_deg).floor().clamp(0.0, (rows - 1) as f64);
    (col as usize, row as usize)
}

/// Kernel weights for cell offsets `-reach..=reach`, indexed from 0.
fn gaussian_weights(reach: usize, cell_deg: f64, bandwidth_deg: f64) -> Vec<f64> {
    let inv_two_sigma_sq = 1.0 / (2.0 * bandwidth_deg * bandwidth_deg);
    (0..=2 * reach)
        .map(|idx| {
            let offset = (idx as f64 - reach as f64) * cell_deg;
            (-offset * offset * inv_two_sigma_sq).exp()
        })
        .collect()
}
