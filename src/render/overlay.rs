//! Relay layers: density heat, cluster markers and the colour bar.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut,
};
use imageproc::rect::Rect;

use super::colormap::{blend, hot, LogNorm};
use super::projection::Projection;
use crate::config::FIGURE_WIDTH_INCHES;
use crate::density::{Cluster, DensitySurface};

/// Surface values below this are left transparent.
const HEAT_THRESHOLD: f64 = 0.02;
/// Opacity of the heat layer at the surface peak.
const HEAT_MAX_ALPHA: f64 = 0.55;
/// Smallest marker size in points.
const MIN_MARKER_POINTS: f64 = 2.0;

const LEGEND_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const LEGEND_INK: Rgba<u8> = Rgba([40, 40, 40, 255]);
const MARKER_EDGE: Rgba<u8> = Rgba([60, 20, 0, 255]);

/// Marker size in points for a cluster of `count` relays.
pub fn marker_points(count: usize) -> f64 {
    (4.0 * (count.max(1) as f64).log10()).max(MIN_MARKER_POINTS)
}

/// Marker radius in pixels at the given canvas width.
pub fn marker_radius_px(count: usize, canvas_width: u32) -> f64 {
    let pixels_per_point = f64::from(canvas_width) / (FIGURE_WIDTH_INCHES * 72.0);
    marker_points(count) / 2.0 * pixels_per_point
}

/// Tints the map area with the normalized kernel surface.
pub fn paint_heat(canvas: &mut RgbaImage, projection: &Projection, surface: &DensitySurface) {
    let height = projection.height().min(canvas.height());
    let width = projection.width().min(canvas.width());
    for y in 0..height {
        for x in 0..width {
            let (lon, lat) = projection.to_lon_lat(x, y);
            let value = surface.value_at(lon, lat);
            if value < HEAT_THRESHOLD {
                continue;
            }
            let color = hot(0.35 + 0.65 * value);
            blend(canvas.get_pixel_mut(x, y), color, HEAT_MAX_ALPHA * value);
        }
    }
}

/// Draws one disc per cluster, smallest counts last so they stay visible.
pub fn paint_clusters(canvas: &mut RgbaImage, projection: &Projection, clusters: &[Cluster], norm: &LogNorm) {
    let mut ordered: Vec<&Cluster> = clusters.iter().collect();
    ordered.sort_by(|a, b| b.count.cmp(&a.count));

    for cluster in ordered {
        let (x, y) = projection.coordinate_to_pixel(&cluster.centroid);
        if !x.is_finite() || !y.is_finite() {
            continue;
        }
        let center = (x.round() as i32, y.round() as i32);
        let radius = marker_radius_px(cluster.count, projection.width()).round().max(1.0) as i32;
        let color = hot(norm.normalize(cluster.count as f64));
        draw_filled_circle_mut(canvas, center, radius, color);
        if radius >= 3 {
            draw_hollow_circle_mut(canvas, center, radius, MARKER_EDGE);
        }
    }
}

/// Draws the horizontal colour bar into the strip below the map.
///
/// Tick marks sit at powers of ten inside the normalization range.
pub fn paint_colorbar(canvas: &mut RgbaImage, map_height: u32, norm: &LogNorm) {
    let width = canvas.width();
    let strip = canvas.height().saturating_sub(map_height);
    if strip < 4 || width < 20 {
        return;
    }

    draw_filled_rect_mut(
        canvas,
        Rect::at(0, map_height as i32).of_size(width, strip),
        LEGEND_BACKGROUND,
    );

    let margin = width / 10;
    let bar_width = width - 2 * margin;
    let bar_top = map_height + strip / 4;
    let bar_height = (strip / 2).max(1);

    for dx in 0..bar_width {
        let t = f64::from(dx) / f64::from((bar_width - 1).max(1));
        let color = hot(t);
        for dy in 0..bar_height {
            canvas.put_pixel(margin + dx, bar_top + dy, color);
        }
    }

    let frame = Rect::at(margin as i32 - 1, bar_top as i32 - 1).of_size(bar_width + 2, bar_height + 2);
    draw_hollow_rect_mut(canvas, frame, LEGEND_INK);

    let tick_bottom = (bar_top + bar_height + strip / 8).min(canvas.height() - 1);
    for t in tick_positions(norm) {
        let x = margin + (t * f64::from(bar_width - 1)).round() as u32;
        for y in bar_top + bar_height..=tick_bottom {
            canvas.put_pixel(x, y, LEGEND_INK);
        }
    }
}

/// Normalized positions of the decade ticks (1, 10, 100, ...) on the bar.
pub fn tick_positions(norm: &LogNorm) -> Vec<f64> {
    let (vmin, vmax) = norm.bounds();
    if vmax <= vmin {
        return vec![0.5];
    }
    let first = vmin.log10().ceil() as i32;
    let last = vmax.log10().floor() as i32;
    (first..=last)
        .map(|exp| norm.normalize(10f64.powi(exp)))
        .collect()
}
