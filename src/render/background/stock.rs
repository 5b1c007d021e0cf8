//! Built-in vector basemap.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

use super::outlines::{Ring, LAND_OUTLINES};
use super::BackgroundProvider;
use crate::error_handling::TileError;
use crate::render::projection::Projection;

const OCEAN: Rgba<u8> = Rgba([168, 196, 222, 255]);
const LAND: Rgba<u8> = Rgba([226, 221, 204, 255]);
const COAST: Rgba<u8> = Rgba([96, 96, 96, 255]);
const GRATICULE: Rgba<u8> = Rgba([190, 210, 230, 255]);

/// Graticule spacing in degrees.
const GRATICULE_STEP: i32 = 30;

/// Offline basemap: ocean fill, land polygons, coastlines and a graticule.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockBasemap;

impl BackgroundProvider for StockBasemap {
    fn name(&self) -> &str {
        "built-in basemap"
    }

    fn paint(&self, canvas: &mut RgbaImage, projection: &Projection) -> Result<(), TileError> {
        paint_ocean(canvas, projection);
        paint_graticule(canvas, projection);
        for (_, ring) in LAND_OUTLINES {
            paint_land(canvas, projection, ring);
        }
        for (_, ring) in LAND_OUTLINES {
            stroke_coast(canvas, projection, ring);
        }
        Ok(())
    }
}

fn paint_ocean(canvas: &mut RgbaImage, projection: &Projection) {
    let height = projection.height().min(canvas.height());
    for y in 0..height {
        for x in 0..projection.width().min(canvas.width()) {
            canvas.put_pixel(x, y, OCEAN);
        }
    }
}

fn paint_graticule(canvas: &mut RgbaImage, projection: &Projection) {
    let extent = *projection.extent();
    let (top, bottom) = (extent.north, extent.south);
    for lon in (-180..=180).step_by(GRATICULE_STEP as usize) {
        let lon = f64::from(lon);
        if !(extent.west..=extent.east).contains(&lon) {
            continue;
        }
        let start = projection.to_pixel(lon, top);
        let end = projection.to_pixel(lon, bottom);
        draw_line_segment_mut(canvas, start, end, GRATICULE);
    }
    for lat in (-90..=90).step_by(GRATICULE_STEP as usize) {
        let lat = f64::from(lat);
        if !(bottom..=top).contains(&lat) {
            continue;
        }
        let start = projection.to_pixel(extent.west, lat);
        let end = projection.to_pixel(extent.east, lat);
        draw_line_segment_mut(canvas, start, end, GRATICULE);
    }
}

fn ring_to_pixels(projection: &Projection, ring: Ring) -> Vec<Point<i32>> {
    let mut points: Vec<Point<i32>> = Vec::with_capacity(ring.len());
    for &(lon, lat) in ring {
        let (x, y) = projection.to_pixel(lon, lat);
        let point = Point::new(x.round() as i32, y.round() as i32);
        // Consecutive duplicates appear on small canvases
        if points.last() != Some(&point) {
            points.push(point);
        }
    }
    // The polygon filler rejects closed rings
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

fn paint_land(canvas: &mut RgbaImage, projection: &Projection, ring: Ring) {
    let points = ring_to_pixels(projection, ring);
    if points.len() >= 3 {
        draw_polygon_mut(canvas, &points, LAND);
    }
}

fn stroke_coast(canvas: &mut RgbaImage, projection: &Projection, ring: Ring) {
    let n = ring.len();
    for i in 0..n {
        let (lon0, lat0) = ring[i];
        let (lon1, lat1) = ring[(i + 1) % n];
        let start = projection.to_pixel(lon0, lat0);
        let end = projection.to_pixel(lon1, lat1);
        draw_line_segment_mut(canvas, start, end, COAST);
        // Second pass one pixel down-right for a 2px stroke on large canvases
        if projection.width() >= 1500 {
            draw_line_segment_mut(canvas, (start.0 + 1.0, start.1), (end.0 + 1.0, end.1), COAST);
        }
    }
}
