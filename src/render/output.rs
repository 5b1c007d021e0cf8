//! PNG encoding and writing.

use std::path::Path;

use image::RgbaImage;
use png::{BitDepth, ColorType, Encoder, PixelDimensions, Unit};

use crate::config::OUTPUT_DPI;
use crate::error_handling::MapError;

/// Physical resolution written to the `pHYs` chunk, in pixels per metre.
pub fn pixels_per_metre(dpi: u32) -> u32 {
    (f64::from(dpi) / 0.0254).round() as u32
}

/// Text metadata stored in the PNG `tEXt` chunks.
#[derive(Debug, Clone, Default)]
pub struct ImageMetadata {
    /// `Title` keyword
    pub title: String,
    /// `Description` keyword: counts and colour bar label
    pub description: String,
    /// Background attribution, written as the `Copyright` keyword
    pub copyright: Option<String>,
}

impl ImageMetadata {
    fn chunks(&self) -> Vec<(&'static str, String)> {
        let mut chunks = vec![
            ("Title", self.title.clone()),
            ("Software", concat!("tor_relay_map ", env!("CARGO_PKG_VERSION")).to_string()),
            ("Description", self.description.clone()),
        ];
        if let Some(copyright) = &self.copyright {
            chunks.push(("Copyright", copyright.clone()));
        }
        chunks
    }
}

/// Encodes the canvas into PNG bytes, tagged at [`OUTPUT_DPI`].
pub fn encode_png(canvas: &RgbaImage, metadata: &ImageMetadata) -> Result<Vec<u8>, png::EncodingError> {
    let mut bytes = Vec::new();
    {
        let mut encoder = Encoder::new(&mut bytes, canvas.width(), canvas.height());
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);
        let ppm = pixels_per_metre(OUTPUT_DPI);
        encoder.set_pixel_dims(Some(PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: Unit::Meter,
        }));
        for (keyword, text) in metadata.chunks() {
            // tEXt is Latin-1 only
            if text.chars().all(|c| u32::from(c) < 0x100) {
                encoder.add_text_chunk(keyword.to_string(), text)?;
            } else {
                encoder.add_itxt_chunk(keyword.to_string(), text)?;
            }
        }
        let mut writer = encoder.write_header()?;
        writer.write_image_data(canvas.as_raw())?;
        writer.finish()?;
    }
    Ok(bytes)
}

/// Encodes then writes the file in one step, so a failed encode leaves no
/// partial output behind.
///
/// # Errors
///
/// Returns [`MapError::Render`] if encoding or writing fails.
pub fn write_png(canvas: &RgbaImage, metadata: &ImageMetadata, path: &Path) -> Result<(), MapError> {
    let render_error = |reason: String| MapError::Render {
        path: path.to_path_buf(),
        reason,
    };
    let bytes = encode_png(canvas, metadata).map_err(|e| render_error(e.to_string()))?;
    std::fs::write(path, bytes).map_err(|e| render_error(e.to_string()))?;
    log::debug!("Wrote {}x{} PNG to {}", canvas.width(), canvas.height(), path.display());
    Ok(())
}
