//! Colour ramps and normalization.

use image::Rgba;

/// The "hot" ramp: black -> red -> yellow -> white.
///
/// `t` is clamped to [0, 1]. Red saturates first, then green, then blue.
pub fn hot(t: f64) -> Rgba<u8> {
    const RED_END: f64 = 0.365_079;
    const GREEN_END: f64 = 0.746_032;

    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let r = (t / RED_END).min(1.0);
    let g = ((t - RED_END) / (GREEN_END - RED_END)).clamp(0.0, 1.0);
    let b = ((t - GREEN_END) / (1.0 - GREEN_END)).clamp(0.0, 1.0);
    Rgba([to_u8(r), to_u8(g), to_u8(b), 255])
}

fn to_u8(channel: f64) -> u8 {
    (channel * 255.0).round() as u8
}

/// Logarithmic normalization of counts onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogNorm {
    vmin: f64,
    vmax: f64,
}

impl LogNorm {
    /// Both bounds are raised to at least 1.
    pub fn new(vmin: usize, vmax: usize) -> Self {
        let vmin = vmin.max(1) as f64;
        let vmax = (vmax.max(1) as f64).max(vmin);
        Self { vmin, vmax }
    }

    /// The (vmin, vmax) range after clamping.
    pub fn bounds(&self) -> (f64, f64) {
        (self.vmin, self.vmax)
    }

    /// Position of `value` on the ramp. A degenerate range maps to the middle.
    pub fn normalize(&self, value: f64) -> f64 {
        if self.vmax <= self.vmin {
            return 0.5;
        }
        let value = value.max(self.vmin);
        ((value.ln() - self.vmin.ln()) / (self.vmax.ln() - self.vmin.ln())).clamp(0.0, 1.0)
    }

    /// Inverse of [`LogNorm::normalize`].
    pub fn value_at(&self, t: f64) -> f64 {
        (self.vmin.ln() + t.clamp(0.0, 1.0) * (self.vmax.ln() - self.vmin.ln())).exp()
    }
}

/// Alpha-blends `color` over `dest` with the given opacity.
pub fn blend(dest: &mut Rgba<u8>, color: Rgba<u8>, alpha: f64) {
    let alpha = alpha.clamp(0.0, 1.0);
    for channel in 0..3 {
        let over = f64::from(color.0[channel]);
        let under = f64::from(dest.0[channel]);
        dest.0[channel] = (over * alpha + under * (1.0 - alpha)).round() as u8;
    }
    dest.0[3] = 255;
}
