//! Debug heatmap of the face region.
//!
//! Provides a compact JPEG of the clamped face region for visual diagnostics:
//! - Three-band ramp (blue=far, green, yellow, red=close)
//! - Black for non-positive samples
//! - Base64 so it can ride inside the JSON verdict

use base64::{engine::general_purpose::STANDARD, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::depth::DepthBuffer;
use crate::error::AnalysisError;
use crate::sampler::PixelRect;

pub const DEFAULT_JPEG_QUALITY: u8 = 70;

const BAND_1: f32 = 0.33;
const BAND_2: f32 = 0.66;

/// Map `t` in `[0, 1]` (0 = far, 1 = close) onto the three-band ramp.
#[inline]
pub fn ramp(t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let (r, g, b) = if t < BAND_1 {
        // blue -> green
        let k = t / BAND_1;
        (0.0, k, 1.0 - k)
    } else if t < BAND_2 {
        // green -> yellow
        let k = (t - BAND_1) / (BAND_2 - BAND_1);
        (k, 1.0, 0.0)
    } else {
        // yellow -> red
        let k = (t - BAND_2) / (1.0 - BAND_2);
        (1.0, 1.0 - k, 0.0)
    };
    [
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    ]
}

/// Colorize the region into an RGB image, or `None` if it holds no positive
/// samples.
///
/// Uses its own `value > 0` filter and local min/max, independent of the
/// sampler's encoding-specific range check. Depth grows with distance and
/// disparity shrinks with it, so depth is inverted to keep red meaning close.
pub fn colorize(buffer: &DepthBuffer<'_>, region: &PixelRect) -> Option<RgbImage> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut any = false;
    for y in region.y..region.bottom() {
        for v in buffer.row_values(y, region.x, region.right()) {
            if v > 0.0 {
                min = min.min(v);
                max = max.max(v);
                any = true;
            }
        }
    }
    if !any {
        return None;
    }

    let span = max - min;
    let closer_is_larger = buffer.encoding().is_disparity();
    let mut img = RgbImage::new(region.width, region.height);
    for (row, y) in (region.y..region.bottom()).enumerate() {
        for (col, v) in buffer.row_values(y, region.x, region.right()).enumerate() {
            if !(v > 0.0) {
                continue;
            }
            let norm = if span > 0.0 { (v - min) / span } else { 0.5 };
            let t = if closer_is_larger { norm } else { 1.0 - norm };
            img.put_pixel(col as u32, row as u32, image::Rgb(ramp(t)));
        }
    }
    Some(img)
}

/// Render the region as a base64 JPEG.
pub fn render(
    buffer: &DepthBuffer<'_>,
    region: &PixelRect,
    quality: u8,
) -> Result<Option<String>, AnalysisError> {
    let Some(img) = colorize(buffer, region) else {
        return Ok(None);
    };

    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100));
    encoder
        .encode_image(&img)
        .map_err(|e| AnalysisError::HeatmapEncode(e.to_string()))?;

    tracing::debug!(
        width = region.width,
        height = region.height,
        bytes = jpeg.len(),
        "heatmap encoded"
    );
    Ok(Some(STANDARD.encode(jpeg)))
}
