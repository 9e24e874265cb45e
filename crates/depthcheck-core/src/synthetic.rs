//! Synthetic captures for diagnostics and tests.
//!
//! Two scenes, both with a single centered face covering the middle 75% of
//! the frame:
//! - flat plane: constant depth, the signature of a photo or screen
//! - nose bump: a conical relief peaking at the face center plus a
//!   checkerboard of sensor-like noise

use crate::depth::{encode_samples, DepthEncoding, DepthMap};
use crate::geometry::{FaceRegion, NormalizedRect, Point, Size};

/// Photo resolution relative to the depth map.
const IMAGE_SCALE: u32 = 4;
const FACE_MARGIN: f64 = 0.125;

/// Smallest and largest depth map edge a scene is generated at; requested
/// sizes are clamped into this range.
pub const MIN_SIZE: u32 = 8;
pub const MAX_SIZE: u32 = 4096;

#[derive(Debug, Clone)]
pub struct SyntheticCapture {
    pub image_size: Size,
    pub face: FaceRegion,
    pub depth: DepthMap,
}

/// Per-encoding scene parameters: background, relief at the nose tip, noise
/// amplitude.
fn scene_params(encoding: DepthEncoding) -> (f32, f32, f32) {
    if encoding.is_disparity() {
        // 1/m: nearer is larger
        (1.6, 1.0, 0.01)
    } else {
        // m: nearer is smaller
        (0.6, -0.25, 0.005)
    }
}

fn capture(size: u32, encoding: DepthEncoding, values: &[f32]) -> SyntheticCapture {
    let face = FaceRegion::new(NormalizedRect::new(
        FACE_MARGIN,
        FACE_MARGIN,
        1.0 - 2.0 * FACE_MARGIN,
        1.0 - 2.0 * FACE_MARGIN,
    ));
    SyntheticCapture {
        image_size: Size::new(size * IMAGE_SCALE, size * IMAGE_SCALE),
        face,
        depth: DepthMap {
            data: encode_samples(values, encoding),
            width: size,
            height: size,
            bytes_per_row: size as usize * encoding.bytes_per_sample(),
            format: encoding.as_str().to_string(),
        },
    }
}

/// A constant-valued frame.
pub fn flat_plane(size: u32, encoding: DepthEncoding) -> SyntheticCapture {
    let size = size.clamp(MIN_SIZE, MAX_SIZE);
    let (background, _, _) = scene_params(encoding);
    let values = vec![background; size as usize * size as usize];
    capture(size, encoding, &values)
}

/// A frame with a cone of relief centered on the face.
pub fn nose_bump(size: u32, encoding: DepthEncoding) -> SyntheticCapture {
    let size = size.clamp(MIN_SIZE, MAX_SIZE);
    let (background, relief, noise) = scene_params(encoding);
    let center = f64::from(size) / 2.0;
    let radius = f64::from(size) * (0.5 - FACE_MARGIN);

    let mut values = Vec::with_capacity(size as usize * size as usize);
    for y in 0..size {
        for x in 0..size {
            let dx = f64::from(x) - center;
            let dy = f64::from(y) - center;
            let cone = (1.0 - (dx * dx + dy * dy).sqrt() / radius).max(0.0) as f32;
            let jitter = if (x + y) % 2 == 0 { noise } else { -noise };
            values.push(background + relief * cone + jitter);
        }
    }

    let mut scene = capture(size, encoding, &values);
    // Nose ridge from bridge to tip, straddling the center.
    scene.face = scene.face.with_landmarks(vec![
        Point::new(0.5, 0.56),
        Point::new(0.5, 0.5),
        Point::new(0.5, 0.44),
    ]);
    scene
}
