//! Coordinate mapping between detector, image and depth-buffer spaces.
//!
//! Face detectors report rectangles normalized to `[0, 1]` with the origin at
//! the bottom-left corner and y growing upward. Image and depth buffers are
//! addressed in pixels with the origin at the top-left. Mapping a face into the
//! depth buffer is therefore a vertical flip into image pixels followed by an
//! independent X/Y rescale into depth pixels.
//!
//! Nothing here clamps: rectangles may extend past the buffer edges and are
//! clamped later by the sampler.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Pixel dimensions of an image or depth buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn ensure_non_zero(self, what: &str) -> Result<(), AnalysisError> {
        if self.width == 0 || self.height == 0 {
            return Err(AnalysisError::InvalidGeometry(format!(
                "{what} size is {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// A point, either normalized (detector convention) or in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Face bounding box in detector convention: normalized, bottom-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Rectangle in pixel space (image or depth), top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Flip into image pixels: `y' = (1 - y - h) * H`.
    pub fn to_image_space(&self, image: Size) -> Result<Rect, AnalysisError> {
        image.ensure_non_zero("image")?;
        let w = f64::from(image.width);
        let h = f64::from(image.height);
        Ok(Rect {
            x: self.x * w,
            y: (1.0 - self.y - self.height) * h,
            width: self.width * w,
            height: self.height * h,
        })
    }
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rescale from one pixel space to another with independent X/Y factors.
    pub fn scale(&self, from: Size, to: Size) -> Result<Rect, AnalysisError> {
        let (sx, sy) = scale_factors(from, to)?;
        Ok(Rect {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
        })
    }

    /// Inverse of [`NormalizedRect::to_image_space`].
    pub fn to_normalized(&self, image: Size) -> Result<NormalizedRect, AnalysisError> {
        image.ensure_non_zero("image")?;
        let w = f64::from(image.width);
        let h = f64::from(image.height);
        let height = self.height / h;
        Ok(NormalizedRect {
            x: self.x / w,
            y: 1.0 - self.y / h - height,
            width: self.width / w,
            height,
        })
    }
}

fn scale_factors(from: Size, to: Size) -> Result<(f64, f64), AnalysisError> {
    from.ensure_non_zero("source")?;
    to.ensure_non_zero("target")?;
    Ok((
        f64::from(to.width) / f64::from(from.width),
        f64::from(to.height) / f64::from(from.height),
    ))
}

/// Map a detector rectangle into depth-buffer pixels.
pub fn to_depth_space(
    rect: &NormalizedRect,
    image: Size,
    depth: Size,
) -> Result<Rect, AnalysisError> {
    depth.ensure_non_zero("depth")?;
    rect.to_image_space(image)?.scale(image, depth)
}

/// Map a depth-buffer rectangle back into detector convention.
pub fn from_depth_space(
    rect: &Rect,
    image: Size,
    depth: Size,
) -> Result<NormalizedRect, AnalysisError> {
    rect.scale(depth, image)?.to_normalized(image)
}

/// Map a normalized detector point into depth-buffer pixels.
///
/// Same flip as for rectangles, minus the height term: `y' = (1 - y) * H`.
pub fn point_to_depth_space(
    point: &Point,
    image: Size,
    depth: Size,
) -> Result<Point, AnalysisError> {
    image.ensure_non_zero("image")?;
    let (sx, sy) = scale_factors(image, depth)?;
    let ix = point.x * f64::from(image.width);
    let iy = (1.0 - point.y) * f64::from(image.height);
    Ok(Point {
        x: ix * sx,
        y: iy * sy,
    })
}

/// Map a depth-buffer point back into detector convention.
pub fn point_from_depth_space(
    point: &Point,
    image: Size,
    depth: Size,
) -> Result<Point, AnalysisError> {
    let (sx, sy) = scale_factors(depth, image)?;
    Ok(Point {
        x: point.x * sx / f64::from(image.width),
        y: 1.0 - point.y * sy / f64::from(image.height),
    })
}

/// A detected face: bounding box plus optional nose-ridge landmarks, all
/// normalized in detector convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub bounds: NormalizedRect,
    #[serde(default)]
    pub landmarks: Vec<Point>,
}

impl FaceRegion {
    pub fn new(bounds: NormalizedRect) -> Self {
        Self {
            bounds,
            landmarks: Vec::new(),
        }
    }

    pub fn with_landmarks(mut self, landmarks: Vec<Point>) -> Self {
        self.landmarks = landmarks;
        self
    }

    /// Centroid of the landmark points, if any were reported.
    pub fn landmark_centroid(&self) -> Option<Point> {
        if self.landmarks.is_empty() {
            return None;
        }
        let n = self.landmarks.len() as f64;
        let (sx, sy) = self
            .landmarks
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Point::new(sx / n, sy / n))
    }
}
