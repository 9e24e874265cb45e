//! Face-region sampling: clamp the mapped face rectangle to the depth buffer,
//! decode every pixel, drop implausible values, and tag the rest as
//! nose-proximal ("center") or peripheral ("edge").

use crate::depth::DepthBuffer;
use crate::error::AnalysisError;
use crate::geometry::{Point, Rect, Size};

/// Fraction of the face width/height used as the half-extent of the center
/// box around a landmark.
const LANDMARK_HALF_EXTENT: f64 = 0.2;
/// Fraction trimmed from each side of the face rect when no landmark exists.
const GEOMETRIC_TRIM: f64 = 0.2;

/// Integer pixel rectangle inside a buffer, `[x, x + width) x [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Clamp a floating-point rectangle to `[0, bounds.width) x [0, bounds.height)`.
    pub fn clamp_from(rect: &Rect, bounds: Size) -> Result<Self, AnalysisError> {
        if ![rect.x, rect.y, rect.width, rect.height]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(AnalysisError::InvalidGeometry(format!(
                "non-finite face rectangle {rect:?}"
            )));
        }

        let empty = AnalysisError::EmptyRegion {
            width: bounds.width,
            height: bounds.height,
        };
        let x0 = rect.x.floor().max(0.0);
        let y0 = rect.y.floor().max(0.0);
        let x1 = (rect.x + rect.width).floor().min(f64::from(bounds.width));
        let y1 = (rect.y + rect.height).floor().min(f64::from(bounds.height));
        if x1 <= x0 || y1 <= y0 {
            return Err(empty);
        }

        Ok(Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Half-open box `[x0, x1) x [y0, y1)` in depth pixels marking the
/// nose-proximal part of the face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterRegion {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl CenterRegion {
    /// Box around a mapped landmark, clamped to the face rect. Without a
    /// landmark, the inner 60% x 60% of the face rect.
    pub fn for_face(face: &PixelRect, landmark: Option<Point>) -> Self {
        let fx0 = f64::from(face.x);
        let fy0 = f64::from(face.y);
        let fx1 = f64::from(face.right());
        let fy1 = f64::from(face.bottom());
        let fw = f64::from(face.width);
        let fh = f64::from(face.height);

        match landmark {
            Some(p) => {
                let hw = LANDMARK_HALF_EXTENT * fw;
                let hh = LANDMARK_HALF_EXTENT * fh;
                Self {
                    x0: (p.x - hw).clamp(fx0, fx1),
                    y0: (p.y - hh).clamp(fy0, fy1),
                    x1: (p.x + hw).clamp(fx0, fx1),
                    y1: (p.y + hh).clamp(fy0, fy1),
                }
            }
            None => Self {
                x0: fx0 + GEOMETRIC_TRIM * fw,
                y0: fy0 + GEOMETRIC_TRIM * fh,
                x1: fx1 - GEOMETRIC_TRIM * fw,
                y1: fy1 - GEOMETRIC_TRIM * fh,
            },
        }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        let (x, y) = (f64::from(x), f64::from(y));
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub value: f32,
    pub is_center: bool,
}

/// Valid samples from one face-region scan, in row-major scan order.
#[derive(Debug, Clone)]
pub struct SampleSet {
    pub samples: Vec<Sample>,
    /// Pixel count of the clamped face rect, decodable or not.
    pub total_scanned: usize,
    pub region: PixelRect,
}

impl SampleSet {
    pub fn valid_count(&self) -> usize {
        self.samples.len()
    }

    pub fn center_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_center).count()
    }
}

/// Scan the face region of `buffer`.
///
/// `face` and `landmark` are already in depth-buffer pixels.
pub fn sample(
    buffer: &DepthBuffer<'_>,
    face: &Rect,
    landmark: Option<Point>,
) -> Result<SampleSet, AnalysisError> {
    let region = PixelRect::clamp_from(face, buffer.size())?;
    let center = CenterRegion::for_face(&region, landmark);
    let encoding = buffer.encoding();

    let mut samples = Vec::with_capacity(region.area());
    for y in region.y..region.bottom() {
        for (x, value) in (region.x..).zip(buffer.row_values(y, region.x, region.right())) {
            if !encoding.is_valid(value) {
                continue;
            }
            samples.push(Sample {
                value,
                is_center: center.contains(x, y),
            });
        }
    }

    let set = SampleSet {
        samples,
        total_scanned: region.area(),
        region,
    };
    tracing::debug!(
        x = region.x,
        y = region.y,
        width = region.width,
        height = region.height,
        valid = set.valid_count(),
        center = set.center_count(),
        encoding = %encoding,
        "face region sampled"
    );
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::{encode_samples, DepthEncoding};

    fn buffer_of(values: &[f32], width: u32, encoding: DepthEncoding) -> Vec<u8> {
        assert_eq!(values.len() % width as usize, 0);
        encode_samples(values, encoding)
    }

    #[test]
    fn clamps_to_buffer() {
        let r = PixelRect::clamp_from(&Rect::new(-5.5, 2.0, 20.0, 100.0), Size::new(10, 8)).unwrap();
        assert_eq!(
            r,
            PixelRect {
                x: 0,
                y: 2,
                width: 10,
                height: 6
            }
        );
    }

    #[test]
    fn empty_region_outside_buffer() {
        let err = PixelRect::clamp_from(&Rect::new(12.0, 0.0, 5.0, 5.0), Size::new(10, 10))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyRegion { .. }));

        let err =
            PixelRect::clamp_from(&Rect::new(2.0, 2.0, 0.5, 5.0), Size::new(10, 10)).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyRegion { .. }));
    }

    #[test]
    fn geometric_center_is_inner_sixty_percent() {
        let face = PixelRect {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        };
        let c = CenterRegion::for_face(&face, None);
        assert!(c.contains(2, 2));
        assert!(c.contains(7, 7));
        assert!(!c.contains(1, 5));
        assert!(!c.contains(8, 5));
    }

    #[test]
    fn landmark_center_is_clamped_to_face() {
        let face = PixelRect {
            x: 10,
            y: 10,
            width: 20,
            height: 20,
        };
        let c = CenterRegion::for_face(&face, Some(Point::new(12.0, 28.0)));
        assert_eq!(c.x0, 10.0);
        assert_eq!(c.x1, 16.0);
        assert_eq!(c.y0, 24.0);
        assert_eq!(c.y1, 30.0);
    }

    #[test]
    fn filters_invalid_and_counts_total() {
        // 4x2 disparity: zeros, negatives and >= 5.0 are dropped.
        let values = [1.0, 0.0, 2.0, 6.0, -1.0, 3.0, 4.5, 5.0];
        let data = buffer_of(&values, 4, DepthEncoding::DisparityFloat32);
        let buf = DepthBuffer::new(&data, 4, 2, 16, DepthEncoding::DisparityFloat32).unwrap();
        let set = sample(&buf, &Rect::new(0.0, 0.0, 4.0, 2.0), None).unwrap();
        assert_eq!(set.total_scanned, 8);
        let kept: Vec<f32> = set.samples.iter().map(|s| s.value).collect();
        assert_eq!(kept, vec![1.0, 2.0, 3.0, 4.5]);
    }

    #[test]
    fn depth_range_is_wider_than_disparity() {
        let values = [6.0, 9.0, 12.0, 0.5];
        let data = buffer_of(&values, 4, DepthEncoding::DepthFloat32);
        let buf = DepthBuffer::new(&data, 4, 1, 16, DepthEncoding::DepthFloat32).unwrap();
        let set = sample(&buf, &Rect::new(0.0, 0.0, 4.0, 1.0), None).unwrap();
        assert_eq!(set.valid_count(), 3);
    }

    #[test]
    fn tags_center_samples_by_landmark() {
        let values = vec![1.0f32; 100];
        let data = buffer_of(&values, 10, DepthEncoding::DepthFloat16);
        let buf = DepthBuffer::new(&data, 10, 10, 20, DepthEncoding::DepthFloat16).unwrap();
        // Half-extent 2 px around (5, 5): columns/rows 3..7.
        let set = sample(
            &buf,
            &Rect::new(0.0, 0.0, 10.0, 10.0),
            Some(Point::new(5.0, 5.0)),
        )
        .unwrap();
        assert_eq!(set.valid_count(), 100);
        assert_eq!(set.center_count(), 16);
    }

    #[test]
    fn off_buffer_face_centers_on_clamped_rect() {
        // Face spans x -10..10 of a 10x10 buffer; only 0..10 survives the
        // clamp, and the center box is sized from that.
        let values = vec![1.0f32; 100];
        let data = buffer_of(&values, 10, DepthEncoding::DepthFloat32);
        let buf = DepthBuffer::new(&data, 10, 10, 40, DepthEncoding::DepthFloat32).unwrap();
        let face = Rect::new(-10.0, 0.0, 20.0, 10.0);

        // Inner 60% of the 10x10 clamped rect: 6x6.
        let set = sample(&buf, &face, None).unwrap();
        assert_eq!(set.region.width, 10);
        assert_eq!(set.center_count(), 36);

        // Half-extent 2 px (0.2 of the clamped width) around (0, 5):
        // columns 0..2, rows 3..7.
        let set = sample(&buf, &face, Some(Point::new(0.0, 5.0))).unwrap();
        assert_eq!(set.center_count(), 8);
        assert!(set
            .samples
            .iter()
            .take(10 * 3 + 2)
            .skip(10 * 3)
            .all(|s| s.is_center));
    }
}
