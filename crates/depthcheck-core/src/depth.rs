//! Depth buffer access and sample decoding.
//!
//! TrueDepth-style sensors deliver either depth (meters) or disparity
//! (inverse meters) as 16-bit half floats or 32-bit floats, in native byte
//! order, with rows possibly padded beyond `width * bytes_per_sample`.

use std::fmt;
use std::str::FromStr;

use half::f16;

use crate::error::AnalysisError;
use crate::geometry::Size;

/// Upper bound (exclusive) for a plausible disparity sample, in 1/m.
pub const MAX_VALID_DISPARITY: f32 = 5.0;
/// Upper bound (exclusive) for a plausible depth sample, in meters.
pub const MAX_VALID_DEPTH_METERS: f32 = 10.0;

/// Core Video four-character codes for the supported pixel formats.
pub const FOURCC_DEPTH_FLOAT16: u32 = u32::from_be_bytes(*b"hdep");
pub const FOURCC_DEPTH_FLOAT32: u32 = u32::from_be_bytes(*b"fdep");
pub const FOURCC_DISPARITY_FLOAT16: u32 = u32::from_be_bytes(*b"hdis");
pub const FOURCC_DISPARITY_FLOAT32: u32 = u32::from_be_bytes(*b"fdis");

/// Sample encoding of a depth buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthEncoding {
    DepthFloat16,
    DepthFloat32,
    DisparityFloat16,
    DisparityFloat32,
}

impl DepthEncoding {
    pub fn from_fourcc(code: u32) -> Result<Self, AnalysisError> {
        match code {
            FOURCC_DEPTH_FLOAT16 => Ok(Self::DepthFloat16),
            FOURCC_DEPTH_FLOAT32 => Ok(Self::DepthFloat32),
            FOURCC_DISPARITY_FLOAT16 => Ok(Self::DisparityFloat16),
            FOURCC_DISPARITY_FLOAT32 => Ok(Self::DisparityFloat32),
            other => Err(AnalysisError::UnsupportedEncoding(format!(
                "pixel format 0x{other:08x}"
            ))),
        }
    }

    pub fn fourcc(self) -> u32 {
        match self {
            Self::DepthFloat16 => FOURCC_DEPTH_FLOAT16,
            Self::DepthFloat32 => FOURCC_DEPTH_FLOAT32,
            Self::DisparityFloat16 => FOURCC_DISPARITY_FLOAT16,
            Self::DisparityFloat32 => FOURCC_DISPARITY_FLOAT32,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DepthFloat16 => "depth-f16",
            Self::DepthFloat32 => "depth-f32",
            Self::DisparityFloat16 => "disparity-f16",
            Self::DisparityFloat32 => "disparity-f32",
        }
    }

    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::DepthFloat16 | Self::DisparityFloat16 => 2,
            Self::DepthFloat32 | Self::DisparityFloat32 => 4,
        }
    }

    pub fn is_disparity(self) -> bool {
        matches!(self, Self::DisparityFloat16 | Self::DisparityFloat32)
    }

    /// Whether a decoded sample lies in the plausible range for this encoding.
    /// NaN is never valid.
    pub fn is_valid(self, value: f32) -> bool {
        let upper = if self.is_disparity() {
            MAX_VALID_DISPARITY
        } else {
            MAX_VALID_DEPTH_METERS
        };
        value > 0.0 && value < upper
    }

    fn decode(self, bytes: &[u8]) -> f32 {
        match self.bytes_per_sample() {
            2 => f16::from_bits(u16::from_ne_bytes([bytes[0], bytes[1]])).to_f32(),
            _ => f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        }
    }
}

impl fmt::Display for DepthEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DepthEncoding {
    type Err = AnalysisError;

    /// Accepts the kebab-case names (`depth-f16`, ...) and the four-character
    /// codes (`hdep`, `fdep`, `hdis`, `fdis`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "depth-f16" | "hdep" => Ok(Self::DepthFloat16),
            "depth-f32" | "fdep" => Ok(Self::DepthFloat32),
            "disparity-f16" | "hdis" => Ok(Self::DisparityFloat16),
            "disparity-f32" | "fdis" => Ok(Self::DisparityFloat32),
            _ => Err(AnalysisError::UnsupportedEncoding(s.to_string())),
        }
    }
}

/// Read-only view over a depth buffer owned by the capture pipeline.
#[derive(Debug, Clone, Copy)]
pub struct DepthBuffer<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    bytes_per_row: usize,
    encoding: DepthEncoding,
}

impl<'a> DepthBuffer<'a> {
    /// Wrap raw bytes, checking that the declared geometry fits them.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        bytes_per_row: usize,
        encoding: DepthEncoding,
    ) -> Result<Self, AnalysisError> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidGeometry(format!(
                "depth buffer size is {width}x{height}"
            )));
        }
        let row_len = (width as usize)
            .checked_mul(encoding.bytes_per_sample())
            .ok_or_else(|| {
                AnalysisError::InvalidGeometry(format!("row of {width} samples overflows usize"))
            })?;
        if bytes_per_row < row_len {
            return Err(AnalysisError::InvalidGeometry(format!(
                "row stride {bytes_per_row} shorter than {row_len} bytes of samples"
            )));
        }
        let needed = bytes_per_row
            .checked_mul(height as usize - 1)
            .and_then(|n| n.checked_add(row_len))
            .ok_or_else(|| {
                AnalysisError::InvalidGeometry(format!(
                    "{height} rows of stride {bytes_per_row} overflow usize"
                ))
            })?;
        if data.len() < needed {
            return Err(AnalysisError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            bytes_per_row,
            encoding,
        })
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn encoding(&self) -> DepthEncoding {
        self.encoding
    }

    /// Decoded samples of row `y` for columns `x0..x1`.
    ///
    /// Panics if the range lies outside the buffer; callers clamp first.
    pub fn row_values(&self, y: u32, x0: u32, x1: u32) -> impl Iterator<Item = f32> + 'a {
        let bps = self.encoding.bytes_per_sample();
        let start = y as usize * self.bytes_per_row + x0 as usize * bps;
        let end = y as usize * self.bytes_per_row + x1 as usize * bps;
        let encoding = self.encoding;
        self.data[start..end]
            .chunks_exact(bps)
            .map(move |c| encoding.decode(c))
    }

    #[cfg(test)]
    pub(crate) fn value_at(&self, x: u32, y: u32) -> f32 {
        let bps = self.encoding.bytes_per_sample();
        let start = y as usize * self.bytes_per_row + x as usize * bps;
        self.encoding.decode(&self.data[start..start + bps])
    }
}

/// Something that can hand out a depth buffer on demand.
///
/// The verdict assembler only calls [`DepthSource::acquire`] once it has
/// decided the depth stage must run, so terminal statuses reached earlier
/// never read depth data.
pub trait DepthSource {
    fn acquire(&self) -> Result<DepthBuffer<'_>, AnalysisError>;
}

impl DepthSource for DepthBuffer<'_> {
    fn acquire(&self) -> Result<DepthBuffer<'_>, AnalysisError> {
        Ok(*self)
    }
}

/// Owned depth map with an unparsed pixel format, as loaded from disk or
/// received from a capture bridge.
#[derive(Debug, Clone)]
pub struct DepthMap {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub bytes_per_row: usize,
    /// Encoding name or four-character code (see [`DepthEncoding::from_str`]).
    pub format: String,
}

impl DepthSource for DepthMap {
    fn acquire(&self) -> Result<DepthBuffer<'_>, AnalysisError> {
        let encoding: DepthEncoding = self.format.parse()?;
        DepthBuffer::new(
            &self.data,
            self.width,
            self.height,
            self.bytes_per_row,
            encoding,
        )
    }
}

/// Pack samples into native-endian bytes with no row padding.
pub fn encode_samples(values: &[f32], encoding: DepthEncoding) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * encoding.bytes_per_sample());
    for &v in values {
        match encoding.bytes_per_sample() {
            2 => out.extend_from_slice(&f16::from_f32(v).to_bits().to_ne_bytes()),
            _ => out.extend_from_slice(&v.to_ne_bytes()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_fourcc() {
        assert_eq!(
            "disparity-f32".parse::<DepthEncoding>().unwrap(),
            DepthEncoding::DisparityFloat32
        );
        assert_eq!("hdep".parse::<DepthEncoding>().unwrap(), DepthEncoding::DepthFloat16);
        assert_eq!(
            DepthEncoding::from_fourcc(u32::from_be_bytes(*b"fdis")).unwrap(),
            DepthEncoding::DisparityFloat32
        );
        for enc in [
            DepthEncoding::DepthFloat16,
            DepthEncoding::DepthFloat32,
            DepthEncoding::DisparityFloat16,
            DepthEncoding::DisparityFloat32,
        ] {
            assert_eq!(DepthEncoding::from_fourcc(enc.fourcc()).unwrap(), enc);
            assert_eq!(enc.to_string().parse::<DepthEncoding>().unwrap(), enc);
        }
    }

    #[test]
    fn rejects_unknown_encoding() {
        let err = "L008".parse::<DepthEncoding>().unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedEncoding(_)));
        let err = DepthEncoding::from_fourcc(u32::from_be_bytes(*b"BGRA")).unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedEncoding(_)));
    }

    #[test]
    fn validity_ranges() {
        let disp = DepthEncoding::DisparityFloat16;
        assert!(!disp.is_valid(0.0));
        assert!(disp.is_valid(4.99));
        assert!(!disp.is_valid(5.0));
        assert!(!disp.is_valid(f32::NAN));

        let depth = DepthEncoding::DepthFloat32;
        assert!(depth.is_valid(9.5));
        assert!(!depth.is_valid(10.0));
        assert!(!depth.is_valid(-0.3));
    }

    #[test]
    fn decodes_half_and_single_with_stride() {
        // 3x2 f16 buffer with 2 bytes of row padding.
        let values = [0.5f32, 1.0, 1.5, 2.0, 2.5, 3.0];
        let mut data = Vec::new();
        for row in values.chunks(3) {
            data.extend(encode_samples(row, DepthEncoding::DisparityFloat16));
            data.extend([0xAA, 0xAA]);
        }
        let buf = DepthBuffer::new(&data, 3, 2, 8, DepthEncoding::DisparityFloat16).unwrap();
        let row1: Vec<f32> = buf.row_values(1, 0, 3).collect();
        assert_eq!(row1, vec![2.0, 2.5, 3.0]);
        assert_eq!(buf.value_at(1, 0), 1.0);

        let data = encode_samples(&[0.25, 0.75], DepthEncoding::DepthFloat32);
        let buf = DepthBuffer::new(&data, 2, 1, 8, DepthEncoding::DepthFloat32).unwrap();
        assert_eq!(buf.value_at(1, 0), 0.75);
    }

    #[test]
    fn rejects_bad_geometry() {
        let data = vec![0u8; 16];
        let err = DepthBuffer::new(&data, 0, 2, 8, DepthEncoding::DepthFloat32).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidGeometry(_)));

        let err = DepthBuffer::new(&data, 4, 1, 8, DepthEncoding::DepthFloat32).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidGeometry(_)));

        let err = DepthBuffer::new(&data, 2, 3, 8, DepthEncoding::DepthFloat32).unwrap_err();
        assert!(matches!(err, AnalysisError::BufferTooSmall { needed: 24, got: 16 }));
    }

    #[test]
    fn oversized_stride_is_rejected_not_overflowed() {
        let map = DepthMap {
            data: vec![0u8; 64],
            width: 2,
            height: 4,
            bytes_per_row: usize::MAX / 2,
            format: "depth-f32".into(),
        };
        let err = map.acquire().unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidGeometry(_)));
    }

    #[test]
    fn depth_map_parses_format_on_acquire() {
        let map = DepthMap {
            data: encode_samples(&[1.0; 4], DepthEncoding::DepthFloat32),
            width: 2,
            height: 2,
            bytes_per_row: 8,
            format: "fdep".into(),
        };
        assert_eq!(map.acquire().unwrap().encoding(), DepthEncoding::DepthFloat32);

        let bad = DepthMap {
            format: "rgb".into(),
            ..map
        };
        assert!(matches!(
            bad.acquire().unwrap_err(),
            AnalysisError::UnsupportedEncoding(_)
        ));
    }
}
