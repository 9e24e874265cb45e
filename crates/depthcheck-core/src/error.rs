use thiserror::Error;

/// Failures inside the depth analysis pipeline.
///
/// None of these escape [`crate::analyze`]: the verdict assembler maps each
/// one to a terminal status with an explanatory message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("face region maps to nothing inside the {width}x{height} depth buffer")]
    EmptyRegion { width: u32, height: u32 },

    #[error("no valid depth samples in face region ({scanned} pixels scanned)")]
    NoValidSamples { scanned: usize },

    #[error("unsupported depth sample encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("depth buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall { needed: usize, got: usize },

    #[error("failed to encode heatmap: {0}")]
    HeatmapEncode(String),
}
