//! depthcheck-core: depth-map anti-spoofing for single-face captures.
//!
//! Pipeline, leaf first:
//!
//! - [`geometry`] maps the detector's normalized face box into depth pixels
//! - [`sampler`] decodes and filters samples inside the face region
//! - [`metrics`] reduces them to range, spread, relief and noise statistics
//! - [`classifier`] votes on those statistics
//! - [`heatmap`] renders an optional debug image of the region
//! - [`verdict`] assembles the final [`AntiSpoofingVerdict`]
//!
//! The whole analysis is a synchronous pure function of its inputs; run it
//! off any latency-sensitive thread since cost grows with face-region area.

pub mod classifier;
pub mod depth;
pub mod detector;
pub mod error;
pub mod geometry;
pub mod heatmap;
pub mod metrics;
pub mod sampler;
pub mod synthetic;
pub mod verdict;

pub use classifier::{classify, Classification, ThresholdProfile};
pub use depth::{DepthBuffer, DepthEncoding, DepthMap, DepthSource};
pub use detector::{FaceDetector, StaticDetector};
pub use error::AnalysisError;
pub use geometry::{FaceRegion, NormalizedRect, Point, Rect, Size};
pub use metrics::DepthMetrics;
pub use verdict::{
    analyze, analyze_with_detector, AnalysisOptions, AntiSpoofingVerdict, CaptureInput,
    VerdictMetrics, VerdictStatus,
};
