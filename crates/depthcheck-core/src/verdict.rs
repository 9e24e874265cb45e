//! Verdict assembly: runs the depth pipeline for one capture and folds every
//! outcome, including pipeline errors, into a terminal [`VerdictStatus`].
//!
//! Status precedence:
//!
//! 1. `disabled` when depth analysis is switched off (depth is never touched)
//! 2. `no_face` / `multiple_faces` from the detector count (depth is never touched)
//! 3. `no_depth_data` when no buffer was supplied or it cannot be used
//! 4. `spoofing_detected` / `success` from the classifier

use std::fmt;

use serde::Serialize;

use crate::classifier::{classify, CheckResults, Classification};
use crate::depth::{DepthBuffer, DepthSource};
use crate::detector::FaceDetector;
use crate::error::AnalysisError;
use crate::geometry::{point_to_depth_space, to_depth_space, FaceRegion, Size};
use crate::heatmap::{self, DEFAULT_JPEG_QUALITY};
use crate::metrics::DepthMetrics;
use crate::sampler::{self, PixelRect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Success,
    NoFace,
    MultipleFaces,
    SpoofingDetected,
    NoDepthData,
    Disabled,
}

impl VerdictStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoFace => "no_face",
            Self::MultipleFaces => "multiple_faces",
            Self::SpoofingDetected => "spoofing_detected",
            Self::NoDepthData => "no_depth_data",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Debug metrics as exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictMetrics {
    pub range: f32,
    pub std_deviation: f32,
    pub gradient: f32,
    pub smoothness: f32,
    /// Valid pixel fraction scaled to 0..=100.
    pub valid_pixel_percentage: f32,
    pub checks_passed: u32,
    pub total_checks: u32,
    /// Which of the individual checks passed.
    pub checks: CheckResults,
}

impl VerdictMetrics {
    pub fn new(metrics: &DepthMetrics, classification: &Classification) -> Self {
        Self {
            range: metrics.range,
            std_deviation: metrics.std_dev,
            gradient: metrics.gradient,
            smoothness: metrics.smoothness,
            valid_pixel_percentage: metrics.valid_pixel_fraction * 100.0,
            checks_passed: classification.checks_passed,
            total_checks: classification.total_checks,
            checks: classification.checks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AntiSpoofingVerdict {
    pub is_enabled: bool,
    pub has_true_depth: bool,
    /// True iff exactly one face was detected.
    pub face_detected: bool,
    pub face_count: usize,
    /// Only meaningful when `face_detected`.
    pub is_real_face: bool,
    pub status: VerdictStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<VerdictMetrics>,
    /// Base64 JPEG of the face region.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_heatmap: Option<String>,
}

/// Flags and knobs for one analysis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Gates whether depth analysis runs at all.
    pub enable_depth_data: bool,
    /// Gates metrics and heatmap in the verdict.
    pub enable_debug: bool,
    pub heatmap_quality: u8,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            enable_depth_data: true,
            enable_debug: false,
            heatmap_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Everything one capture contributes to the analysis.
#[derive(Clone, Copy)]
pub struct CaptureInput<'a> {
    /// Pixel size of the photo the detector ran on.
    pub image_size: Size,
    pub faces: &'a [FaceRegion],
    /// Depth data aligned and oriented to the photo, if the device has it.
    pub depth: Option<&'a dyn DepthSource>,
}

/// Products of the depth stage for a single face.
struct Evaluation {
    /// Set only when sampling ran and debug was requested.
    heatmap: Option<String>,
    outcome: Result<(DepthMetrics, Classification), AnalysisError>,
}

/// Run detection through `detector`, then [`analyze`].
pub fn analyze_with_detector(
    detector: &dyn FaceDetector,
    image_size: Size,
    depth: Option<&dyn DepthSource>,
    options: &AnalysisOptions,
) -> AntiSpoofingVerdict {
    let faces = detector.detect();
    analyze(
        &CaptureInput {
            image_size,
            faces: &faces,
            depth,
        },
        options,
    )
}

/// Produce the verdict for one capture. Never fails: pipeline errors become
/// terminal statuses with an explanatory message.
pub fn analyze(input: &CaptureInput<'_>, options: &AnalysisOptions) -> AntiSpoofingVerdict {
    let face_count = input.faces.len();
    let base = AntiSpoofingVerdict {
        is_enabled: options.enable_depth_data,
        has_true_depth: options.enable_depth_data && input.depth.is_some(),
        face_detected: face_count == 1,
        face_count,
        is_real_face: false,
        status: VerdictStatus::Disabled,
        message: String::new(),
        metrics: None,
        debug_heatmap: None,
    };

    let verdict = if !options.enable_depth_data {
        terminal(base, VerdictStatus::Disabled, "Depth anti-spoofing is disabled")
    } else if face_count == 0 {
        terminal(base, VerdictStatus::NoFace, "No face detected")
    } else if face_count > 1 {
        let msg = format!("Multiple faces detected ({face_count}); exactly one is required");
        terminal(base, VerdictStatus::MultipleFaces, &msg)
    } else if let Some(source) = input.depth {
        assess(base, source, &input.faces[0], input.image_size, options)
    } else {
        terminal(base, VerdictStatus::NoDepthData, "No depth data available")
    };

    tracing::info!(
        status = %verdict.status,
        face_count = verdict.face_count,
        is_real_face = verdict.is_real_face,
        "anti-spoofing verdict"
    );
    verdict
}

fn terminal(
    mut verdict: AntiSpoofingVerdict,
    status: VerdictStatus,
    message: &str,
) -> AntiSpoofingVerdict {
    verdict.status = status;
    verdict.message = message.to_string();
    verdict
}

fn assess(
    base: AntiSpoofingVerdict,
    source: &dyn DepthSource,
    face: &FaceRegion,
    image_size: Size,
    options: &AnalysisOptions,
) -> AntiSpoofingVerdict {
    let evaluation = source
        .acquire()
        .and_then(|buffer| evaluate(&buffer, face, image_size, options));

    let evaluation = match evaluation {
        Ok(e) => e,
        Err(e) => return from_error(base, &e),
    };

    let mut verdict = match evaluation.outcome {
        Ok((metrics, classification)) => {
            tracing::debug!(
                range = metrics.range,
                std_dev = metrics.std_dev,
                gradient = metrics.gradient,
                smoothness = metrics.smoothness,
                valid_pixel_fraction = metrics.valid_pixel_fraction,
                checks_passed = classification.checks_passed,
                "depth metrics classified"
            );
            let (status, message) = if classification.is_real_face {
                (
                    VerdictStatus::Success,
                    format!(
                        "Real face verified ({}/{} depth checks passed)",
                        classification.checks_passed, classification.total_checks
                    ),
                )
            } else {
                (
                    VerdictStatus::SpoofingDetected,
                    format!(
                        "Possible spoofing: face appears flat ({}/{} depth checks passed)",
                        classification.checks_passed, classification.total_checks
                    ),
                )
            };
            let mut v = terminal(base, status, &message);
            v.is_real_face = classification.is_real_face;
            if options.enable_debug {
                v.metrics = Some(VerdictMetrics::new(&metrics, &classification));
            }
            v
        }
        Err(e) => from_error(base, &e),
    };
    verdict.debug_heatmap = evaluation.heatmap;
    verdict
}

/// Map the face into the buffer, sample it and classify.
///
/// Errors before sampling (geometry, empty region) are returned directly;
/// errors after sampling ride in [`Evaluation::outcome`] so the heatmap
/// survives them.
fn evaluate(
    buffer: &DepthBuffer<'_>,
    face: &FaceRegion,
    image_size: Size,
    options: &AnalysisOptions,
) -> Result<Evaluation, AnalysisError> {
    let depth_size = buffer.size();
    let rect = to_depth_space(&face.bounds, image_size, depth_size)?;
    let landmark = face
        .landmark_centroid()
        .map(|p| point_to_depth_space(&p, image_size, depth_size))
        .transpose()?;

    let samples = sampler::sample(buffer, &rect, landmark)?;

    let heatmap = if options.enable_debug {
        render_heatmap(buffer, &samples.region, options.heatmap_quality)
    } else {
        None
    };

    let outcome = DepthMetrics::from_samples(&samples).map(|metrics| {
        let classification = classify(&metrics, buffer.encoding().is_disparity());
        (metrics, classification)
    });

    Ok(Evaluation { heatmap, outcome })
}

fn render_heatmap(buffer: &DepthBuffer<'_>, region: &PixelRect, quality: u8) -> Option<String> {
    match heatmap::render(buffer, region, quality) {
        Ok(h) => h,
        Err(e) => {
            tracing::warn!(error = %e, "heatmap omitted");
            None
        }
    }
}

fn from_error(base: AntiSpoofingVerdict, err: &AnalysisError) -> AntiSpoofingVerdict {
    tracing::warn!(error = %err, "depth analysis could not complete");
    match err {
        AnalysisError::NoValidSamples { .. } => terminal(
            base,
            VerdictStatus::SpoofingDetected,
            &format!("Possible spoofing: {err}"),
        ),
        _ => terminal(
            base,
            VerdictStatus::NoDepthData,
            &format!("Depth data unusable: {err}"),
        ),
    }
}
