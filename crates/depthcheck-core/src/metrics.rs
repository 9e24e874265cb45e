//! Scalar statistics over a face-region sample set.
//!
//! Reduction is batch and two-pass with `f64` accumulators, always in the
//! sampler's row-major order, so results are bit-reproducible run to run.

use crate::error::AnalysisError;
use crate::sampler::SampleSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthMetrics {
    pub min: f32,
    pub max: f32,
    pub range: f32,
    /// Population standard deviation (divides by N).
    pub std_dev: f32,
    /// Mean of center samples, 0 when there are none.
    pub center_mean: f32,
    /// Mean of edge samples, 0 when there are none.
    pub edge_mean: f32,
    /// `|center_mean - edge_mean|`.
    pub gradient: f32,
    /// Mean absolute difference between consecutive samples in scan order.
    /// Row wraparound is included; this is a noise proxy, not a spatial
    /// gradient, and the classifier thresholds are tuned against it.
    pub smoothness: f32,
    pub valid_pixel_fraction: f32,
}

impl DepthMetrics {
    pub fn from_samples(set: &SampleSet) -> Result<Self, AnalysisError> {
        let n = set.valid_count();
        if n == 0 {
            return Err(AnalysisError::NoValidSamples {
                scanned: set.total_scanned,
            });
        }

        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        let (mut center_sum, mut center_n) = (0.0f64, 0usize);
        let (mut edge_sum, mut edge_n) = (0.0f64, 0usize);
        let mut abs_diff_sum = 0.0f64;
        let mut prev: Option<f32> = None;

        for s in &set.samples {
            min = min.min(s.value);
            max = max.max(s.value);
            sum += f64::from(s.value);
            if s.is_center {
                center_sum += f64::from(s.value);
                center_n += 1;
            } else {
                edge_sum += f64::from(s.value);
                edge_n += 1;
            }
            if let Some(p) = prev {
                abs_diff_sum += f64::from((s.value - p).abs());
            }
            prev = Some(s.value);
        }

        let mean = sum / n as f64;
        let var = set
            .samples
            .iter()
            .map(|s| {
                let d = f64::from(s.value) - mean;
                d * d
            })
            .sum::<f64>()
            / n as f64;

        let center_mean = mean_or_zero(center_sum, center_n);
        let edge_mean = mean_or_zero(edge_sum, edge_n);
        let smoothness = if n > 1 {
            abs_diff_sum / (n - 1) as f64
        } else {
            0.0
        };
        let valid_pixel_fraction = if set.total_scanned > 0 {
            n as f64 / set.total_scanned as f64
        } else {
            0.0
        };

        Ok(Self {
            min,
            max,
            range: max - min,
            std_dev: var.sqrt() as f32,
            center_mean: center_mean as f32,
            edge_mean: edge_mean as f32,
            gradient: (center_mean - edge_mean).abs() as f32,
            smoothness: smoothness as f32,
            valid_pixel_fraction: valid_pixel_fraction as f32,
        })
    }
}

fn mean_or_zero(sum: f64, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}
