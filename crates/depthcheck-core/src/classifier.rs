//! Threshold vote over depth metrics.
//!
//! A flat surface (printed photo, phone or tablet screen) held in front of a
//! depth sensor produces a nearly planar, low-variance depth patch. A real face
//! has a pronounced nose-to-cheek relief and modest local noise. Five
//! independent checks encode this; at least four must pass for a real-face
//! verdict, so no single check decides on its own.
//!
//! # Threat Coverage
//!
//! - **Blocks:** Printed photographs, screen replays, flat cut-outs.
//! - **Does not block:** Well-fitted 3D masks or sculpted replicas.

use serde::Serialize;

use crate::metrics::DepthMetrics;

pub const TOTAL_CHECKS: u32 = 5;
/// Minimum passing checks for a real-face verdict.
pub const REQUIRED_CHECKS: u32 = 4;

/// Per-metric thresholds. All lower bounds are strict; smoothness must lie
/// strictly inside `(smoothness_min, smoothness_max)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdProfile {
    pub range_min: f32,
    pub std_dev_min: f32,
    pub gradient_min: f32,
    pub smoothness_min: f32,
    pub smoothness_max: f32,
    pub valid_pixel_fraction_min: f32,
}

/// Thresholds for disparity buffers (1/m).
pub const DISPARITY_PROFILE: ThresholdProfile = ThresholdProfile {
    range_min: 0.50,
    std_dev_min: 0.15,
    gradient_min: 0.10,
    smoothness_min: 0.005,
    smoothness_max: 0.06,
    valid_pixel_fraction_min: 0.85,
};

/// Thresholds for depth buffers (meters).
pub const DEPTH_PROFILE: ThresholdProfile = ThresholdProfile {
    range_min: 0.10,
    std_dev_min: 0.03,
    gradient_min: 0.05,
    smoothness_min: 0.005,
    smoothness_max: 0.04,
    valid_pixel_fraction_min: 0.85,
};

impl ThresholdProfile {
    pub fn for_encoding(is_disparity: bool) -> &'static ThresholdProfile {
        if is_disparity {
            &DISPARITY_PROFILE
        } else {
            &DEPTH_PROFILE
        }
    }
}

/// Outcome of each individual check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResults {
    pub range: bool,
    pub std_dev: bool,
    pub gradient: bool,
    pub smoothness: bool,
    pub valid_pixels: bool,
}

impl CheckResults {
    pub fn passed(&self) -> u32 {
        [
            self.range,
            self.std_dev,
            self.gradient,
            self.smoothness,
            self.valid_pixels,
        ]
        .iter()
        .filter(|&&ok| ok)
        .count() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub is_real_face: bool,
    pub checks_passed: u32,
    pub total_checks: u32,
    pub checks: CheckResults,
}

/// Classify metrics with the profile matching the buffer encoding.
pub fn classify(metrics: &DepthMetrics, is_disparity: bool) -> Classification {
    classify_with(metrics, ThresholdProfile::for_encoding(is_disparity))
}

pub fn classify_with(metrics: &DepthMetrics, profile: &ThresholdProfile) -> Classification {
    let checks = CheckResults {
        range: metrics.range > profile.range_min,
        std_dev: metrics.std_dev > profile.std_dev_min,
        gradient: metrics.gradient > profile.gradient_min,
        smoothness: metrics.smoothness > profile.smoothness_min
            && metrics.smoothness < profile.smoothness_max,
        valid_pixels: metrics.valid_pixel_fraction > profile.valid_pixel_fraction_min,
    };
    let checks_passed = checks.passed();

    Classification {
        is_real_face: checks_passed >= REQUIRED_CHECKS,
        checks_passed,
        total_checks: TOTAL_CHECKS,
        checks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: metrics that pass every depth-profile check.
    fn real_depth_metrics() -> DepthMetrics {
        DepthMetrics {
            min: 0.45,
            max: 0.60,
            range: 0.15,
            std_dev: 0.05,
            center_mean: 0.47,
            edge_mean: 0.55,
            gradient: 0.08,
            smoothness: 0.01,
            valid_pixel_fraction: 0.95,
        }
    }

    fn real_disparity_metrics() -> DepthMetrics {
        DepthMetrics {
            min: 1.6,
            max: 2.4,
            range: 0.8,
            std_dev: 0.2,
            center_mean: 2.2,
            edge_mean: 1.9,
            gradient: 0.3,
            smoothness: 0.02,
            valid_pixel_fraction: 0.9,
        }
    }

    #[test]
    fn real_depth_face_passes_all_checks() {
        let c = classify(&real_depth_metrics(), false);
        assert!(c.is_real_face);
        assert_eq!(c.checks_passed, 5);
        assert_eq!(c.total_checks, 5);
    }

    #[test]
    fn one_failed_check_still_real() {
        let mut m = real_depth_metrics();
        m.valid_pixel_fraction = 0.5;
        let c = classify(&m, false);
        assert!(c.is_real_face);
        assert_eq!(c.checks_passed, 4);
        assert!(!c.checks.valid_pixels);
    }

    #[test]
    fn two_failed_checks_is_spoof() {
        // Every pair of failing disparity checks yields a spoof verdict.
        let failures: [fn(&mut DepthMetrics); 5] = [
            |m| m.range = 0.50,
            |m| m.std_dev = 0.15,
            |m| m.gradient = 0.10,
            |m| m.smoothness = 0.06,
            |m| m.valid_pixel_fraction = 0.85,
        ];
        for i in 0..failures.len() {
            for j in (i + 1)..failures.len() {
                let mut m = real_disparity_metrics();
                failures[i](&mut m);
                failures[j](&mut m);
                let c = classify(&m, true);
                assert!(!c.is_real_face, "checks {i} and {j} failing should reject");
                assert_eq!(c.checks_passed, 3);
            }
        }
    }

    #[test]
    fn thresholds_are_strict() {
        let mut m = real_depth_metrics();
        m.range = DEPTH_PROFILE.range_min;
        m.smoothness = DEPTH_PROFILE.smoothness_min;
        let c = classify(&m, false);
        assert!(!c.checks.range);
        assert!(!c.checks.smoothness);
        assert!(!c.is_real_face);
    }

    #[test]
    fn too_noisy_fails_smoothness() {
        let mut m = real_depth_metrics();
        m.smoothness = 0.05;
        assert!(!classify(&m, false).checks.smoothness);
        // Same value is acceptable under the disparity profile.
        let mut d = real_disparity_metrics();
        d.smoothness = 0.05;
        assert!(classify(&d, true).checks.smoothness);
    }

    #[test]
    fn profile_selection() {
        // Depth-scale relief is far too small for the disparity profile.
        let c = classify(&real_depth_metrics(), true);
        assert!(!c.is_real_face);
        assert_eq!(
            ThresholdProfile::for_encoding(true),
            &DISPARITY_PROFILE
        );
    }
}
