use depthcheck_core::heatmap::DEFAULT_JPEG_QUALITY;
use depthcheck_core::AnalysisOptions;

/// CLI configuration, loaded from environment variables.
pub struct Config {
    /// Whether depth anti-spoofing runs at all.
    pub enable_depth_data: bool,
    /// Whether metrics and the heatmap are included in the verdict.
    pub enable_debug: bool,
    /// JPEG quality (1-100) of the debug heatmap.
    pub heatmap_quality: u8,
    /// How long to wait for the analysis worker before giving up.
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from `DEPTHCHECK_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            enable_depth_data: std::env::var("DEPTHCHECK_ENABLE_DEPTH")
                .map(|v| v != "0")
                .unwrap_or(true),
            enable_debug: std::env::var("DEPTHCHECK_DEBUG")
                .map(|v| v != "0")
                .unwrap_or(false),
            heatmap_quality: env_u8("DEPTHCHECK_HEATMAP_QUALITY", DEFAULT_JPEG_QUALITY),
            timeout_secs: env_u64("DEPTHCHECK_TIMEOUT_SECS", 10),
        }
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            enable_depth_data: self.enable_depth_data,
            enable_debug: self.enable_debug,
            heatmap_quality: self.heatmap_quality,
        }
    }
}

fn env_u8(key: &str, default: u8) -> u8 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_helpers_fall_back_on_garbage() {
        std::env::set_var("DEPTHCHECK_TEST_GARBAGE_U8", "four hundred");
        assert_eq!(env_u8("DEPTHCHECK_TEST_GARBAGE_U8", 7), 7);
        std::env::set_var("DEPTHCHECK_TEST_VALID_U64", "42");
        assert_eq!(env_u64("DEPTHCHECK_TEST_VALID_U64", 1), 42);
        assert_eq!(env_u64("DEPTHCHECK_TEST_UNSET_U64", 9), 9);
    }

    #[test]
    fn options_mirror_config() {
        let cfg = Config {
            enable_depth_data: false,
            enable_debug: true,
            heatmap_quality: 55,
            timeout_secs: 3,
        };
        let opts = cfg.analysis_options();
        assert!(!opts.enable_depth_data);
        assert!(opts.enable_debug);
        assert_eq!(opts.heatmap_quality, 55);
    }
}
