// src/config/constants.rs
//! System-wide configuration constants

/// Request and waveform constants
pub mod signal {
    pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 100;
    pub const MIN_SAMPLE_RATE_HZ: u32 = 1;
}

/// Band-pass filter constants
pub mod filters {
    pub const DEFAULT_LOWCUT_HZ: f64 = 0.5;
    pub const DEFAULT_HIGHCUT_HZ: f64 = 8.0;
    pub const DEFAULT_FILTER_ORDER: usize = 3;
    pub const MIN_FILTER_ORDER: usize = 1;
    pub const MAX_FILTER_ORDER: usize = 8;

    /// Edge padding is this many times the longer coefficient vector
    pub const PAD_LENGTH_FACTOR: usize = 3;
}

/// Normalization constants
pub mod normalization {
    pub const DEFAULT_EPSILON: f64 = 1e-8;
}

/// Feature extraction constants
pub mod features {
    pub const TIME_DOMAIN_FEATURE_COUNT: usize = 8;
    pub const FREQUENCY_DOMAIN_FEATURE_COUNT: usize = 2;
    pub const PULSE_INTERVAL_FEATURE_COUNT: usize = 2;
    pub const MORPHOLOGY_FEATURE_COUNT: usize = 9;

    pub const FEATURE_COUNT: usize = TIME_DOMAIN_FEATURE_COUNT
        + FREQUENCY_DOMAIN_FEATURE_COUNT
        + PULSE_INTERVAL_FEATURE_COUNT
        + MORPHOLOGY_FEATURE_COUNT;

    pub const DEFAULT_WELCH_MAX_SEGMENT: usize = 256;
    pub const DEFAULT_BEAT_MIN_DISTANCE_S: f64 = 0.5;
    pub const DEFAULT_FIDUCIAL_MIN_DISTANCE_SAMPLES: usize = 50;
    pub const DEFAULT_ENTROPY_OFFSET: f64 = 1e-8;

    /// Fill for a feature column with no observed value and no fallback mean
    pub const DEFAULT_MISSING_FILL: f64 = 0.0;

    /// Seconds per minute, divisor of the heart-rate proxy
    pub const HEART_RATE_DIVISOR: f64 = 60.0;
}

/// Model artifact constants
pub mod models {
    pub const DEFAULT_SBP_PATH: &str = "models/sys.json";
    pub const DEFAULT_DBP_PATH: &str = "models/dys.json";
    pub const ONNX_EXTENSION: &str = "onnx";
}

/// Configuration loading constants
pub mod paths {
    pub const ENV_PREFIX: &str = "PPG_BP";
    pub const ENV_SEPARATOR: &str = "__";
    pub const DEFAULT_CONFIG_FILE: &str = "ppg-bp.toml";
}
