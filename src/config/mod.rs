// src/config/mod.rs
//! Configuration for the prediction core
//!
//! Every field has a default backed by [`constants`], so an empty file (or no
//! file at all) yields the reference behaviour.

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete core configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct BpConfig {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub normalization: NormalizationConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub imputation: ImputationConfig,
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default)]
    pub request: RequestConfig,
}

/// Band-pass filter parameters
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FilterConfig {
    #[serde(default = "defaults::lowcut_hz")]
    pub lowcut_hz: f64,

    #[serde(default = "defaults::highcut_hz")]
    pub highcut_hz: f64,

    #[serde(default = "defaults::filter_order")]
    pub order: usize,
}

/// Amplitude normalization parameters
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NormalizationConfig {
    #[serde(default = "defaults::epsilon")]
    pub epsilon: f64,
}

/// Feature extraction parameters
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FeatureConfig {
    /// Upper bound on the Welch segment length
    #[serde(default = "defaults::welch_max_segment")]
    pub welch_max_segment: usize,

    /// Minimum spacing between detected beats, in seconds
    #[serde(default = "defaults::beat_min_distance_s")]
    pub beat_min_distance_s: f64,

    /// Minimum spacing between fiducial peaks (and valleys), in samples
    #[serde(default = "defaults::fiducial_min_distance_samples")]
    pub fiducial_min_distance_samples: usize,

    /// Added to |x| before the entropy computation
    #[serde(default = "defaults::entropy_offset")]
    pub entropy_offset: f64,
}

/// Missing-value handling
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ImputationConfig {
    /// Population means per feature column, used when a column has no observed
    /// value in the batch. Empty disables the fallback.
    #[serde(default)]
    pub fallback_means: Vec<f64>,

    /// Fail the request instead of filling a column that has no observed
    /// value and no fallback mean
    #[serde(default)]
    pub strict: bool,
}

/// Regression model artifact locations
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ModelConfig {
    #[serde(default = "defaults::sbp_path")]
    pub sbp_path: PathBuf,

    #[serde(default = "defaults::dbp_path")]
    pub dbp_path: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbp_crc32: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbp_crc32: Option<u32>,
}

/// Request handling defaults
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RequestConfig {
    #[serde(default = "defaults::default_sample_rate_hz")]
    pub default_sample_rate_hz: u32,
}

/// Default value providers using constants
mod defaults {
    use crate::config::constants::*;
    use std::path::PathBuf;

    pub fn lowcut_hz() -> f64 { filters::DEFAULT_LOWCUT_HZ }
    pub fn highcut_hz() -> f64 { filters::DEFAULT_HIGHCUT_HZ }
    pub fn filter_order() -> usize { filters::DEFAULT_FILTER_ORDER }

    pub fn epsilon() -> f64 { normalization::DEFAULT_EPSILON }

    pub fn welch_max_segment() -> usize { features::DEFAULT_WELCH_MAX_SEGMENT }
    pub fn beat_min_distance_s() -> f64 { features::DEFAULT_BEAT_MIN_DISTANCE_S }
    pub fn fiducial_min_distance_samples() -> usize { features::DEFAULT_FIDUCIAL_MIN_DISTANCE_SAMPLES }
    pub fn entropy_offset() -> f64 { features::DEFAULT_ENTROPY_OFFSET }

    pub fn sbp_path() -> PathBuf { PathBuf::from(models::DEFAULT_SBP_PATH) }
    pub fn dbp_path() -> PathBuf { PathBuf::from(models::DEFAULT_DBP_PATH) }

    pub fn default_sample_rate_hz() -> u32 { signal::DEFAULT_SAMPLE_RATE_HZ }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            lowcut_hz: defaults::lowcut_hz(),
            highcut_hz: defaults::highcut_hz(),
            order: defaults::filter_order(),
        }
    }
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            epsilon: defaults::epsilon(),
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            welch_max_segment: defaults::welch_max_segment(),
            beat_min_distance_s: defaults::beat_min_distance_s(),
            fiducial_min_distance_samples: defaults::fiducial_min_distance_samples(),
            entropy_offset: defaults::entropy_offset(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            sbp_path: defaults::sbp_path(),
            dbp_path: defaults::dbp_path(),
            sbp_crc32: None,
            dbp_crc32: None,
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            default_sample_rate_hz: defaults::default_sample_rate_hz(),
        }
    }
}

impl BpConfig {
    /// Validate configuration consistency, collecting every violation
    pub fn validate_consistency(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let order = self.filter.order;
        if !(filters::MIN_FILTER_ORDER..=filters::MAX_FILTER_ORDER).contains(&order) {
            errors.push(format!(
                "Filter order {} outside {}..={}",
                order,
                filters::MIN_FILTER_ORDER,
                filters::MAX_FILTER_ORDER
            ));
        }

        if !(self.filter.lowcut_hz > 0.0 && self.filter.lowcut_hz < self.filter.highcut_hz) {
            errors.push(format!(
                "Cutoffs must satisfy 0 < lowcut ({} Hz) < highcut ({} Hz)",
                self.filter.lowcut_hz, self.filter.highcut_hz
            ));
        }

        // Only checked against the default rate; requests may carry their own
        let nyquist = self.request.default_sample_rate_hz as f64 / 2.0;
        if self.filter.highcut_hz >= nyquist {
            errors.push(format!(
                "Highcut ({} Hz) must be below the Nyquist frequency of the default rate ({} Hz)",
                self.filter.highcut_hz, nyquist
            ));
        }

        if self.request.default_sample_rate_hz < signal::MIN_SAMPLE_RATE_HZ {
            errors.push("Default sample rate must be positive".to_string());
        }

        if !(self.normalization.epsilon > 0.0) {
            errors.push(format!(
                "Normalization epsilon must be positive, got {}",
                self.normalization.epsilon
            ));
        }

        if self.features.welch_max_segment == 0 {
            errors.push("Welch segment length must be non-zero".to_string());
        }
        if !(self.features.beat_min_distance_s > 0.0) {
            errors.push("Beat minimum distance must be positive".to_string());
        }
        if self.features.fiducial_min_distance_samples == 0 {
            errors.push("Fiducial minimum distance must be non-zero".to_string());
        }
        if !(self.features.entropy_offset > 0.0) {
            errors.push("Entropy offset must be positive".to_string());
        }

        let fallback = &self.imputation.fallback_means;
        if !fallback.is_empty() && fallback.len() != features::FEATURE_COUNT {
            errors.push(format!(
                "Imputation fallback needs {} values, got {}",
                features::FEATURE_COUNT,
                fallback.len()
            ));
        }
        if fallback.iter().any(|v| !v.is_finite()) {
            errors.push("Imputation fallback values must be finite".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
