//! PPG feature extraction module
//!
//! Four independent feature families are computed over the normalized
//! waveform:
//! - Time domain statistics (mean, spread, moments, entropy)
//! - Frequency domain summary from a Welch PSD
//! - Pulse interval features from beat detection
//! - Fiducial point morphology (rise/fall spans, slopes, ratios)

pub mod frequency;
pub mod morphology;
pub mod pulse_interval;
pub mod time_domain;

use crate::processing::aggregator::PartialFeatureVector;
use crate::processing::waveform::Waveform;
use tracing::debug;

pub use crate::config::FeatureConfig;
pub use frequency::{FrequencyDomainExtractor, FrequencyDomainFeatures, Periodogram};
pub use morphology::{MorphologyExtractor, MorphologyFeatures};
pub use pulse_interval::{PulseIntervalExtractor, PulseIntervalFeatures};
pub use time_domain::{TimeDomainExtractor, TimeDomainFeatures};

/// Output of all four extractors for one waveform
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFamilies {
    pub time_domain: TimeDomainFeatures,
    pub frequency_domain: FrequencyDomainFeatures,
    pub pulse_interval: PulseIntervalFeatures,
    pub morphology: MorphologyFeatures,
}

impl FeatureFamilies {
    pub fn to_partial(&self) -> PartialFeatureVector {
        PartialFeatureVector::from_families(
            &self.time_domain,
            &self.frequency_domain,
            &self.pulse_interval,
            &self.morphology,
        )
    }
}

/// Main feature extractor that coordinates the four families.
///
/// Extractors share nothing but the read-only waveform, so they run in
/// parallel on the rayon pool; the result does not depend on scheduling.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: FeatureConfig,
    time_domain: TimeDomainExtractor,
    frequency_domain: FrequencyDomainExtractor,
    pulse_interval: PulseIntervalExtractor,
    morphology: MorphologyExtractor,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(&FeatureConfig::default())
    }
}

impl FeatureExtractor {
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            config: config.clone(),
            time_domain: TimeDomainExtractor::new(config),
            frequency_domain: FrequencyDomainExtractor::new(config),
            pulse_interval: PulseIntervalExtractor::new(config),
            morphology: MorphologyExtractor::new(config),
        }
    }

    /// Run every extractor over an already normalized waveform
    pub fn extract_families(&self, waveform: &Waveform) -> FeatureFamilies {
        let ((time_domain, frequency_domain), (pulse_interval, morphology)) = rayon::join(
            || {
                rayon::join(
                    || self.time_domain.extract(waveform),
                    || self.frequency_domain.extract(waveform),
                )
            },
            || {
                rayon::join(
                    || self.pulse_interval.extract(waveform),
                    || self.morphology.extract(waveform),
                )
            },
        );

        debug!(
            beats = pulse_interval.beat_count,
            dominant_hz = frequency_domain.dominant_frequency_hz,
            "Feature families extracted"
        );

        FeatureFamilies {
            time_domain,
            frequency_domain,
            pulse_interval,
            morphology,
        }
    }

    /// Extract the 21-slot feature vector, missing slots left as `None`
    pub fn extract(&self, waveform: &Waveform) -> PartialFeatureVector {
        self.extract_families(waveform).to_partial()
    }

    /// Get the current configuration
    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }
}
