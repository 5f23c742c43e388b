//! Min-max amplitude normalization

use crate::config::NormalizationConfig;
use crate::processing::waveform::Waveform;

/// Scales a waveform to `[0, 1]` with `(x - min) / (max - min + epsilon)`.
///
/// Applied exactly once per request, before any feature extraction. A
/// constant waveform maps to all zeros instead of dividing by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformNormalizer {
    epsilon: f64,
}

impl Default for WaveformNormalizer {
    fn default() -> Self {
        Self::from_config(&NormalizationConfig::default())
    }
}

impl WaveformNormalizer {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    pub fn from_config(config: &NormalizationConfig) -> Self {
        Self::new(config.epsilon)
    }

    pub fn normalize(&self, waveform: &Waveform) -> Waveform {
        let samples = waveform.samples();
        let (min, max) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            });
        let scale = max - min + self.epsilon;

        let normalized = samples.iter().map(|&x| (x - min) / scale).collect();
        Waveform::derived(normalized, waveform.sample_rate())
    }
}
