//! Beat-to-beat interval features

use crate::config::constants::features::PULSE_INTERVAL_FEATURE_COUNT;
use crate::processing::peaks::find_peaks;
use crate::processing::waveform::Waveform;

/// Mean inter-beat interval and beat amplitude.
///
/// Both are missing when fewer than two beats are detected; that is an
/// ordinary outcome for flat or noisy segments, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseIntervalFeatures {
    pub mean_interval_s: Option<f64>,
    pub mean_peak_amplitude: Option<f64>,
    pub beat_count: usize,
}

impl PulseIntervalFeatures {
    pub const NAMES: [&'static str; PULSE_INTERVAL_FEATURE_COUNT] =
        ["mean_ibi", "mean_peak_amplitude"];

    pub fn to_slots(&self) -> [Option<f64>; PULSE_INTERVAL_FEATURE_COUNT] {
        [self.mean_interval_s, self.mean_peak_amplitude]
    }
}

/// Beat detector working on local maxima at least `min_distance_s` apart
#[derive(Debug, Clone)]
pub struct PulseIntervalExtractor {
    min_distance_s: f64,
}

impl PulseIntervalExtractor {
    pub fn new(config: &super::FeatureConfig) -> Self {
        Self {
            min_distance_s: config.beat_min_distance_s,
        }
    }

    pub fn extract(&self, waveform: &Waveform) -> PulseIntervalFeatures {
        let fs = waveform.sample_rate() as f64;
        let samples = waveform.samples();

        // Truncated to whole samples
        let min_distance = (self.min_distance_s * fs) as usize;
        let beats = find_peaks(samples, min_distance);

        if beats.len() < 2 {
            return PulseIntervalFeatures {
                mean_interval_s: None,
                mean_peak_amplitude: None,
                beat_count: beats.len(),
            };
        }

        let interval_sum: usize = beats.windows(2).map(|pair| pair[1] - pair[0]).sum();
        let mean_interval = interval_sum as f64 / (beats.len() - 1) as f64;
        let mean_amplitude =
            beats.iter().map(|&i| samples[i]).sum::<f64>() / beats.len() as f64;

        PulseIntervalFeatures {
            mean_interval_s: Some(mean_interval / fs),
            mean_peak_amplitude: Some(mean_amplitude),
            beat_count: beats.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::features::FeatureConfig;

    fn extractor() -> PulseIntervalExtractor {
        PulseIntervalExtractor::new(&FeatureConfig::default())
    }

    /// Narrow Gaussian pulses every `period_s`, first one at `period_s / 2`
    fn pulse_train(period_s: f64, fs: u32, duration_s: f64) -> Waveform {
        let len = (duration_s * fs as f64) as usize;
        let samples = (0..len)
            .map(|i| {
                let t = i as f64 / fs as f64;
                let phase = (t % period_s) - period_s / 2.0;
                (-phase * phase / (2.0 * 0.05 * 0.05)).exp()
            })
            .collect();
        Waveform::new(samples, fs).unwrap()
    }

    #[test]
    fn test_interval_of_regular_pulses() {
        let features = extractor().extract(&pulse_train(0.8, 100, 8.0));

        assert_eq!(features.beat_count, 10);
        assert!((features.mean_interval_s.unwrap() - 0.8).abs() < 0.02);
        assert!((features.mean_peak_amplitude.unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_beat_is_missing_not_error() {
        let features = extractor().extract(&pulse_train(2.0, 100, 2.0));

        assert_eq!(features.beat_count, 1);
        assert!(features.mean_interval_s.is_none());
        assert!(features.mean_peak_amplitude.is_none());
    }

    #[test]
    fn test_ramp_has_no_beats() {
        let ramp: Vec<f64> = (0..500).map(|i| i as f64 / 499.0).collect();
        let features = extractor().extract(&Waveform::new(ramp, 100).unwrap());

        assert_eq!(features.beat_count, 0);
        assert_eq!(features.to_slots(), [None, None]);
    }

    #[test]
    fn test_min_distance_scales_with_rate() {
        // Pulses 0.3 s apart are closer than the 0.5 s beat spacing
        let features = extractor().extract(&pulse_train(0.3, 200, 6.0));
        let interval = features.mean_interval_s.unwrap();
        assert!(interval >= 0.5);
    }
}
