//! Time domain feature extraction for PPG waveforms

use crate::config::constants::features::TIME_DOMAIN_FEATURE_COUNT;
use crate::processing::waveform::Waveform;

const MOMENT_RESOLUTION: f64 = 1e-15;

/// Descriptive statistics of the normalized waveform
#[derive(Debug, Clone, PartialEq)]
pub struct TimeDomainFeatures {
    pub mean: f64,
    pub std_dev: f64,                // Population standard deviation
    pub max: f64,
    pub min: f64,
    pub range: f64,
    pub skewness: Option<f64>,       // Missing for a constant waveform
    pub excess_kurtosis: Option<f64>,
    pub entropy: f64,                // Shannon entropy of |x|, nats
}

impl TimeDomainFeatures {
    pub const NAMES: [&'static str; TIME_DOMAIN_FEATURE_COUNT] = [
        "mean", "std", "max", "min", "range", "skewness", "kurtosis", "entropy",
    ];

    pub fn to_slots(&self) -> [Option<f64>; TIME_DOMAIN_FEATURE_COUNT] {
        [
            Some(self.mean),
            Some(self.std_dev),
            Some(self.max),
            Some(self.min),
            Some(self.range),
            self.skewness,
            self.excess_kurtosis,
            Some(self.entropy),
        ]
    }
}

/// Time domain feature extractor
#[derive(Debug, Clone)]
pub struct TimeDomainExtractor {
    entropy_offset: f64, // Keeps log() away from zero
}

impl TimeDomainExtractor {
    pub fn new(config: &super::FeatureConfig) -> Self {
        Self {
            entropy_offset: config.entropy_offset,
        }
    }

    pub fn extract(&self, waveform: &Waveform) -> TimeDomainFeatures {
        let data = waveform.samples();
        let n = data.len() as f64;

        let mean = data.iter().sum::<f64>() / n;
        let (min, max) = data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            });

        let m2 = self.central_moment(data, mean, 2);
        let m3 = self.central_moment(data, mean, 3);
        let m4 = self.central_moment(data, mean, 4);

        // Variance indistinguishable from rounding noise counts as constant
        let (skewness, excess_kurtosis) = if m2 > (MOMENT_RESOLUTION * mean).powi(2) {
            (Some(m3 / m2.powf(1.5)), Some(m4 / (m2 * m2) - 3.0))
        } else {
            (None, None)
        };

        TimeDomainFeatures {
            mean,
            std_dev: m2.sqrt(),
            max,
            min,
            range: max - min,
            skewness,
            excess_kurtosis,
            entropy: self.calculate_entropy(data),
        }
    }

    fn central_moment(&self, data: &[f64], mean: f64, order: i32) -> f64 {
        data.iter().map(|&x| (x - mean).powi(order)).sum::<f64>() / data.len() as f64
    }

    fn calculate_entropy(&self, data: &[f64]) -> f64 {
        let weights: Vec<f64> = data.iter().map(|&x| x.abs() + self.entropy_offset).collect();
        let total: f64 = weights.iter().sum();

        -weights
            .iter()
            .map(|&w| {
                let p = w / total;
                p * p.ln()
            })
            .sum::<f64>()
    }
}
