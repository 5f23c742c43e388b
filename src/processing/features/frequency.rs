//! Frequency domain feature extraction for PPG waveforms
//!
//! Power spectral density is estimated with Welch's method: periodic Hann
//! window, 50% overlap, per-segment mean removal, one-sided density scaling
//! and a plain average over segments.

use crate::config::constants::features::FREQUENCY_DOMAIN_FEATURE_COUNT;
use crate::processing::waveform::Waveform;
use rustfft::{num_complex::Complex64, Fft, FftPlanner};
use std::f64::consts::PI;

/// Spectral summary of the normalized waveform
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyDomainFeatures {
    pub dominant_frequency_hz: f64, // Bin with the largest estimated power
    pub total_power: f64,           // Sum of the PSD over all bins
}

impl FrequencyDomainFeatures {
    pub const NAMES: [&'static str; FREQUENCY_DOMAIN_FEATURE_COUNT] =
        ["dominant_frequency", "total_power"];

    pub fn to_slots(&self) -> [Option<f64>; FREQUENCY_DOMAIN_FEATURE_COUNT] {
        [Some(self.dominant_frequency_hz), Some(self.total_power)]
    }
}

/// One-sided power spectral density estimate
#[derive(Debug, Clone)]
pub struct Periodogram {
    pub frequencies: Vec<f64>,
    pub psd: Vec<f64>,
    pub segments: usize,
}

/// Frequency domain feature extractor
#[derive(Debug, Clone)]
pub struct FrequencyDomainExtractor {
    max_segment: usize,
}

impl FrequencyDomainExtractor {
    pub fn new(config: &super::FeatureConfig) -> Self {
        Self {
            max_segment: config.welch_max_segment.max(1),
        }
    }

    pub fn extract(&self, waveform: &Waveform) -> FrequencyDomainFeatures {
        let periodogram = self.welch(waveform);

        let dominant_bin = periodogram
            .psd
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |(best, best_power), (i, &p)| {
                if p > best_power {
                    (i, p)
                } else {
                    (best, best_power)
                }
            })
            .0;

        FrequencyDomainFeatures {
            dominant_frequency_hz: periodogram.frequencies[dominant_bin],
            total_power: periodogram.psd.iter().sum(),
        }
    }

    /// Welch PSD with segment length `min(max_segment, len)`
    pub fn welch(&self, waveform: &Waveform) -> Periodogram {
        let data = waveform.samples();
        let fs = waveform.sample_rate() as f64;

        let segment_len = self.max_segment.min(data.len());
        let overlap = segment_len / 2;
        let step = segment_len - overlap;
        let segments = (data.len() - overlap) / step;

        let window = Self::create_hann_window(segment_len);
        let scale = 1.0 / (fs * window.iter().map(|w| w * w).sum::<f64>());

        let bins = segment_len / 2 + 1;
        let fft = FftPlanner::<f64>::new().plan_fft_forward(segment_len);
        let mut buffer = vec![Complex64::new(0.0, 0.0); segment_len];
        let mut psd = vec![0.0; bins];

        for seg in 0..segments {
            let segment = &data[seg * step..seg * step + segment_len];
            let mean = segment.iter().sum::<f64>() / segment_len as f64;

            for ((slot, &x), &w) in buffer.iter_mut().zip(segment).zip(&window) {
                *slot = Complex64::new((x - mean) * w, 0.0);
            }
            fft.process(&mut buffer);

            for (acc, value) in psd.iter_mut().zip(&buffer) {
                *acc += value.norm_sqr() * scale;
            }
        }

        // Fold negative frequencies in; DC and (even length) Nyquist appear once
        let folded_end = if segment_len % 2 == 0 { bins - 1 } else { bins };
        for p in psd.iter_mut().take(folded_end).skip(1) {
            *p *= 2.0;
        }
        for p in psd.iter_mut() {
            *p /= segments as f64;
        }

        let frequencies = (0..bins)
            .map(|k| k as f64 * fs / segment_len as f64)
            .collect();

        Periodogram {
            frequencies,
            psd,
            segments,
        }
    }

    fn create_hann_window(size: usize) -> Vec<f64> {
        if size == 1 {
            return vec![1.0];
        }
        (0..size)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / size as f64).cos())
            .collect()
    }
}
