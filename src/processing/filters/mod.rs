// src/processing/filters/mod.rs
//! Digital filters for PPG signal conditioning

pub mod butterworth;
pub mod zero_phase;

pub use butterworth::butterworth_bandpass;
pub use zero_phase::{filtfilt, lfilter, lfilter_zi};

use crate::config::{constants::filters as limits, FilterConfig};
use crate::processing::waveform::Waveform;
use thiserror::Error;
use tracing::debug;

/// Filter coefficients for IIR filters, `a[0]` normalized to 1
#[derive(Debug, Clone, PartialEq)]
pub struct IirCoefficients {
    pub b: Vec<f64>, // Numerator coefficients
    pub a: Vec<f64>, // Denominator coefficients
}

impl IirCoefficients {
    /// Samples of odd extension added at each edge by zero-phase filtering
    pub fn pad_length(&self) -> usize {
        limits::PAD_LENGTH_FACTOR * self.a.len().max(self.b.len())
    }
}

/// Filter error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("filter order must be {}-{}, got {order}", limits::MIN_FILTER_ORDER, limits::MAX_FILTER_ORDER)]
    InvalidOrder { order: usize },

    #[error("cutoffs must satisfy 0 < {lowcut_hz} Hz < {highcut_hz} Hz < Nyquist ({nyquist_hz} Hz)")]
    InvalidCutoff {
        lowcut_hz: f64,
        highcut_hz: f64,
        nyquist_hz: f64,
    },

    #[error("waveform of {len} samples is too short, zero-phase filtering needs at least {required}")]
    InputTooShort { len: usize, required: usize },

    #[error("invalid coefficients: {0}")]
    InvalidCoefficients(String),
}

/// Zero-phase Butterworth band-pass filter.
///
/// Coefficients depend on the waveform's sample rate, so they are designed
/// per call; the struct only holds the band and order.
#[derive(Debug, Clone, PartialEq)]
pub struct BandpassFilter {
    lowcut_hz: f64,
    highcut_hz: f64,
    order: usize,
}

impl Default for BandpassFilter {
    fn default() -> Self {
        Self::from_config(&FilterConfig::default())
    }
}

impl BandpassFilter {
    pub fn new(lowcut_hz: f64, highcut_hz: f64, order: usize) -> Self {
        Self {
            lowcut_hz,
            highcut_hz,
            order,
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.lowcut_hz, config.highcut_hz, config.order)
    }

    /// Design the digital coefficients for a given sample rate
    pub fn coefficients(&self, sample_rate: u32) -> Result<IirCoefficients, FilterError> {
        let nyquist_hz = 0.5 * sample_rate as f64;
        let low = self.lowcut_hz / nyquist_hz;
        let high = self.highcut_hz / nyquist_hz;

        if !(low > 0.0 && low < high && high < 1.0) {
            return Err(FilterError::InvalidCutoff {
                lowcut_hz: self.lowcut_hz,
                highcut_hz: self.highcut_hz,
                nyquist_hz,
            });
        }

        butterworth_bandpass(self.order, low, high)
    }

    /// Shortest waveform this filter accepts
    pub fn min_input_len(&self) -> usize {
        // Band-pass of order N has 2N + 1 coefficients
        limits::PAD_LENGTH_FACTOR * (2 * self.order + 1) + 1
    }

    /// Filter forward and backward; output has the input's length and no phase lag
    pub fn filter(&self, waveform: &Waveform) -> Result<Waveform, FilterError> {
        let coefficients = self.coefficients(waveform.sample_rate())?;
        let filtered = filtfilt(&coefficients, waveform.samples())?;

        debug!(
            samples = filtered.len(),
            sample_rate = waveform.sample_rate(),
            lowcut_hz = self.lowcut_hz,
            highcut_hz = self.highcut_hz,
            "Band-pass filtered waveform"
        );

        Ok(Waveform::derived(filtered, waveform.sample_rate()))
    }

    pub fn order(&self) -> usize {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_band() {
        let filter = BandpassFilter::default();
        assert_eq!(filter.order(), 3);
        assert_eq!(filter.min_input_len(), 22);
    }

    #[test]
    fn test_min_input_len_matches_pad_length() {
        let filter = BandpassFilter::default();
        let coefficients = filter.coefficients(100).unwrap();
        assert_eq!(coefficients.pad_length() + 1, filter.min_input_len());
    }

    #[test]
    fn test_cutoff_above_nyquist() {
        let filter = BandpassFilter::default();
        let result = filter.coefficients(10);
        assert!(matches!(result, Err(FilterError::InvalidCutoff { .. })));
    }

    #[test]
    fn test_inverted_cutoffs() {
        let filter = BandpassFilter::new(8.0, 0.5, 3);
        assert!(filter.coefficients(100).is_err());

        let filter = BandpassFilter::new(0.0, 8.0, 3);
        assert!(filter.coefficients(100).is_err());
    }

    #[test]
    fn test_short_waveform_rejected() {
        let filter = BandpassFilter::default();
        let waveform = Waveform::new(vec![0.5; 21], 100).unwrap();

        let err = filter.filter(&waveform).unwrap_err();
        assert_eq!(err, FilterError::InputTooShort { len: 21, required: 22 });
    }

    #[test]
    fn test_length_preserved() {
        let filter = BandpassFilter::default();
        let samples: Vec<f64> = (0..300).map(|i| (i as f64 * 0.1).sin()).collect();
        let waveform = Waveform::new(samples, 100).unwrap();

        let filtered = filter.filter(&waveform).unwrap();
        assert_eq!(filtered.len(), 300);
        assert_eq!(filtered.sample_rate(), 100);
    }
}
