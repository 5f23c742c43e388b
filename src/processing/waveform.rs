//! Single-channel PPG waveform

use crate::error::{BpError, BpResult};
use serde::Serialize;

/// Ordered floating-point samples plus the rate they were taken at.
///
/// Always non-empty, finite and with a positive sample rate; the only way in
/// from outside the crate is [`Waveform::new`], which checks all three.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waveform {
    samples: Vec<f64>,
    sample_rate: u32,
}

impl Waveform {
    /// Validate raw samples into a waveform
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> BpResult<Self> {
        if samples.is_empty() {
            return Err(BpError::invalid_input("ppg", "waveform is empty"));
        }
        if let Some(index) = samples.iter().position(|x| !x.is_finite()) {
            return Err(BpError::invalid_input(
                "ppg",
                format!("sample {} is not a finite number", index),
            ));
        }
        if sample_rate == 0 {
            return Err(BpError::invalid_input("fs", "sample rate must be positive"));
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Wrap samples derived from an already validated waveform
    pub(crate) fn derived(samples: Vec<f64>, sample_rate: u32) -> Self {
        debug_assert!(!samples.is_empty() && sample_rate > 0);
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}
