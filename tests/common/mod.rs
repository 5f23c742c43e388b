//! Shared helpers for integration tests

#![allow(dead_code)]

use std::f64::consts::PI;
use std::sync::Arc;

use ppg_bp_core::ml::{ModelError, PredictiveModel};
use ppg_bp_core::{BpConfig, FeatureVector, ModelRegistry, PredictionPipeline};

/// Synthetic PPG: a systolic Gaussian pulse plus a smaller, later diastolic
/// wave per beat. Beat amplitude grows by 15% per beat so successive valleys
/// deepen after filtering.
pub fn synthetic_ppg(duration_s: f64, sample_rate: u32, beat_period_s: f64) -> Vec<f64> {
    let fs = sample_rate as f64;
    let len = (duration_s * fs) as usize;
    let beats = (duration_s / beat_period_s) as usize + 2;

    (0..len)
        .map(|i| {
            let t = i as f64 / fs;
            (0..beats)
                .map(|k| {
                    let onset = 0.2 + k as f64 * beat_period_s;
                    let amplitude = 1.0 + 0.15 * k as f64;
                    amplitude * gaussian(t - onset, 0.08)
                        + 0.4 * amplitude * gaussian(t - onset - 0.25, 0.1)
                })
                .sum()
        })
        .collect()
}

/// Constant-amplitude pulse train: every beat identical, the first systolic
/// peak at `onset_s`
pub fn pulse_train(duration_s: f64, sample_rate: u32, beat_period_s: f64, onset_s: f64) -> Vec<f64> {
    let fs = sample_rate as f64;
    let len = (duration_s * fs) as usize;
    let beats = (duration_s / beat_period_s) as usize + 2;

    (0..len)
        .map(|i| {
            let t = i as f64 / fs;
            (0..beats)
                .map(|k| {
                    let onset = onset_s + k as f64 * beat_period_s;
                    gaussian(t - onset, 0.08) + 0.4 * gaussian(t - onset - 0.25, 0.1)
                })
                .sum()
        })
        .collect()
}

fn gaussian(x: f64, sigma: f64) -> f64 {
    (-x * x / (2.0 * sigma * sigma)).exp()
}

pub fn sine(freq_hz: f64, sample_rate: u32, len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| (2.0 * PI * freq_hz * i as f64 / sample_rate as f64).sin())
        .collect()
}

/// Model that ignores its input
#[derive(Debug)]
pub struct ConstantModel(pub f64);

impl PredictiveModel for ConstantModel {
    fn predict(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
        Ok(self.0)
    }

    fn describe(&self) -> String {
        format!("constant {}", self.0)
    }
}

pub fn constant_registry(sbp: f64, dbp: f64) -> Arc<ModelRegistry> {
    Arc::new(ModelRegistry::from_models(
        Arc::new(ConstantModel(sbp)),
        Arc::new(ConstantModel(dbp)),
    ))
}

pub fn constant_pipeline(sbp: f64, dbp: f64) -> PredictionPipeline {
    PredictionPipeline::new(&BpConfig::default(), constant_registry(sbp, dbp))
        .expect("default configuration is valid")
}
