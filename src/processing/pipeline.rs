// src/processing/pipeline.rs
//! Request-scoped prediction pipeline
//!
//! Validate → check models → filter → normalize → extract → impute →
//! predict SBP and DBP. Every stage either hands a value to the next or
//! ends the request with a typed [`BpError`]; nothing is retried and no
//! partial result is returned.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::BpConfig;
use crate::error::{BpError, BpResult, ProcessingStage};
use crate::ml::{ModelKind, ModelRegistry};
use crate::processing::aggregator::{FeatureVector, MeanImputer, PartialFeatureVector};
use crate::processing::features::FeatureExtractor;
use crate::processing::filters::BandpassFilter;
use crate::processing::normalizer::WaveformNormalizer;
use crate::processing::waveform::Waveform;

/// Outcome of one successful prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub sbp: f64,
    pub dbp: f64,
    /// Band-passed waveform, before normalization
    pub filtered: Waveform,
}

/// Filtered waveform and its features, before imputation
#[derive(Debug, Clone)]
pub struct PreparedWaveform {
    pub filtered: Waveform,
    pub features: PartialFeatureVector,
}

/// Stateless PPG → blood pressure pipeline.
///
/// Holds only configuration and a shared read-only model registry, so one
/// instance can serve any number of concurrent requests.
#[derive(Debug)]
pub struct PredictionPipeline {
    registry: Arc<ModelRegistry>,
    filter: BandpassFilter,
    normalizer: WaveformNormalizer,
    extractor: FeatureExtractor,
    imputer: MeanImputer,
    default_sample_rate: u32,
}

impl PredictionPipeline {
    pub fn new(config: &BpConfig, registry: Arc<ModelRegistry>) -> BpResult<Self> {
        config
            .validate_consistency()
            .map_err(|errors| BpError::invalid_input("config", errors.join("; ")))?;

        Ok(Self {
            registry,
            filter: BandpassFilter::from_config(&config.filter),
            normalizer: WaveformNormalizer::from_config(&config.normalization),
            extractor: FeatureExtractor::new(&config.features),
            imputer: MeanImputer::from_config(&config.imputation)?,
            default_sample_rate: config.request.default_sample_rate_hz,
        })
    }

    /// Load the models named in `config` and build a pipeline around them.
    ///
    /// Model load failures do not fail construction; the pipeline then
    /// answers every prediction with `ModelUnavailable`.
    pub fn from_config(config: &BpConfig) -> BpResult<Self> {
        let registry = Arc::new(ModelRegistry::load(&config.models));
        Self::new(config, registry)
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn default_sample_rate(&self) -> u32 {
        self.default_sample_rate
    }

    /// Predict SBP and DBP for one raw waveform
    pub fn predict(&self, samples: &[f64], sample_rate: u32) -> BpResult<PredictionResult> {
        let waveform = Waveform::new(samples.to_vec(), sample_rate)?;
        self.predict_waveform(&waveform)
    }

    pub fn predict_waveform(&self, waveform: &Waveform) -> BpResult<PredictionResult> {
        let start = Instant::now();

        // Fail before any numeric work
        self.registry.ensure_ready()?;

        let prepared = self.prepare(waveform)?;
        let features = self.imputer.impute(&prepared.features)?;
        let (sbp, dbp) = self.infer(&features)?;

        debug!(
            samples = waveform.len(),
            fs = waveform.sample_rate(),
            sbp,
            dbp,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Prediction complete"
        );

        Ok(PredictionResult {
            sbp,
            dbp,
            filtered: prepared.filtered,
        })
    }

    /// Predict a batch, imputing missing features from the batch column means
    pub fn predict_batch(&self, waveforms: &[Waveform]) -> BpResult<Vec<PredictionResult>> {
        self.registry.ensure_ready()?;

        let prepared = waveforms
            .par_iter()
            .map(|waveform| self.prepare(waveform))
            .collect::<BpResult<Vec<_>>>()?;

        let partial: Vec<PartialFeatureVector> = prepared.iter().map(|p| p.features).collect();
        let imputed = self.imputer.impute_batch(&partial)?;

        prepared
            .into_iter()
            .zip(imputed)
            .map(|(prepared, features)| {
                let (sbp, dbp) = self.infer(&features)?;
                Ok(PredictionResult {
                    sbp,
                    dbp,
                    filtered: prepared.filtered,
                })
            })
            .collect()
    }

    /// Filter, normalize and extract without touching the models
    pub fn prepare(&self, waveform: &Waveform) -> BpResult<PreparedWaveform> {
        let filtered = self.filter.filter(waveform)?;
        let normalized = self.normalizer.normalize(&filtered);
        if normalized.samples().iter().any(|x| !x.is_finite()) {
            return Err(BpError::prediction(
                ProcessingStage::Normalization,
                "normalized waveform contains non-finite samples",
            ));
        }

        let features = self.extractor.extract(&normalized);
        let missing = features.missing();
        if !missing.is_empty() {
            warn!(?missing, "Features missing after extraction");
        }

        Ok(PreparedWaveform { filtered, features })
    }

    fn infer(&self, features: &FeatureVector) -> BpResult<(f64, f64)> {
        let sbp = self.predict_one(ModelKind::Sbp, features)?;
        let dbp = self.predict_one(ModelKind::Dbp, features)?;
        Ok((sbp, dbp))
    }

    fn predict_one(&self, kind: ModelKind, features: &FeatureVector) -> BpResult<f64> {
        let value = self.registry.get(kind)?.predict(features)?;
        if !value.is_finite() {
            return Err(BpError::prediction(
                ProcessingStage::Inference,
                format!("{} model returned a non-finite value", kind),
            ));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::constants::features::FEATURE_COUNT;
    use crate::error::ErrorKind;
    use crate::ml::{ModelError, PredictiveModel};

    #[derive(Debug)]
    struct Constant(f64);

    impl PredictiveModel for Constant {
        fn predict(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
            Ok(self.0)
        }

        fn describe(&self) -> String {
            format!("constant {}", self.0)
        }
    }

    fn pipeline(sbp: f64, dbp: f64) -> PredictionPipeline {
        let registry = ModelRegistry::from_models(Arc::new(Constant(sbp)), Arc::new(Constant(dbp)));
        PredictionPipeline::new(&BpConfig::default(), Arc::new(registry)).unwrap()
    }

    /// 1.2 Hz sine with slowly growing amplitude, so the first valley is
    /// never the global minimum and every feature is defined
    fn sine(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let t = i as f64 / 100.0;
                (1.0 + 0.1 * t) * (2.0 * std::f64::consts::PI * 1.2 * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_pipeline_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PredictionPipeline>();
    }

    #[test]
    fn test_empty_waveform_invalid() {
        let err = pipeline(120.0, 80.0).predict(&[], 100).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_short_waveform_filter_error() {
        let err = pipeline(120.0, 80.0).predict(&sine(10), 100).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FilterError);
    }

    #[test]
    fn test_non_finite_model_output() {
        let err = pipeline(f64::NAN, 80.0).predict(&sine(500), 100);
        // Every feature is defined, so only the model can fail here
        match err {
            Err(BpError::Prediction { stage, .. }) => assert_eq!(stage, ProcessingStage::Inference),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_filtered_length_preserved() {
        let result = pipeline(120.0, 80.0).predict(&sine(500), 100).unwrap();
        assert_eq!(result.filtered.len(), 500);
        assert_eq!(result.sbp, 120.0);
        assert_eq!(result.dbp, 80.0);
    }

    #[test]
    fn test_batch_matches_single_when_complete() {
        let pipeline = pipeline(118.0, 76.0);
        let waveforms = vec![
            Waveform::new(sine(500), 100).unwrap(),
            Waveform::new(sine(400), 100).unwrap(),
        ];

        let batch = pipeline.predict_batch(&waveforms).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], pipeline.predict_waveform(&waveforms[1]).unwrap());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = BpConfig::default();
        config.imputation.fallback_means = vec![0.0; FEATURE_COUNT - 1];
        let registry = Arc::new(ModelRegistry::unavailable("unused"));

        let err = PredictionPipeline::new(&config, registry).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
