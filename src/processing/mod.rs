// src/processing/mod.rs
//! Signal processing pipeline for PPG data

pub mod aggregator;
pub mod features;
pub mod filters;
pub mod normalizer;
pub mod peaks;
pub mod pipeline;
pub mod waveform;

pub use aggregator::{FeatureVector, MeanImputer, PartialFeatureVector, FEATURE_NAMES};
pub use features::{FeatureExtractor, FeatureFamilies};
pub use filters::{BandpassFilter, FilterError};
pub use normalizer::WaveformNormalizer;
pub use pipeline::{PredictionPipeline, PredictionResult, PreparedWaveform};
pub use waveform::Waveform;
