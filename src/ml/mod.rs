// src/ml/mod.rs
//! Regression model loading and inference
//!
//! The pipeline sees a model only as `predict(FeatureVector) -> f64`. Two
//! on-disk formats are understood natively (JSON linear and tree ensemble
//! artifacts); ONNX graphs run through `ort` when the `onnx` feature is on.

pub mod model;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod registry;

use std::path::PathBuf;
use thiserror::Error;

use crate::utils::integrity::IntegrityError;

pub use model::{
    load_model, Aggregation, LinearModel, ModelArtifact, PredictiveModel, StandardScaler, Tree,
    TreeEnsembleModel, TreeNode,
};
#[cfg(feature = "onnx")]
pub use onnx::OnnxModel;
pub use registry::{ModelKind, ModelRegistry};

/// Model loading and inference errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("integrity check failed: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("expected {expected} features, model takes {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("unsupported model format: {0}")]
    UnsupportedFormat(String),

    #[error("inference failed: {0}")]
    Inference(String),
}
