// src/error.rs
//! Unified error handling for the PPG blood pressure core
//!
//! Every failure a prediction can end in is one of four kinds: invalid input,
//! a filter rejection, unavailable models, or a numerical failure further down
//! the pipeline. Lower layers keep their own error types (`FilterError`,
//! `ModelError`, `ConfigError`) and convert into [`BpError`] at the boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ml::ModelError;
use crate::processing::filters::FilterError;

/// Unified error type returned by the prediction pipeline
#[derive(Debug, Error)]
pub enum BpError {
    /// Missing or empty waveform, non-numeric samples, non-positive sample rate
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// Waveform too short or cutoffs invalid for the requested filter
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    /// One or both regression models failed to load at startup
    #[error("models not loaded: {reason}")]
    ModelUnavailable { reason: String },

    /// Numerical failure during extraction, imputation or inference
    #[error("prediction failed during {stage:?}: {reason}")]
    Prediction {
        stage: ProcessingStage,
        reason: String,
    },
}

/// Pipeline stages, used to locate a [`BpError::Prediction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    Validation,
    Filtering,
    Normalization,
    FeatureExtraction,
    Imputation,
    Inference,
}

/// Discriminant of [`BpError`], stable across message changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    FilterError,
    ModelUnavailable,
    PredictionError,
}

impl BpError {
    pub fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        BpError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn model_unavailable(reason: impl Into<String>) -> Self {
        BpError::ModelUnavailable {
            reason: reason.into(),
        }
    }

    pub fn prediction(stage: ProcessingStage, reason: impl Into<String>) -> Self {
        BpError::Prediction {
            stage,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BpError::InvalidInput { .. } => ErrorKind::InvalidInput,
            BpError::Filter(_) => ErrorKind::FilterError,
            BpError::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            BpError::Prediction { .. } => ErrorKind::PredictionError,
        }
    }

    /// Client-class failures (bad request, models not loaded) versus internal
    /// failures during filtering, extraction or inference
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BpError::InvalidInput { .. } | BpError::ModelUnavailable { .. }
        )
    }

    /// HTTP status the failure maps to
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }
}

impl From<ModelError> for BpError {
    fn from(err: ModelError) -> Self {
        BpError::prediction(ProcessingStage::Inference, err.to_string())
    }
}

/// Result type alias for pipeline operations
pub type BpResult<T> = Result<T, BpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = BpError::invalid_input("ppg", "waveform is empty");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.is_client_error());
        assert_eq!(err.status_code(), 400);

        let err = BpError::model_unavailable("sys.json missing");
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
        assert_eq!(err.status_code(), 400);

        let err = BpError::prediction(ProcessingStage::Imputation, "pwir missing");
        assert_eq!(err.kind(), ErrorKind::PredictionError);
        assert!(!err.is_client_error());
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_filter_error_conversion() {
        let err: BpError = FilterError::InputTooShort {
            len: 10,
            required: 22,
        }
        .into();

        assert_eq!(err.kind(), ErrorKind::FilterError);
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("22"));
    }

    #[test]
    fn test_model_error_becomes_inference_failure() {
        let err: BpError = ModelError::Inference("non-finite output".to_string()).into();

        match err {
            BpError::Prediction { stage, reason } => {
                assert_eq!(stage, ProcessingStage::Inference);
                assert!(reason.contains("non-finite"));
            }
            other => panic!("Expected prediction error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_display() {
        let err = BpError::invalid_input("fs", "sample rate must be positive");
        assert_eq!(err.to_string(), "invalid fs: sample rate must be positive");
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BpError>();
    }
}
