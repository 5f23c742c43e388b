//! PPG-BP-Core: blood pressure estimation from photoplethysmogram waveforms
//!
//! Turns one raw single-channel PPG waveform into a systolic and diastolic
//! blood pressure estimate:
//!
//! - Zero-phase Butterworth band-pass filtering
//! - Min-max normalization
//! - 21 features across time domain, spectral, pulse interval and fiducial
//!   morphology families, extracted in parallel
//! - Column-wise mean imputation of features that could not be computed
//! - Two pre-trained regression models held in a read-only registry
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ppg_bp_core::config::ConfigLoader;
//! use ppg_bp_core::processing::PredictionPipeline;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().load()?;
//!     let pipeline = PredictionPipeline::from_config(&config)?;
//!
//!     let ppg: Vec<f64> = (0..500)
//!         .map(|i| (2.0 * std::f64::consts::PI * 1.2 * i as f64 / 100.0).sin())
//!         .collect();
//!     let result = pipeline.predict(&ppg, 100)?;
//!     println!("SBP {:.1} / DBP {:.1}", result.sbp, result.dbp);
//!
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod api;
pub mod config;
pub mod error;
pub mod ml;
pub mod processing;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{BpConfig, ConfigLoader};
pub use error::{BpError, BpResult, ErrorKind, ProcessingStage};
pub use ml::{ModelKind, ModelRegistry, PredictiveModel};
pub use processing::{
    FeatureVector, PartialFeatureVector, PredictionPipeline, PredictionResult, Waveform,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    let mut features = vec![
        "Zero-phase band-pass filtering".to_string(),
        "21-column PPG feature extraction".to_string(),
        "Mean imputation of missing features".to_string(),
        "Native JSON regression models".to_string(),
    ];
    if cfg!(feature = "onnx") {
        features.push("ONNX Runtime inference".to_string());
    }

    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Blood pressure estimation from PPG waveforms".to_string(),
        features,
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
}
