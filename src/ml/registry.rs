//! Process-wide holder of the SBP and DBP models
//!
//! Built once at startup and never mutated afterwards, so it can be shared
//! behind an `Arc` without locking.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::model::{load_model, PredictiveModel};
use crate::config::ModelConfig;
use crate::error::{BpError, BpResult};

/// Which blood pressure quantity a model estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Sbp,
    Dbp,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Sbp => write!(f, "SBP"),
            ModelKind::Dbp => write!(f, "DBP"),
        }
    }
}

#[derive(Debug)]
enum RegistryState {
    Ready {
        sbp: Arc<dyn PredictiveModel>,
        dbp: Arc<dyn PredictiveModel>,
    },
    Unavailable {
        reason: String,
    },
}

/// Both regression models, or the reason they could not be loaded.
///
/// Loading is all-or-nothing: if either artifact fails, neither model is
/// served.
#[derive(Debug)]
pub struct ModelRegistry {
    state: RegistryState,
}

impl ModelRegistry {
    /// Load both artifacts named in the configuration
    pub fn load(config: &ModelConfig) -> Self {
        let sbp = load_model(&config.sbp_path, config.sbp_crc32);
        let dbp = load_model(&config.dbp_path, config.dbp_crc32);

        match (sbp, dbp) {
            (Ok(sbp), Ok(dbp)) => {
                info!(
                    sbp = %sbp.describe(),
                    dbp = %dbp.describe(),
                    "BP models loaded successfully"
                );
                Self::from_models(sbp, dbp)
            }
            (sbp, dbp) => {
                let reason = [
                    (ModelKind::Sbp, &config.sbp_path, sbp.err()),
                    (ModelKind::Dbp, &config.dbp_path, dbp.err()),
                ]
                .into_iter()
                .filter_map(|(kind, path, err)| {
                    err.map(|e| format!("{} model {}: {}", kind, path.display(), e))
                })
                .collect::<Vec<_>>()
                .join("; ");

                error!(%reason, "Error loading models");
                Self::unavailable(reason)
            }
        }
    }

    /// Registry over already constructed models
    pub fn from_models(sbp: Arc<dyn PredictiveModel>, dbp: Arc<dyn PredictiveModel>) -> Self {
        Self {
            state: RegistryState::Ready { sbp, dbp },
        }
    }

    /// Registry that refuses every lookup
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: RegistryState::Unavailable {
                reason: reason.into(),
            },
        }
    }

    pub fn get(&self, kind: ModelKind) -> BpResult<&dyn PredictiveModel> {
        match &self.state {
            RegistryState::Ready { sbp, dbp } => Ok(match kind {
                ModelKind::Sbp => sbp.as_ref(),
                ModelKind::Dbp => dbp.as_ref(),
            }),
            RegistryState::Unavailable { reason } => Err(BpError::model_unavailable(reason.clone())),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, RegistryState::Ready { .. })
    }

    /// Fail with `ModelUnavailable` unless both models are loaded
    pub fn ensure_ready(&self) -> BpResult<()> {
        match &self.state {
            RegistryState::Ready { .. } => Ok(()),
            RegistryState::Unavailable { reason } => Err(BpError::model_unavailable(reason.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::constants::features::FEATURE_COUNT;
    use crate::error::ErrorKind;
    use crate::ml::{LinearModel, ModelArtifact};
    use crate::processing::aggregator::FeatureVector;
    use tempfile::TempDir;

    fn constant_model(value: f64) -> Arc<dyn PredictiveModel> {
        Arc::new(LinearModel {
            intercept: value,
            coefficients: vec![0.0; FEATURE_COUNT],
            scaler: None,
        })
    }

    fn write_artifact(dir: &TempDir, name: &str, intercept: f64) -> std::path::PathBuf {
        let artifact = ModelArtifact::Linear(LinearModel {
            intercept,
            coefficients: vec![0.0; FEATURE_COUNT],
            scaler: None,
        });
        let path = dir.path().join(name);
        std::fs::write(&path, serde_json::to_string(&artifact).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_get_by_kind() {
        let registry = ModelRegistry::from_models(constant_model(120.0), constant_model(80.0));
        let features = FeatureVector::new([0.0; FEATURE_COUNT]);

        assert!(registry.is_ready());
        assert_eq!(registry.get(ModelKind::Sbp).unwrap().predict(&features).unwrap(), 120.0);
        assert_eq!(registry.get(ModelKind::Dbp).unwrap().predict(&features).unwrap(), 80.0);
    }

    #[test]
    fn test_unavailable_registry() {
        let registry = ModelRegistry::unavailable("no artifacts");
        assert!(!registry.is_ready());

        let err = registry.get(ModelKind::Sbp).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
        assert!(registry.ensure_ready().is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = TempDir::new().unwrap();
        let config = ModelConfig {
            sbp_path: write_artifact(&dir, "sys.json", 121.0),
            dbp_path: write_artifact(&dir, "dys.json", 79.0),
            sbp_crc32: None,
            dbp_crc32: None,
        };

        let registry = ModelRegistry::load(&config);
        assert!(registry.is_ready());
        let features = FeatureVector::new([0.5; FEATURE_COUNT]);
        assert_eq!(registry.get(ModelKind::Dbp).unwrap().predict(&features).unwrap(), 79.0);
    }

    #[test]
    fn test_one_missing_artifact_disables_both() {
        let dir = TempDir::new().unwrap();
        let config = ModelConfig {
            sbp_path: write_artifact(&dir, "sys.json", 121.0),
            dbp_path: dir.path().join("dys.json"),
            sbp_crc32: None,
            dbp_crc32: None,
        };

        let registry = ModelRegistry::load(&config);
        assert!(!registry.is_ready());

        let err = registry.get(ModelKind::Sbp).unwrap_err();
        assert!(err.to_string().contains("DBP model"));
    }
}
