//! Predictive model capability and native JSON artifacts

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ModelError;
use crate::config::constants::features::FEATURE_COUNT;
use crate::config::constants::models::ONNX_EXTENSION;
use crate::processing::aggregator::FeatureVector;
use crate::utils::integrity::verify_crc32;

/// A trained scalar regressor over the 21-column feature vector
pub trait PredictiveModel: Send + Sync + fmt::Debug {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;

    /// Short human-readable description, for logs
    fn describe(&self) -> String;
}

/// On-disk JSON model artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsembleModel),
}

impl ModelArtifact {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            ModelArtifact::Linear(model) => model.validate(),
            ModelArtifact::TreeEnsemble(model) => model.validate(),
        }
    }

    pub fn into_model(self) -> Result<Arc<dyn PredictiveModel>, ModelError> {
        self.validate()?;
        Ok(match self {
            ModelArtifact::Linear(model) => Arc::new(model),
            ModelArtifact::TreeEnsemble(model) => Arc::new(model),
        })
    }
}

/// Per-column standardization applied before a linear model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// `intercept + sum(coef_i * x_i)`, optionally on standardized inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<StandardScaler>,
}

impl LinearModel {
    fn validate(&self) -> Result<(), ModelError> {
        check_width(self.coefficients.len())?;
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::InvalidArtifact(
                "linear coefficients must be finite".to_string(),
            ));
        }

        if let Some(scaler) = &self.scaler {
            check_width(scaler.mean.len())?;
            check_width(scaler.scale.len())?;
            if scaler.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                return Err(ModelError::InvalidArtifact(
                    "scaler scale must be finite and non-zero".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl PredictiveModel for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let x = features.as_slice();
        let weighted: f64 = match &self.scaler {
            Some(scaler) => x
                .iter()
                .zip(&self.coefficients)
                .zip(scaler.mean.iter().zip(&scaler.scale))
                .map(|((x, c), (m, s))| c * (x - m) / s)
                .sum(),
            None => x.iter().zip(&self.coefficients).map(|(x, c)| c * x).sum(),
        };
        Ok(self.intercept + weighted)
    }

    fn describe(&self) -> String {
        format!(
            "linear model ({} coefficients{})",
            self.coefficients.len(),
            if self.scaler.is_some() { ", scaled" } else { "" }
        )
    }
}

/// How tree outputs are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Gradient boosting: base score plus the sum of tree outputs
    #[default]
    Sum,
    /// Random forest: base score plus the mean of tree outputs
    Mean,
}

/// Decision tree node; index 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go to `left` when `x[feature] <= threshold`, else to `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    fn validate(&self, index: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::InvalidArtifact(format!("tree {} is empty", index)));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(ModelError::InvalidArtifact(format!(
                            "tree {} node {} splits on feature {}",
                            index, i, feature
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(ModelError::InvalidArtifact(format!(
                            "tree {} node {} has a NaN threshold",
                            index, i
                        )));
                    }
                    // Children after their parent keeps every walk finite
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(ModelError::InvalidArtifact(format!(
                                "tree {} node {} has child index {} out of range",
                                index, i, child
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(ModelError::InvalidArtifact(format!(
                            "tree {} node {} has a non-finite leaf",
                            index, i
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, x: &[f64]) -> f64 {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Additive ensemble of decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsembleModel {
    #[serde(default)]
    pub base_score: f64,
    #[serde(default)]
    pub aggregation: Aggregation,
    pub trees: Vec<Tree>,
}

impl TreeEnsembleModel {
    fn validate(&self) -> Result<(), ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::InvalidArtifact("ensemble has no trees".to_string()));
        }
        if !self.base_score.is_finite() {
            return Err(ModelError::InvalidArtifact("base_score must be finite".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i)?;
        }
        Ok(())
    }
}

impl PredictiveModel for TreeEnsembleModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let x = features.as_slice();
        let total: f64 = self.trees.iter().map(|tree| tree.evaluate(x)).sum();
        let combined = match self.aggregation {
            Aggregation::Sum => total,
            Aggregation::Mean => total / self.trees.len() as f64,
        };
        Ok(self.base_score + combined)
    }

    fn describe(&self) -> String {
        format!("tree ensemble ({} trees, {:?})", self.trees.len(), self.aggregation)
    }
}

fn check_width(actual: usize) -> Result<(), ModelError> {
    if actual != FEATURE_COUNT {
        return Err(ModelError::Shape {
            expected: FEATURE_COUNT,
            actual,
        });
    }
    Ok(())
}

/// Load a model artifact, verifying its CRC-32 first when one is given
pub fn load_model(
    path: &Path,
    expected_crc32: Option<u32>,
) -> Result<Arc<dyn PredictiveModel>, ModelError> {
    let bytes = fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(crc) = expected_crc32 {
        verify_crc32(&bytes, crc, &path.display().to_string())?;
    }

    let is_onnx = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ONNX_EXTENSION));
    if is_onnx {
        return load_onnx(path, &bytes);
    }

    let text = std::str::from_utf8(&bytes).map_err(|e| ModelError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let artifact = ModelArtifact::from_json(text).map_err(|e| ModelError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let model = artifact.into_model()?;
    debug!(path = %path.display(), model = %model.describe(), "Model artifact parsed");
    Ok(model)
}

#[cfg(feature = "onnx")]
fn load_onnx(_path: &Path, bytes: &[u8]) -> Result<Arc<dyn PredictiveModel>, ModelError> {
    Ok(Arc::new(super::onnx::OnnxModel::from_bytes(bytes)?))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(path: &Path, _bytes: &[u8]) -> Result<Arc<dyn PredictiveModel>, ModelError> {
    Err(ModelError::UnsupportedFormat(format!(
        "{} needs the `onnx` feature",
        path.display()
    )))
}
