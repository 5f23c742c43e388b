//! ONNX graph execution through ONNX Runtime
//!
//! The graph must take a single `[1, 21]` f32 input and produce the
//! prediction as the first element of its first output.

use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;

use super::model::PredictiveModel;
use super::ModelError;
use crate::config::constants::features::FEATURE_COUNT;
use crate::processing::aggregator::FeatureVector;

/// ONNX regression model
///
/// `Session::run` needs exclusive access, so concurrent predictions on the
/// same model serialize on the session lock.
pub struct OnnxModel {
    session: Mutex<Session>,
    input_name: String,
}

impl OnnxModel {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        let session = Session::builder()
            .and_then(|builder| builder.commit_from_memory(bytes))
            .map_err(|e| ModelError::InvalidArtifact(e.to_string()))?;

        let input_name = match session.inputs.as_slice() {
            [input] => input.name.clone(),
            inputs => {
                return Err(ModelError::InvalidArtifact(format!(
                    "expected one graph input, found {}",
                    inputs.len()
                )))
            }
        };

        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }
}

impl std::fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxModel")
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl PredictiveModel for OnnxModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let input = Tensor::from_array(([1usize, FEATURE_COUNT], features.to_f32_vec()))
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        let (_, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        data.first()
            .map(|&value| value as f64)
            .ok_or_else(|| ModelError::Inference("graph produced an empty output".to_string()))
    }

    fn describe(&self) -> String {
        format!("onnx graph (input '{}')", self.input_name)
    }
}
