// src/api.rs
//! JSON request/response contract
//!
//! Request: `{"ppg": [float, ...], "fs": int}` with `fs` optional.
//! Success: `{"sbp": float, "dbp": float, "filtered": [float, ...]}`, the two
//! estimates rounded to one decimal. Failure: `{"error": string}`, with a
//! 400 status for client-class failures and 500 for internal ones.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{BpError, BpResult};
use crate::processing::pipeline::{PredictionPipeline, PredictionResult};

/// Parsed prediction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub ppg: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<u32>,
}

impl PredictRequest {
    /// Decode a request body, reporting the offending field on failure.
    ///
    /// A missing or null `ppg` decodes to an empty waveform, which the
    /// pipeline then rejects as invalid input.
    pub fn from_json(body: &[u8]) -> BpResult<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| BpError::invalid_input("body", format!("malformed JSON: {}", e)))?;
        let object = value
            .as_object()
            .ok_or_else(|| BpError::invalid_input("body", "expected a JSON object"))?;

        let ppg = match object.get("ppg") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    item.as_f64().ok_or_else(|| {
                        BpError::invalid_input("ppg", format!("sample {} is not a number", i))
                    })
                })
                .collect::<BpResult<Vec<f64>>>()?,
            Some(_) => return Err(BpError::invalid_input("ppg", "expected an array of numbers")),
        };

        let fs = match object.get("fs") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(parse_sample_rate(n)?),
            Some(_) => return Err(BpError::invalid_input("fs", "expected an integer")),
        };

        Ok(Self { ppg, fs })
    }
}

/// Accept any JSON number with an integral value, so `100` and `100.0` agree
fn parse_sample_rate(n: &serde_json::Number) -> BpResult<u32> {
    let rate = match n.as_i64() {
        Some(rate) => rate as f64,
        None => n
            .as_f64()
            .ok_or_else(|| BpError::invalid_input("fs", format!("{} is out of range", n)))?,
    };

    if !rate.is_finite() || rate.fract() != 0.0 {
        return Err(BpError::invalid_input("fs", format!("{} is not an integer", n)));
    }
    if rate <= 0.0 {
        return Err(BpError::invalid_input("fs", "sample rate must be positive"));
    }
    if rate > u32::MAX as f64 {
        return Err(BpError::invalid_input("fs", format!("{} is out of range", n)));
    }
    Ok(rate as u32)
}

/// Successful prediction body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub sbp: f64,
    pub dbp: f64,
    pub filtered: Vec<f64>,
}

impl From<PredictionResult> for PredictResponse {
    fn from(result: PredictionResult) -> Self {
        Self {
            sbp: round_one_decimal(result.sbp),
            dbp: round_one_decimal(result.dbp),
            filtered: result.filtered.into_samples(),
        }
    }
}

/// Failure body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Status code plus JSON body, ready for any transport
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    fn from_error(err: &BpError) -> Self {
        let body = ErrorResponse {
            error: err.to_string(),
        };
        Self {
            status: err.status_code(),
            body: serde_json::json!(body),
        }
    }
}

/// Decode, run and encode one prediction request
pub fn handle_predict(pipeline: &PredictionPipeline, body: &[u8]) -> ApiResponse {
    match predict_request(pipeline, body) {
        Ok(response) => {
            info!(sbp = response.sbp, dbp = response.dbp, "Prediction served");
            ApiResponse {
                status: 200,
                body: serde_json::json!(response),
            }
        }
        Err(err) => {
            warn!(kind = ?err.kind(), error = %err, "Prediction failed");
            ApiResponse::from_error(&err)
        }
    }
}

fn predict_request(pipeline: &PredictionPipeline, body: &[u8]) -> BpResult<PredictResponse> {
    let request = PredictRequest::from_json(body)?;
    let fs = request.fs.unwrap_or_else(|| pipeline.default_sample_rate());
    pipeline.predict(&request.ppg, fs).map(PredictResponse::from)
}

/// Round half away from zero to one decimal place
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
