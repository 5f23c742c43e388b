// src/processing/aggregator.rs
//! Feature vector assembly and missing-value imputation
//!
//! The 21 columns are laid out as time domain, frequency domain, pulse
//! interval, morphology. Models are trained against exactly this order.

use crate::config::constants::features::{DEFAULT_MISSING_FILL, FEATURE_COUNT};
use crate::config::ImputationConfig;
use crate::error::{BpError, BpResult, ProcessingStage};
use crate::processing::features::{
    FrequencyDomainFeatures, MorphologyFeatures, PulseIntervalFeatures, TimeDomainFeatures,
};
use ndarray::{Array2, ArrayView1, Axis};
use serde::Serialize;
use tracing::warn;

/// Column names in model order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "mean",
    "std",
    "max",
    "min",
    "range",
    "skewness",
    "kurtosis",
    "entropy",
    "dominant_frequency",
    "total_power",
    "mean_ibi",
    "mean_peak_amplitude",
    "etr",
    "bd",
    "hr",
    "svc",
    "dvc",
    "smvc",
    "dmvc",
    "pwir",
    "pwat",
];

/// Extracted features before imputation; `None` marks a missing slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PartialFeatureVector {
    slots: [Option<f64>; FEATURE_COUNT],
}

impl PartialFeatureVector {
    pub fn new(slots: [Option<f64>; FEATURE_COUNT]) -> Self {
        Self { slots }
    }

    pub fn from_families(
        time: &TimeDomainFeatures,
        frequency: &FrequencyDomainFeatures,
        pulse: &PulseIntervalFeatures,
        morphology: &MorphologyFeatures,
    ) -> Self {
        let mut slots = [None; FEATURE_COUNT];
        let families = time
            .to_slots()
            .into_iter()
            .chain(frequency.to_slots())
            .chain(pulse.to_slots())
            .chain(morphology.to_slots());

        for (slot, value) in slots.iter_mut().zip(families) {
            *slot = value;
        }
        Self { slots }
    }

    pub fn slots(&self) -> &[Option<f64>; FEATURE_COUNT] {
        &self.slots
    }

    /// Names of the missing columns, in model order
    pub fn missing(&self) -> Vec<&'static str> {
        FEATURE_NAMES
            .iter()
            .zip(&self.slots)
            .filter_map(|(name, slot)| slot.is_none().then_some(*name))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }
}

/// Complete, model-ready feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn names() -> &'static [&'static str; FEATURE_COUNT] {
        &FEATURE_NAMES
    }

    /// Value of a named column
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.values[i])
    }

    /// Single-precision copy for inference runtimes that take `f32` tensors
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.values.iter().map(|&v| v as f32).collect()
    }

    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Column-wise mean imputation
///
/// A missing slot takes the mean of the observed values in its column. A
/// column with no observed values takes the configured fallback mean, or
/// [`DEFAULT_MISSING_FILL`] when none is configured. In strict mode that
/// last case fails the request naming the column instead.
#[derive(Debug, Clone, Default)]
pub struct MeanImputer {
    fallback: Option<[f64; FEATURE_COUNT]>,
    strict: bool,
}

impl MeanImputer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(fallback: [f64; FEATURE_COUNT]) -> Self {
        Self {
            fallback: Some(fallback),
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn from_config(config: &ImputationConfig) -> BpResult<Self> {
        if config.fallback_means.is_empty() {
            return Ok(Self::new().strict(config.strict));
        }

        let fallback: [f64; FEATURE_COUNT] =
            config.fallback_means.as_slice().try_into().map_err(|_| {
                BpError::invalid_input(
                    "imputation.fallback_means",
                    format!(
                        "expected {} values, got {}",
                        FEATURE_COUNT,
                        config.fallback_means.len()
                    ),
                )
            })?;
        Ok(Self::with_fallback(fallback).strict(config.strict))
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Impute a single request's features
    pub fn impute(&self, features: &PartialFeatureVector) -> BpResult<FeatureVector> {
        let mut rows = self.impute_batch(std::slice::from_ref(features))?;
        rows.pop().ok_or_else(|| {
            BpError::prediction(ProcessingStage::Imputation, "imputer produced no rows")
        })
    }

    /// Impute every row using the column means of the whole batch
    pub fn impute_batch(&self, rows: &[PartialFeatureVector]) -> BpResult<Vec<FeatureVector>> {
        let mut table: Array2<Option<f64>> = Array2::from_elem((rows.len(), FEATURE_COUNT), None);
        for (mut target, row) in table.axis_iter_mut(Axis(0)).zip(rows) {
            for (cell, value) in target.iter_mut().zip(row.slots()) {
                *cell = *value;
            }
        }

        let mut fills = [0.0; FEATURE_COUNT];
        for (col, column) in table.axis_iter(Axis(1)).enumerate() {
            if column.iter().all(Option::is_some) {
                continue;
            }

            fills[col] = match (column_mean(column), &self.fallback) {
                (Some(mean), _) => mean,
                (None, Some(fallback)) => {
                    warn!(
                        feature = FEATURE_NAMES[col],
                        value = fallback[col],
                        "No observed values, using fallback mean"
                    );
                    fallback[col]
                }
                (None, None) if self.strict => {
                    warn!(feature = FEATURE_NAMES[col], "No observed values to impute from");
                    return Err(BpError::prediction(
                        ProcessingStage::Imputation,
                        format!("feature '{}' has no observed value to impute from", FEATURE_NAMES[col]),
                    ));
                }
                (None, None) => {
                    warn!(
                        feature = FEATURE_NAMES[col],
                        value = DEFAULT_MISSING_FILL,
                        "No observed values, using default fill"
                    );
                    DEFAULT_MISSING_FILL
                }
            };
        }

        Ok(table
            .axis_iter(Axis(0))
            .map(|row| {
                let mut values = [0.0; FEATURE_COUNT];
                for (col, (value, cell)) in values.iter_mut().zip(row).enumerate() {
                    *value = cell.unwrap_or(fills[col]);
                }
                FeatureVector::new(values)
            })
            .collect())
    }
}

fn column_mean(column: ArrayView1<'_, Option<f64>>) -> Option<f64> {
    let (sum, count) = column
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), &v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::features::{
        FrequencyDomainFeatures, MorphologyFeatures, PulseIntervalFeatures, TimeDomainFeatures,
    };

    fn complete(value: f64) -> PartialFeatureVector {
        PartialFeatureVector::new([Some(value); FEATURE_COUNT])
    }

    #[test]
    fn test_names_follow_family_order() {
        let expected: Vec<&str> = TimeDomainFeatures::NAMES
            .iter()
            .chain(&FrequencyDomainFeatures::NAMES)
            .chain(&PulseIntervalFeatures::NAMES)
            .chain(&MorphologyFeatures::NAMES)
            .copied()
            .collect();
        assert_eq!(expected, FEATURE_NAMES.to_vec());
    }

    #[test]
    fn test_complete_row_passes_through() {
        let mut slots = [Some(1.0); FEATURE_COUNT];
        slots[3] = Some(-2.5);
        let features = MeanImputer::new()
            .impute(&PartialFeatureVector::new(slots))
            .unwrap();

        assert_eq!(features.as_slice()[3], -2.5);
        assert_eq!(features.get("min"), Some(-2.5));
        assert_eq!(features.len(), 21);
    }

    #[test]
    fn test_single_row_missing_gets_default_fill() {
        let mut slots = [Some(0.5); FEATURE_COUNT];
        slots[19] = None;
        let features = MeanImputer::new()
            .impute(&PartialFeatureVector::new(slots))
            .unwrap();

        assert_eq!(features.get("pwir"), Some(DEFAULT_MISSING_FILL));
        assert_eq!(features.get("pwat"), Some(0.5));
    }

    #[test]
    fn test_strict_single_row_missing_fails_without_fallback() {
        let mut slots = [Some(0.5); FEATURE_COUNT];
        slots[19] = None;
        let err = MeanImputer::new()
            .strict(true)
            .impute(&PartialFeatureVector::new(slots))
            .unwrap_err();

        match err {
            BpError::Prediction { stage, reason } => {
                assert_eq!(stage, ProcessingStage::Imputation);
                assert!(reason.contains("pwir"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_single_row_uses_fallback() {
        let mut slots = [Some(0.5); FEATURE_COUNT];
        slots[10] = None;
        slots[11] = None;
        let mut fallback = [0.0; FEATURE_COUNT];
        fallback[10] = 0.83;
        fallback[11] = 0.91;

        let features = MeanImputer::with_fallback(fallback)
            .impute(&PartialFeatureVector::new(slots))
            .unwrap();
        assert_eq!(features.get("mean_ibi"), Some(0.83));
        assert_eq!(features.get("mean_peak_amplitude"), Some(0.91));
        assert_eq!(features.get("mean"), Some(0.5));
    }

    #[test]
    fn test_batch_uses_column_mean() {
        let mut gap = complete(9.0);
        gap.slots[0] = None;
        let rows = [complete(1.0), gap, complete(3.0)];

        let imputed = MeanImputer::new().impute_batch(&rows).unwrap();
        assert_eq!(imputed.len(), 3);
        assert_eq!(imputed[1].as_slice()[0], 2.0);
        assert_eq!(imputed[1].as_slice()[1], 9.0);
    }

    #[test]
    fn test_missing_lists_names() {
        let mut partial = complete(0.0);
        partial.slots[5] = None;
        partial.slots[6] = None;
        assert_eq!(partial.missing(), vec!["skewness", "kurtosis"]);
        assert!(!partial.is_complete());
    }

    #[test]
    fn test_fallback_length_checked() {
        let config = ImputationConfig {
            fallback_means: vec![0.0; 3],
            strict: false,
        };
        assert!(MeanImputer::from_config(&config).is_err());
        assert!(!MeanImputer::from_config(&ImputationConfig::default())
            .unwrap()
            .has_fallback());
    }

    #[test]
    fn test_strict_flag_from_config() {
        let config = ImputationConfig {
            fallback_means: Vec::new(),
            strict: true,
        };
        assert!(MeanImputer::from_config(&config).unwrap().is_strict());
        assert!(!MeanImputer::new().is_strict());
    }

    #[test]
    fn test_to_f32() {
        let features = FeatureVector::new([0.25; FEATURE_COUNT]);
        assert_eq!(features.to_f32_vec(), vec![0.25f32; FEATURE_COUNT]);
    }
}
