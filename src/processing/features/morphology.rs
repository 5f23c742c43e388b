//! Fiducial point morphology features
//!
//! Landmarks are taken from the first systolic peak and the valleys around
//! it. All spans are signed sample counts: when the waveform starts on a
//! downstroke the first peak precedes the first valley and the spans go
//! negative, which the downstream models were trained with.

use crate::config::constants::features::{HEART_RATE_DIVISOR, MORPHOLOGY_FEATURE_COUNT};
use crate::processing::peaks::{find_peaks, find_valleys};
use crate::processing::waveform::Waveform;

/// Nine morphology values in model column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MorphologyFeatures {
    pub ejection_time_ratio: Option<f64>,
    pub beat_duration: Option<f64>,
    pub heart_rate_proxy: Option<f64>,
    pub systolic_slope: Option<f64>,
    pub diastolic_slope: Option<f64>,
    pub max_slope: Option<f64>,
    pub min_slope: Option<f64>,
    pub peak_valley_ratio: Option<f64>,
    pub arrival_time_s: Option<f64>,
}

impl MorphologyFeatures {
    pub const NAMES: [&'static str; MORPHOLOGY_FEATURE_COUNT] = [
        "etr", "bd", "hr", "svc", "dvc", "smvc", "dmvc", "pwir", "pwat",
    ];

    /// Every value missing
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn to_slots(&self) -> [Option<f64>; MORPHOLOGY_FEATURE_COUNT] {
        [
            self.ejection_time_ratio,
            self.beat_duration,
            self.heart_rate_proxy,
            self.systolic_slope,
            self.diastolic_slope,
            self.max_slope,
            self.min_slope,
            self.peak_valley_ratio,
            self.arrival_time_s,
        ]
    }
}

/// Signed landmark spans, in samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Landmarks {
    rise: i64,         // first peak - first valley
    fall: i64,         // second valley - first peak
    next_rise: i64,    // second peak - second valley
    valley_to_peak: i64,
    peak_to_valley: i64,
}

impl Landmarks {
    fn locate(peaks: &[usize], valleys: &[usize]) -> Self {
        let p0 = peaks[0] as i64;
        let v0 = valleys[0] as i64;
        let rise = p0 - v0;

        let fall = valleys.get(1).map_or(rise, |&v1| v1 as i64 - p0);
        let next_rise = match (peaks.get(1), valleys.get(1)) {
            (Some(&p1), Some(&v1)) => p1 as i64 - v1 as i64,
            _ => rise,
        };

        Self {
            rise,
            fall,
            next_rise,
            valley_to_peak: v0 - p0,
            peak_to_valley: p0 - v0,
        }
    }

    fn beat_duration(&self) -> i64 {
        self.rise + self.fall + self.next_rise
    }
}

/// Morphology feature extractor
#[derive(Debug, Clone)]
pub struct MorphologyExtractor {
    min_distance: usize,
}

impl MorphologyExtractor {
    pub fn new(config: &super::FeatureConfig) -> Self {
        Self {
            min_distance: config.fiducial_min_distance_samples,
        }
    }

    pub fn extract(&self, waveform: &Waveform) -> MorphologyFeatures {
        let samples = waveform.samples();
        let peaks = find_peaks(samples, self.min_distance);
        let valleys = find_valleys(samples, self.min_distance);

        if peaks.len() < 2 || valleys.len() < 2 {
            return MorphologyFeatures::missing();
        }

        let fs = waveform.sample_rate() as f64;
        let peak = samples[peaks[0]];
        let valley = samples[valleys[0]];
        let marks = Landmarks::locate(&peaks, &valleys);
        let duration = marks.beat_duration();
        let swing = peak - valley;

        let ejection_time_ratio = (duration != 0).then(|| {
            (marks.valley_to_peak + marks.peak_to_valley) as f64 / duration as f64
        });
        let systolic_slope = (marks.rise != 0).then(|| swing / marks.rise as f64);
        let diastolic_slope = (marks.fall != 0).then(|| swing / marks.fall as f64);
        let peak_valley_ratio = (valley != 0.0).then(|| peak / valley);

        let (max_slope, min_slope) = samples.windows(2).map(|w| w[1] - w[0]).fold(
            (f64::NEG_INFINITY, f64::INFINITY),
            |(hi, lo), d| (hi.max(d), lo.min(d)),
        );

        MorphologyFeatures {
            ejection_time_ratio,
            beat_duration: Some(duration as f64),
            heart_rate_proxy: Some(duration as f64 / HEART_RATE_DIVISOR),
            systolic_slope,
            diastolic_slope,
            max_slope: Some(max_slope),
            min_slope: Some(min_slope),
            peak_valley_ratio,
            arrival_time_s: Some(marks.rise as f64 / fs),
        }
    }
}
