// src/processing/filters/butterworth.rs
//! Butterworth band-pass design
//!
//! Analog prototype poles are moved to the requested band with the
//! low-pass to band-pass transform, then mapped to the z-plane with the
//! bilinear transform (frequencies pre-warped so the band edges land exactly).

use super::{FilterError, IirCoefficients};
use crate::config::constants::filters::{MAX_FILTER_ORDER, MIN_FILTER_ORDER};
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

/// Bilinear transform constant for a normalized rate of 2 (Nyquist = 1)
const BILINEAR_FS: f64 = 2.0;

/// Design a band-pass filter of the given order.
///
/// `low` and `high` are normalized to Nyquist and must satisfy
/// `0 < low < high < 1`. The result has `2 * order + 1` coefficients in each
/// of `b` and `a`.
pub fn butterworth_bandpass(
    order: usize,
    low: f64,
    high: f64,
) -> Result<IirCoefficients, FilterError> {
    if !(MIN_FILTER_ORDER..=MAX_FILTER_ORDER).contains(&order) {
        return Err(FilterError::InvalidOrder { order });
    }
    if !(low > 0.0 && low < high && high < 1.0) {
        return Err(FilterError::InvalidCutoff {
            lowcut_hz: low,
            highcut_hz: high,
            nyquist_hz: 1.0,
        });
    }

    // Pre-warp band edges for the bilinear transform
    let warped_low = 2.0 * BILINEAR_FS * (PI * low / BILINEAR_FS).tan();
    let warped_high = 2.0 * BILINEAR_FS * (PI * high / BILINEAR_FS).tan();
    let bandwidth = warped_high - warped_low;
    let center = (warped_low * warped_high).sqrt();

    let prototype = prototype_poles(order);

    // Low-pass to band-pass: each pole splits in two, `order` zeros at DC
    let mut analog_poles = Vec::with_capacity(2 * order);
    for &pole in &prototype {
        let scaled = pole * (bandwidth / 2.0);
        let offset = (scaled * scaled - center * center).sqrt();
        analog_poles.push(scaled + offset);
    }
    for &pole in &prototype {
        let scaled = pole * (bandwidth / 2.0);
        let offset = (scaled * scaled - center * center).sqrt();
        analog_poles.push(scaled - offset);
    }
    let analog_gain = bandwidth.powi(order as i32);

    // Bilinear transform. DC zeros map to z = 1, the zeros at infinity to z = -1
    let fs2 = Complex64::new(2.0 * BILINEAR_FS, 0.0);
    let digital_poles: Vec<Complex64> = analog_poles
        .iter()
        .map(|&p| (fs2 + p) / (fs2 - p))
        .collect();
    let mut digital_zeros = vec![Complex64::new(1.0, 0.0); order];
    digital_zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(order));

    let zero_factor = fs2.powu(order as u32);
    let pole_factor = analog_poles
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, &p| acc * (fs2 - p));
    let gain = analog_gain * (zero_factor / pole_factor).re;

    let b: Vec<f64> = poly(&digital_zeros).iter().map(|c| gain * c.re).collect();
    let a: Vec<f64> = poly(&digital_poles).iter().map(|c| c.re).collect();

    if a.iter().chain(b.iter()).any(|c| !c.is_finite()) {
        return Err(FilterError::InvalidCoefficients(
            "design produced non-finite coefficients".to_string(),
        ));
    }

    Ok(IirCoefficients { b, a })
}

/// Poles of the normalized analog Butterworth low-pass prototype
fn prototype_poles(order: usize) -> Vec<Complex64> {
    let n = order as f64;
    (0..order)
        .map(|k| {
            let m = 2.0 * k as f64 - n + 1.0;
            -Complex64::from_polar(1.0, PI * m / (2.0 * n))
        })
        .collect()
}

/// Monic polynomial coefficients (highest power first) with the given roots
fn poly(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for &root in roots {
        let mut next = vec![Complex64::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * root;
        }
        coeffs = next;
    }
    coeffs
}
