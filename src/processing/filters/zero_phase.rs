// src/processing/filters/zero_phase.rs
//! Forward-backward IIR filtering
//!
//! The signal is extended at both ends by odd reflection, run through the
//! filter once forward and once backward with steady-state initial
//! conditions, then trimmed back to its original length. Phase responses of
//! the two passes cancel.

use super::{FilterError, IirCoefficients};

/// Apply an IIR filter in transposed direct form II.
///
/// `zi` is the initial delay-line state (`max(len(a), len(b)) - 1` values);
/// pass an empty slice to start from rest.
pub fn lfilter(coefficients: &IirCoefficients, input: &[f64], zi: &[f64]) -> Vec<f64> {
    let (b, a) = padded(coefficients);
    let order = b.len() - 1;

    let mut state = vec![0.0; order];
    for (s, &z) in state.iter_mut().zip(zi) {
        *s = z;
    }

    let mut output = Vec::with_capacity(input.len());
    for &x in input {
        let y = b[0] * x + state.first().copied().unwrap_or(0.0);
        for i in 0..order {
            let next = if i + 1 < order { state[i + 1] } else { 0.0 };
            state[i] = b[i + 1] * x + next - a[i + 1] * y;
        }
        output.push(y);
    }

    output
}

/// Delay-line state matching the step response's steady state.
///
/// Scaling it by the first input sample starts the filter as if that value
/// had been applied forever, which removes the start-up transient.
pub fn lfilter_zi(coefficients: &IirCoefficients) -> Result<Vec<f64>, FilterError> {
    let (b, a) = padded(coefficients);
    let n = b.len() - 1;
    if n == 0 {
        return Ok(Vec::new());
    }

    // (I - A^T) zi = b[1..] - a[1..] * b[0], A the companion matrix of a
    let mut matrix = vec![vec![0.0; n]; n];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[i] += 1.0;
        row[0] += a[i + 1];
        if i + 1 < n {
            row[i + 1] -= 1.0;
        }
    }
    let rhs: Vec<f64> = (0..n).map(|i| b[i + 1] - a[i + 1] * b[0]).collect();

    solve_linear_system(matrix, rhs).ok_or_else(|| {
        FilterError::InvalidCoefficients("steady-state system is singular".to_string())
    })
}

/// Zero-phase filtering; output length equals input length
pub fn filtfilt(coefficients: &IirCoefficients, input: &[f64]) -> Result<Vec<f64>, FilterError> {
    let edge = coefficients.pad_length();
    if input.len() <= edge {
        return Err(FilterError::InputTooShort {
            len: input.len(),
            required: edge + 1,
        });
    }

    let extended = odd_extension(input, edge);
    let zi = lfilter_zi(coefficients)?;

    let start: Vec<f64> = zi.iter().map(|z| z * extended[0]).collect();
    let mut forward = lfilter(coefficients, &extended, &start);

    forward.reverse();
    let start: Vec<f64> = zi.iter().map(|z| z * forward[0]).collect();
    let mut backward = lfilter(coefficients, &forward, &start);
    backward.reverse();

    Ok(backward[edge..backward.len() - edge].to_vec())
}

/// Extend by `edge` samples at each end, reflected through the end points
fn odd_extension(input: &[f64], edge: usize) -> Vec<f64> {
    let n = input.len();
    let first = input[0];
    let last = input[n - 1];

    let mut extended = Vec::with_capacity(n + 2 * edge);
    extended.extend((1..=edge).rev().map(|i| 2.0 * first - input[i]));
    extended.extend_from_slice(input);
    extended.extend((1..=edge).map(|i| 2.0 * last - input[n - 1 - i]));
    extended
}

/// Coefficients normalized by `a[0]` and zero-padded to equal length
fn padded(coefficients: &IirCoefficients) -> (Vec<f64>, Vec<f64>) {
    let len = coefficients.a.len().max(coefficients.b.len()).max(1);
    let a0 = coefficients.a.first().copied().unwrap_or(1.0);

    let mut b: Vec<f64> = coefficients.b.iter().map(|c| c / a0).collect();
    let mut a: Vec<f64> = coefficients.a.iter().map(|c| c / a0).collect();
    b.resize(len, 0.0);
    a.resize(len, 0.0);
    (b, a)
}

/// Gaussian elimination with partial pivoting
fn solve_linear_system(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
    let n = rhs.len();

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            matrix[i][col]
                .abs()
                .partial_cmp(&matrix[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if matrix[pivot][col].abs() < f64::EPSILON {
            return None;
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in col + 1..n {
            let factor = matrix[row][col] / matrix[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| matrix[row][k] * solution[k]).sum();
        solution[row] = (rhs[row] - tail) / matrix[row][row];
    }

    Some(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::filters::butterworth_bandpass;

    fn first_order_lowpass() -> IirCoefficients {
        // y[n] = 0.2 x[n] + 0.8 y[n-1]
        IirCoefficients {
            b: vec![0.2, 0.0],
            a: vec![1.0, -0.8],
        }
    }

    #[test]
    fn test_lfilter_impulse_response() {
        let coefficients = first_order_lowpass();
        let output = lfilter(&coefficients, &[1.0, 0.0, 0.0], &[]);

        assert!((output[0] - 0.2).abs() < 1e-12);
        assert!((output[1] - 0.16).abs() < 1e-12);
        assert!((output[2] - 0.128).abs() < 1e-12);
    }

    #[test]
    fn test_lfilter_normalizes_leading_coefficient() {
        let scaled = IirCoefficients {
            b: vec![0.4, 0.0],
            a: vec![2.0, -1.6],
        };
        let reference = lfilter(&first_order_lowpass(), &[1.0, 0.5, -0.25], &[]);
        let output = lfilter(&scaled, &[1.0, 0.5, -0.25], &[]);

        for (x, y) in reference.iter().zip(&output) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_lfilter_zi_gives_steady_state() {
        let coefficients = first_order_lowpass();
        let zi = lfilter_zi(&coefficients).unwrap();

        // DC gain is 1, so a constant input stays constant from the first sample
        let output = lfilter(&coefficients, &[3.0; 5], &[zi[0] * 3.0]);
        for y in output {
            assert!((y - 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bandpass_steady_state_for_constant_input() {
        let coefficients = butterworth_bandpass(3, 0.01, 0.16).unwrap();
        let zi = lfilter_zi(&coefficients).unwrap();
        assert_eq!(zi.len(), 6);

        let start: Vec<f64> = zi.iter().map(|z| z * 2.0).collect();
        let output = lfilter(&coefficients, &[2.0; 50], &start);

        // Band-pass blocks DC entirely
        for y in output {
            assert!(y.abs() < 1e-9);
        }
    }

    #[test]
    fn test_odd_extension() {
        let extended = odd_extension(&[1.0, 2.0, 4.0, 7.0], 2);
        assert_eq!(extended, vec![-2.0, 0.0, 1.0, 2.0, 4.0, 7.0, 10.0, 12.0]);
    }

    #[test]
    fn test_filtfilt_preserves_length() {
        let coefficients = butterworth_bandpass(3, 0.01, 0.16).unwrap();
        let input: Vec<f64> = (0..100).map(|i| ((i * 7) % 13) as f64).collect();

        let output = filtfilt(&coefficients, &input).unwrap();
        assert_eq!(output.len(), input.len());
        assert!(output.iter().all(|y| y.is_finite()));
    }

    #[test]
    fn test_filtfilt_rejects_short_input() {
        let coefficients = butterworth_bandpass(3, 0.01, 0.16).unwrap();
        let result = filtfilt(&coefficients, &[0.0; 21]);
        assert_eq!(
            result,
            Err(FilterError::InputTooShort { len: 21, required: 22 })
        );
        assert!(filtfilt(&coefficients, &[0.0; 22]).is_ok());
    }

    #[test]
    fn test_filtfilt_removes_dc_offset() {
        let coefficients = butterworth_bandpass(3, 0.01, 0.16).unwrap();
        let output = filtfilt(&coefficients, &[5.0; 200]).unwrap();
        assert!(output.iter().all(|y| y.abs() < 1e-6));
    }

    #[test]
    fn test_solve_linear_system() {
        let matrix = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let solution = solve_linear_system(matrix, vec![3.0, 5.0]).unwrap();
        assert!((solution[0] - 0.8).abs() < 1e-12);
        assert!((solution[1] - 1.4).abs() < 1e-12);

        let singular = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(solve_linear_system(singular, vec![1.0, 2.0]).is_none());
    }
}
