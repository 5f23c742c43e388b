//! Local extremum detection with a minimum spacing constraint

/// Indices of local maxima at least `min_distance` samples apart.
///
/// A sample is a candidate when it is strictly greater than its left
/// neighbour and the run of equal values it starts is followed by a strictly
/// smaller sample; flat tops report their middle index. End points are never
/// peaks. Candidates are then kept in decreasing order of height, each one
/// suppressing any remaining candidate closer than `min_distance`. A distance
/// below one sample is treated as one.
pub fn find_peaks(signal: &[f64], min_distance: usize) -> Vec<usize> {
    let candidates = local_maxima(signal);
    select_by_distance(signal, candidates, min_distance.max(1))
}

/// Local minima, detected as the peaks of the negated signal
pub fn find_valleys(signal: &[f64], min_distance: usize) -> Vec<usize> {
    let negated: Vec<f64> = signal.iter().map(|x| -x).collect();
    find_peaks(&negated, min_distance)
}

fn local_maxima(signal: &[f64]) -> Vec<usize> {
    let mut maxima = Vec::new();
    if signal.len() < 3 {
        return maxima;
    }

    let last = signal.len() - 1;
    let mut i = 1;
    while i < last {
        if signal[i - 1] < signal[i] {
            let mut ahead = i + 1;
            while ahead < last && signal[ahead] == signal[i] {
                ahead += 1;
            }
            if signal[ahead] < signal[i] {
                maxima.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }

    maxima
}

fn select_by_distance(signal: &[f64], peaks: Vec<usize>, min_distance: usize) -> Vec<usize> {
    if min_distance <= 1 || peaks.len() < 2 {
        return peaks;
    }

    // Stable sort: among equal heights the later peak is visited first
    let mut by_height: Vec<usize> = (0..peaks.len()).collect();
    by_height.sort_by(|&x, &y| {
        signal[peaks[x]]
            .partial_cmp(&signal[peaks[y]])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = vec![true; peaks.len()];
    for &j in by_height.iter().rev() {
        if !keep[j] {
            continue;
        }

        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < min_distance {
            keep[k - 1] = false;
            k -= 1;
        }

        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < min_distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .into_iter()
        .zip(keep)
        .filter_map(|(peak, kept)| kept.then_some(peak))
        .collect()
}
