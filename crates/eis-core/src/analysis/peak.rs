//! Threshold-crossing extremum detection for noisy magnitude spectra.
//!
//! A maximum is registered once the signal has climbed more than `delta`
//! above the last trough and then dropped more than `delta` below the running
//! peak; minima are registered symmetrically. The detector alternates between
//! the two searches, so small ripples under `delta` never register.

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extrema {
    pub maxima: Vec<(usize, f64)>,
    pub minima: Vec<(usize, f64)>,
}

impl Extrema {
    pub fn maxima_indices(&self) -> Vec<usize> {
        self.maxima.iter().map(|(index, _)| *index).collect()
    }
}

/// Outcome of looking for the one excited harmonic in a spectrum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeakSearch {
    Found(usize),
    NotFound,
    /// Several maxima, or the forward and reverse scans disagree.
    Ambiguous(Vec<usize>),
}

pub fn detect_extrema(values: &[f64], delta: f64) -> Extrema {
    scan(values.iter().copied().enumerate(), delta)
}

/// Same detector run from the last sample back to the first; indices still
/// refer to positions in `values`.
pub fn detect_extrema_reversed(values: &[f64], delta: f64) -> Extrema {
    let mut extrema = scan(values.iter().copied().enumerate().rev(), delta);
    extrema.maxima.reverse();
    extrema.minima.reverse();
    extrema
}

fn scan(samples: impl Iterator<Item = (usize, f64)>, delta: f64) -> Extrema {
    let mut extrema = Extrema::default();
    let mut max = (0_usize, f64::NEG_INFINITY);
    let mut min = (0_usize, f64::INFINITY);
    let mut looking_for_max = true;

    for (index, value) in samples {
        if value > max.1 {
            max = (index, value);
        }
        if value < min.1 {
            min = (index, value);
        }

        if looking_for_max {
            if value < max.1 - delta {
                extrema.maxima.push(max);
                min = (index, value);
                looking_for_max = false;
            }
        } else if value > min.1 + delta {
            extrema.minima.push(min);
            max = (index, value);
            looking_for_max = true;
        }
    }

    extrema
}

/// Requires a forward and a reverse scan to agree on exactly one maximum.
/// A non-positive or non-finite `delta` cannot separate a peak from noise and
/// yields `NotFound`.
pub fn locate_single_peak(values: &[f64], delta: f64) -> PeakSearch {
    if !(delta.is_finite() && delta > 0.0) {
        return PeakSearch::NotFound;
    }

    let forward = detect_extrema(values, delta).maxima_indices();
    let reverse = detect_extrema_reversed(values, delta).maxima_indices();

    match (forward.as_slice(), reverse.as_slice()) {
        ([], []) => PeakSearch::NotFound,
        ([first], [second]) if first == second => PeakSearch::Found(*first),
        _ => {
            let mut candidates = forward;
            candidates.extend(reverse);
            candidates.sort_unstable();
            candidates.dedup();
            PeakSearch::Ambiguous(candidates)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PeakSearch, detect_extrema, detect_extrema_reversed, locate_single_peak};

    #[test]
    fn detects_alternating_extrema_above_threshold() {
        let values = [0.0, 1.0, 0.2, 0.3, 0.25, 2.0, 0.0];
        let extrema = detect_extrema(&values, 0.5);
        assert_eq!(extrema.maxima, vec![(1, 1.0), (5, 2.0)]);
        assert_eq!(extrema.minima, vec![(2, 0.2)]);
    }

    #[test]
    fn ripples_below_threshold_are_ignored() {
        let values = [0.0, 0.1, 0.05, 0.12, 0.0, 3.0, 0.1, 0.15, 0.1];
        assert_eq!(detect_extrema(&values, 0.5).maxima_indices(), vec![5]);
        assert_eq!(detect_extrema_reversed(&values, 0.5).maxima_indices(), vec![5]);
    }

    #[test]
    fn single_peak_is_found_by_both_scans() {
        let values = [0.0, 0.01, 0.0, 2.5, 0.02, 0.0, 0.01];
        assert_eq!(locate_single_peak(&values, 0.1), PeakSearch::Found(3));
    }

    #[test]
    fn flat_spectrum_has_no_peak() {
        let values = [0.1; 16];
        assert_eq!(locate_single_peak(&values, 0.1), PeakSearch::NotFound);
        assert_eq!(locate_single_peak(&[0.0, 1.0, 0.0], 0.0), PeakSearch::NotFound);
    }

    #[test]
    fn two_tones_are_ambiguous() {
        let values = [0.0, 1.0, 0.0, 0.0, 1.5, 0.0];
        assert_eq!(
            locate_single_peak(&values, 0.2),
            PeakSearch::Ambiguous(vec![1, 4])
        );
    }

    #[test]
    fn scans_that_disagree_are_ambiguous() {
        // The trailing rise never falls back, so only the reverse scan
        // registers it as a maximum.
        let values = [0.0, 1.0, 0.0, 0.0, 1.0];
        let forward = detect_extrema(&values, 0.5).maxima_indices();
        let reverse = detect_extrema_reversed(&values, 0.5).maxima_indices();
        assert_eq!(forward, vec![1]);
        assert_eq!(reverse, vec![1, 4]);
        assert_eq!(
            locate_single_peak(&values, 0.5),
            PeakSearch::Ambiguous(vec![1, 4])
        );
    }
}
