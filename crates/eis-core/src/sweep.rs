//! Log-spaced frequency sweep planning.

use crate::config::ExperimentConfig;

/// Ordered list of excitation frequencies, in the order they are simulated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrequencySweep {
    frequencies: Vec<f64>,
}

impl FrequencySweep {
    /// Walks down from `upper` in steps of `10^(1/steps_per_decade)`.
    ///
    /// The lowest point is kept as long as it sits within one percent of a log
    /// step below `lower`, so rounding in the repeated division never drops the
    /// lower bound. Degenerate bounds yield an empty or single-point sweep.
    pub fn logarithmic(upper: f64, lower: f64, steps_per_decade: u32) -> Self {
        let ratio = 10.0_f64.powf(1.0 / f64::from(steps_per_decade));
        let threshold = lower * (1.0 + 0.01 * (ratio.recip() - 1.0));

        let mut frequencies = Vec::new();
        let mut frequency = upper;
        while frequency > 0.0 && frequency >= threshold {
            frequencies.push(frequency);
            frequency /= ratio;
        }
        Self { frequencies }
    }

    pub fn from_config(config: &ExperimentConfig) -> Self {
        Self::logarithmic(
            config.frequency_upper_limit(),
            config.frequency_lower_limit(),
            config.steps_per_decade(),
        )
    }

    /// Caller-supplied frequencies, kept verbatim.
    pub fn explicit(frequencies: impl Into<Vec<f64>>) -> Self {
        Self {
            frequencies: frequencies.into(),
        }
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.frequencies.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::FrequencySweep;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1.0e-9 * expected.abs(),
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn one_step_per_decade_includes_both_bounds() {
        let sweep = FrequencySweep::logarithmic(1.0e2, 1.0e-1, 1);
        let frequencies = sweep.frequencies();
        assert_eq!(frequencies.len(), 4);
        assert_eq!(frequencies[0], 1.0e2);
        for (actual, expected) in frequencies.iter().zip([1.0e2, 1.0e1, 1.0, 1.0e-1]) {
            assert_close(*actual, expected);
        }
    }

    #[test]
    fn three_steps_per_decade_hits_every_decade() {
        let sweep = FrequencySweep::logarithmic(1.0e2, 1.0e-1, 3);
        let frequencies = sweep.frequencies();
        assert_eq!(frequencies.len(), 10);
        assert_close(frequencies[0], 1.0e2);
        assert_close(frequencies[3], 1.0e1);
        assert_close(frequencies[9], 1.0e-1);
    }

    #[test]
    fn generated_sweeps_are_strictly_decreasing_with_expected_length() {
        let cases = [
            (1.0e4, 1.0e-6, 3_u32),
            (1.0e3, 1.0, 5),
            (5.0e2, 5.0e-2, 2),
            (1.0, 1.0, 4),
        ];

        for (upper, lower, steps_per_decade) in cases {
            let sweep = FrequencySweep::logarithmic(upper, lower, steps_per_decade);
            let frequencies = sweep.frequencies();
            let expected = f64::from(steps_per_decade) * (upper / lower).log10() + 1.0;

            assert_eq!(frequencies[0], upper);
            assert!(
                (frequencies.len() as f64 - expected).abs() <= 1.0,
                "{upper}..{lower} @ {steps_per_decade}: {} points, expected {expected}",
                frequencies.len()
            );
            assert!(frequencies.windows(2).all(|pair| pair[1] < pair[0]));
        }
    }

    #[test]
    fn degenerate_bounds_yield_short_sweeps() {
        assert_eq!(FrequencySweep::logarithmic(1.0, 10.0, 3).len(), 0);
        assert_eq!(FrequencySweep::logarithmic(-1.0, -10.0, 3).len(), 0);
        assert_eq!(FrequencySweep::logarithmic(10.0, 10.0, 3).len(), 1);
    }

    #[test]
    fn explicit_frequencies_are_kept_in_caller_order() {
        let sweep = FrequencySweep::explicit(vec![3.0, 2.0e3, 0.1]);
        assert_eq!(sweep.frequencies(), &[3.0, 2.0e3, 0.1]);
        assert_eq!(sweep.iter().collect::<Vec<_>>(), vec![3.0, 2.0e3, 0.1]);
    }
}
