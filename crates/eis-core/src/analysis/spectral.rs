//! One-sided discrete Fourier transform of real samples.

use num_complex::Complex64;
use rustfft::FftPlanner;

/// Spectrum of one real channel: bins `0..=n/2`, each divided by `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct OneSidedSpectrum {
    pub bins: Vec<Complex64>,
}

impl OneSidedSpectrum {
    pub fn magnitudes(&self) -> Vec<f64> {
        self.bins.iter().map(|bin| bin.norm()).collect()
    }

    pub fn mean_magnitude(&self) -> f64 {
        if self.bins.is_empty() {
            return 0.0;
        }
        self.bins.iter().map(|bin| bin.norm()).sum::<f64>() / self.bins.len() as f64
    }
}

/// Transforms several equally long real channels with one shared plan.
pub struct RealFft {
    planner: FftPlanner<f64>,
}

impl RealFft {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    pub fn transform(&mut self, samples: &[f64]) -> OneSidedSpectrum {
        let len = samples.len();
        if len == 0 {
            return OneSidedSpectrum { bins: Vec::new() };
        }

        let mut buffer: Vec<Complex64> = samples
            .iter()
            .map(|&sample| Complex64::new(sample, 0.0))
            .collect();
        let fft = self.planner.plan_fft_forward(len);
        fft.process(&mut buffer);

        let scale = len as f64;
        buffer.truncate(len / 2 + 1);
        for bin in &mut buffer {
            *bin /= scale;
        }
        OneSidedSpectrum { bins: buffer }
    }
}

impl Default for RealFft {
    fn default() -> Self {
        Self::new()
    }
}

/// Bin centre frequencies for `len` samples spaced `time_step` apart.
pub fn bin_frequencies(len: usize, time_step: f64) -> Vec<f64> {
    let resolution = 1.0 / (len as f64 * time_step);
    (0..=len / 2).map(|bin| bin as f64 * resolution).collect()
}

#[cfg(test)]
mod tests {
    use super::{RealFft, bin_frequencies};
    use std::f64::consts::PI;

    #[test]
    fn bin_frequencies_cover_dc_to_nyquist() {
        assert_eq!(bin_frequencies(8, 0.125), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(bin_frequencies(5, 0.1), vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn constant_signal_lands_in_dc_bin() {
        let spectrum = RealFft::new().transform(&[2.0; 8]);
        assert_eq!(spectrum.bins.len(), 5);
        assert!((spectrum.bins[0].re - 2.0).abs() < 1.0e-12);
        assert!(spectrum.bins[1..].iter().all(|bin| bin.norm() < 1.0e-12));
    }

    #[test]
    fn cosine_splits_amplitude_between_positive_and_negative_bins() {
        let len = 64;
        let samples: Vec<f64> = (0..len)
            .map(|index| 3.0 * (2.0 * PI * 5.0 * index as f64 / len as f64).cos())
            .collect();
        let spectrum = RealFft::new().transform(&samples);

        assert_eq!(spectrum.bins.len(), 33);
        assert!((spectrum.bins[5].re - 1.5).abs() < 1.0e-12);
        assert!(spectrum.bins[5].im.abs() < 1.0e-12);
        let magnitudes = spectrum.magnitudes();
        assert!((spectrum.mean_magnitude() - 1.5 / 33.0).abs() < 1.0e-12);
        assert!(
            magnitudes
                .iter()
                .enumerate()
                .all(|(bin, magnitude)| bin == 5 || *magnitude < 1.0e-12)
        );
    }
}
