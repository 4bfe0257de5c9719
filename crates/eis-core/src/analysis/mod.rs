//! Harmonic analysis of a sampled voltage/current response.
//!
//! [`fourier_analysis`] validates a [`Waveform`], drops the transient head,
//! transforms both channels and divides the voltage phasor by the current
//! phasor at every excited harmonic.
//!
//! With an [`AnalysisWindow`] the harmonic bins are known up front: harmonic
//! `h` sits at bin `h × (cycles − ignore_cycles)` because the retained window
//! always spans a whole number of fundamental periods. Without one, the first
//! half of the record is discarded and the single dominant voltage peak is
//! located with the detector in [`peak`], using the mean current magnitude as
//! its threshold.

pub mod peak;
pub mod spectral;

use crate::domain::{AdvisoryPolicy, EisError, EisResult, ImpedancePoint, Waveform};
use num_complex::Complex64;
use peak::{PeakSearch, locate_single_peak};
use spectral::{RealFft, bin_frequencies};
use tracing::{debug, warn};

pub const SAMPLING_ABS_TOL: f64 = 1.0e-10;
pub const SAMPLING_REL_TOL: f64 = 1.0e-10;

/// Cycle bookkeeping and excited harmonics of a configured sweep point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisWindow {
    pub steps_per_cycle: usize,
    pub cycles: usize,
    pub ignore_cycles: usize,
    pub harmonics: Vec<u32>,
}

impl AnalysisWindow {
    pub fn retained_cycles(&self) -> usize {
        self.cycles.saturating_sub(self.ignore_cycles)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalysisOptions {
    pub advisory_policy: AdvisoryPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    /// The transform still runs, just without the radix-2 fast path.
    NonPowerOfTwoSamples { retained: usize },
}

/// Parallel frequency/impedance sequences, in harmonic order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HarmonicAnalysis {
    pub frequencies: Vec<f64>,
    pub impedances: Vec<Complex64>,
    pub advisories: Vec<Advisory>,
}

impl HarmonicAnalysis {
    pub fn points(&self) -> impl Iterator<Item = ImpedancePoint> + '_ {
        self.frequencies
            .iter()
            .zip(&self.impedances)
            .map(|(&frequency, &impedance)| ImpedancePoint::new(frequency, impedance))
    }
}

/// Checks column lengths and uniform sampling; returns the time step.
pub fn validate_waveform(waveform: &Waveform) -> EisResult<f64> {
    let len = waveform.time.len();
    for (name, column) in [("current", &waveform.current), ("voltage", &waveform.voltage)] {
        if column.len() != len {
            return Err(EisError::input_validation(
                "INPUT.WAVEFORM_LENGTH_MISMATCH",
                format!(
                    "{} has {} samples but time has {}",
                    name,
                    column.len(),
                    len
                ),
            ));
        }
    }
    if len < 2 {
        return Err(EisError::input_validation(
            "INPUT.WAVEFORM_OUT_OF_RANGE",
            format!("waveform needs at least two samples to infer a time step, got {len}"),
        ));
    }

    let time_step = waveform.time[1] - waveform.time[0];
    if !time_step.is_finite() {
        return Err(EisError::input_validation(
            "INPUT.WAVEFORM_NON_UNIFORM",
            format!("time step {time_step} between the first two samples is not finite"),
        ));
    }
    let tolerance = SAMPLING_ABS_TOL + SAMPLING_REL_TOL * time_step.abs();
    if let Some(index) = waveform.time.windows(2).position(|pair| {
        let deviation = ((pair[1] - pair[0]) - time_step).abs();
        deviation.is_nan() || deviation > tolerance
    }) {
        return Err(EisError::input_validation(
            "INPUT.WAVEFORM_NON_UNIFORM",
            format!(
                "time step {} at sample {} differs from {}",
                waveform.time[index + 1] - waveform.time[index],
                index,
                time_step
            ),
        ));
    }

    Ok(time_step)
}

pub fn fourier_analysis(
    waveform: &Waveform,
    window: Option<&AnalysisWindow>,
    options: AnalysisOptions,
) -> EisResult<HarmonicAnalysis> {
    let time_step = validate_waveform(waveform)?;
    let len = waveform.len();

    let skip = match window {
        Some(window) => transient_samples(window, len)?,
        None => len / 2,
    };
    let current = &waveform.current[skip..];
    let voltage = &waveform.voltage[skip..];
    let retained = current.len();

    let mut advisories = Vec::new();
    if !retained.is_power_of_two() {
        match options.advisory_policy {
            AdvisoryPolicy::Warn => {
                warn!(
                    retained,
                    "retained sample count is not a power of two; the FFT falls back to a slower path"
                );
                advisories.push(Advisory::NonPowerOfTwoSamples { retained });
            }
            AdvisoryPolicy::Deny => {
                return Err(EisError::computation(
                    "RUN.ANALYSIS_POWER_OF_TWO",
                    format!(
                        "(cycles - ignore_cycles) * steps_per_cycle = {retained} is not a power of two"
                    ),
                ));
            }
        }
    }

    let mut fft = RealFft::new();
    let current_spectrum = fft.transform(current);
    let voltage_spectrum = fft.transform(voltage);
    let bin_frequencies = bin_frequencies(retained, time_step);

    let bins = match window {
        Some(window) => configured_bins(window, bin_frequencies.len())?,
        None => vec![dominant_bin(
            &voltage_spectrum.magnitudes(),
            current_spectrum.mean_magnitude(),
        )?],
    };
    debug!(retained, ?bins, "located excited harmonics");

    Ok(HarmonicAnalysis {
        frequencies: bins.iter().map(|&bin| bin_frequencies[bin]).collect(),
        impedances: bins
            .iter()
            .map(|&bin| voltage_spectrum.bins[bin] / current_spectrum.bins[bin])
            .collect(),
        advisories,
    })
}

fn transient_samples(window: &AnalysisWindow, len: usize) -> EisResult<usize> {
    if window.cycles <= window.ignore_cycles {
        return Err(EisError::input_validation(
            "INPUT.CONFIG_CYCLES",
            format!(
                "cycles ({}) must be greater than ignore_cycles ({})",
                window.cycles, window.ignore_cycles
            ),
        ));
    }
    let expected = window.cycles * window.steps_per_cycle;
    if len != expected {
        return Err(EisError::input_validation(
            "INPUT.CONFIG_SAMPLE_COUNT",
            format!(
                "waveform has {} samples but cycles * steps_per_cycle = {} * {} = {}",
                len, window.cycles, window.steps_per_cycle, expected
            ),
        ));
    }
    Ok(window.ignore_cycles * window.steps_per_cycle)
}

fn configured_bins(window: &AnalysisWindow, bin_count: usize) -> EisResult<Vec<usize>> {
    let retained_cycles = window.retained_cycles();
    window
        .harmonics
        .iter()
        .map(|&harmonic| {
            let bin = harmonic as usize * retained_cycles;
            if bin < bin_count {
                Ok(bin)
            } else {
                Err(EisError::input_validation(
                    "INPUT.ANALYSIS_HARMONIC_OUT_OF_RANGE",
                    format!(
                        "harmonic {harmonic} maps to bin {bin} beyond the {bin_count} available bins"
                    ),
                ))
            }
        })
        .collect()
}

fn dominant_bin(voltage_magnitudes: &[f64], noise_floor: f64) -> EisResult<usize> {
    match locate_single_peak(voltage_magnitudes, noise_floor) {
        PeakSearch::Found(bin) => Ok(bin),
        PeakSearch::NotFound => Err(EisError::computation(
            "RUN.ANALYSIS_NO_PEAK",
            format!("no voltage peak rises above the current noise floor {noise_floor:e}"),
        )),
        PeakSearch::Ambiguous(bins) => Err(EisError::computation(
            "RUN.ANALYSIS_AMBIGUOUS_PEAK",
            format!("expected one excited harmonic, candidate bins {bins:?}"),
        )),
    }
}
