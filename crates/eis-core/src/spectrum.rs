//! Running impedance spectrum of an experiment, and its reconstruction from
//! stored waveforms.

use crate::analysis::{AnalysisOptions, HarmonicAnalysis, fourier_analysis};
use crate::domain::{EisError, EisResult, ImpedancePoint};
use crate::store::{EIS_DATA_GROUP, WaveformStore};
use num_complex::Complex64;
use tracing::debug;

/// Parallel frequency (Hz) and impedance (ohm) sequences.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spectrum {
    frequencies: Vec<f64>,
    impedances: Vec<Complex64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodePoint {
    pub frequency: f64,
    pub magnitude_db: f64,
    pub phase_degrees: f64,
}

impl Spectrum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.frequencies.clear();
        self.impedances.clear();
    }

    /// Appends one batch as is; the spectrum keeps sweep order.
    pub fn record(&mut self, frequencies: &[f64], impedances: &[Complex64]) -> EisResult<()> {
        if frequencies.len() != impedances.len() {
            return Err(EisError::internal(
                "SYS.SPECTRUM_BATCH",
                format!(
                    "{} frequencies recorded against {} impedances",
                    frequencies.len(),
                    impedances.len()
                ),
            ));
        }
        self.frequencies.extend_from_slice(frequencies);
        self.impedances.extend_from_slice(impedances);
        Ok(())
    }

    pub fn record_analysis(&mut self, analysis: &HarmonicAnalysis) -> EisResult<()> {
        self.record(&analysis.frequencies, &analysis.impedances)
    }

    /// Ascending stable sort, then reversed.
    pub fn sort_descending(&mut self) {
        let mut order: Vec<usize> = (0..self.frequencies.len()).collect();
        order.sort_by(|&a, &b| self.frequencies[a].total_cmp(&self.frequencies[b]));
        order.reverse();

        self.frequencies = order.iter().map(|&index| self.frequencies[index]).collect();
        self.impedances = order.iter().map(|&index| self.impedances[index]).collect();
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn impedances(&self) -> &[Complex64] {
        &self.impedances
    }

    pub fn admittances(&self) -> Vec<Complex64> {
        self.impedances.iter().map(|impedance| impedance.inv()).collect()
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = ImpedancePoint> + '_ {
        self.frequencies
            .iter()
            .zip(&self.impedances)
            .map(|(&frequency, &impedance)| ImpedancePoint::new(frequency, impedance))
    }

    /// `(R, -X)` pairs, the usual Nyquist axes.
    pub fn nyquist_points(&self) -> Vec<(f64, f64)> {
        self.points()
            .map(|point| (point.resistance(), -point.reactance()))
            .collect()
    }

    pub fn bode_points(&self) -> Vec<BodePoint> {
        self.points()
            .map(|point| BodePoint {
                frequency: point.frequency,
                magnitude_db: point.magnitude_db(),
                phase_degrees: point.phase_degrees(),
            })
            .collect()
    }
}

/// Re-analyzes every waveform under `eis_data` without a window and returns
/// the spectrum sorted by descending frequency, whatever order the groups were
/// written or listed in.
pub fn retrieve_impedance_spectrum<S>(store: &S, options: AnalysisOptions) -> EisResult<Spectrum>
where
    S: WaveformStore + ?Sized,
{
    let mut spectrum = Spectrum::new();
    for child in store.list_children(EIS_DATA_GROUP)? {
        let path = format!("{EIS_DATA_GROUP}/{child}");
        let waveform = store.read(&path)?;
        let analysis = fourier_analysis(&waveform, None, options)?;
        debug!(path = %path, points = analysis.frequencies.len(), "re-analyzed stored waveform");
        spectrum.record_analysis(&analysis)?;
    }
    spectrum.sort_descending();
    Ok(spectrum)
}
