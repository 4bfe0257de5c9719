pub mod errors;

pub use errors::{EisError, EisErrorCategory, EisResult};

use num_complex::Complex64;
use std::collections::BTreeMap;

pub const TIME_FIELD: &str = "time";
pub const CURRENT_FIELD: &str = "current";
pub const VOLTAGE_FIELD: &str = "voltage";

/// What to do with non-fatal analysis advisories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AdvisoryPolicy {
    /// Log through `tracing::warn!` and keep going.
    #[default]
    Warn,
    /// Turn the advisory into a `ComputationError`.
    Deny,
}

/// Sampled response for one frequency point.
///
/// The three columns are expected to share one length and a uniform time step;
/// nothing is checked on construction, the analyzer validates before use.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Waveform {
    pub time: Vec<f64>,
    pub current: Vec<f64>,
    pub voltage: Vec<f64>,
}

impl Waveform {
    pub fn new(time: Vec<f64>, current: Vec<f64>, voltage: Vec<f64>) -> Self {
        Self {
            time,
            current,
            voltage,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            time: Vec::with_capacity(capacity),
            current: Vec::with_capacity(capacity),
            voltage: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, time: f64, current: f64, voltage: f64) {
        self.time.push(time);
        self.current.push(current);
        self.voltage.push(voltage);
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Builds a waveform from named columns, as found in a persisted dataset group.
    pub fn from_columns(columns: &BTreeMap<String, Vec<f64>>) -> EisResult<Self> {
        let column = |name: &str| {
            columns.get(name).cloned().ok_or_else(|| {
                EisError::input_validation(
                    "INPUT.WAVEFORM_FIELD_MISSING",
                    format!("waveform has no '{}' column", name),
                )
            })
        };

        Ok(Self {
            time: column(TIME_FIELD)?,
            current: column(CURRENT_FIELD)?,
            voltage: column(VOLTAGE_FIELD)?,
        })
    }

    pub fn into_columns(self) -> BTreeMap<String, Vec<f64>> {
        BTreeMap::from([
            (TIME_FIELD.to_string(), self.time),
            (CURRENT_FIELD.to_string(), self.current),
            (VOLTAGE_FIELD.to_string(), self.voltage),
        ])
    }
}

/// Complex impedance `Z = R + jX` measured at one frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpedancePoint {
    pub frequency: f64,
    pub impedance: Complex64,
}

impl ImpedancePoint {
    pub fn new(frequency: f64, impedance: Complex64) -> Self {
        Self {
            frequency,
            impedance,
        }
    }

    pub fn resistance(&self) -> f64 {
        self.impedance.re
    }

    pub fn reactance(&self) -> f64 {
        self.impedance.im
    }

    pub fn admittance(&self) -> Complex64 {
        self.impedance.inv()
    }

    pub fn magnitude(&self) -> f64 {
        self.impedance.norm()
    }

    pub fn magnitude_db(&self) -> f64 {
        20.0 * self.magnitude().log10()
    }

    pub fn phase_degrees(&self) -> f64 {
        self.impedance.arg().to_degrees()
    }
}
