//! Experiment configuration.
//!
//! A JSON document (or an [`ExperimentConfigInput`] built in code) is checked
//! once and turned into an immutable [`ExperimentConfig`]. Phases are given in
//! degrees on input and held in radians afterwards.

use crate::analysis::AnalysisWindow;
use crate::domain::{EisError, EisResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExperimentConfigInput {
    pub frequency_upper_limit: f64,
    pub frequency_lower_limit: f64,
    pub steps_per_decade: u32,
    pub steps_per_cycle: usize,
    pub cycles: usize,
    pub ignore_cycles: usize,
    #[serde(default)]
    pub dc_voltage: f64,
    pub harmonics: Vec<u32>,
    pub amplitudes: Vec<f64>,
    /// Degrees.
    pub phases: Vec<f64>,
}

/// One sinusoidal component of the excitation signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicExcitation {
    pub harmonic: u32,
    pub amplitude: f64,
    /// Radians.
    pub phase: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    frequency_upper_limit: f64,
    frequency_lower_limit: f64,
    steps_per_decade: u32,
    steps_per_cycle: usize,
    cycles: usize,
    ignore_cycles: usize,
    dc_voltage: f64,
    excitation: Vec<HarmonicExcitation>,
}

impl ExperimentConfig {
    pub fn new(input: ExperimentConfigInput) -> EisResult<Self> {
        if input.cycles <= input.ignore_cycles {
            return Err(EisError::input_validation(
                "INPUT.CONFIG_CYCLES",
                format!(
                    "cycles ({}) must be greater than ignore_cycles ({})",
                    input.cycles, input.ignore_cycles
                ),
            ));
        }
        if input.steps_per_cycle == 0 {
            return Err(EisError::input_validation(
                "INPUT.CONFIG_STEPS_PER_CYCLE",
                "steps_per_cycle must be positive",
            ));
        }
        if input.harmonics.is_empty() {
            return Err(EisError::input_validation(
                "INPUT.CONFIG_EXCITATION",
                "at least one excited harmonic is required",
            ));
        }
        if input.amplitudes.len() != input.harmonics.len()
            || input.phases.len() != input.harmonics.len()
        {
            return Err(EisError::input_validation(
                "INPUT.CONFIG_EXCITATION",
                format!(
                    "harmonics ({}), amplitudes ({}) and phases ({}) must have the same length",
                    input.harmonics.len(),
                    input.amplitudes.len(),
                    input.phases.len()
                ),
            ));
        }

        let excitation = input
            .harmonics
            .iter()
            .zip(&input.amplitudes)
            .zip(&input.phases)
            .map(|((&harmonic, &amplitude), &phase)| HarmonicExcitation {
                harmonic,
                amplitude,
                phase: phase.to_radians(),
            })
            .collect();

        Ok(Self {
            frequency_upper_limit: input.frequency_upper_limit,
            frequency_lower_limit: input.frequency_lower_limit,
            steps_per_decade: input.steps_per_decade,
            steps_per_cycle: input.steps_per_cycle,
            cycles: input.cycles,
            ignore_cycles: input.ignore_cycles,
            dc_voltage: input.dc_voltage,
            excitation,
        })
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let input: ExperimentConfigInput =
            serde_json::from_str(source).map_err(|source| ConfigError::Parse {
                path: None,
                source,
            })?;
        Ok(Self::new(input)?)
    }

    pub fn frequency_upper_limit(&self) -> f64 {
        self.frequency_upper_limit
    }

    pub fn frequency_lower_limit(&self) -> f64 {
        self.frequency_lower_limit
    }

    pub fn steps_per_decade(&self) -> u32 {
        self.steps_per_decade
    }

    pub fn steps_per_cycle(&self) -> usize {
        self.steps_per_cycle
    }

    pub fn cycles(&self) -> usize {
        self.cycles
    }

    pub fn ignore_cycles(&self) -> usize {
        self.ignore_cycles
    }

    pub fn dc_voltage(&self) -> f64 {
        self.dc_voltage
    }

    pub fn excitation(&self) -> &[HarmonicExcitation] {
        &self.excitation
    }

    pub fn samples_per_point(&self) -> usize {
        self.cycles * self.steps_per_cycle
    }

    pub fn analysis_window(&self) -> AnalysisWindow {
        AnalysisWindow {
            steps_per_cycle: self.steps_per_cycle,
            cycles: self.cycles,
            ignore_cycles: self.ignore_cycles,
            harmonics: self
                .excitation
                .iter()
                .map(|component| component.harmonic)
                .collect(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read experiment configuration '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse experiment configuration{}: {source}", describe_path(path.as_deref()))]
    Parse {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Invalid(#[from] EisError),
}

fn describe_path(path: Option<&Path>) -> String {
    path.map(|path| format!(" '{}'", path.display()))
        .unwrap_or_default()
}

impl From<ConfigError> for EisError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::Read { .. } => EisError::io_system("IO.CONFIG_READ", error.to_string()),
            ConfigError::Parse { .. } => {
                EisError::input_validation("INPUT.CONFIG_PARSE", error.to_string())
            }
            ConfigError::Invalid(inner) => inner,
        }
    }
}

pub fn load_experiment_config(path: impl AsRef<Path>) -> Result<ExperimentConfig, ConfigError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let input: ExperimentConfigInput =
        serde_json::from_str(&source).map_err(|source| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })?;
    Ok(ExperimentConfig::new(input)?)
}
