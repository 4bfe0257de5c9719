use super::CliError;
use anyhow::Context;
use eis_core::analysis::AnalysisOptions;
use eis_core::config::{ExperimentConfig, load_experiment_config};
use eis_core::device::{DeviceModel, DeviceProperties, ParallelRc, SeriesRc};
use eis_core::domain::{AdvisoryPolicy, EisError};
use eis_core::experiment::ImpedanceSpectroscopy;
use eis_core::export::{EcLabAsciiExport, format_scientific};
use eis_core::observer::{SpectrumObserver, SpectrumSnapshot};
use eis_core::spectrum::{Spectrum, retrieve_impedance_spectrum};
use eis_core::store::{DirectoryStore, WaveformStore};
use eis_core::sweep::FrequencySweep;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(clap::Args)]
pub(super) struct FrequenciesArgs {
    /// Experiment configuration (JSON)
    #[arg(long)]
    config: PathBuf,

    #[command(flatten)]
    output: OutputFlags,
}

#[derive(clap::Args)]
pub(super) struct SweepArgs {
    /// Experiment configuration (JSON)
    #[arg(long)]
    config: PathBuf,

    /// Reference circuit to drive
    #[arg(long, value_enum)]
    circuit: Circuit,

    /// Series resistance in ohm
    #[arg(long)]
    series_resistance: f64,

    /// Capacitance in farad
    #[arg(long)]
    capacitance: f64,

    /// Leakage resistance across the capacitor in ohm (parallel-rc only)
    #[arg(long)]
    parallel_resistance: Option<f64>,

    /// Directory to persist per-frequency waveforms into
    #[arg(long)]
    store: Option<PathBuf>,

    /// EC-Lab ASCII file rewritten after every frequency point
    #[arg(long)]
    export: Option<PathBuf>,

    /// Fail instead of warning when the analysis window is not a power of two
    #[arg(long)]
    deny_advisories: bool,

    #[command(flatten)]
    output: OutputFlags,
}

#[derive(clap::Args)]
pub(super) struct RetrieveArgs {
    /// Directory written by `eis sweep --store`
    #[arg(long)]
    store: PathBuf,

    /// EC-Lab ASCII file for the retrieved spectrum
    #[arg(long)]
    export: Option<PathBuf>,

    #[command(flatten)]
    output: OutputFlags,
}

#[derive(clap::Args)]
struct OutputFlags {
    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Circuit {
    SeriesRc,
    ParallelRc,
}

#[derive(Serialize)]
struct SpectrumRow {
    frequency: f64,
    resistance: f64,
    reactance: f64,
    magnitude_db: f64,
    phase_degrees: f64,
}

pub(super) fn run_frequencies_command(args: FrequenciesArgs) -> Result<i32, CliError> {
    let config = load_config(&args.config)?;
    let sweep = FrequencySweep::from_config(&config);

    if args.output.json {
        let encoded = serde_json::to_string_pretty(sweep.frequencies())
            .context("failed to encode frequencies as JSON")?;
        println!("{encoded}");
    } else {
        for frequency in sweep.iter() {
            println!("{frequency}");
        }
    }
    Ok(0)
}

pub(super) fn run_sweep_command(args: SweepArgs) -> Result<i32, CliError> {
    let config = load_config(&args.config)?;
    let mut device = build_device(&args)?;
    let options = AnalysisOptions {
        advisory_policy: if args.deny_advisories {
            AdvisoryPolicy::Deny
        } else {
            AdvisoryPolicy::Warn
        },
    };

    let mut experiment = ImpedanceSpectroscopy::new(config).with_options(options);
    if let Some(path) = &args.export {
        experiment.attach(Box::new(EcLabAsciiExport::new(path)));
    }

    let mut store = args.store.as_ref().map(|root| DirectoryStore::new(root));
    experiment
        .run(
            device.as_mut(),
            store.as_mut().map(|store| store as &mut dyn WaveformStore),
        )
        .map_err(CliError::Compute)?;
    if let Some(store) = &store {
        info!(root = %store.root().display(), "waveforms persisted");
    }

    print_spectrum(experiment.spectrum(), args.output.json)?;
    Ok(0)
}

pub(super) fn run_retrieve_command(args: RetrieveArgs) -> Result<i32, CliError> {
    let store = DirectoryStore::new(&args.store);
    let spectrum = retrieve_impedance_spectrum(&store, AnalysisOptions::default())
        .map_err(CliError::Compute)?;

    if let Some(path) = &args.export {
        let properties = DeviceProperties::new();
        EcLabAsciiExport::new(path)
            .update(&SpectrumSnapshot {
                spectrum: &spectrum,
                properties: &properties,
            })
            .map_err(CliError::Compute)?;
    }

    print_spectrum(&spectrum, args.output.json)?;
    Ok(0)
}

fn load_config(path: &Path) -> Result<ExperimentConfig, CliError> {
    load_experiment_config(path).map_err(|error| CliError::Compute(EisError::from(error)))
}

fn build_device(args: &SweepArgs) -> Result<Box<dyn DeviceModel>, CliError> {
    require_positive("--series-resistance", args.series_resistance)?;
    require_positive("--capacitance", args.capacitance)?;

    match args.circuit {
        Circuit::SeriesRc => {
            if args.parallel_resistance.is_some() {
                return Err(CliError::Usage(
                    "--parallel-resistance only applies to --circuit parallel-rc".to_string(),
                ));
            }
            Ok(Box::new(SeriesRc::new(
                args.series_resistance,
                args.capacitance,
            )))
        }
        Circuit::ParallelRc => {
            let parallel_resistance = args.parallel_resistance.ok_or_else(|| {
                CliError::Usage(
                    "--circuit parallel-rc requires --parallel-resistance".to_string(),
                )
            })?;
            require_positive("--parallel-resistance", parallel_resistance)?;
            Ok(Box::new(ParallelRc::new(
                args.series_resistance,
                parallel_resistance,
                args.capacitance,
            )))
        }
    }
}

fn require_positive(flag: &str, value: f64) -> Result<(), CliError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CliError::Usage(format!(
            "{flag} must be a positive finite number, got {value}"
        )))
    }
}

fn print_spectrum(spectrum: &Spectrum, json: bool) -> Result<(), CliError> {
    let rows: Vec<SpectrumRow> = spectrum
        .points()
        .map(|point| SpectrumRow {
            frequency: point.frequency,
            resistance: point.resistance(),
            reactance: point.reactance(),
            magnitude_db: point.magnitude_db(),
            phase_degrees: point.phase_degrees(),
        })
        .collect();

    if json {
        let encoded =
            serde_json::to_string_pretty(&rows).context("failed to encode spectrum as JSON")?;
        println!("{encoded}");
        return Ok(());
    }

    println!(
        "{:>15} {:>15} {:>15} {:>15} {:>15}",
        "freq/Hz", "Re(Z)/Ohm", "Im(Z)/Ohm", "|Z|/dB", "Phase(Z)/deg"
    );
    for row in rows {
        println!(
            "{:>15} {:>15} {:>15} {:>15} {:>15}",
            format_scientific(row.frequency, 6),
            format_scientific(row.resistance, 6),
            format_scientific(row.reactance, 6),
            format_scientific(row.magnitude_db, 6),
            format_scientific(row.phase_degrees, 6),
        );
    }
    Ok(())
}
