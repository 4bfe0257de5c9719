//! EC-Lab compatible ASCII export of an impedance spectrum.

use crate::domain::{EisError, EisResult, ImpedancePoint};
use crate::observer::{SpectrumObserver, SpectrumSnapshot};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const LINE_ENDING: &str = "\r\n";
const UNAVAILABLE: f64 = 255.0;
const DIGITS: usize = 7;

pub const ECLAB_COLUMNS: [&str; 18] = [
    "freq/Hz",
    "Re(Z)/Ohm",
    "-Im(Z)/Ohm",
    "|Z|/Ohm",
    "Phase(Z)/deg",
    "time/s",
    "<Ewe>/V",
    "<I>/mA",
    "Cs/uF",
    "Cp/uF",
    "cycle number",
    "I Range",
    "|Ewe|/V",
    "|I|/A",
    "Re(Y)/Ohm-1",
    "Im(Y)/Ohm-1",
    "|Y|/Ohm-1",
    "Phase(Y)/deg",
];

/// `{:.Ne}` with a signed exponent of at least two digits, e.g. `2.5500000e+02`.
pub fn format_scientific(value: f64, precision: usize) -> String {
    let formatted = format!("{value:.precision$e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => formatted,
    }
}

pub fn render_eclab_ascii(snapshot: &SpectrumSnapshot<'_>) -> String {
    let mut header = vec![
        "EC-Lab ASCII FILE".to_string(),
        String::new(),
        String::new(),
        "Potentio Electrochemical Impedance Spectroscopy".to_string(),
        String::new(),
        format!(
            "Generated using eis-core version \"{}\"",
            env!("CARGO_PKG_VERSION")
        ),
        String::new(),
        "Device".to_string(),
        "------".to_string(),
    ];
    for (name, value) in snapshot.properties {
        header.push(format!("{name:<32} {}", format_scientific(*value, DIGITS)));
    }
    header.push(String::new());
    header.push(ECLAB_COLUMNS.join("\t"));
    header[1] = format!("Nb header lines : {}", header.len());

    let mut content = String::new();
    for line in &header {
        content.push_str(line);
        content.push_str(LINE_ENDING);
    }
    for point in snapshot.spectrum.points() {
        for value in data_row(&point) {
            content.push_str(&format_scientific(value, DIGITS));
            content.push('\t');
        }
        content.push_str(LINE_ENDING);
    }
    content
}

fn data_row(point: &ImpedancePoint) -> [f64; 18] {
    let admittance = point.admittance();
    [
        point.frequency,
        point.resistance(),
        -point.reactance(),
        point.magnitude(),
        point.phase_degrees(),
        UNAVAILABLE,
        UNAVAILABLE,
        UNAVAILABLE,
        UNAVAILABLE,
        UNAVAILABLE,
        UNAVAILABLE,
        UNAVAILABLE,
        UNAVAILABLE,
        UNAVAILABLE,
        admittance.re,
        admittance.im,
        admittance.norm(),
        admittance.arg().to_degrees(),
    ]
}

/// Rewrites the whole file on every update.
#[derive(Debug, Clone)]
pub struct EcLabAsciiExport {
    path: PathBuf,
}

impl EcLabAsciiExport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SpectrumObserver for EcLabAsciiExport {
    fn update(&mut self, snapshot: &SpectrumSnapshot<'_>) -> EisResult<()> {
        let content = render_eclab_ascii(snapshot);
        fs::write(&self.path, &content).map_err(|source| {
            EisError::io_system(
                "IO.EXPORT_WRITE",
                format!(
                    "failed to write EC-Lab export '{}': {}",
                    self.path.display(),
                    source
                ),
            )
        })?;
        debug!(
            path = %self.path.display(),
            points = snapshot.spectrum.len(),
            "wrote EC-Lab export"
        );
        Ok(())
    }
}
