//! Device capability seam.
//!
//! The sweep only ever talks to a device through [`DeviceModel`]: advance one
//! step under an applied voltage, then read back current and voltage.

mod circuit;

pub use circuit::{ParallelRc, SeriesRc};

use std::collections::BTreeMap;

/// Named scalar properties reported by a device, used as export metadata.
pub type DeviceProperties = BTreeMap<String, f64>;

pub trait DeviceModel {
    /// Advances internal state by `time_step` seconds while the terminal
    /// voltage moves linearly to `voltage`.
    fn advance(&mut self, time_step: f64, voltage: f64);

    fn current(&self) -> f64;

    fn voltage(&self) -> f64;

    fn inspect(&self) -> DeviceProperties;
}
