//! Lumped RC equivalent circuits with closed-form time stepping.
//!
//! Both circuits reduce to a single capacitor voltage `u` relaxing towards a
//! scaled copy of the terminal voltage. With the terminal voltage ramping
//! linearly across a step the update is exact:
//!
//! `u(dt) = v'(dt) - a'τ + (u(0) - v'(0) + a'τ) e^(-dt/τ)`

use super::{DeviceModel, DeviceProperties};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct RcState {
    capacitor_voltage: f64,
    terminal_voltage: f64,
    current: f64,
}

impl RcState {
    /// `gain` maps terminal voltage onto the capacitor's relaxation target.
    fn relax(&mut self, time_step: f64, voltage: f64, tau: f64, gain: f64) {
        let start = self.terminal_voltage * gain;
        let end = voltage * gain;
        let slope = (end - start) / time_step;
        let decay = (-time_step / tau).exp();
        self.capacitor_voltage =
            end - slope * tau + (self.capacitor_voltage - start + slope * tau) * decay;
        self.terminal_voltage = voltage;
    }
}

/// Resistor in series with a capacitor: `Z = R + 1/(jωC)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRc {
    series_resistance: f64,
    capacitance: f64,
    state: RcState,
}

impl SeriesRc {
    pub fn new(series_resistance: f64, capacitance: f64) -> Self {
        Self {
            series_resistance,
            capacitance,
            state: RcState::default(),
        }
    }
}

impl DeviceModel for SeriesRc {
    fn advance(&mut self, time_step: f64, voltage: f64) {
        let tau = self.series_resistance * self.capacitance;
        self.state.relax(time_step, voltage, tau, 1.0);
        self.state.current = (voltage - self.state.capacitor_voltage) / self.series_resistance;
    }

    fn current(&self) -> f64 {
        self.state.current
    }

    fn voltage(&self) -> f64 {
        self.state.terminal_voltage
    }

    fn inspect(&self) -> DeviceProperties {
        DeviceProperties::from([
            ("series_resistance".to_string(), self.series_resistance),
            ("capacitance".to_string(), self.capacitance),
        ])
    }
}

/// Resistor in series with a leaky capacitor: `Z = R + R_L/(1 + jωR_LC)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParallelRc {
    series_resistance: f64,
    parallel_resistance: f64,
    capacitance: f64,
    state: RcState,
}

impl ParallelRc {
    pub fn new(series_resistance: f64, parallel_resistance: f64, capacitance: f64) -> Self {
        Self {
            series_resistance,
            parallel_resistance,
            capacitance,
            state: RcState::default(),
        }
    }
}

impl DeviceModel for ParallelRc {
    fn advance(&mut self, time_step: f64, voltage: f64) {
        let divider = 1.0 + self.series_resistance / self.parallel_resistance;
        let tau = self.series_resistance * self.capacitance / divider;
        self.state.relax(time_step, voltage, tau, divider.recip());
        self.state.current = (voltage - self.state.capacitor_voltage) / self.series_resistance;
    }

    fn current(&self) -> f64 {
        self.state.current
    }

    fn voltage(&self) -> f64 {
        self.state.terminal_voltage
    }

    fn inspect(&self) -> DeviceProperties {
        DeviceProperties::from([
            ("series_resistance".to_string(), self.series_resistance),
            ("parallel_resistance".to_string(), self.parallel_resistance),
            ("capacitance".to_string(), self.capacitance),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::{ParallelRc, SeriesRc};
    use crate::device::DeviceModel;

    #[test]
    fn series_rc_charges_towards_held_voltage() {
        let mut device = SeriesRc::new(1.0, 1.0);
        device.advance(1.0e-9, 1.0);
        for _ in 0..50 {
            device.advance(1.0, 1.0);
        }
        assert_eq!(device.voltage(), 1.0);
        assert!(device.current().abs() < 1.0e-12);
    }

    #[test]
    fn series_rc_initial_current_follows_resistor() {
        let mut device = SeriesRc::new(2.0, 1.0e6);
        device.advance(1.0e-3, 1.0);
        device.advance(1.0e-3, 1.0);
        assert!((device.current() - 0.5).abs() < 1.0e-6);
    }

    #[test]
    fn parallel_rc_settles_on_resistive_divider() {
        let mut device = ParallelRc::new(1.0, 3.0, 1.0);
        device.advance(1.0e-9, 2.0);
        for _ in 0..100 {
            device.advance(1.0, 2.0);
        }
        assert!((device.current() - 0.5).abs() < 1.0e-12);
    }

    #[test]
    fn inspect_reports_circuit_parameters() {
        let properties = ParallelRc::new(50.0e-3, 500.0, 3.0).inspect();
        assert_eq!(properties["series_resistance"], 50.0e-3);
        assert_eq!(properties["parallel_resistance"], 500.0);
        assert_eq!(properties["capacitance"], 3.0);
    }
}
