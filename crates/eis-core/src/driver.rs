//! Drives a device through the excitation cycles of one frequency point.

use crate::config::ExperimentConfig;
use crate::device::DeviceModel;
use crate::domain::Waveform;
use std::f64::consts::PI;
use tracing::trace;

/// `dc + Σ aₖ sin(2π hₖ f t + φₖ)` over the configured harmonics.
pub fn excitation_voltage(config: &ExperimentConfig, frequency: f64, time: f64) -> f64 {
    config.dc_voltage()
        + config
            .excitation()
            .iter()
            .map(|component| {
                component.amplitude
                    * (2.0 * PI * f64::from(component.harmonic) * frequency * time
                        + component.phase)
                        .sin()
            })
            .sum::<f64>()
}

/// Runs `cycles × steps_per_cycle` steps at `frequency` and records the
/// device response after each step. Elapsed time restarts at zero for every
/// point while device state carries over from the previous one.
pub fn run_one_frequency<D>(device: &mut D, config: &ExperimentConfig, frequency: f64) -> Waveform
where
    D: DeviceModel + ?Sized,
{
    let steps_per_cycle = config.steps_per_cycle();
    let time_step = 1.0 / (frequency * steps_per_cycle as f64);
    let mut waveform = Waveform::with_capacity(config.samples_per_point());
    let mut time = 0.0;

    for cycle in 0..config.cycles() {
        for _ in 0..steps_per_cycle {
            time += time_step;
            let voltage = excitation_voltage(config, frequency, time);
            device.advance(time_step, voltage);
            waveform.push(time, device.current(), device.voltage());
        }
        trace!(frequency, cycle, "cycle complete");
    }

    waveform
}
