//! Frequency sweep experiment.
//!
//! [`ImpedanceSpectroscopy`] drives a device through every frequency of its
//! sweep in order. Device state carries over from one point to the next, so a
//! run is strictly sequential and the experiment must not be shared between
//! overlapping runs.

use crate::analysis::{AnalysisOptions, AnalysisWindow, fourier_analysis};
use crate::config::ExperimentConfig;
use crate::device::DeviceModel;
use crate::domain::EisResult;
use crate::driver::run_one_frequency;
use crate::observer::{SpectrumObserver, SpectrumSnapshot};
use crate::spectrum::Spectrum;
use crate::store::{WaveformStore, frequency_point_path};
use crate::sweep::FrequencySweep;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

pub struct ImpedanceSpectroscopy {
    config: ExperimentConfig,
    window: AnalysisWindow,
    sweep: FrequencySweep,
    options: AnalysisOptions,
    spectrum: Spectrum,
    observers: Vec<Box<dyn SpectrumObserver>>,
}

impl ImpedanceSpectroscopy {
    /// Plans the logarithmic sweep from the configured bounds.
    pub fn new(config: ExperimentConfig) -> Self {
        let sweep = FrequencySweep::from_config(&config);
        Self::with_sweep(config, sweep)
    }

    /// Uses `frequencies` as given, in the given order.
    pub fn with_frequencies(config: ExperimentConfig, frequencies: impl Into<Vec<f64>>) -> Self {
        Self::with_sweep(config, FrequencySweep::explicit(frequencies))
    }

    fn with_sweep(config: ExperimentConfig, sweep: FrequencySweep) -> Self {
        Self {
            window: config.analysis_window(),
            config,
            sweep,
            options: AnalysisOptions::default(),
            spectrum: Spectrum::new(),
            observers: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn attach(&mut self, observer: Box<dyn SpectrumObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn sweep(&self) -> &FrequencySweep {
        &self.sweep
    }

    pub fn spectrum(&self) -> &Spectrum {
        &self.spectrum
    }

    pub fn reset(&mut self) {
        self.spectrum.reset();
    }

    /// Runs the whole sweep, appending to the current spectrum.
    ///
    /// For each frequency the device is driven for the configured number of
    /// cycles, the raw waveform is written to `store` when one is given, and
    /// the analyzed points are recorded before every observer is notified.
    /// The first failure (analysis, store or observer) ends the run; points
    /// recorded before it are kept.
    pub fn run<D>(&mut self, device: &mut D, mut store: Option<&mut dyn WaveformStore>) -> EisResult<()>
    where
        D: DeviceModel + ?Sized,
    {
        let properties = device.inspect();
        let mut persisted_paths = BTreeSet::new();
        info!(
            points = self.sweep.len(),
            persisted = store.is_some(),
            observers = self.observers.len(),
            "starting impedance sweep"
        );

        for frequency in self.sweep.iter() {
            let waveform = run_one_frequency(device, &self.config, frequency);
            if let Some(store) = store.as_deref_mut() {
                let path = frequency_point_path(frequency);
                store.write(&path, &waveform)?;
                if !persisted_paths.insert(path) {
                    warn!(
                        frequency,
                        "frequency repeated in sweep; its stored waveform was replaced"
                    );
                }
            }

            let analysis = fourier_analysis(&waveform, Some(&self.window), self.options)?;
            self.spectrum.record_analysis(&analysis)?;
            debug!(
                frequency,
                recorded = self.spectrum.len(),
                "frequency point recorded"
            );

            let snapshot = SpectrumSnapshot {
                spectrum: &self.spectrum,
                properties: &properties,
            };
            for observer in &mut self.observers {
                observer.update(&snapshot)?;
            }
        }

        info!(recorded = self.spectrum.len(), "impedance sweep complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ImpedanceSpectroscopy;
    use crate::config::{ExperimentConfig, ExperimentConfigInput};
    use crate::device::SeriesRc;
    use crate::domain::{EisError, EisResult};
    use crate::observer::SpectrumSnapshot;
    use crate::store::{EIS_DATA_GROUP, MemoryStore, WaveformStore};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn config() -> ExperimentConfig {
        ExperimentConfig::new(ExperimentConfigInput {
            frequency_upper_limit: 1.0e2,
            frequency_lower_limit: 1.0e-1,
            steps_per_decade: 1,
            steps_per_cycle: 64,
            cycles: 2,
            ignore_cycles: 1,
            dc_voltage: 0.0,
            harmonics: vec![3],
            amplitudes: vec![5.0e-3],
            phases: vec![0.0],
        })
        .expect("config should be valid")
    }

    #[test]
    fn run_records_one_point_per_frequency_in_sweep_order() {
        let mut experiment = ImpedanceSpectroscopy::new(config());
        let mut device = SeriesRc::new(0.1, 2.5);
        experiment
            .run(&mut device, None)
            .expect("sweep should succeed");

        let recorded = experiment.spectrum().frequencies();
        let expected = [300.0, 30.0, 3.0, 0.3];
        assert_eq!(recorded.len(), expected.len());
        for (recorded, expected) in recorded.iter().zip(expected) {
            assert!((recorded - expected).abs() <= 1.0e-9 * expected);
        }
    }

    #[test]
    fn explicit_frequencies_keep_caller_order_and_reset_clears() {
        let mut experiment = ImpedanceSpectroscopy::with_frequencies(config(), vec![1.0, 4.0]);
        let mut device = SeriesRc::new(0.1, 2.5);
        experiment
            .run(&mut device, None)
            .expect("sweep should succeed");
        assert_eq!(experiment.spectrum().frequencies(), &[3.0, 12.0]);
        assert_eq!(experiment.sweep().frequencies(), &[1.0, 4.0]);

        experiment.reset();
        assert!(experiment.spectrum().is_empty());
    }

    #[test]
    fn store_receives_one_group_per_frequency() {
        let mut experiment = ImpedanceSpectroscopy::new(config());
        let mut device = SeriesRc::new(0.1, 2.5);
        let mut store = MemoryStore::new();
        experiment
            .run(&mut device, Some(&mut store))
            .expect("sweep should succeed");

        let children = store
            .list_children(EIS_DATA_GROUP)
            .expect("groups should be listed");
        assert_eq!(
            children,
            vec![
                "frequency=0.1Hz",
                "frequency=100Hz",
                "frequency=10Hz",
                "frequency=1Hz",
            ]
        );
    }

    #[test]
    fn repeated_frequency_keeps_one_stored_group() {
        let mut experiment = ImpedanceSpectroscopy::with_frequencies(config(), vec![1.0, 1.0]);
        let mut device = SeriesRc::new(0.1, 2.5);
        let mut store = MemoryStore::new();
        experiment
            .run(&mut device, Some(&mut store))
            .expect("sweep should succeed");

        assert_eq!(experiment.spectrum().len(), 2);
        assert_eq!(
            store
                .list_children(EIS_DATA_GROUP)
                .expect("groups should be listed"),
            vec!["frequency=1Hz"]
        );
    }

    #[test]
    fn observers_see_every_point_and_failures_abort() {
        let mut experiment = ImpedanceSpectroscopy::new(config());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        experiment.attach(Box::new(move |snapshot: &SpectrumSnapshot<'_>| -> EisResult<()> {
            log.borrow_mut().push(snapshot.spectrum.len());
            assert!(snapshot.properties.contains_key("capacitance"));
            Ok(())
        }));
        experiment.attach(Box::new(|snapshot: &SpectrumSnapshot<'_>| -> EisResult<()> {
            if snapshot.spectrum.len() == 2 {
                return Err(EisError::io_system("IO.OBSERVER", "observer went away"));
            }
            Ok(())
        }));

        let mut device = SeriesRc::new(0.1, 2.5);
        let error = experiment
            .run(&mut device, None)
            .expect_err("failing observer should abort the sweep");

        assert_eq!(error.placeholder(), "IO.OBSERVER");
        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(experiment.spectrum().len(), 2);
    }
}
