//! Consumers notified after each recorded frequency point.

use crate::device::DeviceProperties;
use crate::domain::EisResult;
use crate::spectrum::Spectrum;

/// The accumulated spectrum plus the device metadata captured before the sweep.
#[derive(Debug, Clone, Copy)]
pub struct SpectrumSnapshot<'a> {
    pub spectrum: &'a Spectrum,
    pub properties: &'a DeviceProperties,
}

/// Called synchronously once per point. An error stops the sweep; points
/// already recorded stay in the spectrum.
pub trait SpectrumObserver {
    fn update(&mut self, snapshot: &SpectrumSnapshot<'_>) -> EisResult<()>;
}

impl<F> SpectrumObserver for F
where
    F: FnMut(&SpectrumSnapshot<'_>) -> EisResult<()>,
{
    fn update(&mut self, snapshot: &SpectrumSnapshot<'_>) -> EisResult<()> {
        self(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::{SpectrumObserver, SpectrumSnapshot};
    use crate::device::DeviceProperties;
    use crate::domain::{EisError, EisResult};
    use crate::spectrum::Spectrum;

    #[test]
    fn closures_act_as_observers() {
        let spectrum = Spectrum::new();
        let properties = DeviceProperties::new();
        let snapshot = SpectrumSnapshot {
            spectrum: &spectrum,
            properties: &properties,
        };

        let mut seen = 0_usize;
        let mut counting = |snapshot: &SpectrumSnapshot<'_>| -> EisResult<()> {
            seen += 1 + snapshot.spectrum.len();
            Ok(())
        };
        counting.update(&snapshot).expect("observer should accept");
        counting.update(&snapshot).expect("observer should accept");
        assert_eq!(seen, 2);

        let mut failing = |_: &SpectrumSnapshot<'_>| -> EisResult<()> {
            Err(EisError::io_system("IO.OBSERVER", "closed"))
        };
        let error = failing.update(&snapshot).expect_err("observer should fail");
        assert_eq!(error.placeholder(), "IO.OBSERVER");
    }
}
