//! Cumulative step counter adapter.
//!
//! Models the platform step-counter sensor: a lifetime total that only
//! grows within a boot cycle and restarts from zero on reboot.  A counter
//! constructed with [`CounterSensor::unavailable`] reports no hardware.

use std::cell::Cell;

use crate::app::ports::StepSensor;

#[derive(Debug, Default)]
pub struct CounterSensor {
    total: Cell<Option<u64>>,
}

impl CounterSensor {
    pub fn new(total: u64) -> Self {
        Self {
            total: Cell::new(Some(total)),
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Record `steps` more steps.  No-op without hardware.
    pub fn walk(&self, steps: u64) {
        if let Some(t) = self.total.get() {
            self.total.set(Some(t.saturating_add(steps)));
        }
    }

    /// Simulate a device reboot: the lifetime total restarts at zero.
    pub fn reboot(&self) {
        if self.total.get().is_some() {
            self.total.set(Some(0));
        }
    }
}

impl StepSensor for CounterSensor {
    fn read_total(&self) -> Option<u64> {
        self.total.get()
    }
}
