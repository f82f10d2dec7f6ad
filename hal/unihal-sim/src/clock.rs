//! Virtual time
//!
//! Time only moves when something waits on it, so polling loops run
//! instantly and their timing can be asserted exactly.

use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use unihal::Clock;

/// Shared virtual microsecond counter
///
/// Clones observe and advance the same counter, which lets a test keep a
/// clone while the chip owns another.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now_us: Rc<Cell<u64>>,
}

impl SimClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance_us(&self, us: u64) {
        self.now_us.set(self.now_us.get().saturating_add(us));
    }

    /// Move time forward in milliseconds
    pub fn advance_ms(&self, ms: u64) {
        self.advance_us(ms.saturating_mul(1_000));
    }

    /// Current time in milliseconds (truncated)
    pub fn now_ms(&self) -> u64 {
        self.now_us.get() / 1_000
    }
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.advance_us(u64::from(ns).div_ceil(1_000));
    }
}

impl Clock for SimClock {
    fn now_us(&self) -> u64 {
        self.now_us.get()
    }
}
