//! Time source for bounded busy-waits
//!
//! Polling transfers spin on status flags while a [`Deadline`] runs down.
//! The clock is injected so tests can drive virtual time deterministically
//! instead of sleeping.

use embedded_hal::delay::DelayNs;

/// Interval between two status-flag polls (one poll granularity)
pub const POLL_INTERVAL_US: u32 = 1_000;

/// Monotonic time source with busy-wait delays
pub trait Clock: DelayNs {
    /// Microseconds since an arbitrary fixed origin
    fn now_us(&self) -> u64;
}

/// Millisecond deadline measured against a [`Clock`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deadline {
    start_us: u64,
    /// `None` waits forever
    budget_us: Option<u64>,
}

impl Deadline {
    /// Start a deadline `timeout_ms` from now
    ///
    /// A timeout of 0 never expires.
    pub fn after_ms<C: Clock + ?Sized>(clock: &C, timeout_ms: u32) -> Self {
        Self {
            start_us: clock.now_us(),
            budget_us: match timeout_ms {
                0 => None,
                ms => Some(u64::from(ms) * 1_000),
            },
        }
    }

    /// A deadline that never expires
    pub fn never<C: Clock + ?Sized>(clock: &C) -> Self {
        Self::after_ms(clock, 0)
    }

    /// Microseconds elapsed since the deadline was started
    pub fn elapsed_us<C: Clock + ?Sized>(&self, clock: &C) -> u64 {
        clock.now_us().saturating_sub(self.start_us)
    }

    /// Check whether the budget has run out
    pub fn expired<C: Clock + ?Sized>(&self, clock: &C) -> bool {
        match self.budget_us {
            Some(budget) => self.elapsed_us(clock) >= budget,
            None => false,
        }
    }

    /// Check whether this deadline can ever expire
    pub fn is_bounded(&self) -> bool {
        self.budget_us.is_some()
    }
}

/// [`Clock`] backed by the embassy-time driver
#[cfg(feature = "embassy-time")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

#[cfg(feature = "embassy-time")]
impl DelayNs for EmbassyClock {
    fn delay_ns(&mut self, ns: u32) {
        embassy_time::block_for(embassy_time::Duration::from_nanos(u64::from(ns)));
    }
}

#[cfg(feature = "embassy-time")]
impl Clock for EmbassyClock {
    fn now_us(&self) -> u64 {
        embassy_time::Instant::now().as_micros()
    }
}
