//! unihal board support
//!
//! Pin tables and UART defaults for supported boards, the bring-up routine
//! that turns them into registered handles, and the build-time choice of
//! chip backend.
//!
//! # Backend selection
//!
//! Exactly one `chip-*` cargo feature picks [`ActiveChip`]. Application
//! code names only `Hal<ActiveChip>`, so switching chips is a build
//! change and never a code change.
//!
//! | Feature    | Backend                   |
//! |------------|---------------------------|
//! | `chip-sim` | [`unihal_sim::SimChip`]   |

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod board;
pub mod boards;
pub mod bringup;

pub use board::{BoardDescription, GpioRole, UartDefaults, UartRole};
pub use bringup::{init_board, BoardDevices, BringupError};

/// Backend compiled into this build
#[cfg(feature = "chip-sim")]
pub type ActiveChip = unihal_sim::SimChip;

/// HAL over the simulated chip, with its clock at zero
#[cfg(feature = "chip-sim")]
pub fn active_hal() -> unihal::Hal<ActiveChip> {
    unihal::Hal::new(unihal_sim::SimChip::new(unihal_sim::SimClock::new()))
}
