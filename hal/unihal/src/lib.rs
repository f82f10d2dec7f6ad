//! unihal Hardware Abstraction Layer
//!
//! This crate defines the uniform GPIO and UART operation set, the opaque
//! handle model and the device registry. Chip-specific backends implement
//! the [`gpio::GpioBackend`] and [`uart::UartBackend`] traits; exactly one
//! backend is compiled into a build and [`Hal`] forwards to it without any
//! runtime indirection.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application / board bring-up           │
//! └─────────────────────────────────────────┘
//!          │                     │
//!          ▼                     ▼
//! ┌──────────────────┐   ┌──────────────────┐
//! │  Hal<B> dispatch │   │  DeviceRegistry  │
//! └──────────────────┘   └──────────────────┘
//!          │
//!          ▼  (one backend per build)
//! ┌───────────────┐       ┌───────────────┐
//! │  unihal-sim   │       │  <chip>-hal   │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Modules
//!
//! - [`gpio`] - Pin handles, directions and the GPIO backend contract
//! - [`uart`] - UART configuration, handles and the UART backend contract
//! - [`registry`] - Name to handle directory
//! - [`time`] - Injectable time source for bounded busy-waits
//! - [`hal`] - Dispatch layer and `embedded-hal`/`embedded-io` adapters

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod gpio;
pub mod hal;
pub mod registry;
pub mod time;
pub mod uart;

// Re-export key types at crate root for convenience
pub use gpio::{Direction, GpioBackend, GpioError, GpioHandle, PinFunction};
pub use hal::{Backend, Hal};
pub use registry::{DeviceEntry, DeviceKind, DeviceRef, DeviceRegistry, RegistryError};
pub use time::Clock;
pub use uart::{Parity, StopBits, UartBackend, UartConfig, UartError, UartHandle, UartMode};
