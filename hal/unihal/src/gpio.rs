//! GPIO pin abstractions
//!
//! Defines the opaque pin handle and the contract a chip backend must
//! satisfy to be driven through [`crate::Hal`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// High-impedance input
    #[default]
    Input,
    /// Push-pull output
    Output,
}

/// Peripheral function routed to a pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PinFunction {
    /// Pad is not claimed by anything (reset state)
    #[default]
    Disabled,
    /// Software-controlled GPIO
    Gpio,
    /// UART transmit line
    UartTx,
    /// UART receive line
    UartRx,
}

/// Errors from GPIO configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioError {
    /// Pin number is outside the backend's valid range
    InvalidPin,
    /// Function cannot be routed to this pin
    UnsupportedFunction,
}

/// Opaque handle to an initialized pin
///
/// Handles are small indices into the backend's pin arena. Callers copy
/// them around freely but never look inside; only the backend that issued
/// a handle knows what it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioHandle(u8);

impl GpioHandle {
    /// Create a handle for arena slot `index`
    ///
    /// Intended for backend implementations only.
    pub const fn from_index(index: u8) -> Self {
        Self(index)
    }

    /// Arena slot this handle refers to
    ///
    /// Intended for backend implementations only.
    pub const fn index(self) -> u8 {
        self.0
    }
}

/// GPIO backend contract
///
/// Every operation completes in bounded, short time; none may block.
pub trait GpioBackend {
    /// Number of pins the backend exposes (valid pins are `0..PIN_COUNT`)
    const PIN_COUNT: u8;

    /// Configure `pin` as a GPIO with the given direction
    ///
    /// Re-initializing an already configured pin reconfigures it and
    /// returns the same handle.
    fn gpio_init(&mut self, pin: u8, direction: Direction) -> Result<GpioHandle, GpioError>;

    /// Drive the pin to `level`
    ///
    /// On an input-configured pin the behavior is backend-defined, but no
    /// other pin may be affected.
    fn gpio_set(&mut self, handle: GpioHandle, level: bool);

    /// Sample the pin level regardless of direction
    ///
    /// An output pin reads back its last driven level.
    fn gpio_get(&self, handle: GpioHandle) -> bool;

    /// Return the pin to its reset state
    ///
    /// Must be idempotent. Operations through a released handle are inert.
    fn gpio_release(&mut self, handle: GpioHandle);

    /// Route a peripheral function to `pin`
    fn gpio_set_function(&mut self, pin: u8, function: PinFunction) -> Result<(), GpioError>;
}
