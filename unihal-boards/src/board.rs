//! Board description types
//!
//! A board is a set of named roles mapped onto chip pins, plus the default
//! line settings for each UART it brings out. Descriptions are plain
//! `const` data; nothing here touches hardware.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use unihal::gpio::Direction;
use unihal::uart::{Parity, StopBits, UartConfig, UartMode};

/// Default line settings for a board UART
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UartDefaults {
    /// Chip UART instance wired to the connector
    pub port: u8,
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
    /// Transfer mode
    pub mode: UartMode,
}

impl UartDefaults {
    /// Build the UART configuration these defaults describe
    pub const fn to_config(&self) -> UartConfig {
        UartConfig::new(self.baudrate, self.parity, self.stop_bits, self.mode).with_port(self.port)
    }
}

/// A GPIO with a fixed job on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct GpioRole {
    /// Registry name (e.g. "LED0")
    pub name: &'static str,
    /// Chip pin number
    pub pin: u8,
    /// Direction configured at bring-up
    pub direction: Direction,
}

/// A UART brought out on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct UartRole {
    /// Registry name (e.g. "UART0")
    pub name: &'static str,
    /// Chip pin routed to UART TX
    pub tx_pin: u8,
    /// Chip pin routed to UART RX
    pub rx_pin: u8,
    /// Line settings used by bring-up
    pub defaults: UartDefaults,
}

/// Everything bring-up needs to know about one board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BoardDescription {
    /// Human-readable board name
    pub name: &'static str,
    /// GPIO roles, initialized in order
    pub gpios: &'static [GpioRole],
    /// UART roles, initialized after the GPIOs
    pub uarts: &'static [UartRole],
}

impl BoardDescription {
    /// Look up a GPIO role by registry name
    pub fn gpio(&self, name: &str) -> Option<&GpioRole> {
        self.gpios.iter().find(|role| role.name == name)
    }

    /// Look up a UART role by registry name
    pub fn uart(&self, name: &str) -> Option<&UartRole> {
        self.uarts.iter().find(|role| role.name == name)
    }

    /// Number of devices bring-up will register
    pub const fn device_count(&self) -> usize {
        self.gpios.len() + self.uarts.len()
    }
}
