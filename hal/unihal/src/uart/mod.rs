//! UART serial communication abstractions
//!
//! Defines the UART configuration, the opaque channel handle and the
//! contract a chip backend must satisfy. Failures are reported through
//! return values only: an `Err` from init, a short count from recv.

pub mod poll;

pub use poll::UartPort;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default bound on the wait for transmit-ready, per byte
pub const DEFAULT_TX_TIMEOUT_MS: u32 = 100;

/// Default receive FIFO trigger level for interrupt-driven mode
pub const DEFAULT_RX_TRIGGER_LEVEL: u8 = 1;

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StopBits {
    #[default]
    One,
    Two,
}

impl StopBits {
    /// Stop bit count as a number
    pub const fn count(self) -> u8 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}

/// Transfer mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UartMode {
    /// Busy-wait on status flags, no interrupts or DMA
    #[default]
    Polling,
    /// Receive/transmit interrupts at the configured trigger level
    Irq,
    /// DMA channels for both directions
    Dma,
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Peripheral instance on chips with more than one UART
    pub port: u8,
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
    /// Transfer mode
    pub mode: UartMode,
    /// Receive FIFO level that raises the RX interrupt (IRQ mode only)
    pub rx_trigger_level: u8,
    /// Bound on the wait for transmit-ready, per byte (0 waits forever)
    pub tx_timeout_ms: u32,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::new(115_200, Parity::None, StopBits::One, UartMode::Polling)
    }
}

impl UartConfig {
    /// Create a configuration for port 0
    pub const fn new(baudrate: u32, parity: Parity, stop_bits: StopBits, mode: UartMode) -> Self {
        Self {
            port: 0,
            baudrate,
            parity,
            stop_bits,
            mode,
            rx_trigger_level: DEFAULT_RX_TRIGGER_LEVEL,
            tx_timeout_ms: DEFAULT_TX_TIMEOUT_MS,
        }
    }

    /// Select the peripheral instance
    pub const fn with_port(mut self, port: u8) -> Self {
        self.port = port;
        self
    }

    /// Set the RX interrupt trigger level
    pub const fn with_rx_trigger_level(mut self, level: u8) -> Self {
        self.rx_trigger_level = level;
        self
    }

    /// Set the transmit stall timeout
    pub const fn with_tx_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.tx_timeout_ms = timeout_ms;
        self
    }
}

/// Errors from UART operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartError {
    /// Backend cannot arm the requested transfer mode
    UnsupportedMode,
    /// Baud rate outside what the baud generator can produce
    InvalidBaudrate,
    /// No such UART instance
    InvalidPort,
    /// Instance already has a live handle
    PortBusy,
    /// Handle was deinitialized
    Closed,
    /// Transmitter did not become ready in time; `sent` bytes went out first
    TxStalled { sent: usize },
    /// No data arrived before the read deadline
    Timeout,
}

impl embedded_io::Error for UartError {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_io::ErrorKind;

        match self {
            UartError::UnsupportedMode => ErrorKind::Unsupported,
            UartError::InvalidBaudrate | UartError::InvalidPort => ErrorKind::InvalidInput,
            UartError::PortBusy => ErrorKind::AddrInUse,
            UartError::Closed => ErrorKind::NotConnected,
            UartError::TxStalled { .. } | UartError::Timeout => ErrorKind::TimedOut,
        }
    }
}

/// Opaque handle to a configured UART channel
///
/// An index into the backend's channel arena. Stays copyable after
/// deinit; operations through it then report [`UartError::Closed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartHandle(u8);

impl UartHandle {
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

/// UART backend contract
pub trait UartBackend {
    /// Program the baud generator and frame format, then arm the mode
    fn uart_init(&mut self, config: &UartConfig) -> Result<UartHandle, UartError>;

    /// Transmit all of `data`
    ///
    /// Polling mode returns after the last byte hit the data register.
    /// IRQ/DMA modes may return once every byte is accepted into the
    /// transmit queue; order is preserved and nothing is dropped. Returns
    /// `Ok(data.len())` on success, or [`UartError::TxStalled`] with the
    /// partial count if the transmitter stops accepting bytes.
    fn uart_send(&mut self, handle: UartHandle, data: &[u8]) -> Result<usize, UartError>;

    /// Receive into `buf`, waiting at most `timeout_ms` (0 waits forever)
    ///
    /// Returns as soon as `buf` is full or the timeout elapses. Running out
    /// of time is not an error: the count of bytes collected is returned,
    /// possibly zero.
    fn uart_recv(&mut self, handle: UartHandle, buf: &mut [u8], timeout_ms: u32) -> Result<usize, UartError>;

    /// Disable interrupts and DMA and leave the port re-initializable
    ///
    /// Subsequent calls are no-ops.
    fn uart_deinit(&mut self, handle: UartHandle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error as _, ErrorKind};

    #[test]
    fn test_config_builder() {
        let config = UartConfig::new(9600, Parity::Even, StopBits::Two, UartMode::Irq)
            .with_port(1)
            .with_rx_trigger_level(4)
            .with_tx_timeout_ms(20);

        assert_eq!(config.port, 1);
        assert_eq!(config.baudrate, 9600);
        assert_eq!(config.parity, Parity::Even);
        assert_eq!(config.stop_bits.count(), 2);
        assert_eq!(config.mode, UartMode::Irq);
        assert_eq!(config.rx_trigger_level, 4);
        assert_eq!(config.tx_timeout_ms, 20);
    }

    #[test]
    fn test_default_config() {
        let config = UartConfig::default();
        assert_eq!(config.port, 0);
        assert_eq!(config.baudrate, 115_200);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.mode, UartMode::Polling);
        assert_eq!(config.tx_timeout_ms, DEFAULT_TX_TIMEOUT_MS);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(UartError::TxStalled { sent: 3 }.kind(), ErrorKind::TimedOut);
        assert_eq!(UartError::Closed.kind(), ErrorKind::NotConnected);
        assert_eq!(UartError::UnsupportedMode.kind(), ErrorKind::Unsupported);
    }
}
