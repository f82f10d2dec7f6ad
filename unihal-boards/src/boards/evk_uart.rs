//! EVK debug UART
//!
//! UART0 on GPIO4 (TX) and GPIO5 (RX), 115200 8N1, polled.

use unihal::uart::{Parity, StopBits, UartMode};

use crate::board::{UartDefaults, UartRole};

pub const UART_TX_PIN: u8 = 4;
pub const UART_RX_PIN: u8 = 5;

/// Line settings used unless the application overrides them
pub const UART_DEFAULTS: UartDefaults = UartDefaults {
    port: 0,
    baudrate: 115_200,
    parity: Parity::None,
    stop_bits: StopBits::One,
    mode: UartMode::Polling,
};

pub const UART0: UartRole = UartRole {
    name: "UART0",
    tx_pin: UART_TX_PIN,
    rx_pin: UART_RX_PIN,
    defaults: UART_DEFAULTS,
};

/// All UART roles on the board
pub const UARTS: [UartRole; 1] = [UART0];
