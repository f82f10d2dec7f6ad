//! Board tables
//!
//! - [`evk_gpio`] - LED and push-button pins
//! - [`evk_uart`] - Debug UART pins and line defaults
//!
//! [`EVK`] combines both into the description bring-up consumes.

pub mod evk_gpio;
pub mod evk_uart;

use crate::board::BoardDescription;

/// Evaluation kit: LED0, BUTTON0 and UART0
pub const EVK: BoardDescription = BoardDescription {
    name: "evk",
    gpios: &evk_gpio::GPIOS,
    uarts: &evk_uart::UARTS,
};

#[cfg(test)]
mod tests {
    use super::*;
    use unihal::gpio::Direction;
    use unihal::uart::{Parity, StopBits, UartMode};

    #[test]
    fn test_evk_pins() {
        let led = EVK.gpio("LED0").unwrap();
        assert_eq!((led.pin, led.direction), (12, Direction::Output));

        let button = EVK.gpio("BUTTON0").unwrap();
        assert_eq!((button.pin, button.direction), (13, Direction::Input));

        let uart = EVK.uart("UART0").unwrap();
        assert_eq!((uart.tx_pin, uart.rx_pin), (4, 5));
        assert_eq!(EVK.device_count(), 3);
    }

    #[test]
    fn test_evk_uart_defaults() {
        let config = evk_uart::UART_DEFAULTS.to_config();
        assert_eq!(config.baudrate, 115_200);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.mode, UartMode::Polling);
    }

    #[test]
    fn test_role_names_fit_registry() {
        for name in EVK.gpios.iter().map(|r| r.name).chain(EVK.uarts.iter().map(|r| r.name)) {
            assert!(!name.is_empty() && name.len() <= unihal::registry::MAX_NAME_LEN);
        }
    }
}
