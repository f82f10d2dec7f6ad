//! HAL dispatch layer
//!
//! [`Hal`] exposes the uniform GPIO/UART operation set and forwards each
//! call to the backend it was built with. The backend type is fixed at
//! compile time, so every call is monomorphized straight into the backend
//! implementation.

use core::convert::Infallible;

use crate::gpio::{Direction, GpioBackend, GpioError, GpioHandle, PinFunction};
use crate::uart::{UartBackend, UartConfig, UartError, UartHandle};

/// A complete chip backend: GPIO and UART
pub trait Backend: GpioBackend + UartBackend {}

// Blanket implementation
impl<T: GpioBackend + UartBackend> Backend for T {}

/// Uniform peripheral API over one compiled-in backend
pub struct Hal<B> {
    backend: B,
}

impl<B: Backend> Hal<B> {
    /// Wrap an initialized backend
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Configure `pin` as a GPIO
    pub fn gpio_init(&mut self, pin: u8, direction: Direction) -> Result<GpioHandle, GpioError> {
        let result = self.backend.gpio_init(pin, direction);
        match result {
            Ok(_) => debug!("gpio {} init as {}", pin, direction),
            Err(e) => warn!("gpio {} init failed: {}", pin, e),
        }
        result
    }

    /// Drive an output pin
    #[inline]
    pub fn gpio_set(&mut self, handle: GpioHandle, level: bool) {
        self.backend.gpio_set(handle, level);
    }

    /// Sample a pin
    #[inline]
    pub fn gpio_get(&self, handle: GpioHandle) -> bool {
        self.backend.gpio_get(handle)
    }

    /// Return a pin to its reset state
    pub fn gpio_release(&mut self, handle: GpioHandle) {
        self.backend.gpio_release(handle);
    }

    /// Route a peripheral function to a pin
    pub fn gpio_set_function(&mut self, pin: u8, function: PinFunction) -> Result<(), GpioError> {
        self.backend.gpio_set_function(pin, function)
    }

    /// Configure a UART channel
    pub fn uart_init(&mut self, config: &UartConfig) -> Result<UartHandle, UartError> {
        let result = self.backend.uart_init(config);
        match result {
            Ok(_) => info!(
                "uart{} init: {} baud, {}, {} stop, {}",
                config.port,
                config.baudrate,
                config.parity,
                config.stop_bits.count(),
                config.mode
            ),
            Err(e) => warn!("uart{} init failed: {}", config.port, e),
        }
        result
    }

    /// Transmit all of `data`
    pub fn uart_send(&mut self, handle: UartHandle, data: &[u8]) -> Result<usize, UartError> {
        self.backend.uart_send(handle, data)
    }

    /// Receive into `buf`, waiting at most `timeout_ms` (0 waits forever)
    pub fn uart_recv(&mut self, handle: UartHandle, buf: &mut [u8], timeout_ms: u32) -> Result<usize, UartError> {
        self.backend.uart_recv(handle, buf, timeout_ms)
    }

    /// Shut a UART channel down; repeat calls are no-ops
    pub fn uart_deinit(&mut self, handle: UartHandle) {
        debug!("uart deinit {}", handle);
        self.backend.uart_deinit(handle);
    }

    /// Borrow a pin as an `embedded-hal` digital pin
    pub fn pin(&mut self, handle: GpioHandle) -> Pin<'_, B> {
        Pin { hal: self, handle }
    }

    /// Borrow a UART channel as an `embedded-io` stream
    ///
    /// `read_timeout_ms` bounds how long a read waits for its first byte.
    pub fn serial(&mut self, handle: UartHandle, read_timeout_ms: u32) -> Serial<'_, B> {
        Serial {
            hal: self,
            handle,
            read_timeout_ms,
        }
    }

    /// Access the backend directly
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Release the backend
    pub fn into_inner(self) -> B {
        self.backend
    }
}

/// Borrowed GPIO implementing the `embedded-hal` digital traits
pub struct Pin<'a, B: Backend> {
    hal: &'a mut Hal<B>,
    handle: GpioHandle,
}

impl<B: Backend> embedded_hal::digital::ErrorType for Pin<'_, B> {
    type Error = Infallible;
}

impl<B: Backend> embedded_hal::digital::OutputPin for Pin<'_, B> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.hal.gpio_set(self.handle, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.hal.gpio_set(self.handle, true);
        Ok(())
    }
}

impl<B: Backend> embedded_hal::digital::StatefulOutputPin for Pin<'_, B> {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.hal.gpio_get(self.handle))
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.hal.gpio_get(self.handle))
    }
}

impl<B: Backend> embedded_hal::digital::InputPin for Pin<'_, B> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.hal.gpio_get(self.handle))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.hal.gpio_get(self.handle))
    }
}

/// Borrowed UART channel implementing `embedded-io`
pub struct Serial<'a, B: Backend> {
    hal: &'a mut Hal<B>,
    handle: UartHandle,
    read_timeout_ms: u32,
}

impl<B: Backend> embedded_io::ErrorType for Serial<'_, B> {
    type Error = UartError;
}

impl<B: Backend> embedded_io::Write for Serial<'_, B> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        match self.hal.uart_send(self.handle, buf) {
            // A short write is fine as long as something went out
            Err(UartError::TxStalled { sent }) if sent > 0 => Ok(sent),
            other => other,
        }
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<B: Backend> embedded_io::Read for Serial<'_, B> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        let (first, rest) = buf.split_at_mut(1);
        if self.hal.uart_recv(self.handle, first, self.read_timeout_ms)? == 0 {
            return Err(UartError::Timeout);
        }
        if rest.is_empty() {
            return Ok(1);
        }

        // Pick up whatever arrived alongside the first byte
        let more = self.hal.uart_recv(self.handle, rest, 1)?;
        Ok(1 + more)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::{InputPin, OutputPin, StatefulOutputPin};
    use embedded_io::{Read, Write};
    use heapless::{Deque, Vec};

    const PINS: usize = 8;

    /// Minimal in-memory backend: pins are bits, UART 0 loops TX into RX
    struct MockBackend {
        outputs: [Option<bool>; PINS],
        levels: [bool; PINS],
        uart_open: bool,
        wire: Deque<u8, 32>,
        stall_after: Option<usize>,
    }

    impl MockBackend {
        fn new() -> Self {
            Self {
                outputs: [None; PINS],
                levels: [false; PINS],
                uart_open: false,
                wire: Deque::new(),
                stall_after: None,
            }
        }
    }

    impl GpioBackend for MockBackend {
        const PIN_COUNT: u8 = PINS as u8;

        fn gpio_init(&mut self, pin: u8, direction: Direction) -> Result<GpioHandle, GpioError> {
            if pin >= Self::PIN_COUNT {
                return Err(GpioError::InvalidPin);
            }
            self.outputs[pin as usize] = Some(direction == Direction::Output);
            Ok(GpioHandle::from_index(pin))
        }

        fn gpio_set(&mut self, handle: GpioHandle, level: bool) {
            let pin = handle.index() as usize;
            if self.outputs[pin] == Some(true) {
                self.levels[pin] = level;
            }
        }

        fn gpio_get(&self, handle: GpioHandle) -> bool {
            self.levels[handle.index() as usize]
        }

        fn gpio_release(&mut self, handle: GpioHandle) {
            self.outputs[handle.index() as usize] = None;
        }

        fn gpio_set_function(&mut self, pin: u8, _function: PinFunction) -> Result<(), GpioError> {
            if pin >= Self::PIN_COUNT {
                return Err(GpioError::InvalidPin);
            }
            Ok(())
        }
    }

    impl UartBackend for MockBackend {
        fn uart_init(&mut self, config: &UartConfig) -> Result<UartHandle, UartError> {
            if config.port != 0 {
                return Err(UartError::InvalidPort);
            }
            self.uart_open = true;
            Ok(UartHandle::from_index(0))
        }

        fn uart_send(&mut self, _handle: UartHandle, data: &[u8]) -> Result<usize, UartError> {
            if !self.uart_open {
                return Err(UartError::Closed);
            }
            for (sent, &byte) in data.iter().enumerate() {
                if self.stall_after == Some(sent) {
                    return Err(UartError::TxStalled { sent });
                }
                self.wire.push_back(byte).map_err(|_| UartError::TxStalled { sent })?;
            }
            Ok(data.len())
        }

        fn uart_recv(&mut self, _handle: UartHandle, buf: &mut [u8], _timeout_ms: u32) -> Result<usize, UartError> {
            if !self.uart_open {
                return Err(UartError::Closed);
            }
            let mut n = 0;
            while n < buf.len() {
                match self.wire.pop_front() {
                    Some(byte) => {
                        buf[n] = byte;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }

        fn uart_deinit(&mut self, _handle: UartHandle) {
            self.uart_open = false;
        }
    }

    #[test]
    fn test_gpio_dispatch() {
        let mut hal = Hal::new(MockBackend::new());

        let led = hal.gpio_init(3, Direction::Output).unwrap();
        hal.gpio_set(led, true);
        assert!(hal.gpio_get(led));
        hal.gpio_set(led, false);
        assert!(!hal.gpio_get(led));

        assert_eq!(hal.gpio_init(PINS as u8, Direction::Output), Err(GpioError::InvalidPin));
    }

    #[test]
    fn test_pin_adapter() {
        let mut hal = Hal::new(MockBackend::new());
        let led = hal.gpio_init(1, Direction::Output).unwrap();

        let mut pin = hal.pin(led);
        pin.set_high().unwrap();
        assert!(pin.is_set_high().unwrap());
        pin.toggle().unwrap();
        assert!(pin.is_low().unwrap());
    }

    #[test]
    fn test_uart_dispatch() {
        let mut hal = Hal::new(MockBackend::new());
        let uart = hal.uart_init(&UartConfig::default()).unwrap();

        assert_eq!(hal.uart_send(uart, b"AT\r\n"), Ok(4));
        let mut buf = [0u8; 4];
        assert_eq!(hal.uart_recv(uart, &mut buf, 100), Ok(4));
        assert_eq!(&buf, b"AT\r\n");

        hal.uart_deinit(uart);
        assert_eq!(hal.uart_send(uart, b"x"), Err(UartError::Closed));
        assert_eq!(hal.uart_init(&UartConfig::default().with_port(3)), Err(UartError::InvalidPort));
    }

    #[test]
    fn test_serial_adapter() {
        let mut hal = Hal::new(MockBackend::new());
        let uart = hal.uart_init(&UartConfig::default()).unwrap();

        let mut serial = hal.serial(uart, 10);
        serial.write_all(b"ping").unwrap();

        let mut buf = [0u8; 8];
        let n = serial.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ping");

        assert_eq!(serial.read(&mut buf), Err(UartError::Timeout));
    }

    #[test]
    fn test_serial_short_write() {
        let mut backend = MockBackend::new();
        backend.stall_after = Some(2);
        let mut hal = Hal::new(backend);
        let uart = hal.uart_init(&UartConfig::default()).unwrap();

        let mut serial = hal.serial(uart, 10);
        assert_eq!(serial.write(b"abcd"), Ok(2));

        let mut echoed: Vec<u8, 4> = Vec::new();
        let mut buf = [0u8; 4];
        let n = serial.read(&mut buf).unwrap();
        echoed.extend_from_slice(&buf[..n]).unwrap();
        assert_eq!(echoed.as_slice(), b"ab");
    }
}
