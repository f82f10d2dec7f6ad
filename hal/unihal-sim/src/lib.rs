//! Simulated chip backend for unihal
//!
//! A host-side stand-in for a microcontroller: 32 GPIO pads and two UART
//! instances, driven by a virtual clock. It satisfies the full GPIO and
//! UART backend contracts so application and board code can be exercised
//! without hardware.
//!
//! Beyond the contract it exposes the "other side of the wire" for tests:
//!
//! - [`SimChip::drive_pad`] forces an external level onto a pad
//! - [`SimChip::set_loopback`] ties a UART's TX to its RX
//! - [`SimChip::inject_rx`] / [`SimChip::take_tx`] feed and capture the line
//! - [`SimChip::set_tx_stuck`] and [`SimChip::schedule_rx_break`] inject faults
//! - [`SimChip::service`] runs the interrupt handlers for IRQ/DMA channels

#[macro_use]
mod fmt;

pub mod clock;
pub mod gpio;
pub mod uart;

use unihal::gpio::{Direction, GpioBackend, GpioError, GpioHandle, PinFunction};
use unihal::uart::{UartBackend, UartConfig, UartError, UartHandle, UartMode};
use unihal::Clock;

pub use clock::SimClock;
pub use gpio::{PIN_COUNT, UART_PIN_MUX};

use gpio::PinBank;
use uart::SimUart;

/// Number of UART instances
pub const UART_COUNT: usize = 2;

/// Simulated microcontroller
#[derive(Debug)]
pub struct SimChip {
    pins: PinBank,
    uarts: [SimUart; UART_COUNT],
    clock: SimClock,
    dma_available: bool,
}

impl SimChip {
    /// Create a chip with every peripheral in reset state
    pub fn new(clock: SimClock) -> Self {
        Self {
            pins: PinBank::new(),
            uarts: Default::default(),
            clock,
            dma_available: true,
        }
    }

    /// Model a part without a DMA engine
    pub fn without_dma(mut self) -> Self {
        self.dma_available = false;
        self
    }

    /// The chip's time source
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Run pending interrupt/DMA work on every UART
    pub fn service(&mut self) {
        for uart in self.uarts.iter_mut() {
            uart.service();
        }
    }

    /// Force a level onto a pad from outside (`None` releases it)
    pub fn drive_pad(&mut self, pin: u8, level: Option<bool>) {
        self.pins.drive(pin, level);
    }

    /// Level a GPIO output is driving, if any
    pub fn pad_output(&self, pin: u8) -> Option<bool> {
        self.pins.driven_level(pin)
    }

    /// Function currently routed to a pad
    pub fn pad_function(&self, pin: u8) -> Option<PinFunction> {
        self.pins.function(pin)
    }

    /// Tie TX to RX on a UART port
    pub fn set_loopback(&mut self, port: u8, enabled: bool) {
        if let Some(uart) = self.uart_port_mut(port) {
            uart.set_loopback(enabled);
        }
    }

    /// Keep the transmitter permanently busy
    pub fn set_tx_stuck(&mut self, port: u8, stuck: bool) {
        if let Some(uart) = self.uart_port_mut(port) {
            uart.set_tx_stuck(stuck);
        }
    }

    /// Raise a line break on `port` after `after_ms` of virtual time
    pub fn schedule_rx_break(&mut self, port: u8, after_ms: u32) {
        let at_us = self.clock.now_us() + u64::from(after_ms) * 1_000;
        if let Some(uart) = self.uart_port_mut(port) {
            uart.schedule_break(at_us);
        }
    }

    /// Put bytes on the RX line as if a peer sent them
    pub fn inject_rx(&mut self, port: u8, bytes: &[u8]) {
        if let Some(uart) = self.uart_port_mut(port) {
            uart.inject_rx(bytes);
        }
    }

    /// Drain everything that went out on the TX line
    pub fn take_tx(&mut self, port: u8) -> Vec<u8> {
        self.uart_port_mut(port).map(|u| u.take_tx()).unwrap_or_default()
    }

    /// Bytes accepted by an IRQ/DMA channel but not yet on the line
    pub fn pending_tx(&self, port: u8) -> usize {
        self.uart_port(port).map_or(0, |u| u.pending_tx())
    }

    /// Whether a UART port currently has a live handle
    pub fn uart_enabled(&self, port: u8) -> bool {
        self.uart_port(port).is_some_and(|u| u.is_armed())
    }

    /// Whether a UART port has interrupts or DMA armed
    pub fn uart_irq_or_dma_enabled(&self, port: u8) -> bool {
        self.uart_port(port).is_some_and(|u| u.irq_enabled() || u.dma_enabled())
    }

    /// Bytes `send` accepted on `port` that a later deinit discarded unsent
    pub fn tx_dropped(&self, port: u8) -> usize {
        self.uart_port(port).map_or(0, |u| u.tx_dropped())
    }

    /// Programmed baud generator divisor
    pub fn uart_divisor(&self, port: u8) -> Option<u16> {
        self.uart_port(port).and_then(|u| u.divisor())
    }

    fn uart_port(&self, port: u8) -> Option<&SimUart> {
        self.uarts.get(usize::from(port))
    }

    fn uart_port_mut(&mut self, port: u8) -> Option<&mut SimUart> {
        self.uarts.get_mut(usize::from(port))
    }
}

impl GpioBackend for SimChip {
    const PIN_COUNT: u8 = PIN_COUNT;

    fn gpio_init(&mut self, pin: u8, direction: Direction) -> Result<GpioHandle, GpioError> {
        self.pins.init(pin, direction)
    }

    fn gpio_set(&mut self, handle: GpioHandle, level: bool) {
        self.pins.set(handle, level);
    }

    fn gpio_get(&self, handle: GpioHandle) -> bool {
        self.pins.get(handle)
    }

    fn gpio_release(&mut self, handle: GpioHandle) {
        self.pins.release(handle);
    }

    fn gpio_set_function(&mut self, pin: u8, function: PinFunction) -> Result<(), GpioError> {
        self.pins.set_function(pin, function)
    }
}

impl UartBackend for SimChip {
    fn uart_init(&mut self, config: &UartConfig) -> Result<UartHandle, UartError> {
        if config.mode == UartMode::Dma && !self.dma_available {
            return Err(UartError::UnsupportedMode);
        }
        let divisor = uart::baud_divisor(config.baudrate).ok_or(UartError::InvalidBaudrate)?;
        let uart = self.uart_port_mut(config.port).ok_or(UartError::InvalidPort)?;
        if uart.is_armed() {
            return Err(UartError::PortBusy);
        }

        uart.arm(config, divisor);
        Ok(UartHandle::from_index(config.port))
    }

    fn uart_send(&mut self, handle: UartHandle, data: &[u8]) -> Result<usize, UartError> {
        let uart = self
            .uarts
            .get_mut(usize::from(handle.index()))
            .ok_or(UartError::Closed)?;
        uart.send(&mut self.clock, data)
    }

    fn uart_recv(&mut self, handle: UartHandle, buf: &mut [u8], timeout_ms: u32) -> Result<usize, UartError> {
        let uart = self
            .uarts
            .get_mut(usize::from(handle.index()))
            .ok_or(UartError::Closed)?;
        uart.recv(&mut self.clock, buf, timeout_ms)
    }

    fn uart_deinit(&mut self, handle: UartHandle) {
        if let Some(uart) = self.uart_port_mut(handle.index()) {
            let lost = uart.disarm();
            if lost > 0 {
                warn!("uart{} deinit dropped {} queued tx bytes", handle.index(), lost);
            }
        }
    }
}
