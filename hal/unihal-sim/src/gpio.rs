//! Simulated GPIO pads
//!
//! Each pad models the function-select, output-enable and input-enable
//! bits plus the output latch. A test can drive a pad from outside to
//! stand in for a button or another chip.

use unihal::gpio::{Direction, GpioError, GpioHandle, PinFunction};

/// Number of pads on the simulated chip
pub const PIN_COUNT: u8 = 32;

/// Pads that can be muxed to a UART, as `(tx, rx)` per port
pub const UART_PIN_MUX: [(u8, u8); 2] = [(4, 5), (8, 9)];

#[derive(Debug, Clone, Copy, Default)]
struct Pad {
    function: PinFunction,
    output_enable: bool,
    input_enable: bool,
    latch: bool,
    /// Level forced onto the pad from outside the chip
    stimulus: Option<bool>,
}

/// Pad arena indexed by pin number
#[derive(Debug, Clone)]
pub(crate) struct PinBank {
    pads: [Pad; PIN_COUNT as usize],
}

impl PinBank {
    pub(crate) fn new() -> Self {
        Self {
            pads: [Pad::default(); PIN_COUNT as usize],
        }
    }

    fn pad(&self, pin: u8) -> Option<&Pad> {
        self.pads.get(pin as usize)
    }

    fn pad_mut(&mut self, pin: u8) -> Option<&mut Pad> {
        self.pads.get_mut(pin as usize)
    }

    /// Pad behind a handle, if it is still a GPIO
    fn gpio_pad_mut(&mut self, handle: GpioHandle) -> Option<&mut Pad> {
        self.pad_mut(handle.index()).filter(|p| p.function == PinFunction::Gpio)
    }

    pub(crate) fn init(&mut self, pin: u8, direction: Direction) -> Result<GpioHandle, GpioError> {
        let pad = self.pad_mut(pin).ok_or(GpioError::InvalidPin)?;

        pad.function = PinFunction::Gpio;
        match direction {
            Direction::Output => {
                pad.output_enable = true;
                pad.input_enable = false;
            }
            Direction::Input => {
                pad.input_enable = true;
                pad.output_enable = false;
            }
        }
        Ok(GpioHandle::from_index(pin))
    }

    pub(crate) fn set(&mut self, handle: GpioHandle, level: bool) {
        // Input pads latch the value without driving it
        if let Some(pad) = self.gpio_pad_mut(handle) {
            pad.latch = level;
        }
    }

    pub(crate) fn get(&self, handle: GpioHandle) -> bool {
        match self.pad(handle.index()) {
            Some(pad) if pad.function == PinFunction::Gpio => {
                if pad.output_enable {
                    pad.latch
                } else if pad.input_enable {
                    // Weak pull-down when nothing drives the pad
                    pad.stimulus.unwrap_or(false)
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    pub(crate) fn release(&mut self, handle: GpioHandle) {
        if let Some(pad) = self.pad_mut(handle.index()) {
            *pad = Pad {
                stimulus: pad.stimulus,
                ..Pad::default()
            };
        }
    }

    pub(crate) fn set_function(&mut self, pin: u8, function: PinFunction) -> Result<(), GpioError> {
        let allowed = match function {
            PinFunction::Disabled | PinFunction::Gpio => true,
            PinFunction::UartTx => UART_PIN_MUX.iter().any(|&(tx, _)| tx == pin),
            PinFunction::UartRx => UART_PIN_MUX.iter().any(|&(_, rx)| rx == pin),
        };
        let pad = self.pad_mut(pin).ok_or(GpioError::InvalidPin)?;
        if !allowed {
            return Err(GpioError::UnsupportedFunction);
        }

        pad.function = function;
        pad.output_enable = function == PinFunction::UartTx;
        pad.input_enable = matches!(function, PinFunction::UartRx | PinFunction::Gpio);
        Ok(())
    }

    pub(crate) fn drive(&mut self, pin: u8, level: Option<bool>) {
        if let Some(pad) = self.pad_mut(pin) {
            pad.stimulus = level;
        }
    }

    pub(crate) fn driven_level(&self, pin: u8) -> Option<bool> {
        self.pad(pin)
            .filter(|p| p.function == PinFunction::Gpio && p.output_enable)
            .map(|p| p.latch)
    }

    pub(crate) fn function(&self, pin: u8) -> Option<PinFunction> {
        self.pad(pin).map(|p| p.function)
    }
}
