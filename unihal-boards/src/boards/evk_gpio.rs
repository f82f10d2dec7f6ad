//! EVK LED and push-button
//!
//! The user LED is wired to GPIO12 and the push-button to GPIO13.

use unihal::gpio::Direction;

use crate::board::GpioRole;

/// User LED
pub const LED0_PIN: u8 = 12;

/// User push-button
pub const BUTTON0_PIN: u8 = 13;

pub const LED0: GpioRole = GpioRole {
    name: "LED0",
    pin: LED0_PIN,
    direction: Direction::Output,
};

pub const BUTTON0: GpioRole = GpioRole {
    name: "BUTTON0",
    pin: BUTTON0_PIN,
    direction: Direction::Input,
};

/// All GPIO roles on the board
pub const GPIOS: [GpioRole; 2] = [LED0, BUTTON0];
