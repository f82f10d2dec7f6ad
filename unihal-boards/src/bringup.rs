//! Start-up bring-up
//!
//! Walks a [`BoardDescription`] once: configures every GPIO role, routes
//! and opens every UART role, and registers each handle under its role
//! name. After this the dispatch layer never looks at board data again.

use heapless::Vec;
use unihal::gpio::{GpioError, PinFunction};
use unihal::registry::{DeviceDirectory, DeviceRef, RegistryError};
use unihal::uart::UartError;
use unihal::{Backend, Hal};

use crate::board::{BoardDescription, GpioRole, UartRole};

/// Upper bound on devices per board
pub const MAX_BOARD_DEVICES: usize = 16;

/// Errors from bring-up
///
/// Peripherals opened before the failing role stay open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringupError {
    Gpio(GpioError),
    Uart(UartError),
    Registry(RegistryError),
    /// Board declares more than [`MAX_BOARD_DEVICES`] roles
    TooManyDevices,
}

impl From<GpioError> for BringupError {
    fn from(e: GpioError) -> Self {
        BringupError::Gpio(e)
    }
}

impl From<UartError> for BringupError {
    fn from(e: UartError) -> Self {
        BringupError::Uart(e)
    }
}

impl From<RegistryError> for BringupError {
    fn from(e: RegistryError) -> Self {
        BringupError::Registry(e)
    }
}

/// Handles opened by [`init_board`], in board order
#[derive(Debug, Clone, Default)]
pub struct BoardDevices {
    devices: Vec<(&'static str, DeviceRef), MAX_BOARD_DEVICES>,
}

impl BoardDevices {
    /// Handle opened for a role
    pub fn get(&self, name: &str) -> Option<DeviceRef> {
        self.devices.iter().find(|(n, _)| *n == name).map(|(_, d)| *d)
    }

    /// All opened handles with their role names
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, DeviceRef)> + '_ {
        self.devices.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Bring up every device on `board` and register it in `directory`
pub fn init_board<B, D>(
    hal: &mut Hal<B>,
    directory: &mut D,
    board: &BoardDescription,
) -> Result<BoardDevices, BringupError>
where
    B: Backend,
    D: DeviceDirectory + ?Sized,
{
    if board.device_count() > MAX_BOARD_DEVICES {
        return Err(BringupError::TooManyDevices);
    }

    let mut opened = BoardDevices::default();
    for role in board.gpios {
        let device = init_gpio(hal, role)?;
        publish(directory, &mut opened, role.name, device)?;
    }
    for role in board.uarts {
        let device = init_uart(hal, role)?;
        publish(directory, &mut opened, role.name, device)?;
    }

    info!("board {} up, {} devices", board.name, opened.len());
    Ok(opened)
}

fn init_gpio<B: Backend>(hal: &mut Hal<B>, role: &GpioRole) -> Result<DeviceRef, BringupError> {
    let handle = hal.gpio_init(role.pin, role.direction).inspect_err(|e| {
        warn!("{} on pin {}: {}", role.name, role.pin, e);
    })?;
    Ok(DeviceRef::Gpio(handle))
}

fn init_uart<B: Backend>(hal: &mut Hal<B>, role: &UartRole) -> Result<DeviceRef, BringupError> {
    hal.gpio_set_function(role.tx_pin, PinFunction::UartTx)?;
    hal.gpio_set_function(role.rx_pin, PinFunction::UartRx)?;

    let handle = hal.uart_init(&role.defaults.to_config()).inspect_err(|e| {
        warn!("{} init failed: {}", role.name, e);
    })?;
    debug!("{} on pins {}/{}", role.name, role.tx_pin, role.rx_pin);
    Ok(DeviceRef::Uart(handle))
}

fn publish<D: DeviceDirectory + ?Sized>(
    directory: &mut D,
    opened: &mut BoardDevices,
    name: &'static str,
    device: DeviceRef,
) -> Result<(), BringupError> {
    directory.register(name, device)?;
    // Bounded by the device_count check in init_board
    let _ = opened.devices.push((name, device));
    Ok(())
}
