//! Process-wide device registry
//!
//! A single [`DeviceRegistry`] shared by the whole program, guarded by a
//! critical section so it can be touched from thread and interrupt
//! context alike. It starts empty; [`reset`] brings it back to that state.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::{DeviceDirectory, DeviceEntry, DeviceRef, DeviceRegistry, RegistryError};
use crate::gpio::GpioHandle;
use crate::uart::UartHandle;

static REGISTRY: Mutex<CriticalSectionRawMutex, RefCell<DeviceRegistry>> =
    Mutex::new(RefCell::new(DeviceRegistry::new()));

/// Register `device` under `name` in the process-wide registry
pub fn register(name: &str, device: DeviceRef) -> Result<(), RegistryError> {
    REGISTRY.lock(|registry| registry.borrow_mut().register(name, device))
}

/// Look up an entry by exact name
pub fn find(name: &str) -> Option<DeviceEntry> {
    REGISTRY.lock(|registry| registry.borrow().find(name).cloned())
}

/// Look up a GPIO handle by name
pub fn find_gpio(name: &str) -> Option<GpioHandle> {
    REGISTRY.lock(|registry| registry.borrow().find_gpio(name))
}

/// Look up a UART handle by name
pub fn find_uart(name: &str) -> Option<UartHandle> {
    REGISTRY.lock(|registry| registry.borrow().find_uart(name))
}

/// Remove an entry, returning it
pub fn unregister(name: &str) -> Option<DeviceEntry> {
    REGISTRY.lock(|registry| registry.borrow_mut().unregister(name))
}

/// Number of live entries
pub fn len() -> usize {
    REGISTRY.lock(|registry| registry.borrow().len())
}

/// Drop every entry
///
/// For tests and warm restarts; handles themselves are unaffected.
pub fn reset() {
    REGISTRY.lock(|registry| registry.borrow_mut().clear());
}

/// [`DeviceDirectory`] view of the process-wide registry
#[derive(Debug, Clone, Copy, Default)]
pub struct Global;

impl DeviceDirectory for Global {
    fn register(&mut self, name: &str, device: DeviceRef) -> Result<(), RegistryError> {
        register(name, device)
    }
}
