//! Device registry
//!
//! A fixed-capacity directory from names to peripheral handles. The
//! registry only indexes handles; the backend that issued a handle keeps
//! owning the peripheral behind it.
//!
//! Unlike a silently truncating table, every rejected registration comes
//! back as a [`RegistryError`]: a full registry, a name that is already
//! taken, or a name that does not fit the fixed name buffer.

pub mod global;

use heapless::{String, Vec};

use crate::gpio::GpioHandle;
use crate::uart::UartHandle;

/// Default number of entries
pub const DEFAULT_CAPACITY: usize = 32;

/// Maximum name length in bytes
pub const MAX_NAME_LEN: usize = 16;

/// Peripheral type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceKind {
    Gpio,
    Uart,
}

/// Reference to a handle owned elsewhere
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceRef {
    Gpio(GpioHandle),
    Uart(UartHandle),
}

impl DeviceRef {
    /// Type tag of the referenced device
    pub const fn kind(&self) -> DeviceKind {
        match self {
            DeviceRef::Gpio(_) => DeviceKind::Gpio,
            DeviceRef::Uart(_) => DeviceKind::Uart,
        }
    }

    /// The GPIO handle, if this is a GPIO device
    pub const fn as_gpio(&self) -> Option<GpioHandle> {
        match self {
            DeviceRef::Gpio(handle) => Some(*handle),
            _ => None,
        }
    }

    /// The UART handle, if this is a UART device
    pub const fn as_uart(&self) -> Option<UartHandle> {
        match self {
            DeviceRef::Uart(handle) => Some(*handle),
            _ => None,
        }
    }
}

impl From<GpioHandle> for DeviceRef {
    fn from(handle: GpioHandle) -> Self {
        DeviceRef::Gpio(handle)
    }
}

impl From<UartHandle> for DeviceRef {
    fn from(handle: UartHandle) -> Self {
        DeviceRef::Uart(handle)
    }
}

/// Errors from registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// Every slot is taken
    Full,
    /// Another live entry already uses this name
    Duplicate,
    /// Name is empty or longer than [`MAX_NAME_LEN`]
    InvalidName,
}

/// One registry entry
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceEntry {
    name: String<MAX_NAME_LEN>,
    device: DeviceRef,
}

impl DeviceEntry {
    /// Registered name
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Type tag
    pub fn kind(&self) -> DeviceKind {
        self.device.kind()
    }

    /// Referenced handle
    pub fn device(&self) -> DeviceRef {
        self.device
    }
}

/// Anything that accepts named device registrations
///
/// Lets bring-up code target either a local [`DeviceRegistry`] or the
/// process-wide one in [`global`].
pub trait DeviceDirectory {
    /// Register `device` under `name`
    fn register(&mut self, name: &str, device: DeviceRef) -> Result<(), RegistryError>;
}

/// Fixed-capacity name to handle directory
#[derive(Debug, Clone)]
pub struct DeviceRegistry<const N: usize = DEFAULT_CAPACITY> {
    entries: Vec<DeviceEntry, N>,
}

impl<const N: usize> Default for DeviceRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> DeviceRegistry<N> {
    /// Create an empty registry
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Register `device` under `name`
    ///
    /// Names are matched case-sensitively. An existing entry is never
    /// replaced.
    pub fn register(&mut self, name: &str, device: DeviceRef) -> Result<(), RegistryError> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(RegistryError::InvalidName);
        }
        if self.find(name).is_some() {
            warn!("device {} already registered", name);
            return Err(RegistryError::Duplicate);
        }
        if self.entries.is_full() {
            warn!("device registry full, dropping {}", name);
            return Err(RegistryError::Full);
        }

        let mut owned = String::new();
        owned.push_str(name).map_err(|_| RegistryError::InvalidName)?;
        self.entries
            .push(DeviceEntry { name: owned, device })
            .map_err(|_| RegistryError::Full)?;

        debug!("registered {} as {}", name, device);
        Ok(())
    }

    /// Find an entry by exact name
    pub fn find(&self, name: &str) -> Option<&DeviceEntry> {
        self.entries.iter().find(|e| e.name.as_str() == name)
    }

    /// Find a GPIO handle by name
    pub fn find_gpio(&self, name: &str) -> Option<GpioHandle> {
        self.find(name).and_then(|e| e.device.as_gpio())
    }

    /// Find a UART handle by name
    pub fn find_uart(&self, name: &str) -> Option<UartHandle> {
        self.find(name).and_then(|e| e.device.as_uart())
    }

    /// Remove an entry, returning it
    pub fn unregister(&mut self, name: &str) -> Option<DeviceEntry> {
        let index = self.entries.iter().position(|e| e.name.as_str() == name)?;
        Some(self.entries.swap_remove(index))
    }

    /// Iterate over live entries
    pub fn iter(&self) -> impl Iterator<Item = &DeviceEntry> {
        self.entries.iter()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<const N: usize> DeviceDirectory for DeviceRegistry<N> {
    fn register(&mut self, name: &str, device: DeviceRef) -> Result<(), RegistryError> {
        DeviceRegistry::register(self, name, device)
    }
}
