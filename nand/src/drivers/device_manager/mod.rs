//! Device Manager
//!
//! Central device manager responsible for:
//! - Keeping the table of registered drivers and their `of_match` lists
//! - Binding described devices to drivers by compatible string
//! - Probing a bound device on first request, and only once
//!
//! Storage is fixed-capacity; nothing here allocates.


use crate::drivers::dtb::{Fdt, FdtNode};
use crate::drivers::nand::catalog::PlatformProfile;
use crate::drivers::{Device, ProbeContext};
use crate::error::{DeviceError, ProbeError};

/// Driver probe entry point
pub type ProbeFn = fn(&BoundDevice<'_>, &mut ProbeContext<'_>) -> Result<(), ProbeError>;

/// One compatible string a driver handles, with its match data
#[derive(Debug)]
pub struct OfMatch {
    pub compatible: &'static str,
    pub data: Option<&'static PlatformProfile>,
}

/// A driver as registered with the device manager
pub struct DriverEntry {
    pub name: &'static str,
    pub of_match: &'static [OfMatch],
    pub probe: ProbeFn,
}

impl DriverEntry {
    pub fn match_compatible(&self, compat: &str) -> Option<&'static OfMatch> {
        self.of_match.iter().find(|m| m.compatible == compat)
    }
}

impl core::fmt::Debug for DriverEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("DriverEntry")
            .field("name", &self.name)
            .field("of_match", &self.of_match.len())
            .finish()
    }
}

/// A device handed to a probe, with the `of_match` entry it bound through
pub struct BoundDevice<'a> {
    pub device: &'a dyn Device,
    pub of_match: Option<&'static OfMatch>,
}

impl<'a> BoundDevice<'a> {
    /// A device that did not come through driver matching.
    pub fn unmatched(device: &'a dyn Device) -> Self {
        Self { device, of_match: None }
    }

    pub fn match_data(&self) -> Option<&'static PlatformProfile> {
        self.of_match.and_then(|m| m.data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DeviceId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DriverId(pub usize);

struct DeviceSlot<D> {
    device: D,
    driver: Option<DriverId>,
    of_match: Option<&'static OfMatch>,
    active: bool,
}

/// Main device manager structure
pub struct DeviceManager<D, const N: usize = 32, const M: usize = 8> {
    devices: heapless::Vec<DeviceSlot<D>, N>,
    drivers: heapless::Vec<&'static DriverEntry, M>,
}

impl<D: Device, const N: usize, const M: usize> DeviceManager<D, N, M> {
    pub const fn new() -> Self {
        Self {
            devices: heapless::Vec::new(),
            drivers: heapless::Vec::new(),
        }
    }

    /// Register a new driver and bind any waiting devices to it
    pub fn register_driver(
        &mut self,
        entry: &'static DriverEntry,
    ) -> Result<DriverId, DeviceError> {
        if self.drivers.iter().any(|d| d.name == entry.name) {
            return Err(DeviceError::DriverExists);
        }
        self.drivers.push(entry).map_err(|_| DeviceError::RegistryFull)?;
        let driver_id = DriverId(self.drivers.len() - 1);
        log::info!("device_manager: driver registered name={} id={:?}", entry.name, driver_id);

        for slot in self.devices.iter_mut().filter(|s| s.driver.is_none()) {
            if let Some((id, m)) = Self::find_driver(&self.drivers, &slot.device) {
                slot.driver = Some(id);
                slot.of_match = Some(m);
                log::debug!("device_manager: {} bound via {}", slot.device.name(), m.compatible);
            }
        }
        Ok(driver_id)
    }

    /// Add a described device; it binds immediately if a driver matches
    pub fn add_device(&mut self, device: D) -> Result<DeviceId, DeviceError> {
        let found = Self::find_driver(&self.drivers, &device);
        if let Some((_, m)) = found {
            log::debug!("device_manager: {} bound via {}", device.name(), m.compatible);
        }
        let slot = DeviceSlot {
            device,
            driver: found.map(|(id, _)| id),
            of_match: found.map(|(_, m)| m),
            active: false,
        };
        self.devices.push(slot).map_err(|_| DeviceError::RegistryFull)?;
        Ok(DeviceId(self.devices.len() - 1))
    }

    /// Device compatible strings are tried in order, so the most specific
    /// one a driver knows wins.
    fn find_driver(
        drivers: &[&'static DriverEntry],
        device: &D,
    ) -> Option<(DriverId, &'static OfMatch)> {
        device.compatible().find_map(|compat| {
            drivers
                .iter()
                .enumerate()
                .find_map(|(i, d)| d.match_compatible(compat).map(|m| (DriverId(i), m)))
        })
    }

    /// First device bound to driver `name`, probed if it is not active yet.
    pub fn get_device_by_driver(
        &mut self,
        name: &str,
        ctx: &mut ProbeContext<'_>,
    ) -> Result<DeviceId, DeviceError> {
        let driver_idx = self
            .drivers
            .iter()
            .position(|d| d.name == name)
            .ok_or(DeviceError::UnknownDriver)?;
        let driver = self.drivers[driver_idx];
        let idx = self
            .devices
            .iter()
            .position(|s| s.driver == Some(DriverId(driver_idx)))
            .ok_or(DeviceError::NotFound)?;

        let slot = &mut self.devices[idx];
        if !slot.active {
            log::debug!("device_manager: probing {} with {}", slot.device.name(), driver.name);
            let bound = BoundDevice {
                device: &slot.device,
                of_match: slot.of_match,
            };
            (driver.probe)(&bound, ctx)?;
            slot.active = true;
            log::info!("device_manager: {} active", slot.device.name());
        }
        Ok(DeviceId(idx))
    }

    pub fn device(&self, id: DeviceId) -> Option<&D> {
        self.devices.get(id.0).map(|s| &s.device)
    }

    pub fn driver_of(&self, id: DeviceId) -> Option<&'static DriverEntry> {
        let driver = self.devices.get(id.0)?.driver?;
        self.drivers.get(driver.0).copied()
    }

    pub fn is_active(&self, id: DeviceId) -> bool {
        self.devices.get(id.0).map_or(false, |s| s.active)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

impl<'a, const N: usize, const M: usize> DeviceManager<FdtNode<'a>, N, M> {
    /// Adds every enabled node some registered driver can handle.
    ///
    /// Register drivers first; nodes nobody claims are skipped.
    pub fn populate_from_fdt(&mut self, fdt: &Fdt<'a>) -> Result<usize, DeviceError> {
        let mut added = 0;
        for node in fdt.nodes().filter(|n| n.status_okay()) {
            if Self::find_driver(&self.drivers, &node).is_some() {
                self.add_device(node)?;
                added += 1;
            }
        }
        log::info!("device_manager: {} device(s) from dtb", added);
        Ok(added)
    }
}

impl<D: Device, const N: usize, const M: usize> Default for DeviceManager<D, N, M> {
    fn default() -> Self {
        Self::new()
    }
}
