//! Device drivers
//!
//! - **DTB**: flattened device tree reader, hardware description for probes
//! - **Clock**: clock lookup and `fixed-clock` providers
//! - **Device manager**: driver table, compatible-string binding, probe-once
//! - **NAND**: Denali controller front end
//!
//! Drivers never reach for globals. Everything a probe may touch is passed
//! in through a [`ProbeContext`].

pub mod clk;
pub mod device_manager;
pub mod dtb;
pub mod nand;
pub mod resource;

use crate::drivers::clk::ClockService;
use crate::drivers::dtb::StringList;
use crate::drivers::nand::denali_dt::ControllerConfig;
use crate::error::InitError;

pub use resource::{MemoryMapper, MmioRegion, OffsetMapper, PhysRange};

/// Requested resource is not described for this device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotFound;

/// A hardware-described device as seen by its driver
pub trait Device {
    fn name(&self) -> &str;

    /// Compatible strings, most specific first.
    fn compatible(&self) -> StringList<'_>;

    /// Looks up a register range by its `reg-names` entry.
    fn find_register_range(&self, name: &str) -> Result<PhysRange, NotFound>;

    fn property(&self, name: &str) -> Option<&[u8]>;
}

/// Shared controller initialization, fed by the platform front ends
pub trait ControllerCore {
    /// Takes ownership of a fully populated configuration.
    fn init(&mut self, config: ControllerConfig) -> Result<(), InitError>;
}

/// Services a driver probe runs against.
pub struct ProbeContext<'a> {
    /// Physical to CPU address mapping
    pub mapper: &'a mut dyn MemoryMapper,
    /// Clock lookup and control
    pub clocks: &'a mut dyn ClockService,
    /// Controller core receiving the resolved configuration
    pub controller: &'a mut dyn ControllerCore,
}
