//! Denali NAND controller, device-tree front end
//!
//! Collects everything the controller core needs from the hardware
//! description: platform quirks, the control and data register windows, and
//! the controller clock. The probe hands the result to [`ControllerCore`]
//! and does nothing else; ECC setup, timing and chip detection live there.
//!
//! Acquisition is strictly ordered and stops at the first failure. Whatever
//! was claimed before a failure stays claimed (windows mapped, clock
//! running) and is reclaimed with the device, never unwound here.

use core::num::NonZeroU64;

use crate::drivers::clk::ClockService;
use crate::drivers::device_manager::{BoundDevice, DriverEntry};
use crate::drivers::nand::catalog::{self, CapabilityFlags, PlatformProfile, DENALI_OF_MATCH};
use crate::drivers::{ControllerCore, MemoryMapper, MmioRegion, PhysRange, ProbeContext};
use crate::error::{AcquisitionError, ProbeError};

pub const DRIVER_NAME: &str = "denali-nand-dt";

/// `reg-names` entry of the control/status register window
pub const CONTROL_REGS: &str = "control";
/// `reg-names` entry of the data transfer window
pub const DATA_REGS: &str = "data";

/// Clock index of the controller clock
const CONTROLLER_CLOCK: usize = 0;

/// Fully resolved controller configuration.
///
/// Only built at the end of a successful [`acquire`]; there is no partially
/// filled state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Register/command protocol generation, 0 when not specified
    pub revision: u32,
    pub caps: CapabilityFlags,
    /// Control and status registers
    pub registers: MmioRegion,
    /// Data transfer window
    pub data: MmioRegion,
    pub clk_rate_hz: NonZeroU64,
}

impl ControllerConfig {
    pub fn profile(&self) -> PlatformProfile {
        PlatformProfile {
            revision: self.revision,
            caps: self.caps,
        }
    }
}

fn platform_profile(bound: &BoundDevice<'_>) -> PlatformProfile {
    if let Some(profile) = bound.match_data().or_else(|| catalog::lookup_device(bound.device)) {
        return *profile;
    }
    log::warn!(
        "nand: {} not in the platform catalog, using defaults",
        bound.device.name()
    );
    PlatformProfile::DEFAULT
}

fn map_window(
    mapper: &mut dyn MemoryMapper,
    name: &'static str,
    range: PhysRange,
) -> Result<MmioRegion, AcquisitionError> {
    let region = mapper
        .map_physical(range)
        .ok_or(AcquisitionError::ResourceMissing(name))?;
    log::debug!(
        "nand: {} regs phys=0x{:X} size=0x{:X} virt=0x{:X}",
        name,
        range.base(),
        range.size(),
        region.virt_addr()
    );
    Ok(region)
}

/// Claims the controller's resources in order: profile, control window,
/// data window, clock.
pub fn acquire(
    bound: &BoundDevice<'_>,
    mapper: &mut dyn MemoryMapper,
    clocks: &mut dyn ClockService,
) -> Result<ControllerConfig, AcquisitionError> {
    let dev = bound.device;
    let profile = platform_profile(bound);

    let control = dev
        .find_register_range(CONTROL_REGS)
        .map_err(|_| AcquisitionError::ResourceMissing(CONTROL_REGS))?;
    let registers = map_window(mapper, CONTROL_REGS, control)?;

    let data_range = dev
        .find_register_range(DATA_REGS)
        .map_err(|_| AcquisitionError::ResourceMissing(DATA_REGS))?;
    if data_range.overlaps(&control) {
        log::debug!("nand: {} data window overlaps control window", dev.name());
        return Err(AcquisitionError::ResourceMissing(DATA_REGS));
    }
    let data = map_window(mapper, DATA_REGS, data_range)?;

    let clk = clocks
        .get_clock(dev, CONTROLLER_CLOCK)
        .map_err(|_| AcquisitionError::ClockUnavailable)?;
    clocks
        .enable(&clk)
        .map_err(|_| AcquisitionError::ClockEnableFailed)?;
    let clk_rate_hz =
        NonZeroU64::new(clocks.rate_hz(&clk)).ok_or(AcquisitionError::ClockRateUnknown)?;

    log::debug!(
        "nand: {} revision=0x{:04X} caps={:?} clk={}Hz",
        dev.name(),
        profile.revision,
        profile.caps,
        clk_rate_hz
    );

    Ok(ControllerConfig {
        revision: profile.revision,
        caps: profile.caps,
        registers,
        data,
        clk_rate_hz,
    })
}

/// Probe for [`DENALI_NAND_DT`]: acquire, then hand over to the controller core.
pub fn denali_dt_probe(
    bound: &BoundDevice<'_>,
    ctx: &mut ProbeContext<'_>,
) -> Result<(), ProbeError> {
    let config = acquire(bound, &mut *ctx.mapper, &mut *ctx.clocks)?;
    ctx.controller.init(config)?;
    log::info!("nand: denali controller at 0x{:X} ready", config.registers.phys().base());
    Ok(())
}

pub static DENALI_NAND_DT: DriverEntry = DriverEntry {
    name: DRIVER_NAME,
    of_match: &DENALI_OF_MATCH,
    probe: denali_dt_probe,
};
