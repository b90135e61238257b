//! HNX NAND bring-up
//!
//! Boot-time front end for the Denali NAND controller found on several SoC
//! families. The crate resolves a platform's compatible string to the
//! controller's quirks, claims its register windows and clock, and hands a
//! complete [`ControllerConfig`] to the shared controller core.
//!
//! ```text
//! board::NandBoot::initialize_once
//!        │
//!        ▼
//! DeviceManager::get_device_by_driver("denali-nand-dt")
//!        │
//!        ▼
//! denali_dt_probe ──► acquire ──► catalog::lookup
//!        │
//!        ▼
//! ControllerCore::init(ControllerConfig)
//! ```

#![cfg_attr(not(test), no_std)]

pub mod board;
pub mod console;
pub mod drivers;
pub mod error;

#[cfg(test)]
mod testing;

pub use board::{board_nand_init, NandBoot, NandBootOutcome};
pub use console::{DiagnosticSink, LogSink};
pub use drivers::nand::catalog::{CapabilityFlags, PlatformProfile};
pub use drivers::nand::denali_dt::{ControllerConfig, DENALI_NAND_DT};
pub use error::{AcquisitionError, DeviceError, InitError, ProbeError};
