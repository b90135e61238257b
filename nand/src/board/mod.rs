//! Board-level NAND bring-up
//!
//! The boot sequence calls [`board_nand_init`] once, after drivers and
//! devices are registered. A board without a Denali controller is normal and
//! stays silent. Any other failure prints one line and boot carries on
//! without NAND.


use spin::Once;

use crate::console::DiagnosticSink;
use crate::drivers::device_manager::{DeviceId, DeviceManager};
use crate::drivers::nand::denali_dt::DRIVER_NAME;
use crate::drivers::{Device, ProbeContext};
use crate::error::DeviceError;

/// Result of the one bring-up attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NandBootOutcome {
    /// Controller probed and handed to the core
    Ready(DeviceId),
    /// No Denali controller on this board
    Absent,
    Failed(DeviceError),
}

impl NandBootOutcome {
    pub fn error_code(&self) -> Option<isize> {
        match self {
            NandBootOutcome::Failed(e) => Some(e.to_error_code()),
            _ => None,
        }
    }
}

/// Single-shot guard around the bring-up attempt.
///
/// The first [`initialize_once`](Self::initialize_once) runs the probe and
/// records the outcome; later calls only return it.
pub struct NandBoot {
    outcome: Once<NandBootOutcome>,
}

impl NandBoot {
    pub const fn new() -> Self {
        Self { outcome: Once::new() }
    }

    pub fn initialize_once<D: Device, const N: usize, const M: usize>(
        &self,
        dm: &mut DeviceManager<D, N, M>,
        ctx: &mut ProbeContext<'_>,
        sink: &mut dyn DiagnosticSink,
    ) -> NandBootOutcome {
        if let Some(done) = self.outcome.get() {
            log::warn!("nand: init already ran ({:?}), not repeating", done);
            return *done;
        }
        *self.outcome.call_once(|| bring_up(dm, ctx, sink))
    }

    /// Outcome of the first attempt, `None` before it ran
    pub fn outcome(&self) -> Option<NandBootOutcome> {
        self.outcome.get().copied()
    }
}

impl Default for NandBoot {
    fn default() -> Self {
        Self::new()
    }
}

fn bring_up<D: Device, const N: usize, const M: usize>(
    dm: &mut DeviceManager<D, N, M>,
    ctx: &mut ProbeContext<'_>,
    sink: &mut dyn DiagnosticSink,
) -> NandBootOutcome {
    match dm.get_device_by_driver(DRIVER_NAME, ctx) {
        Ok(id) => NandBootOutcome::Ready(id),
        Err(DeviceError::NotFound) => {
            log::debug!("nand: no {} device", DRIVER_NAME);
            NandBootOutcome::Absent
        }
        Err(e) => {
            sink.emit(format_args!(
                "Failed to initialize Denali NAND controller. (error {})",
                e.to_error_code()
            ));
            NandBootOutcome::Failed(e)
        }
    }
}

static NAND_BOOT: NandBoot = NandBoot::new();

/// Boot-sequence entry point, backed by a process-wide [`NandBoot`].
pub fn board_nand_init<D: Device, const N: usize, const M: usize>(
    dm: &mut DeviceManager<D, N, M>,
    ctx: &mut ProbeContext<'_>,
    sink: &mut dyn DiagnosticSink,
) -> NandBootOutcome {
    NAND_BOOT.initialize_once(dm, ctx, sink)
}

/// What [`board_nand_init`] recorded, if it ran
pub fn board_nand_outcome() -> Option<NandBootOutcome> {
    NAND_BOOT.outcome()
}
