//! `fixed-clock` providers from the device tree

use crate::drivers::clk::{ClockError, ClockHandle, ClockService, EnableFailed};
use crate::drivers::dtb::{Fdt, FdtNode};
use crate::drivers::Device;

const FIXED_CLOCK: &str = "fixed-clock";

/// Resolves `clocks = <&phandle ...>` against fixed-rate providers.
///
/// Fixed clocks are always running, so enabling only checks that the
/// provider still exists.
#[derive(Clone, Copy)]
pub struct FixedClocks<'a> {
    fdt: Fdt<'a>,
}

impl<'a> FixedClocks<'a> {
    pub fn new(fdt: Fdt<'a>) -> Self {
        Self { fdt }
    }

    fn provider(&self, phandle: u32) -> Option<FdtNode<'a>> {
        self.fdt
            .find_by_phandle(phandle)
            .filter(|n| n.is_compatible(FIXED_CLOCK))
    }
}

impl ClockService for FixedClocks<'_> {
    fn get_clock(&mut self, dev: &dyn Device, index: usize) -> Result<ClockHandle, ClockError> {
        let raw = dev.property("clocks").ok_or(ClockError::NotFound)?;
        if raw.len() % 4 != 0 {
            return Err(ClockError::NotFound);
        }
        let mut cells = raw
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]));

        // each specifier is <phandle arg0 .. argN>, N from the provider's #clock-cells
        for n in 0.. {
            let phandle = cells.next().ok_or(ClockError::NotFound)?;
            let node = self.fdt.find_by_phandle(phandle).ok_or(ClockError::NotFound)?;
            let nargs = node.property_u32("#clock-cells").unwrap_or(0);
            let mut id = 0;
            for _ in 0..nargs {
                id = cells.next().ok_or(ClockError::NotFound)?;
            }
            if n != index {
                continue;
            }
            if !node.is_compatible(FIXED_CLOCK) || node.property("clock-frequency").is_none() {
                log::debug!("clk: {} clock {} is not a fixed clock", dev.name(), index);
                return Err(ClockError::NotFound);
            }
            return Ok(ClockHandle { provider: phandle, id });
        }
        Err(ClockError::NotFound)
    }

    fn enable(&mut self, clk: &ClockHandle) -> Result<(), EnableFailed> {
        self.provider(clk.provider).map(|_| ()).ok_or(EnableFailed)
    }

    fn rate_hz(&self, clk: &ClockHandle) -> u64 {
        self.provider(clk.provider)
            .and_then(|n| n.property_u64("clock-frequency"))
            .unwrap_or(0)
    }
}
