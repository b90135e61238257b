//! Clock lookup and control
//!
//! A driver asks for its N-th clock, enables it and reads the rate. Enabling
//! is a side effect on shared hardware and is never undone from here.

pub mod fixed;

#[cfg(test)]
mod tests;

use crate::drivers::Device;

pub use fixed::FixedClocks;

/// Reference to one output of a clock provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockHandle {
    /// Provider handle (the provider node's phandle for device-tree clocks)
    pub provider: u32,
    /// Output selector within the provider
    pub id: u32,
}

/// Clock lookup failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    NotFound,
}

/// The clock could not be switched on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnableFailed;

pub trait ClockService {
    /// Resolves clock `index` of `dev`.
    fn get_clock(&mut self, dev: &dyn Device, index: usize) -> Result<ClockHandle, ClockError>;

    fn enable(&mut self, clk: &ClockHandle) -> Result<(), EnableFailed>;

    /// Running rate in Hz, 0 when the provider cannot tell.
    fn rate_hz(&self, clk: &ClockHandle) -> u64;
}
