//! Error types for the NAND bring-up path
//!
//! Each layer has its own error enum; lower layers convert upward with
//! `From` so `?` carries a failure unchanged to the boot stage. Every error
//! maps to a stable errno-style code for the boot console.

use core::fmt;

const ENOENT: isize = 2;
const EIO: isize = 5;
const ENXIO: isize = 6;
const EEXIST: isize = 17;
const ENODEV: isize = 19;
const EINVAL: isize = 22;
const ENOSPC: isize = 28;
const ERANGE: isize = 34;

/// Failure while claiming the controller's resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionError {
    /// Named register range not declared, malformed, or not mappable
    ResourceMissing(&'static str),
    /// No clock at index 0
    ClockUnavailable,
    /// Clock found but could not be switched on
    ClockEnableFailed,
    /// Enabled clock reports 0 Hz
    ClockRateUnknown,
}

impl AcquisitionError {
    /// Converts the error to a numeric error code
    pub fn to_error_code(&self) -> isize {
        match self {
            AcquisitionError::ResourceMissing(_) => -EINVAL,
            AcquisitionError::ClockUnavailable => -ENOENT,
            AcquisitionError::ClockEnableFailed => -EIO,
            AcquisitionError::ClockRateUnknown => -ERANGE,
        }
    }
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AcquisitionError::ResourceMissing(name) => {
                write!(f, "register range \"{}\" missing", name)
            }
            AcquisitionError::ClockUnavailable => write!(f, "clock unavailable"),
            AcquisitionError::ClockEnableFailed => write!(f, "clock enable failed"),
            AcquisitionError::ClockRateUnknown => write!(f, "clock rate unknown"),
        }
    }
}

/// Opaque failure code returned by the controller core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitError(pub isize);

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "controller init failed ({})", self.0)
    }
}

/// Failure of a driver probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeError {
    Acquisition(AcquisitionError),
    Init(InitError),
}

impl ProbeError {
    pub fn to_error_code(&self) -> isize {
        match self {
            ProbeError::Acquisition(e) => e.to_error_code(),
            ProbeError::Init(e) => e.0,
        }
    }
}

impl From<AcquisitionError> for ProbeError {
    fn from(e: AcquisitionError) -> Self {
        ProbeError::Acquisition(e)
    }
}

impl From<InitError> for ProbeError {
    fn from(e: InitError) -> Self {
        ProbeError::Init(e)
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProbeError::Acquisition(e) => write!(f, "{}", e),
            ProbeError::Init(e) => write!(f, "{}", e),
        }
    }
}

/// Device manager failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// No device is bound to the requested driver
    NotFound,
    /// No driver registered under the requested name
    UnknownDriver,
    /// A driver with the same name is already registered
    DriverExists,
    /// Fixed-capacity table is full
    RegistryFull,
    /// Device found, probe failed
    Probe(ProbeError),
}

impl DeviceError {
    pub fn to_error_code(&self) -> isize {
        match self {
            DeviceError::NotFound => -ENODEV,
            DeviceError::UnknownDriver => -ENXIO,
            DeviceError::DriverExists => -EEXIST,
            DeviceError::RegistryFull => -ENOSPC,
            DeviceError::Probe(e) => e.to_error_code(),
        }
    }
}

impl From<ProbeError> for DeviceError {
    fn from(e: ProbeError) -> Self {
        DeviceError::Probe(e)
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeviceError::NotFound => write!(f, "no such device"),
            DeviceError::UnknownDriver => write!(f, "unknown driver"),
            DeviceError::DriverExists => write!(f, "driver already registered"),
            DeviceError::RegistryFull => write!(f, "device table full"),
            DeviceError::Probe(e) => write!(f, "probe failed: {}", e),
        }
    }
}
