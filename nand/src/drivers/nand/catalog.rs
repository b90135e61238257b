//! Denali platform catalog
//!
//! Compatible string → (protocol revision, quirk flags). The table is
//! generated by `build.rs` from `configs/nand/denali.toml` and doubles as
//! the driver's `of_match` list. Unknown identities are not an error; they
//! get [`PlatformProfile::DEFAULT`].

use crate::drivers::device_manager::OfMatch;
use crate::drivers::Device;

bitflags::bitflags! {
    /// Controller quirks consulted by the controller core
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CapabilityFlags: u32 {
        /// ECC error reports need a software fixup
        const HW_ECC_FIXUP = 1 << 0;
        /// DMA engine takes 64-bit bus addresses
        const DMA_64BIT    = 1 << 1;
    }
}

/// What one silicon integration needs the controller core to know
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformProfile {
    pub revision: u32,
    pub caps: CapabilityFlags,
}

impl PlatformProfile {
    pub const DEFAULT: PlatformProfile = PlatformProfile {
        revision: 0,
        caps: CapabilityFlags::empty(),
    };
}

impl Default for PlatformProfile {
    fn default() -> Self {
        Self::DEFAULT
    }
}

include!(concat!(env!("OUT_DIR"), "/denali_catalog.rs"));

/// `identity` is either the full compatible string or the model part
/// after the vendor prefix.
fn identity_matches(compatible: &str, identity: &str) -> bool {
    compatible == identity
        || compatible
            .split_once(',')
            .map_or(false, |(_, model)| model == identity)
}

pub fn lookup(identity: &str) -> Option<&'static PlatformProfile> {
    DENALI_OF_MATCH
        .iter()
        .find(|m| identity_matches(m.compatible, identity))
        .and_then(|m| m.data)
}

/// Profile for `identity`, the default one when it is not listed.
pub fn resolve(identity: &str) -> PlatformProfile {
    lookup(identity).copied().unwrap_or_default()
}

/// First of the device's compatible strings the catalog knows.
pub fn lookup_device(dev: &dyn Device) -> Option<&'static PlatformProfile> {
    dev.compatible().find_map(lookup)
}
