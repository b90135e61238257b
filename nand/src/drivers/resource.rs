//! Physical register ranges and their CPU mappings

use core::ptr::NonNull;

/// A physical address range taken from the hardware description.
///
/// Only valid ranges can be constructed: non-zero base, non-zero size, and
/// an end that fits in 64 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysRange {
    base: u64,
    size: u64,
}

impl PhysRange {
    pub const fn new(base: u64, size: u64) -> Option<Self> {
        if base == 0 || size == 0 {
            return None;
        }
        match base.checked_add(size) {
            Some(_) => Some(Self { base, size }),
            None => None,
        }
    }

    pub const fn base(&self) -> u64 {
        self.base
    }

    pub const fn size(&self) -> u64 {
        self.size
    }

    /// First address past the range
    pub const fn end(&self) -> u64 {
        self.base + self.size
    }

    /// 检查是否与另一个区域重叠
    pub fn overlaps(&self, other: &Self) -> bool {
        self.base < other.end() && other.base < self.end()
    }
}

/// A register range mapped into the CPU's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmioRegion {
    phys: PhysRange,
    virt: NonNull<u8>,
}

impl MmioRegion {
    pub fn new(phys: PhysRange, virt: NonNull<u8>) -> Self {
        Self { phys, virt }
    }

    pub fn phys(&self) -> PhysRange {
        self.phys
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.virt.as_ptr()
    }

    pub fn virt_addr(&self) -> usize {
        self.virt.as_ptr() as usize
    }

    pub fn size(&self) -> u64 {
        self.phys.size()
    }
}

/// Maps physical ranges for device access.
///
/// Mapping a valid range is expected to succeed; `None` means the range
/// cannot be reached from this CPU at all (e.g. above the pointer width).
pub trait MemoryMapper {
    fn map_physical(&mut self, range: PhysRange) -> Option<MmioRegion>;
}

/// Linear device mapping: `virt = phys + offset`.
///
/// Boot code runs with device memory identity mapped, so the offset is
/// usually 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetMapper {
    offset: u64,
}

impl OffsetMapper {
    pub const fn identity() -> Self {
        Self { offset: 0 }
    }

    pub const fn new(offset: u64) -> Self {
        Self { offset }
    }
}

impl MemoryMapper for OffsetMapper {
    fn map_physical(&mut self, range: PhysRange) -> Option<MmioRegion> {
        let virt = range.base().checked_add(self.offset)?;
        // the whole window has to be addressable, not just its first byte
        let last = virt.checked_add(range.size() - 1)?;
        usize::try_from(last).ok()?;
        let ptr = NonNull::new(usize::try_from(virt).ok()? as *mut u8)?;
        log::debug!(
            "mmio: map phys=0x{:016X} size=0x{:X} -> virt=0x{:016X}",
            range.base(),
            range.size(),
            virt
        );
        Some(MmioRegion::new(range, ptr))
    }
}
