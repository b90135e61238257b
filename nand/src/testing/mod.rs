//! Test fixtures shared by the driver tests
//!
//! - [`FdtBuilder`] assembles small device tree blobs
//! - recording fakes for every service a probe touches; all of them append
//!   to one [`EventLog`] so tests can assert call order

use std::cell::RefCell;
use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::console::DiagnosticSink;
use crate::drivers::clk::{ClockError, ClockHandle, ClockService, EnableFailed};
use crate::drivers::dtb::StringList;
use crate::drivers::nand::denali_dt::ControllerConfig;
use crate::drivers::{ControllerCore, Device, MemoryMapper, MmioRegion, NotFound, PhysRange};
use crate::error::InitError;

pub fn range(base: u64, size: u64) -> PhysRange {
    PhysRange::new(base, size).unwrap()
}

/// Minimal DTB writer (version 17, empty reservation map).
pub struct FdtBuilder {
    structs: Vec<u8>,
    strings: Vec<u8>,
}

impl FdtBuilder {
    pub fn new() -> Self {
        Self { structs: Vec::new(), strings: Vec::new() }
    }

    fn push_u32(&mut self, v: u32) {
        self.structs.extend_from_slice(&v.to_be_bytes());
    }

    fn pad(&mut self) {
        while self.structs.len() % 4 != 0 {
            self.structs.push(0);
        }
    }

    fn intern(&mut self, name: &str) -> u32 {
        let mut off = 0;
        for s in self.strings.split(|&b| b == 0) {
            if s == name.as_bytes() {
                return off as u32;
            }
            off += s.len() + 1;
        }
        let off = self.strings.len() as u32;
        self.strings.extend_from_slice(name.as_bytes());
        self.strings.push(0);
        off
    }

    pub fn begin_node(&mut self, name: &str) -> &mut Self {
        self.push_u32(1);
        self.structs.extend_from_slice(name.as_bytes());
        self.structs.push(0);
        self.pad();
        self
    }

    pub fn end_node(&mut self) -> &mut Self {
        self.push_u32(2);
        self
    }

    pub fn nop(&mut self) -> &mut Self {
        self.push_u32(4);
        self
    }

    pub fn prop(&mut self, name: &str, value: &[u8]) -> &mut Self {
        let nameoff = self.intern(name);
        self.push_u32(3);
        self.push_u32(value.len() as u32);
        self.push_u32(nameoff);
        self.structs.extend_from_slice(value);
        self.pad();
        self
    }

    pub fn prop_u32(&mut self, name: &str, v: u32) -> &mut Self {
        self.prop(name, &v.to_be_bytes())
    }

    pub fn prop_cells(&mut self, name: &str, cells: &[u32]) -> &mut Self {
        let bytes: Vec<u8> = cells.iter().flat_map(|c| c.to_be_bytes()).collect();
        self.prop(name, &bytes)
    }

    pub fn prop_strs(&mut self, name: &str, list: &[&str]) -> &mut Self {
        let mut bytes = Vec::new();
        for s in list {
            bytes.extend_from_slice(s.as_bytes());
            bytes.push(0);
        }
        self.prop(name, &bytes)
    }

    pub fn finish(&mut self) -> Vec<u8> {
        self.push_u32(9);
        let off_rsvmap = 40u32;
        let off_struct = off_rsvmap + 16;
        let off_strings = off_struct + self.structs.len() as u32;
        let total = off_strings + self.strings.len() as u32;

        let mut blob = Vec::new();
        for field in [
            0xD00D_FEED,
            total,
            off_struct,
            off_strings,
            off_rsvmap,
            17,
            16,
            0,
            self.strings.len() as u32,
            self.structs.len() as u32,
        ] {
            blob.extend_from_slice(&u32::to_be_bytes(field));
        }
        blob.extend_from_slice(&[0u8; 16]);
        blob.extend_from_slice(&self.structs);
        blob.extend_from_slice(&self.strings);
        blob
    }
}

/// A SoC with a 50 MHz fixed clock and one Denali node at `/soc/nand@ff900000`.
pub fn denali_board_dtb(compatible: &str, reg_names: &[&str]) -> Vec<u8> {
    let mut b = FdtBuilder::new();
    b.begin_node("")
        .prop_strs("compatible", &["altr,socfpga-cyclone5", "altr,socfpga"])
        .prop_u32("#address-cells", 1)
        .prop_u32("#size-cells", 1)
        .begin_node("clk-nand")
        .prop_strs("compatible", &["fixed-clock"])
        .prop_u32("#clock-cells", 0)
        .prop_u32("clock-frequency", 50_000_000)
        .prop_u32("phandle", 7)
        .end_node()
        .begin_node("soc")
        .prop_u32("#address-cells", 1)
        .prop_u32("#size-cells", 1)
        .begin_node("nand@ff900000")
        .prop_strs("compatible", &[compatible])
        .prop_cells("reg", &[0xffb8_0000, 0x1_0000, 0xff90_0000, 0x10_0000])
        .prop_strs("reg-names", reg_names)
        .prop_cells("clocks", &[7])
        .end_node()
        .end_node()
        .end_node();
    b.finish()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    FindRange(String),
    Map(u64),
    GetClock(usize),
    EnableClock,
    ClockRate,
    ControllerInit,
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn clock_touched(log: &EventLog) -> bool {
    log.borrow()
        .iter()
        .any(|e| matches!(e, Event::GetClock(_) | Event::EnableClock | Event::ClockRate))
}

pub struct FakeDevice {
    pub name: &'static str,
    /// NUL-separated, as in a device tree
    pub compatible: &'static [u8],
    pub ranges: Vec<(&'static str, PhysRange)>,
    pub log: EventLog,
}

impl FakeDevice {
    pub fn new(compatible: &'static [u8], log: &EventLog) -> Self {
        Self { name: "nand@ff900000", compatible, ranges: Vec::new(), log: log.clone() }
    }

    pub fn with_range(mut self, name: &'static str, base: u64, size: u64) -> Self {
        self.ranges.push((name, range(base, size)));
        self
    }

    /// Both Denali windows at their SoCFPGA addresses.
    pub fn with_denali_windows(self) -> Self {
        self.with_range("control", 0xffb8_0000, 0x1_0000)
            .with_range("data", 0xff90_0000, 0x10_0000)
    }
}

impl Device for FakeDevice {
    fn name(&self) -> &str {
        self.name
    }

    fn compatible(&self) -> StringList<'_> {
        StringList::new(self.compatible)
    }

    fn find_register_range(&self, name: &str) -> Result<PhysRange, NotFound> {
        self.log.borrow_mut().push(Event::FindRange(name.to_string()));
        self.ranges
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, r)| *r)
            .ok_or(NotFound)
    }

    fn property(&self, _name: &str) -> Option<&[u8]> {
        None
    }
}

pub struct FakeMapper {
    pub log: EventLog,
    pub offset: u64,
}

impl FakeMapper {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone(), offset: 0 }
    }
}

impl MemoryMapper for FakeMapper {
    fn map_physical(&mut self, range: PhysRange) -> Option<MmioRegion> {
        self.log.borrow_mut().push(Event::Map(range.base()));
        let virt = NonNull::new((range.base() + self.offset) as usize as *mut u8)?;
        Some(MmioRegion::new(range, virt))
    }
}

pub struct FakeClocks {
    pub log: EventLog,
    pub present: bool,
    pub enable_ok: bool,
    pub rate: u64,
}

impl FakeClocks {
    pub fn new(log: &EventLog, rate: u64) -> Self {
        Self { log: log.clone(), present: true, enable_ok: true, rate }
    }
}

impl ClockService for FakeClocks {
    fn get_clock(&mut self, _dev: &dyn Device, index: usize) -> Result<ClockHandle, ClockError> {
        self.log.borrow_mut().push(Event::GetClock(index));
        if self.present {
            Ok(ClockHandle { provider: 1, id: index as u32 })
        } else {
            Err(ClockError::NotFound)
        }
    }

    fn enable(&mut self, _clk: &ClockHandle) -> Result<(), EnableFailed> {
        self.log.borrow_mut().push(Event::EnableClock);
        if self.enable_ok {
            Ok(())
        } else {
            Err(EnableFailed)
        }
    }

    fn rate_hz(&self, _clk: &ClockHandle) -> u64 {
        self.log.borrow_mut().push(Event::ClockRate);
        self.rate
    }
}

pub struct FakeController {
    pub log: EventLog,
    pub result: Result<(), InitError>,
    pub received: Vec<ControllerConfig>,
}

impl FakeController {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone(), result: Ok(()), received: Vec::new() }
    }
}

impl ControllerCore for FakeController {
    fn init(&mut self, config: ControllerConfig) -> Result<(), InitError> {
        self.log.borrow_mut().push(Event::ControllerInit);
        self.received.push(config);
        self.result
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub lines: Vec<String>,
}

impl DiagnosticSink for RecordingSink {
    fn emit(&mut self, args: fmt::Arguments<'_>) {
        self.lines.push(args.to_string());
    }
}
