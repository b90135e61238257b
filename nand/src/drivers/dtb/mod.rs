//! 设备树(blob)解析模块
//!
//! Read-only, allocation-free access to a flattened device tree:
//! - header validation
//! - node walk with inherited `#address-cells` / `#size-cells`
//! - property lookup, string lists, phandles
//! - named register ranges (`reg` + `reg-names`)


use core::str;

use crate::drivers::{Device, NotFound, PhysRange};

const FDT_MAGIC: u32 = 0xD00D_FEED;
const FDT_BEGIN_NODE: u32 = 1;
const FDT_END_NODE: u32 = 2;
const FDT_PROP: u32 = 3;
const FDT_NOP: u32 = 4;
const FDT_END: u32 = 9;

const HEADER_SIZE: usize = 40;
/// Oldest layout carrying `size_dt_struct`
const MIN_VERSION: u32 = 17;
const MAX_DEPTH: usize = 16;

const DEFAULT_ADDRESS_CELLS: u32 = 2;
const DEFAULT_SIZE_CELLS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdtError {
    BadMagic,
    Truncated,
    BadVersion,
    BadStructure,
}

fn be32_at(bytes: &[u8], off: usize) -> Option<u32> {
    let b = bytes.get(off..off.checked_add(4)?)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn align4(x: usize) -> usize {
    (x + 3) & !3
}

/// Big-endian cell sequence as one number; at most two cells.
fn read_cells(bytes: &[u8]) -> Option<u64> {
    if bytes.len() > 8 || bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .fold(0u64, |acc, c| (acc << 32) | u32::from_be_bytes([c[0], c[1], c[2], c[3]]) as u64),
    )
}

/// 设备树解析器
#[derive(Clone, Copy)]
pub struct Fdt<'a> {
    blob: &'a [u8],
    structs: &'a [u8],
    strings: &'a [u8],
}

impl<'a> Fdt<'a> {
    pub fn new(blob: &'a [u8]) -> Result<Self, FdtError> {
        if blob.len() < HEADER_SIZE {
            return Err(FdtError::Truncated);
        }
        let field = |off| be32_at(blob, off).ok_or(FdtError::Truncated);

        if field(0)? != FDT_MAGIC {
            return Err(FdtError::BadMagic);
        }
        let total_size = field(4)? as usize;
        let off_struct = field(8)? as usize;
        let off_strings = field(12)? as usize;
        let version = field(20)?;
        let size_strings = field(32)? as usize;
        let size_struct = field(36)? as usize;

        if version < MIN_VERSION {
            return Err(FdtError::BadVersion);
        }
        let blob = blob.get(..total_size).ok_or(FdtError::Truncated)?;
        let structs = off_struct
            .checked_add(size_struct)
            .and_then(|end| blob.get(off_struct..end))
            .ok_or(FdtError::Truncated)?;
        let strings = off_strings
            .checked_add(size_strings)
            .and_then(|end| blob.get(off_strings..end))
            .ok_or(FdtError::Truncated)?;

        if be32_at(structs, 0) != Some(FDT_BEGIN_NODE) {
            return Err(FdtError::BadStructure);
        }

        Ok(Fdt { blob, structs, strings })
    }

    pub fn total_size(&self) -> usize {
        self.blob.len()
    }

    /// Depth-first walk over every node, root first.
    pub fn nodes(&self) -> Nodes<'a> {
        Nodes {
            fdt: *self,
            pos: 0,
            depth: 0,
            cells: [(DEFAULT_ADDRESS_CELLS, DEFAULT_SIZE_CELLS); MAX_DEPTH],
            done: false,
        }
    }

    pub fn root(&self) -> Option<FdtNode<'a>> {
        self.nodes().next()
    }

    pub fn find_compatible<'b>(&self, compat: &'b str) -> impl Iterator<Item = FdtNode<'a>> + 'b
    where
        'a: 'b,
    {
        self.nodes().filter(move |n| n.is_compatible(compat))
    }

    pub fn find_by_phandle(&self, phandle: u32) -> Option<FdtNode<'a>> {
        self.nodes().find(|n| n.phandle() == Some(phandle))
    }

    fn string_at(&self, offset: usize) -> Option<&'a str> {
        let tail = self.strings.get(offset..)?;
        let end = tail.iter().position(|&b| b == 0)?;
        str::from_utf8(&tail[..end]).ok()
    }
}

impl Fdt<'static> {
    /// Wraps the blob firmware left in memory.
    ///
    /// # Safety
    ///
    /// `dtb_ptr` must point at a device tree that stays mapped and
    /// unmodified for the rest of boot.
    pub unsafe fn from_raw(dtb_ptr: usize) -> Result<Self, FdtError> {
        if dtb_ptr == 0 {
            return Err(FdtError::BadMagic);
        }
        let hdr = core::slice::from_raw_parts(dtb_ptr as *const u8, HEADER_SIZE);
        if be32_at(hdr, 0) != Some(FDT_MAGIC) {
            return Err(FdtError::BadMagic);
        }
        let total_size = be32_at(hdr, 4).ok_or(FdtError::Truncated)? as usize;
        Fdt::new(core::slice::from_raw_parts(dtb_ptr as *const u8, total_size))
    }
}

/// Node iterator, see [`Fdt::nodes`].
pub struct Nodes<'a> {
    fdt: Fdt<'a>,
    pos: usize,
    depth: usize,
    /// cell sizes declared by the open node at each depth
    cells: [(u32, u32); MAX_DEPTH],
    done: bool,
}

impl<'a> Nodes<'a> {
    fn begin_node(&mut self) -> Option<FdtNode<'a>> {
        let structs = self.fdt.structs;
        let tail = structs.get(self.pos..)?;
        let name_len = tail.iter().position(|&b| b == 0)?;
        let name = str::from_utf8(&tail[..name_len]).ok()?;
        self.pos = align4(self.pos + name_len + 1);

        if self.depth >= MAX_DEPTH {
            return None;
        }
        let (address_cells, size_cells) = match self.depth {
            0 => (DEFAULT_ADDRESS_CELLS, DEFAULT_SIZE_CELLS),
            d => self.cells[d - 1],
        };
        let node = FdtNode {
            fdt: self.fdt,
            name,
            depth: self.depth,
            props: self.pos,
            address_cells,
            size_cells,
        };
        self.cells[self.depth] = (
            node.property_u32("#address-cells").unwrap_or(DEFAULT_ADDRESS_CELLS),
            node.property_u32("#size-cells").unwrap_or(DEFAULT_SIZE_CELLS),
        );
        self.depth += 1;
        Some(node)
    }
}

impl<'a> Iterator for Nodes<'a> {
    type Item = FdtNode<'a>;

    fn next(&mut self) -> Option<FdtNode<'a>> {
        while !self.done {
            let Some(token) = be32_at(self.fdt.structs, self.pos) else {
                break;
            };
            self.pos += 4;
            match token {
                FDT_BEGIN_NODE => match self.begin_node() {
                    Some(node) => return Some(node),
                    None => break,
                },
                FDT_END_NODE => {
                    if self.depth == 0 {
                        break;
                    }
                    self.depth -= 1;
                }
                FDT_PROP => {
                    let Some(len) = be32_at(self.fdt.structs, self.pos) else {
                        break;
                    };
                    self.pos = align4(self.pos + 8 + len as usize);
                }
                FDT_NOP => {}
                // FDT_END or garbage
                _ => break,
            }
        }
        self.done = true;
        None
    }
}

/// 设备树节点
#[derive(Clone, Copy)]
pub struct FdtNode<'a> {
    fdt: Fdt<'a>,
    name: &'a str,
    depth: usize,
    /// first token after the node name
    props: usize,
    /// parent's `#address-cells`, used to decode our `reg`
    address_cells: u32,
    /// parent's `#size-cells`
    size_cells: u32,
}

impl core::fmt::Debug for FdtNode<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("FdtNode")
            .field("name", &self.name)
            .field("depth", &self.depth)
            .finish()
    }
}

/// 设备树属性
#[derive(Debug, Clone, Copy)]
pub struct FdtProperty<'a> {
    pub name: &'a str,
    pub value: &'a [u8],
}

impl<'a> FdtNode<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn properties(&self) -> Properties<'a> {
        Properties {
            fdt: self.fdt,
            pos: self.props,
        }
    }

    pub fn property(&self, name: &str) -> Option<&'a [u8]> {
        self.properties().find(|p| p.name == name).map(|p| p.value)
    }

    pub fn property_u32(&self, name: &str) -> Option<u32> {
        let v = self.property(name)?;
        if v.len() != 4 {
            return None;
        }
        be32_at(v, 0)
    }

    /// One- or two-cell integer property
    pub fn property_u64(&self, name: &str) -> Option<u64> {
        read_cells(self.property(name)?)
    }

    pub fn compatible(&self) -> StringList<'a> {
        StringList::new(self.property("compatible").unwrap_or(&[]))
    }

    pub fn is_compatible(&self, compat: &str) -> bool {
        self.compatible().any(|c| c == compat)
    }

    pub fn phandle(&self) -> Option<u32> {
        self.property_u32("phandle")
            .or_else(|| self.property_u32("linux,phandle"))
    }

    /// `status` absent, `"okay"` or `"ok"`
    pub fn status_okay(&self) -> bool {
        match self.property("status") {
            None => true,
            Some(v) => matches!(StringList::new(v).next(), Some("okay") | Some("ok")),
        }
    }

    /// Entry `index` of `reg`, decoded with the parent's cell sizes.
    pub fn reg(&self, index: usize) -> Option<PhysRange> {
        let ac = self.address_cells as usize;
        let sc = self.size_cells as usize;
        if ac == 0 || ac > 2 || sc > 2 {
            return None;
        }
        let stride = (ac + sc) * 4;
        let start = index.checked_mul(stride)?;
        let entry = self.property("reg")?.get(start..start + stride)?;
        let base = read_cells(&entry[..ac * 4])?;
        let size = read_cells(&entry[ac * 4..])?;
        PhysRange::new(base, size)
    }

    pub fn find_register_range(&self, name: &str) -> Result<PhysRange, NotFound> {
        let names = self.property("reg-names").ok_or(NotFound)?;
        let index = StringList::new(names).position(|n| n == name).ok_or(NotFound)?;
        self.reg(index).ok_or(NotFound)
    }
}

impl Device for FdtNode<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn compatible(&self) -> StringList<'_> {
        FdtNode::compatible(self)
    }

    fn find_register_range(&self, name: &str) -> Result<PhysRange, NotFound> {
        FdtNode::find_register_range(self, name)
    }

    fn property(&self, name: &str) -> Option<&[u8]> {
        FdtNode::property(self, name)
    }
}

/// Property iterator, see [`FdtNode::properties`].
pub struct Properties<'a> {
    fdt: Fdt<'a>,
    pos: usize,
}

impl<'a> Iterator for Properties<'a> {
    type Item = FdtProperty<'a>;

    fn next(&mut self) -> Option<FdtProperty<'a>> {
        let structs = self.fdt.structs;
        loop {
            match be32_at(structs, self.pos)? {
                FDT_PROP => {
                    let len = be32_at(structs, self.pos + 4)? as usize;
                    let nameoff = be32_at(structs, self.pos + 8)? as usize;
                    let start = self.pos + 12;
                    let value = structs.get(start..start.checked_add(len)?)?;
                    let name = self.fdt.string_at(nameoff)?;
                    self.pos = align4(start + len);
                    return Some(FdtProperty { name, value });
                }
                FDT_NOP => self.pos += 4,
                _ => return None,
            }
        }
    }
}

/// NUL-separated string list (`compatible`, `reg-names`, ...)
#[derive(Debug, Clone)]
pub struct StringList<'a> {
    rest: &'a [u8],
}

impl<'a> StringList<'a> {
    pub fn new(raw: &'a [u8]) -> Self {
        Self { rest: raw }
    }
}

impl<'a> Iterator for StringList<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let end = self.rest.iter().position(|&b| b == 0).unwrap_or(self.rest.len());
        let (s, tail) = self.rest.split_at(end);
        self.rest = tail.get(1..).unwrap_or(&[]);
        str::from_utf8(s).ok()
    }
}
