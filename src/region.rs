//! Labeled spans of the image.

use std::fmt;
use serde::Serialize;

use crate::Address;

/// Label of the file header region
pub const HEADER: &str = "header";
/// Label of the interpreter path region
pub const INTERP: &str = "interp_segment";
/// Label of the gap between the tables and the entry point
pub const BEFORE_START: &str = "before_start";
/// Label of the entry procedure region
pub const START: &str = "_start";
/// Label of everything after the entry procedure
pub const AFTER_START: &str = "after_start";

/// Label of the `index`-th program header region
pub fn program_header_name(index: usize) -> String {
    format!("program_header_{}", index)
}

/// Semantic category of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// ELF32 file header
    FileHeader,
    /// One program header table entry
    ProgramHeader,
    /// Interpreter path string
    Interpreter,
    /// Bytes with no identified meaning
    Unknown,
    /// Code reached from the entry point
    Code,
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionKind::FileHeader => write!(f, "file header"),
            RegionKind::ProgramHeader => write!(f, "program header"),
            RegionKind::Interpreter => write!(f, "interpreter"),
            RegionKind::Unknown => write!(f, "unknown"),
            RegionKind::Code => write!(f, "code"),
        }
    }
}

/// One labeled, contiguous span of the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Human-readable label
    pub name: String,
    pub kind: RegionKind,
    /// Address of the first byte
    pub base_address: Address,
    /// Length in bytes
    pub size: u64,
}

impl Region {
    pub fn new(name: impl Into<String>, kind: RegionKind, base_address: Address, size: u64) -> Self {
        Self {
            name: name.into(),
            kind,
            base_address,
            size,
        }
    }

    /// Address of the first byte past the region
    pub fn end_address(&self) -> Address {
        self.base_address + self.size
    }

    pub fn contains(&self, address: Address) -> bool {
        address >= self.base_address && address < self.end_address()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [0x{:08x}, 0x{:08x}) {} bytes ({})",
            self.name,
            self.base_address,
            self.end_address(),
            self.size,
            self.kind
        )
    }
}
