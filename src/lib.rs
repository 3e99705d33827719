//! Core IR, collaborator traits, and error types for elfsweep.
//!
//! elfsweep tiles a 32-bit ELF image into labeled, contiguous regions (file
//! header, program headers, interpreter path, the entry procedure and the
//! unidentified gaps around it) and then linearly disassembles every region
//! exactly once.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use elfsweep::{
//!     context::AnalysisContext,
//!     coverage::CodeCoverage,
//!     decoder::CapstoneDecoder,
//!     layout::LayoutFacts,
//!     parser::GoblinParser,
//!     tiler,
//!     BinaryParser, // Import the trait to bring parse() method into scope
//! };
//!
//! let ctx = AnalysisContext::open("path/to/binary").unwrap();
//! let metadata = GoblinParser::new().parse(ctx.image()).unwrap();
//! let decoder = CapstoneDecoder::for_architecture(metadata.architecture, metadata.big_endian).unwrap();
//!
//! let facts = LayoutFacts::extract(&metadata);
//! let tiling = tiler::tile(ctx.image(), &metadata, &facts, &decoder).unwrap();
//!
//! let report = CodeCoverage::new(&tiling).disassemble(ctx.image(), &decoder).unwrap();
//! for insn in report.instructions() {
//!     println!("{}", insn);
//! }
//! ```

pub mod context;
pub mod coverage;
pub mod decoder;
pub mod format;
pub mod layout;
pub mod parser;
pub mod region;
pub mod scanner;
pub mod tiler;
#[cfg(test)]
mod test_support;

/// Represents an address in memory
pub type Address = u64;

use std::fmt;
use clap::ValueEnum;

/// Maximum instruction size in bytes
pub const MAX_INSTRUCTION_SIZE: usize = 16;

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insn {
    /// Address of the instruction
    pub addr: Address,
    /// Size of the instruction in bytes
    pub size: u8,
    /// Instruction mnemonic (e.g., "mov", "add")
    pub mnemonic: String,
    /// Instruction operands as string representation
    pub operands: String,
    /// Raw bytes of the instruction (up to MAX_INSTRUCTION_SIZE)
    pub bytes: [u8; MAX_INSTRUCTION_SIZE],
}

impl Insn {
    /// Build an instruction from its encoding; the size is the encoding length.
    pub fn new(addr: Address, mnemonic: &str, operands: &str, encoding: &[u8]) -> Self {
        let mut bytes = [0u8; MAX_INSTRUCTION_SIZE];
        let size = encoding.len().min(MAX_INSTRUCTION_SIZE);
        bytes[..size].copy_from_slice(&encoding[..size]);

        Self {
            addr,
            size: size as u8,
            mnemonic: mnemonic.to_string(),
            operands: operands.to_string(),
            bytes,
        }
    }

    /// Returns the instruction bytes, up to the actual instruction size.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.size as usize]
    }

    /// Address of the first byte past this instruction.
    pub fn end_address(&self) -> Address {
        self.addr + self.size as Address
    }

    /// Returns true if this instruction is a return or halt form.
    ///
    /// This is what ends the entry procedure scan.
    pub fn is_terminator(&self) -> bool {
        let mnemonic = self.mnemonic.to_lowercase();
        let operands = self.operands.trim().to_lowercase();

        match mnemonic.as_str() {
            // x86, and the RISC-V `ret` pseudo-instruction
            "ret" | "retf" | "retn" | "hlt" => true,
            // ARM
            "bx" => operands == "lr",
            // MIPS
            "jr" => operands == "ra" || operands == "$ra",
            // PowerPC
            "blr" => true,
            _ => false,
        }
    }
}

impl fmt::Display for Insn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.mnemonic, self.operands)
    }
}

/// Decoder trait: architecture-specific disassembler.
pub trait Decoder {
    /// Decode the single instruction at the start of `code`.
    ///
    /// # Arguments
    /// * `code` - Bytes starting at the instruction to decode
    /// * `address` - Virtual address of `code[0]`
    ///
    /// # Returns
    /// Some(Insn) if an instruction was successfully decoded, None otherwise
    fn decode(&self, code: &[u8], address: Address) -> Option<Insn>;
}

/// Lazy linear sweep over a byte buffer.
///
/// Yields instructions in byte order and stops for good at the end of the
/// buffer or at the first byte sequence the decoder rejects. A fresh `Sweep`
/// can be started over any buffer at any time.
pub struct Sweep<'a> {
    decoder: &'a dyn Decoder,
    code: &'a [u8],
    origin: Address,
    offset: usize,
    stalled: bool,
}

impl<'a> Sweep<'a> {
    /// Start sweeping `code`, treating `code[0]` as living at `origin`.
    pub fn new(decoder: &'a dyn Decoder, code: &'a [u8], origin: Address) -> Self {
        Self {
            decoder,
            code,
            origin,
            offset: 0,
            stalled: false,
        }
    }

    /// Number of bytes consumed by the instructions yielded so far.
    pub fn consumed(&self) -> usize {
        self.offset
    }

    /// True once the decoder rejected bytes before the end of the buffer.
    pub fn stalled(&self) -> bool {
        self.stalled
    }
}

impl Iterator for Sweep<'_> {
    type Item = Insn;

    fn next(&mut self) -> Option<Insn> {
        if self.stalled || self.offset >= self.code.len() {
            return None;
        }

        let at = self.origin + self.offset as Address;
        match self.decoder.decode(&self.code[self.offset..], at) {
            // Zero-sized instructions would never advance the sweep
            Some(insn) if insn.size > 0 => {
                self.offset += insn.size as usize;
                Some(insn)
            }
            _ => {
                self.stalled = true;
                None
            }
        }
    }
}

/// Supported architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Architecture {
    /// 32-bit x86
    #[value(name = "x86")]
    X86_32,
    /// ARM (32-bit)
    Arm,
    /// MIPS 32-bit
    Mips32,
    /// RISC-V 32-bit
    #[value(name = "riscv32")]
    RiscV32,
    /// PowerPC 32-bit
    Ppc32,
    /// Unknown architecture
    #[value(skip)]
    Unknown,
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Architecture::X86_32 => write!(f, "x86-32"),
            Architecture::Arm => write!(f, "ARM"),
            Architecture::Mips32 => write!(f, "MIPS32"),
            Architecture::RiscV32 => write!(f, "RISC-V 32"),
            Architecture::Ppc32 => write!(f, "PowerPC 32"),
            Architecture::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Segment types the layout logic cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Loadable segment (`PT_LOAD`)
    Load,
    /// Interpreter path (`PT_INTERP`)
    Interp,
    /// Any other segment type, keeping the raw value
    Other(u32),
}

/// One program-header-table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    /// Offset of the segment's bytes in the file
    pub file_offset: u64,
    /// Virtual address the segment is mapped at
    pub virtual_address: Address,
    /// Number of bytes the segment occupies in the file
    pub file_size: u64,
}

impl Segment {
    /// Create a new segment
    pub fn new(kind: SegmentKind, file_offset: u64, virtual_address: Address, file_size: u64) -> Self {
        Self {
            kind,
            file_offset,
            virtual_address,
            file_size,
        }
    }

    /// Whether `address` falls inside `[virtual_address, virtual_address + file_size)`.
    pub fn contains(&self, address: Address) -> bool {
        address >= self.virtual_address && address - self.virtual_address < self.file_size
    }
}

/// Metadata describing a parsed binary.
#[derive(Debug, Clone)]
pub struct BinaryMetadata {
    /// Detected architecture
    pub architecture: Architecture,
    /// Whether the image is big-endian
    pub big_endian: bool,
    /// Entry point virtual address
    pub entry_point: Address,
    /// Size of the file header in bytes (`e_ehsize`)
    pub header_size: u64,
    /// Number of program header entries (`e_phnum`)
    pub program_header_count: usize,
    /// Program header table, in table order
    pub segments: Vec<Segment>,
}

impl BinaryMetadata {
    /// Iterate over the loadable segments
    pub fn loadable_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.kind == SegmentKind::Load)
    }
}

/// Parser trait: turn raw bytes into `BinaryMetadata`.
pub trait BinaryParser {
    /// Parse binary data into metadata
    ///
    /// # Arguments
    /// * `data` - The binary data to parse
    ///
    /// # Returns
    /// Result containing BinaryMetadata if parsing was successful
    fn parse(&self, data: &[u8]) -> Result<BinaryMetadata, DisassemblyError>;
}

/// Error type for disassembly operations
#[derive(Debug, thiserror::Error)]
pub enum DisassemblyError {
    /// Failed to parse binary format
    #[error("Failed to parse binary format: {0}")]
    ParsingError(String),

    /// Decoder error
    #[error("Decoder error: {0}")]
    Decoder(#[from] decoder::DecoderError),

    /// Unsupported architecture
    #[error("Unsupported architecture: {0}")]
    UnsupportedArchitecture(Architecture),

    /// The image layout could not be tiled consistently
    #[error("Unsupported binary layout: {0}")]
    Tiling(#[from] tiler::TilingError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Generic(String),
}
