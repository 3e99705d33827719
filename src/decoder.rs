//! Capstone-based instruction decoders for the supported 32-bit ISAs.

use std::fmt;

use capstone::{Arch, Capstone, Endian, Mode, NO_EXTRA_MODE};

use crate::{Address, Architecture, Decoder, Insn};

/// Errors that can occur while building a decoder
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    /// Capstone error
    #[error("Capstone error: {0}")]
    CapstoneError(#[from] capstone::Error),

    /// Unsupported architecture
    #[error("Unsupported architecture: {0}")]
    UnsupportedArchitecture(Architecture),
}

/// A Capstone handle configured for one ISA.
pub struct CapstoneDecoder {
    arch: Architecture,
    big_endian: bool,
    cs: Capstone,
}

impl fmt::Debug for CapstoneDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapstoneDecoder")
            .field("arch", &self.arch)
            .field("big_endian", &self.big_endian)
            .finish()
    }
}

impl CapstoneDecoder {
    /// Create a decoder for a specific architecture and byte order
    pub fn for_architecture(arch: Architecture, big_endian: bool) -> Result<Self, DecoderError> {
        let (cs_arch, mode) = match arch {
            Architecture::X86_32 => (Arch::X86, Mode::Mode32),
            Architecture::Arm => (Arch::ARM, Mode::Arm),
            Architecture::Mips32 => (Arch::MIPS, Mode::Mips32),
            Architecture::RiscV32 => (Arch::RISCV, Mode::RiscV32),
            Architecture::Ppc32 => (Arch::PPC, Mode::Mode32),
            Architecture::Unknown => return Err(DecoderError::UnsupportedArchitecture(arch)),
        };

        // x86 and RISC-V only exist little-endian
        let endian = match arch {
            Architecture::X86_32 | Architecture::RiscV32 => Endian::Little,
            _ if big_endian => Endian::Big,
            _ => Endian::Little,
        };

        let cs = Capstone::new_raw(cs_arch, mode, NO_EXTRA_MODE, Some(endian))?;
        log::debug!("built capstone decoder for {} (big endian: {})", arch, matches!(endian, Endian::Big));

        Ok(Self { arch, big_endian, cs })
    }

    /// Get the architecture of this decoder
    pub fn architecture(&self) -> Architecture {
        self.arch
    }
}

impl fmt::Display for CapstoneDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CapstoneDecoder::{}", self.arch)
    }
}

impl Decoder for CapstoneDecoder {
    fn decode(&self, code: &[u8], address: Address) -> Option<Insn> {
        if code.is_empty() {
            return None;
        }

        let insns = self.cs.disasm_count(code, address, 1).ok()?;
        let i = insns.iter().next()?;

        // Ensure instruction starts at the address we requested
        if i.address() != address {
            return None;
        }

        Some(Insn::new(
            i.address(),
            i.mnemonic().unwrap_or(""),
            i.op_str().unwrap_or(""),
            i.bytes(),
        ))
    }
}
