//! Goblin-based ELF32 structure reader.

use std::fmt;
use goblin::{elf, Object};
use goblin::elf::program_header::{PT_INTERP, PT_LOAD};

use crate::{Architecture, BinaryMetadata, BinaryParser, DisassemblyError, Segment, SegmentKind};

/// A parser that reads the header and segment table of 32-bit ELF images via Goblin.
#[derive(Debug, Default)]
pub struct GoblinParser;

impl GoblinParser {
    /// Construct a new GoblinParser.
    pub fn new() -> Self {
        GoblinParser
    }

    /// Parse an ELF image.
    fn parse_elf(&self, elf: elf::Elf) -> Result<BinaryMetadata, DisassemblyError> {
        if elf.is_64 {
            return Err(DisassemblyError::ParsingError(
                "64-bit ELF images are not supported".into(),
            ));
        }

        let arch = match elf.header.e_machine {
            elf::header::EM_386 => Architecture::X86_32,
            elf::header::EM_ARM => Architecture::Arm,
            elf::header::EM_MIPS => Architecture::Mips32,
            elf::header::EM_RISCV => Architecture::RiscV32,
            elf::header::EM_PPC => Architecture::Ppc32,
            _ => Architecture::Unknown,
        };

        let segments: Vec<Segment> = elf
            .program_headers
            .iter()
            .map(|ph| {
                let kind = match ph.p_type {
                    PT_LOAD => SegmentKind::Load,
                    PT_INTERP => SegmentKind::Interp,
                    other => SegmentKind::Other(other),
                };
                Segment::new(kind, ph.p_offset, ph.p_vaddr, ph.p_filesz)
            })
            .collect();

        log::debug!(
            "ELF32 {} image: entry 0x{:x}, {} segments",
            arch,
            elf.entry,
            segments.len()
        );

        Ok(BinaryMetadata {
            architecture: arch,
            big_endian: !elf.little_endian,
            entry_point: elf.entry,
            header_size: elf.header.e_ehsize as u64,
            program_header_count: elf.header.e_phnum as usize,
            segments,
        })
    }
}

impl fmt::Display for GoblinParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GoblinParser")
    }
}

impl BinaryParser for GoblinParser {
    fn parse(&self, data: &[u8]) -> Result<BinaryMetadata, DisassemblyError> {
        match Object::parse(data) {
            Ok(Object::Elf(elf)) => self.parse_elf(elf),
            Ok(_) => Err(DisassemblyError::ParsingError("Unsupported file format".into())),
            Err(e) => Err(DisassemblyError::ParsingError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Elf32Builder, PT_INTERP as INTERP, PT_LOAD as LOAD};

    #[test]
    fn test_parse_minimal_elf32() {
        let image = Elf32Builder::new(0x0804_8100, 0x200)
            .segment(LOAD, 0, 0x0804_8000, 0x200)
            .build();

        let meta = GoblinParser::new().parse(&image).unwrap();

        assert_eq!(meta.architecture, Architecture::X86_32);
        assert!(!meta.big_endian);
        assert_eq!(meta.entry_point, 0x0804_8100);
        assert_eq!(meta.header_size, 52);
        assert_eq!(meta.program_header_count, 1);
        assert_eq!(
            meta.segments,
            vec![Segment::new(SegmentKind::Load, 0, 0x0804_8000, 0x200)]
        );
    }

    #[test]
    fn test_parse_interp_segment() {
        let interp = b"/lib/ld-linux.so.2\0";
        let image = Elf32Builder::new(0x0804_8100, 0x200)
            .segment(INTERP, 116, 0x0804_8074, interp.len() as u32)
            .segment(LOAD, 0, 0x0804_8000, 0x200)
            .patch(116, interp)
            .build();

        let meta = GoblinParser::new().parse(&image).unwrap();

        assert_eq!(meta.segments[0].kind, SegmentKind::Interp);
        assert_eq!(meta.segments[0].virtual_address, 0x0804_8074);
        assert_eq!(meta.loadable_segments().count(), 1);
    }

    #[test]
    fn test_unknown_machine() {
        let mut builder = Elf32Builder::new(0x1000, 0x100).segment(LOAD, 0, 0x1000, 0x100);
        builder.machine = 0x1234;

        let meta = GoblinParser::new().parse(&builder.build()).unwrap();
        assert_eq!(meta.architecture, Architecture::Unknown);
    }

    #[test]
    fn test_reject_garbage() {
        let err = GoblinParser::new().parse(b"definitely not an executable").unwrap_err();
        assert!(matches!(err, DisassemblyError::ParsingError(_)));
    }
}
