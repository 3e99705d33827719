//! Deterministic decoder and ELF32 image builder shared by the unit tests.

use crate::{Address, Decoder, Insn};

/// Tiny fixed instruction set with predictable lengths.
///
/// | byte | decodes as            | length |
/// |------|-----------------------|--------|
/// | 0x90 | `nop`                 | 1      |
/// | 0xc3 | `ret`                 | 1      |
/// | 0xf4 | `hlt`                 | 1      |
/// | 0xe8 | `call rel32`          | 5      |
/// | 0x00 | `add byte ptr [eax], al` | 2   |
///
/// Anything else, or a truncated encoding, is undecodable.
pub struct ScriptedDecoder;

impl Decoder for ScriptedDecoder {
    fn decode(&self, code: &[u8], address: Address) -> Option<Insn> {
        let (mnemonic, operands, len) = match *code.first()? {
            0x90 => ("nop", "", 1),
            0xc3 => ("ret", "", 1),
            0xf4 => ("hlt", "", 1),
            0xe8 => ("call", "rel32", 5),
            0x00 => ("add", "byte ptr [eax], al", 2),
            _ => return None,
        };

        let encoding = code.get(..len)?;
        Some(Insn::new(address, mnemonic, operands, encoding))
    }
}

pub const EHDR_SIZE: usize = 52;
pub const PHDR_SIZE: usize = 32;

pub const PT_LOAD: u32 = 1;
pub const PT_INTERP: u32 = 3;
pub const PT_NOTE: u32 = 4;

/// One program header for [`Elf32Builder`].
#[derive(Debug, Clone, Copy)]
pub struct Phdr {
    pub p_type: u32,
    pub offset: u32,
    pub vaddr: u32,
    pub filesz: u32,
}

/// Builds minimal little-endian ELF32 executables in memory.
pub struct Elf32Builder {
    pub machine: u16,
    pub entry: u32,
    pub phdrs: Vec<Phdr>,
    /// Bytes to place at given file offsets after the tables are written
    pub patches: Vec<(usize, Vec<u8>)>,
    pub file_len: usize,
}

impl Elf32Builder {
    /// An x86 image of `file_len` zero-filled bytes with no segments yet.
    pub fn new(entry: u32, file_len: usize) -> Self {
        Self {
            machine: 3, // EM_386
            entry,
            phdrs: Vec::new(),
            patches: Vec::new(),
            file_len,
        }
    }

    pub fn segment(mut self, p_type: u32, offset: u32, vaddr: u32, filesz: u32) -> Self {
        self.phdrs.push(Phdr {
            p_type,
            offset,
            vaddr,
            filesz,
        });
        self
    }

    pub fn patch(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.patches.push((offset, bytes.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.file_len];

        out[..4].copy_from_slice(b"\x7fELF");
        out[4] = 1; // ELFCLASS32
        out[5] = 1; // ELFDATA2LSB
        out[6] = 1; // EV_CURRENT
        put16(&mut out, 16, 2); // ET_EXEC
        put16(&mut out, 18, self.machine);
        put32(&mut out, 20, 1);
        put32(&mut out, 24, self.entry);
        put32(&mut out, 28, EHDR_SIZE as u32); // e_phoff
        put32(&mut out, 32, 0); // e_shoff
        put32(&mut out, 36, 0); // e_flags
        put16(&mut out, 40, EHDR_SIZE as u16);
        put16(&mut out, 42, PHDR_SIZE as u16);
        put16(&mut out, 44, self.phdrs.len() as u16);
        put16(&mut out, 46, 40); // e_shentsize
        put16(&mut out, 48, 0); // e_shnum
        put16(&mut out, 50, 0); // e_shstrndx

        for (i, ph) in self.phdrs.iter().enumerate() {
            let at = EHDR_SIZE + i * PHDR_SIZE;
            put32(&mut out, at, ph.p_type);
            put32(&mut out, at + 4, ph.offset);
            put32(&mut out, at + 8, ph.vaddr);
            put32(&mut out, at + 12, ph.vaddr); // p_paddr
            put32(&mut out, at + 16, ph.filesz);
            put32(&mut out, at + 20, ph.filesz); // p_memsz
            put32(&mut out, at + 24, 5); // PF_R | PF_X
            put32(&mut out, at + 28, 0x1000);
        }

        for (offset, bytes) in &self.patches {
            out[*offset..*offset + bytes.len()].copy_from_slice(bytes);
        }

        out
    }
}

fn put16(buf: &mut [u8], at: usize, value: u16) {
    buf[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn put32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}
