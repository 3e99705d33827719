//! Region tiler: cuts the whole image into contiguous labeled regions.

use crate::layout::LayoutFacts;
use crate::region::{self, Region, RegionKind};
use crate::scanner::scan_entry_procedure;
use crate::{Address, BinaryMetadata, Decoder};

/// Size of one ELF32 program header table entry
pub const ELF32_PROGRAM_HEADER_SIZE: u64 = 32;

/// Layouts the tiler cannot describe without gaps or overlaps.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TilingError {
    /// A region would have to end before it starts
    #[error("region `{name}` would span 0x{start:x}..0x{end:x}")]
    NegativeRegion {
        name: String,
        start: Address,
        end: Address,
    },

    /// The entry point maps past the end of the file
    #[error("entry file offset 0x{offset:x} is beyond the image ({len} bytes)")]
    EntryOutOfBounds { offset: u64, len: usize },

    /// A region does not start where its predecessor ended
    #[error("region `{name}` starts at 0x{actual:x}, expected 0x{expected:x}")]
    Discontiguous {
        name: String,
        expected: Address,
        actual: Address,
    },

    /// The regions do not add up to the image size
    #[error("regions cover {actual} bytes, image has {expected}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// A region's bytes lie outside the image
    #[error("region `{name}` maps outside the image")]
    RegionOutOfBounds { name: String },
}

/// Ordered, gapless, non-overlapping regions covering the whole image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tiling {
    regions: Vec<Region>,
    base_address: Address,
    total_size: u64,
}

impl Tiling {
    /// Wrap `regions` after checking that they tile `[base_address, base_address + total_size)`.
    pub fn new(regions: Vec<Region>, base_address: Address, total_size: u64) -> Result<Self, TilingError> {
        let tiling = Self {
            regions,
            base_address,
            total_size,
        };
        tiling.validate()?;
        Ok(tiling)
    }

    fn validate(&self) -> Result<(), TilingError> {
        let mut cursor = self.base_address;
        let mut covered: u64 = 0;

        for region in &self.regions {
            if region.base_address != cursor {
                return Err(TilingError::Discontiguous {
                    name: region.name.clone(),
                    expected: cursor,
                    actual: region.base_address,
                });
            }
            cursor = region.end_address();
            covered += region.size;
        }

        if covered != self.total_size {
            return Err(TilingError::SizeMismatch {
                expected: self.total_size,
                actual: covered,
            });
        }
        Ok(())
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Virtual address the image is loaded at; maps to file offset 0
    pub fn base_address(&self) -> Address {
        self.base_address
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// The `_start` region
    pub fn entry_procedure(&self) -> Option<&Region> {
        self.regions.iter().find(|r| r.kind == RegionKind::Code)
    }

    /// The region holding `address`, if any
    pub fn region_at(&self, address: Address) -> Option<&Region> {
        self.regions.iter().find(|r| r.contains(address))
    }

    /// File offset range backing `region`.
    pub fn file_range(&self, region: &Region) -> Option<std::ops::Range<usize>> {
        let start = region.base_address.checked_sub(self.base_address)?;
        let end = start.checked_add(region.size)?;
        Some(usize::try_from(start).ok()?..usize::try_from(end).ok()?)
    }
}

/// Appends regions at a running cursor.
struct Cursor {
    at: Address,
    regions: Vec<Region>,
}

impl Cursor {
    fn push(&mut self, name: impl Into<String>, kind: RegionKind, size: u64) {
        let region = Region::new(name, kind, self.at, size);
        self.at = region.end_address();
        self.regions.push(region);
    }

    /// Push a region from the cursor up to `end`.
    fn push_until(&mut self, name: &str, kind: RegionKind, end: Address) -> Result<(), TilingError> {
        let size = end.checked_sub(self.at).ok_or_else(|| TilingError::NegativeRegion {
            name: name.to_string(),
            start: self.at,
            end,
        })?;
        self.push(name, kind, size);
        Ok(())
    }
}

/// Tile `image` into regions.
///
/// Order: file header, one region per program header, the interpreter path
/// when it sits right after the program headers, the gap up to the entry
/// point, the entry procedure, and everything after it.
pub fn tile(
    image: &[u8],
    metadata: &BinaryMetadata,
    facts: &LayoutFacts,
    decoder: &dyn Decoder,
) -> Result<Tiling, TilingError> {
    let entry = metadata.entry_point;
    let mut cursor = Cursor {
        at: facts.base_address,
        regions: Vec::with_capacity(metadata.program_header_count + 5),
    };

    cursor.push(region::HEADER, RegionKind::FileHeader, metadata.header_size);

    for i in 0..metadata.program_header_count {
        cursor.push(
            region::program_header_name(i),
            RegionKind::ProgramHeader,
            ELF32_PROGRAM_HEADER_SIZE,
        );
    }

    // An interpreter placed anywhere else ends up inside `before_start`
    match facts.interpreter {
        Some(interp) if interp.virtual_address == cursor.at => {
            cursor.push(region::INTERP, RegionKind::Interpreter, interp.file_size);
        }
        Some(interp) => log::debug!(
            "interpreter at 0x{:x} does not follow the program headers (0x{:x})",
            interp.virtual_address,
            cursor.at
        ),
        None => {}
    }

    cursor.push_until(region::BEFORE_START, RegionKind::Unknown, entry)?;

    let entry_offset = usize::try_from(facts.entry_file_offset)
        .ok()
        .filter(|&offset| offset <= image.len())
        .ok_or(TilingError::EntryOutOfBounds {
            offset: facts.entry_file_offset,
            len: image.len(),
        })?;

    let start = scan_entry_procedure(&image[entry_offset..], entry, decoder);
    let start_end = start.end_address();
    cursor.at = start_end;
    cursor.regions.push(start);

    let consumed = facts.entry_file_offset + (start_end - entry);
    let remaining = (image.len() as u64)
        .checked_sub(consumed)
        .ok_or_else(|| TilingError::NegativeRegion {
            name: region::AFTER_START.to_string(),
            start: start_end,
            end: facts.base_address + image.len() as u64,
        })?;
    cursor.push(region::AFTER_START, RegionKind::Unknown, remaining);

    let tiling = Tiling::new(cursor.regions, facts.base_address, image.len() as u64)?;
    for region in tiling.regions() {
        log::info!("region {}", region);
    }
    Ok(tiling)
}
