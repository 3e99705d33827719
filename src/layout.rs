//! Load base, entry file offset and interpreter location derived from the segment table.

use crate::{Address, BinaryMetadata, Segment, SegmentKind};

/// Location of the `PT_INTERP` segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterSegment {
    pub virtual_address: Address,
    pub file_size: u64,
}

/// Facts about the image layout that the tiler builds on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutFacts {
    /// Virtual address of the loadable segment mapping file offset zero, or 0
    pub base_address: Address,
    /// File offset of the entry point, or 0 when no segment contains it
    pub entry_file_offset: u64,
    /// Interpreter path segment, if the image has one
    pub interpreter: Option<InterpreterSegment>,
}

impl LayoutFacts {
    /// Derive the layout facts from parsed metadata.
    ///
    /// Missing information falls back to zero instead of failing; the tiler
    /// catches layouts that those fallbacks cannot describe.
    pub fn extract(metadata: &BinaryMetadata) -> Self {
        let base_address = metadata
            .loadable_segments()
            .find(|s| s.file_offset == 0)
            .map(|s| s.virtual_address)
            .unwrap_or_else(|| {
                log::warn!("no loadable segment maps file offset 0, assuming base address 0");
                0
            });

        let entry = metadata.entry_point;
        let entry_segment = metadata
            .loadable_segments()
            .find(|s| s.contains(entry))
            .or_else(|| metadata.segments.iter().find(|s| s.contains(entry)));

        let entry_file_offset = match entry_segment {
            Some(seg) => entry_offset_in(seg, entry),
            None => {
                log::warn!("no segment contains entry point 0x{:x}, assuming file offset 0", entry);
                0
            }
        };

        let interpreter = metadata
            .segments
            .iter()
            .find(|s| s.kind == SegmentKind::Interp)
            .map(|s| InterpreterSegment {
                virtual_address: s.virtual_address,
                file_size: s.file_size,
            });

        let facts = Self {
            base_address,
            entry_file_offset,
            interpreter,
        };
        log::debug!("layout: {:x?}", facts);
        facts
    }
}

fn entry_offset_in(segment: &Segment, entry: Address) -> u64 {
    segment.file_offset + (entry - segment.virtual_address)
}
