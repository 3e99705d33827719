//! Coverage tracker: linear disassembly of every tiled region.

use crate::region::Region;
use crate::tiler::{Tiling, TilingError};
use crate::{Address, Decoder, Insn, Sweep};

/// Bytes at the end of a region that the decoder could not get through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeGap {
    /// Address of the first byte the decoder rejected
    pub start: Address,
    /// End of the region
    pub end: Address,
}

impl DecodeGap {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// How much of a region decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageStatus {
    Full,
    Partial,
    None,
}

/// Decoded instructions of one region.
#[derive(Debug, Clone)]
pub struct RegionCoverage<'t> {
    pub region: &'t Region,
    pub instructions: Vec<Insn>,
    /// Bytes covered by `instructions`
    pub decoded_bytes: u64,
    /// Undecoded tail, if the sweep stopped early
    pub gap: Option<DecodeGap>,
}

impl RegionCoverage<'_> {
    pub fn status(&self) -> CoverageStatus {
        if self.decoded_bytes == self.region.size {
            CoverageStatus::Full
        } else if self.decoded_bytes == 0 {
            CoverageStatus::None
        } else {
            CoverageStatus::Partial
        }
    }
}

/// Per-region disassembly of a whole tiling, in tiling order.
#[derive(Debug, Clone)]
pub struct CoverageReport<'t> {
    pub regions: Vec<RegionCoverage<'t>>,
}

impl<'t> CoverageReport<'t> {
    /// All instructions, region by region
    pub fn instructions(&self) -> Box<dyn Iterator<Item = &Insn> + '_> {
        Box::new(self.regions.iter().flat_map(|r| r.instructions.iter()))
    }

    pub fn instruction_count(&self) -> usize {
        self.regions.iter().map(|r| r.instructions.len()).sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.regions.iter().map(|r| r.region.size).sum()
    }

    pub fn decoded_bytes(&self) -> u64 {
        self.regions.iter().map(|r| r.decoded_bytes).sum()
    }

    /// Regions whose sweep stopped before their end
    pub fn gaps(&self) -> Vec<(&'t Region, DecodeGap)> {
        self.regions
            .iter()
            .filter_map(|r| r.gap.map(|gap| (r.region, gap)))
            .collect()
    }
}

/// Walks a tiling and disassembles each region once.
pub struct CodeCoverage<'t> {
    tiling: &'t Tiling,
}

impl<'t> CodeCoverage<'t> {
    pub fn new(tiling: &'t Tiling) -> Self {
        Self { tiling }
    }

    /// Sweep every region of the tiling over `image`.
    ///
    /// Decoding stops inside a region are recorded as gaps; only regions
    /// that map outside `image` are errors.
    pub fn disassemble(&self, image: &[u8], decoder: &dyn Decoder) -> Result<CoverageReport<'t>, TilingError> {
        let mut regions = Vec::with_capacity(self.tiling.regions().len());

        for region in self.tiling.regions() {
            let bytes = self
                .tiling
                .file_range(region)
                .and_then(|range| image.get(range))
                .ok_or_else(|| TilingError::RegionOutOfBounds {
                    name: region.name.clone(),
                })?;

            let mut sweep = Sweep::new(decoder, bytes, region.base_address);
            let instructions: Vec<Insn> = sweep.by_ref().collect();
            let decoded_bytes = sweep.consumed() as u64;

            let gap = (decoded_bytes < region.size).then(|| DecodeGap {
                start: region.base_address + decoded_bytes,
                end: region.end_address(),
            });

            match gap {
                Some(gap) => log::debug!(
                    "{}: {} instructions, {} undecoded bytes from 0x{:x}",
                    region.name,
                    instructions.len(),
                    gap.len(),
                    gap.start
                ),
                None => log::debug!("{}: {} instructions", region.name, instructions.len()),
            }

            regions.push(RegionCoverage {
                region,
                instructions,
                decoded_bytes,
                gap,
            });
        }

        let report = CoverageReport { regions };
        log::info!(
            "decoded {} instructions covering {} of {} bytes",
            report.instruction_count(),
            report.decoded_bytes(),
            report.total_bytes()
        );
        Ok(report)
    }
}
