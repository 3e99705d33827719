//! JSON output formatter

use serde::Serialize;

use crate::coverage::{CoverageReport, CoverageStatus, RegionCoverage};
use crate::region::RegionKind;
use crate::{DisassemblyError, Insn};
use super::{hex_bytes, CoverageFormatter};

/// Serializable instruction for JSON output
#[derive(Serialize)]
struct InstructionJson {
    /// Address of the instruction
    address: String,
    /// Size of the instruction in bytes
    size: u8,
    mnemonic: String,
    operands: String,
    /// Bytes of the instruction as hex string
    bytes: String,
}

/// Undecoded tail of a region
#[derive(Serialize)]
struct GapJson {
    start: String,
    end: String,
}

/// Serializable region for JSON output
#[derive(Serialize)]
struct RegionJson {
    name: String,
    kind: RegionKind,
    base_address: String,
    size: u64,
    /// "full", "partial" or "none"
    coverage: &'static str,
    decoded_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    gap: Option<GapJson>,
    instructions: Vec<InstructionJson>,
}

/// Serializable coverage report for JSON output
#[derive(Serialize)]
struct CoverageJson {
    total_bytes: u64,
    decoded_bytes: u64,
    instruction_count: usize,
    regions: Vec<RegionJson>,
}

impl CoverageFormatter for super::JsonFormatter {
    fn format(&self, report: &CoverageReport<'_>) -> Result<String, DisassemblyError> {
        let result = CoverageJson {
            total_bytes: report.total_bytes(),
            decoded_bytes: report.decoded_bytes(),
            instruction_count: report.instruction_count(),
            regions: report.regions.iter().map(region_to_json).collect(),
        };

        serde_json::to_string_pretty(&result)
            .map_err(|e| DisassemblyError::Generic(format!("JSON serialization error: {}", e)))
    }
}

fn region_to_json(coverage: &RegionCoverage<'_>) -> RegionJson {
    let region = coverage.region;

    RegionJson {
        name: region.name.clone(),
        kind: region.kind,
        base_address: format!("0x{:x}", region.base_address),
        size: region.size,
        coverage: match coverage.status() {
            CoverageStatus::Full => "full",
            CoverageStatus::Partial => "partial",
            CoverageStatus::None => "none",
        },
        decoded_bytes: coverage.decoded_bytes,
        gap: coverage.gap.map(|gap| GapJson {
            start: format!("0x{:x}", gap.start),
            end: format!("0x{:x}", gap.end),
        }),
        instructions: coverage.instructions.iter().map(instruction_to_json).collect(),
    }
}

fn instruction_to_json(insn: &Insn) -> InstructionJson {
    InstructionJson {
        address: format!("0x{:x}", insn.addr),
        size: insn.size,
        mnemonic: insn.mnemonic.clone(),
        operands: insn.operands.clone(),
        bytes: hex_bytes(insn.bytes()),
    }
}
