//! CSV output formatter

use serde::Serialize;

use crate::coverage::CoverageReport;
use crate::region::RegionKind;
use crate::DisassemblyError;
use super::{hex_bytes, CoverageFormatter};

/// One CSV row
#[derive(Serialize)]
struct InstructionRow<'a> {
    region: &'a str,
    region_kind: RegionKind,
    address: String,
    size: u8,
    mnemonic: &'a str,
    operands: &'a str,
    bytes: String,
}

impl CoverageFormatter for super::CsvFormatter {
    fn format(&self, report: &CoverageReport<'_>) -> Result<String, DisassemblyError> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        for coverage in &report.regions {
            for insn in &coverage.instructions {
                writer
                    .serialize(InstructionRow {
                        region: &coverage.region.name,
                        region_kind: coverage.region.kind,
                        address: format!("0x{:x}", insn.addr),
                        size: insn.size,
                        mnemonic: &insn.mnemonic,
                        operands: &insn.operands,
                        bytes: hex_bytes(insn.bytes()),
                    })
                    .map_err(|e| DisassemblyError::Generic(format!("CSV error: {}", e)))?;
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| DisassemblyError::Generic(format!("CSV error: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| DisassemblyError::Generic(format!("CSV error: {}", e)))
    }
}
