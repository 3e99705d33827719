//! Region table formatter

use crate::coverage::{CoverageReport, CoverageStatus};
use crate::DisassemblyError;
use super::CoverageFormatter;

impl CoverageFormatter for super::RegionsFormatter {
    fn format(&self, report: &CoverageReport<'_>) -> Result<String, DisassemblyError> {
        let mut output = String::new();

        output.push_str(&format!(
            "{:<10} {:<10} {:>8}  {:<16} {:<15} {}\n",
            "start", "end", "size", "name", "kind", "coverage"
        ));

        for coverage in &report.regions {
            let region = coverage.region;
            let status = match coverage.status() {
                CoverageStatus::Full => "full".to_string(),
                CoverageStatus::Partial => format!("partial ({}/{})", coverage.decoded_bytes, region.size),
                CoverageStatus::None => "none".to_string(),
            };

            output.push_str(&format!(
                "0x{:08x} 0x{:08x} {:>8}  {:<16} {:<15} {}\n",
                region.base_address,
                region.end_address(),
                region.size,
                region.name,
                region.kind.to_string(),
                status
            ));
        }

        Ok(output)
    }
}
