//! Output format module implementation

mod json;
mod csv;
mod regions;

pub use self::json::*;
pub use self::csv::*;
pub use self::regions::*;

use crate::coverage::CoverageReport;
use crate::DisassemblyError;
use std::fmt;
use std::str::FromStr;
use clap::ValueEnum;

/// Supported output formats for coverage results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// `mnemonic<TAB>operands`, one instruction per line (default)
    #[default]
    Text,
    /// JSON document with every region and its instructions
    Json,
    /// CSV, one row per instruction tagged with its region
    Csv,
    /// The region table only
    Regions,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Regions => write!(f, "regions"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "regions" => Ok(OutputFormat::Regions),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

impl OutputFormat {
    /// Whether the output is meant for programs rather than people
    pub fn is_machine_readable(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Csv)
    }

    /// Get a formatter for this output format
    pub fn get_formatter(&self) -> Box<dyn CoverageFormatter> {
        match self {
            OutputFormat::Text => Box::new(TextFormatter),
            OutputFormat::Json => Box::new(JsonFormatter),
            OutputFormat::Csv => Box::new(CsvFormatter),
            OutputFormat::Regions => Box::new(RegionsFormatter),
        }
    }
}

/// Formatter trait for coverage output
pub trait CoverageFormatter {
    /// Format a coverage report
    fn format(&self, report: &CoverageReport<'_>) -> Result<String, DisassemblyError>;
}

/// Plain `mnemonic<TAB>operands` listing in tiling order
pub struct TextFormatter;

/// Format coverage in JSON
pub struct JsonFormatter;

/// Format coverage in CSV
pub struct CsvFormatter;

/// List the regions without their instructions
pub struct RegionsFormatter;

impl CoverageFormatter for TextFormatter {
    fn format(&self, report: &CoverageReport<'_>) -> Result<String, DisassemblyError> {
        let mut output = String::new();

        for insn in report.instructions() {
            output.push_str(&insn.to_string());
            output.push('\n');
        }

        Ok(output)
    }
}

/// Hex rendering of an instruction's encoding, space separated
fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::coverage::CodeCoverage;
    use crate::region::{Region, RegionKind};
    use crate::test_support::ScriptedDecoder;
    use crate::tiler::Tiling;

    /// `header` (2 bytes, one undecodable) followed by `_start` (nop; ret)
    pub(crate) fn sample_tiling() -> Tiling {
        Tiling::new(
            vec![
                Region::new("header", RegionKind::FileHeader, 0x1000, 2),
                Region::new("_start", RegionKind::Code, 0x1002, 2),
            ],
            0x1000,
            4,
        )
        .unwrap()
    }

    pub(crate) const SAMPLE_IMAGE: [u8; 4] = [0x90, 0xff, 0x90, 0xc3];

    pub(crate) fn sample_report(tiling: &Tiling) -> CoverageReport<'_> {
        CodeCoverage::new(tiling)
            .disassemble(&SAMPLE_IMAGE, &ScriptedDecoder)
            .unwrap()
    }

    #[test]
    fn test_text_formatter() {
        let tiling = sample_tiling();
        let output = TextFormatter.format(&sample_report(&tiling)).unwrap();

        assert_eq!(output, "nop\t\nnop\t\nret\t\n");
    }

    #[test]
    fn test_format_names_round_trip() {
        for format in OutputFormat::value_variants() {
            assert_eq!(format.to_string().parse::<OutputFormat>(), Ok(*format));
        }
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_machine_readable() {
        assert!(!OutputFormat::default().is_machine_readable());
        assert!(OutputFormat::Json.is_machine_readable());
        assert!(OutputFormat::Csv.is_machine_readable());
    }

    #[test]
    fn test_hex_bytes() {
        assert_eq!(hex_bytes(&[0x89, 0xe5]), "89 e5");
        assert_eq!(hex_bytes(&[]), "");
    }
}
