//! elfsweep: tile a 32-bit ELF image into regions and disassemble each one.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::LevelFilter;

use elfsweep::context::AnalysisContext;
use elfsweep::decoder::CapstoneDecoder;
use elfsweep::format::OutputFormat;
use elfsweep::parser::GoblinParser;
use elfsweep::Architecture;

/// Region coverage and linear-sweep disassembly for 32-bit ELF executables.
#[derive(Debug, Parser)]
#[command(name = "elfsweep", version, about)]
struct Cli {
    /// ELF executable to analyze
    binary: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Decode as this ISA instead of the one named by the ELF header
    #[arg(short, long, value_enum)]
    arch: Option<Architecture>,

    /// More logging on stderr (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Keep stdout clean for machine-readable formats
    let progress = |line: &str| {
        if cli.format.is_machine_readable() {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    };

    let ctx = AnalysisContext::open(&cli.binary)
        .with_context(|| format!("failed to read {}", cli.binary.display()))?;

    let metadata = ctx
        .metadata(&GoblinParser::new())
        .with_context(|| format!("failed to parse {}", ctx.path().display()))?;

    let arch = cli.arch.unwrap_or(metadata.architecture);
    if arch == Architecture::Unknown {
        bail!("unsupported machine type in {}; pass --arch to pick one", ctx.path().display());
    }
    let decoder = CapstoneDecoder::for_architecture(arch, metadata.big_endian)?;
    log::info!("decoding {} as {}", ctx.path().display(), arch);

    progress("Creating code coverage...");
    let tiling = ctx.tile(&metadata, &decoder)?;

    progress("Disassembling the file...");
    let report = ctx.cover(&tiling, &decoder)?;
    print!("{}", cli.format.get_formatter().format(&report)?);

    progress("Done.");
    Ok(())
}
