//! Analysis context: the loaded image plus the pipeline steps that run over it.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::coverage::{CodeCoverage, CoverageReport};
use crate::layout::LayoutFacts;
use crate::tiler::{self, Tiling};
use crate::{BinaryMetadata, BinaryParser, Decoder, DisassemblyError};

/// One binary under analysis.
///
/// The file is read once on [`AnalysisContext::open`]; its handle does not
/// outlive that call. Everything downstream borrows the in-memory image.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    path: PathBuf,
    image: Vec<u8>,
}

impl AnalysisContext {
    /// Read the whole file at `path` into memory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DisassemblyError> {
        let path = path.as_ref();
        let mut image = Vec::new();
        {
            let mut file = File::open(path)?;
            file.read_to_end(&mut image)?;
        }
        log::debug!("loaded {} ({} bytes)", path.display(), image.len());

        Ok(Self {
            path: path.to_path_buf(),
            image,
        })
    }

    /// Wrap bytes that are already in memory.
    pub fn from_bytes(path: impl Into<PathBuf>, image: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            image,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Parse the header and segment table.
    pub fn metadata(&self, parser: &dyn BinaryParser) -> Result<BinaryMetadata, DisassemblyError> {
        parser.parse(&self.image)
    }

    /// Tile the image into regions.
    pub fn tile(&self, metadata: &BinaryMetadata, decoder: &dyn Decoder) -> Result<Tiling, DisassemblyError> {
        let facts = LayoutFacts::extract(metadata);
        Ok(tiler::tile(&self.image, metadata, &facts, decoder)?)
    }

    /// Disassemble every region of `tiling`.
    pub fn cover<'t>(&self, tiling: &'t Tiling, decoder: &dyn Decoder) -> Result<CoverageReport<'t>, DisassemblyError> {
        Ok(CodeCoverage::new(tiling).disassemble(&self.image, decoder)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_open_reads_whole_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[1, 2, 3, 4, 5]).unwrap();

        let ctx = AnalysisContext::open(file.path()).unwrap();

        assert_eq!(ctx.image(), &[1, 2, 3, 4, 5]);
        assert_eq!(ctx.path(), file.path());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AnalysisContext::open(dir.path().join("missing")).unwrap_err();

        assert!(matches!(err, DisassemblyError::IoError(_)));
    }
}
