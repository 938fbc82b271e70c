//!
//! # GDSII Import & Export Module
//!
//! Conversion between [Layout]s and GDSII record streams,
//! through the [GdsExporter] and [GdsImporter].
//!

// Std-Lib
use std::fs::File;
use std::io::{BufWriter, Write};

// Local imports
use crate::config::ImportOptions;
use crate::error::LayoutResult;
use crate::layout::Layout;
use gdswire::{GdsRecord, GdsWriter};

mod export;
pub use export::{GdsExporter, GDS_VERSION};
mod import;
pub use import::GdsImporter;

impl Layout {
    /// Convert to GDSII records
    pub fn to_records(&self) -> LayoutResult<Vec<GdsRecord>> {
        GdsExporter::export(self)
    }
    /// Encode to GDSII bytes
    pub fn to_bytes(&self) -> LayoutResult<Vec<u8>> {
        Ok(gdswire::to_bytes(&self.to_records()?)?)
    }
    /// Write GDSII to `dest`
    pub fn write(&self, dest: impl Write) -> LayoutResult<()> {
        let records = self.to_records()?;
        let mut wr = GdsWriter::new(dest);
        wr.write_records(&records)?;
        wr.flush()?;
        Ok(())
    }
    /// Save to GDSII file `fname`
    pub fn save(&self, fname: impl AsRef<std::path::Path>) -> LayoutResult<()> {
        let file = BufWriter::new(File::create(fname)?);
        self.write(file)
    }
    /// Decode from GDSII bytes
    pub fn from_bytes(bytes: &[u8]) -> LayoutResult<Layout> {
        Self::from_bytes_with(bytes, &ImportOptions::default())
    }
    /// Decode from GDSII bytes, remapping layers and names per `options`
    pub fn from_bytes_with(bytes: &[u8], options: &ImportOptions) -> LayoutResult<Layout> {
        GdsImporter::import(bytes, options)
    }
    /// Open GDSII file `fname`
    pub fn open(fname: impl AsRef<std::path::Path>) -> LayoutResult<Layout> {
        Self::open_with(fname, &ImportOptions::default())
    }
    /// Open GDSII file `fname`, remapping layers and names per `options`
    pub fn open_with(
        fname: impl AsRef<std::path::Path>,
        options: &ImportOptions,
    ) -> LayoutResult<Layout> {
        let bytes = std::fs::read(fname)?;
        Self::from_bytes_with(&bytes, options)
    }
}

/// Write `layout` to a temporary file, and read it back
#[cfg(any(test, feature = "selftest"))]
pub fn roundtrip(layout: &Layout) -> LayoutResult<Layout> {
    use std::io::{Read, Seek, SeekFrom};
    use tempfile::tempfile;

    // Write to a temporary file
    let mut file = tempfile()?;
    layout.write(&mut file)?;

    // Rewind to the file-start, and read it back
    file.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Layout::from_bytes(&bytes)
}
