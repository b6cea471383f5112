//! Provides a general interface to a physical OPC package (ZIP file).
//!
//! This module handles the low-level reading and writing of OPC packages as ZIP
//! archives. Reading materializes every file entry in archive order; writing
//! deflates every entry at the maximum level with a fixed timestamp, so the same
//! parts always produce the same bytes.

use crate::ooxml::opc::error::{OpcError, Result};
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// Deflate level used for every written entry.
pub const MAX_DEFLATE_LEVEL: i64 = 9;

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_PREALLOCATION: u64 = 1 << 24;

/// Physical package reader over an in-memory ZIP archive.
pub struct PhysPkgReader<'data> {
    archive: ZipArchive<Cursor<&'data [u8]>>,
}

impl<'data> PhysPkgReader<'data> {
    /// Open a ZIP archive from a byte slice.
    ///
    /// # Errors
    /// Returns [`OpcError::CorruptArchive`] if the bytes are not a readable ZIP archive.
    pub fn new(data: &'data [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        Ok(Self { archive })
    }

    /// Number of entries in the central directory, including directories.
    #[inline]
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Check if the archive has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Decompress every file entry, in archive order.
    ///
    /// Directory entries are skipped. Leading slashes are stripped from member names.
    pub fn read_all(&mut self) -> Result<Vec<(String, Vec<u8>)>> {
        let mut entries = Vec::with_capacity(self.archive.len());
        for index in 0..self.archive.len() {
            let mut file = self.archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut blob = Vec::with_capacity(file.size().min(MAX_PREALLOCATION) as usize);
            file.read_to_end(&mut blob)
                .map_err(|e| OpcError::CorruptArchive(format!("{}: {}", name, e)))?;
            entries.push((name, blob));
        }
        Ok(entries)
    }
}

/// Physical package writer for creating OPC packages.
///
/// Handles the low-level writing of parts to a ZIP archive with maximum deflate compression.
pub struct PhysPkgWriter {
    archive: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl PhysPkgWriter {
    /// Create a new package writer that writes to memory.
    pub fn new() -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(MAX_DEFLATE_LEVEL))
            .last_modified_time(DateTime::default());
        Self {
            archive: ZipWriter::new(Cursor::new(Vec::new())),
            options,
        }
    }

    /// Write a part to the package with Deflate compression.
    ///
    /// # Arguments
    /// * `membername` - The zip member name (no leading slash)
    /// * `blob` - The binary content to write
    pub fn write(&mut self, membername: &str, blob: &[u8]) -> Result<()> {
        self.archive
            .start_file(membername, self.options)
            .map_err(|e| OpcError::ZipWrite(format!("{}: {}", membername, e)))?;
        self.archive.write_all(blob)?;
        Ok(())
    }

    /// Finish writing and return the package bytes.
    ///
    /// Consumes the writer and returns the complete ZIP archive.
    pub fn finish(self) -> Result<Vec<u8>> {
        let cursor = self
            .archive
            .finish()
            .map_err(|e| OpcError::ZipWrite(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

impl Default for PhysPkgWriter {
    fn default() -> Self {
        Self::new()
    }
}
