//! In-memory OPC package.
//!
//! This module provides the [`Package`] type, which materializes every entry of a
//! ZIP-based package as raw bytes keyed by member name. Parts only change through
//! [`Package::put`] and [`Package::remove`]; the package as a whole is serialized
//! back with [`Package::to_bytes`].

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::phys_pkg::{PhysPkgReader, PhysPkgWriter};
use std::collections::HashMap;
use std::path::Path;

/// An OPC package held entirely in memory.
///
/// Member names are archive-relative (`word/document.xml`, no leading slash) and
/// unique. Entries keep the order they had in the source archive; new entries are
/// appended.
#[derive(Debug, Clone, Default)]
pub struct Package {
    /// Member names in archive order
    order: Vec<String>,
    /// Entry contents, indexed by member name
    parts: HashMap<String, Vec<u8>>,
}

impl Package {
    /// Create a new empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a package from a file.
    ///
    /// # Errors
    /// Returns [`OpcError::PackageNotFound`] if the file doesn't exist,
    /// [`OpcError::CorruptArchive`] if it isn't a valid ZIP file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(OpcError::PackageNotFound(path.display().to_string()));
        }
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Load a package from the bytes of a ZIP archive.
    ///
    /// # Errors
    /// Returns [`OpcError::CorruptArchive`] if the input is not a valid ZIP archive.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = PhysPkgReader::new(data)?;
        let mut package = Self::new();
        for (name, blob) in reader.read_all()? {
            if package.parts.contains_key(&name) {
                return Err(OpcError::CorruptArchive(format!("duplicate entry '{}'", name)));
            }
            package.put(name, blob);
        }
        Ok(package)
    }

    /// Get the bytes of an entry, or `None` if it is absent.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    /// Check whether an entry exists.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    /// Insert an entry or replace the bytes of an existing one.
    ///
    /// A replaced entry keeps its position in the archive.
    pub fn put<S: Into<String>>(&mut self, name: S, blob: Vec<u8>) {
        let name = name.into();
        if !self.parts.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.parts.insert(name, blob);
    }

    /// Remove an entry. Removing an absent entry is a no-op.
    ///
    /// Returns whether an entry was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        if self.parts.remove(name).is_none() {
            return false;
        }
        self.order.retain(|n| n != name);
        true
    }

    /// All entries whose member name starts with `prefix`, in archive order.
    pub fn entries_under<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a [u8])> {
        self.order
            .iter()
            .filter(move |name| name.starts_with(prefix))
            .filter_map(move |name| self.parts.get(name).map(|blob| (name.as_str(), blob.as_slice())))
    }

    /// Member names of the entries under `prefix`, in archive order.
    pub fn names_under(&self, prefix: &str) -> Vec<String> {
        self.entries_under(prefix).map(|(name, _)| name.to_string()).collect()
    }

    /// All member names, in archive order.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the package is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Serialize the package to ZIP bytes.
    ///
    /// Every entry is deflated at the maximum level, regardless of how it was
    /// stored in the source archive.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = PhysPkgWriter::new();
        for (name, blob) in self.entries_under("") {
            writer.write(name, blob)?;
        }
        writer.finish()
    }
}
