//! WordprocessingML (.docx) optimization passes.
//!
//! Each pass works directly on an in-memory [`Package`] and only removes what it
//! can prove is unreachable:
//!
//! - [`fonts`]: embedded font binaries, their relationships and the settings flag
//!   that asks Word to embed fonts on save
//! - [`media`]: media entries no relationship refers to
//! - [`styles`]: style definitions outside the closure of used and default styles
//!
//! A pass that cannot parse a part it depends on returns an error before changing
//! anything, leaving that part byte-identical.

pub mod fonts;
pub mod media;
pub mod settings;
pub mod styles;

pub use fonts::{FontRemoval, remove_embedded_fonts};
pub use media::{MediaPruning, remove_unused_media};
pub use styles::{StyleDefinition, StyleGraph, StylePruning, remove_unused_styles};

use crate::common::xml::XmlDocument;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::{Package, PackURI, Relationships};

/// Parse a part of the package, or `None` if it is absent.
pub(crate) fn read_xml(package: &Package, part: &str) -> Result<Option<XmlDocument>> {
    match package.get(part) {
        Some(bytes) => XmlDocument::parse(bytes)
            .map(Some)
            .map_err(|e| OoxmlError::malformed(part, e)),
        None => Ok(None),
    }
}

/// Replace a part with the serialized document.
pub(crate) fn write_xml(package: &mut Package, part: &str, doc: &XmlDocument) {
    package.put(part, doc.to_bytes());
}

/// Load the relationships of the part stored under `source` (a member name).
pub(crate) fn load_rels(package: &Package, source: &str) -> Result<Relationships> {
    let source = PackURI::from_membername(source);
    Relationships::load(package, &source)
        .map_err(|e| OoxmlError::malformed(source.rels_uri().membername(), e))
}

/// Member names of every relationship part in the package, in archive order.
pub(crate) fn rels_part_names(package: &Package) -> Vec<String> {
    package
        .entry_names()
        .filter(|name| name.ends_with(".rels") && PackURI::from_membername(name).rels_source().is_some())
        .map(str::to_string)
        .collect()
}

/// Load every relationship part in the package.
///
/// Fails on the first malformed part: callers that need the complete reference
/// set must not act on a partial one.
pub(crate) fn load_all_rels(package: &Package) -> Result<Vec<Relationships>> {
    rels_part_names(package)
        .into_iter()
        .map(|name| {
            let rels_uri = PackURI::from_membername(&name);
            // rels_part_names only yields names with a source
            let source = rels_uri.rels_source().unwrap_or_else(|| rels_uri.clone());
            let xml = package.get(&name).unwrap_or_default();
            Relationships::parse(source, xml).map_err(|e| OoxmlError::malformed(&name, e))
        })
        .collect()
}
