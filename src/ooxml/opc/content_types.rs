//! `[Content_Types].xml` maintenance.
//!
//! Parts removed from a package must not keep an `<Override>` entry behind:
//! strict consumers reject content types that name missing parts.

use crate::common::xml::{XmlDocument, XmlError};
use crate::ooxml::opc::constants::part_name;
use crate::ooxml::opc::package::Package;
use crate::ooxml::opc::packuri::PackURI;

/// Remove `<Override>` entries whose `PartName` is no longer in the package.
///
/// Part names are compared case-insensitively, as OPC requires. Returns the number
/// of removed entries; a package without a content types part is left alone.
pub fn prune_stale_overrides(package: &mut Package) -> Result<usize, XmlError> {
    let Some(xml) = package.get(part_name::CONTENT_TYPES) else {
        return Ok(0);
    };
    let mut doc = XmlDocument::parse(xml)?;

    let present: std::collections::HashSet<String> = package
        .entry_names()
        .map(|name| name.to_ascii_lowercase())
        .collect();

    let removed = doc.root_mut().retain_elements(|el| {
        if el.local_name() != "Override" {
            return true;
        }
        match el.attribute("PartName") {
            Some(part) => {
                let uri = PackURI::from_membername(&part);
                present.contains(&uri.membername().to_ascii_lowercase())
            },
            None => true,
        }
    });

    if removed > 0 {
        package.put(part_name::CONTENT_TYPES, doc.to_bytes());
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/fontTable.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.fontTable+xml"/></Types>"#;

    #[test]
    fn test_prunes_missing_parts_only() {
        let mut pkg = Package::new();
        pkg.put(part_name::CONTENT_TYPES, CONTENT_TYPES.as_bytes().to_vec());
        pkg.put("word/document.xml", b"<w:document/>".to_vec());

        assert_eq!(prune_stale_overrides(&mut pkg).unwrap(), 1);

        let xml = String::from_utf8(pkg.get(part_name::CONTENT_TYPES).unwrap().to_vec()).unwrap();
        assert!(xml.contains("/word/document.xml"));
        assert!(!xml.contains("/word/fontTable.xml"));
        assert!(xml.contains(r#"Extension="rels""#));
    }

    #[test]
    fn test_untouched_when_consistent() {
        let mut pkg = Package::new();
        pkg.put(part_name::CONTENT_TYPES, CONTENT_TYPES.as_bytes().to_vec());
        pkg.put("word/document.xml", b"<w:document/>".to_vec());
        pkg.put("word/FontTable.xml", b"<w:fonts/>".to_vec());

        assert_eq!(prune_stale_overrides(&mut pkg).unwrap(), 0);
        assert_eq!(pkg.get(part_name::CONTENT_TYPES), Some(CONTENT_TYPES.as_bytes()));
    }

    #[test]
    fn test_missing_content_types_is_noop() {
        let mut pkg = Package::new();
        assert_eq!(prune_stale_overrides(&mut pkg).unwrap(), 0);
    }
}
