//! Embedded font removal.
//!
//! Embedded fonts live under `word/fonts/` and are referenced from the font table
//! part through `font` relationships. Removing them means deleting the binaries,
//! dropping the font-table relationship of the main document, cleaning up
//! whatever then points at nothing, and clearing the settings flag so Word does
//! not embed the fonts again on the next save.

use super::{load_all_rels, load_rels, read_xml, rels_part_names, settings, write_xml};
use crate::common::XmlElement;
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::{part_name, relationship_type as rt};
use crate::ooxml::opc::{Package, PackURI, Relationships};
use log::{debug, warn};
use std::collections::HashSet;

/// What the font pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontRemoval {
    /// Removed font binaries
    pub fonts_removed: Vec<String>,
    /// Removed font-table and font relationships
    pub relationships_removed: usize,
    /// Parts that became unreachable and were removed (font table and its rels)
    pub parts_removed: Vec<String>,
    /// Removed `w:embed*` elements of font tables that stay in the package
    pub embed_references_removed: usize,
    /// Removed settings elements
    pub settings_flags_cleared: usize,
    /// Sub-steps that were skipped because their part could not be parsed
    pub warnings: Vec<String>,
}

impl FontRemoval {
    /// Whether the pass left the package untouched.
    pub fn is_noop(&self) -> bool {
        self.fonts_removed.is_empty()
            && self.relationships_removed == 0
            && self.parts_removed.is_empty()
            && self.embed_references_removed == 0
            && self.settings_flags_cleared == 0
    }
}

/// Remove every embedded font from the package.
///
/// Nothing happens unless at least one entry exists under `word/fonts/`. The
/// relationship and settings sub-steps are skipped when their part is absent.
///
/// # Errors
///
/// Returns [`crate::ooxml::OoxmlError::MalformedXml`] without touching the package
/// when the main document relationships cannot be parsed. A malformed settings part
/// only skips the settings sub-step and is reported in [`FontRemoval::warnings`].
pub fn remove_embedded_fonts(package: &mut Package) -> Result<FontRemoval> {
    let mut report = FontRemoval::default();

    let fonts = package.names_under(part_name::FONTS_DIR);
    if fonts.is_empty() {
        return Ok(report);
    }

    // Parsed before anything is removed so a malformed part aborts cleanly.
    let mut document_rels = load_rels(package, part_name::DOCUMENT)?;
    let settings_doc = read_xml(package, part_name::SETTINGS);

    for font in &fonts {
        package.remove(font);
    }
    debug!("removed {} embedded font(s)", fonts.len());
    report.fonts_removed = fonts;

    let font_tables: Vec<PackURI> = document_rels
        .filter_by_type(rt::is_font_table)
        .into_iter()
        .filter_map(|rel| document_rels.resolve_target(rel))
        .collect();
    let removed = document_rels.retain(|rel| !rt::is_font_table(rel.reltype()));
    if removed > 0 {
        document_rels.store(package);
        report.relationships_removed += removed;
    }

    for table in font_tables {
        remove_if_unreferenced(package, &table, &mut report);
    }

    drop_dangling_font_relationships(package, &mut report);

    match settings_doc {
        Ok(Some(mut doc)) => {
            let cleared = settings::clear_font_embedding(&mut doc);
            if cleared > 0 {
                write_xml(package, part_name::SETTINGS, &doc);
                report.settings_flags_cleared = cleared;
            }
        },
        Ok(None) => {},
        Err(e) => {
            warn!("leaving settings untouched: {}", e);
            report.warnings.push(e.to_string());
        },
    }

    Ok(report)
}

/// Remove a part and its relationships when no relationship in the package still targets it.
fn remove_if_unreferenced(package: &mut Package, part: &PackURI, report: &mut FontRemoval) {
    let all_rels = match load_all_rels(package) {
        Ok(all_rels) => all_rels,
        Err(e) => {
            warn!("keeping {}: {}", part, e);
            report.warnings.push(e.to_string());
            return;
        },
    };
    let referenced = all_rels
        .iter()
        .flat_map(Relationships::resolved_targets)
        .any(|target| target.membername().eq_ignore_ascii_case(part.membername()));
    if referenced {
        return;
    }

    for name in [part.membername().to_string(), part.rels_uri().membername().to_string()] {
        if package.remove(&name) {
            debug!("removed unreferenced part {}", name);
            report.parts_removed.push(name);
        }
    }
}

/// Font table elements that point at an embedded font binary.
const EMBED_ELEMENTS: [&str; 4] = ["embedRegular", "embedBold", "embedItalic", "embedBoldItalic"];

/// Drop `font` relationships whose target no longer exists, along with the
/// `w:embed*` elements of the source part that refer to them.
fn drop_dangling_font_relationships(package: &mut Package, report: &mut FontRemoval) {
    let present: HashSet<String> = package.entry_names().map(str::to_ascii_lowercase).collect();

    for name in rels_part_names(package) {
        let rels_uri = PackURI::from_membername(&name);
        let Some(source) = rels_uri.rels_source() else {
            continue;
        };
        let source_part = source.membername().to_string();
        let mut rels = match package.get(&name).map(|xml| Relationships::parse(source, xml)) {
            Some(Ok(rels)) => rels,
            Some(Err(e)) => {
                warn!("leaving {} untouched: {}", name, e);
                report.warnings.push(format!("{}: {}", name, e));
                continue;
            },
            None => continue,
        };

        let dangling: HashSet<String> = rels
            .filter_by_type(rt::is_font)
            .into_iter()
            .filter(|rel| {
                rels.resolve_target(rel)
                    .is_some_and(|target| !present.contains(&target.membername().to_ascii_lowercase()))
            })
            .map(|rel| rel.r_id().to_string())
            .collect();
        if dangling.is_empty() {
            continue;
        }

        let removed = rels.retain(|rel| !dangling.contains(rel.r_id()));
        rels.store(package);
        report.relationships_removed += removed;

        strip_embed_references(package, &source_part, &dangling, report);
    }
}

fn strip_embed_references(package: &mut Package, part: &str, r_ids: &HashSet<String>, report: &mut FontRemoval) {
    let mut doc = match read_xml(package, part) {
        Ok(Some(doc)) => doc,
        Ok(None) => return,
        Err(e) => {
            warn!("leaving embed references in {}: {}", part, e);
            report.warnings.push(e.to_string());
            return;
        },
    };

    let removed = doc.root_mut().remove_descendants(&|el: &XmlElement| {
        EMBED_ELEMENTS.contains(&el.local_name())
            && el.attribute_local("id").is_some_and(|id| r_ids.contains(id.as_ref()))
    });
    if removed > 0 {
        debug!("removed {} embed reference(s) from {}", removed, part);
        write_xml(package, part, &doc);
        report.embed_references_removed += removed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::testing::{minimal_package, rels_xml};

    const SETTINGS: &[u8] = br#"<w:settings xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:embedTrueTypeFonts/><w:zoom w:percent="100"/></w:settings>"#;

    const FONT_TABLE: &[u8] = br#"<w:fonts xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:font w:name="Calibri"><w:panose1 w:val="020F0502020204030204"/><w:embedRegular r:id="rId1" w:fontKey="{A1}"/><w:embedBold r:id="rId2" w:fontKey="{A2}"/></w:font><w:font w:name="Cambria"><w:family w:val="roman"/></w:font></w:fonts>"#;

    fn package_with_fonts() -> Package {
        let mut pkg = minimal_package(&[
            ("rId2", rt::FONT_TABLE, "fontTable.xml"),
            ("rId3", rt::SETTINGS, "settings.xml"),
        ]);
        pkg.put("word/fontTable.xml", FONT_TABLE.to_vec());
        pkg.put(
            "word/_rels/fontTable.xml.rels",
            rels_xml(&[("rId1", rt::FONT, "fonts/font1.odttf"), ("rId2", rt::FONT, "fonts/font2.odttf")]),
        );
        pkg.put("word/fonts/font1.odttf", vec![0u8; 64]);
        pkg.put("word/fonts/font2.odttf", vec![1u8; 64]);
        pkg.put("word/settings.xml", SETTINGS.to_vec());
        pkg
    }

    #[test]
    fn test_removes_fonts_relationships_and_flag() {
        let mut pkg = package_with_fonts();
        let report = remove_embedded_fonts(&mut pkg).unwrap();

        assert_eq!(report.fonts_removed.len(), 2);
        assert_eq!(pkg.entries_under(part_name::FONTS_DIR).count(), 0);

        let rels = load_rels(&pkg, part_name::DOCUMENT).unwrap();
        assert!(rels.filter_by_type(rt::is_font_table).is_empty());
        assert_eq!(rels.len(), 2);

        assert!(!pkg.contains("word/fontTable.xml"));
        assert!(!pkg.contains("word/_rels/fontTable.xml.rels"));

        let doc = read_xml(&pkg, part_name::SETTINGS).unwrap().unwrap();
        assert!(!settings::font_embedding_enabled(&doc));
        assert_eq!(report.settings_flags_cleared, 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_noop_without_fonts() {
        let mut pkg = minimal_package(&[("rId2", rt::FONT_TABLE, "fontTable.xml")]);
        pkg.put("word/settings.xml", SETTINGS.to_vec());
        let before = pkg.clone();

        let report = remove_embedded_fonts(&mut pkg).unwrap();
        assert!(report.is_noop());
        assert_eq!(pkg.get("word/settings.xml"), before.get("word/settings.xml"));
        assert_eq!(
            pkg.get("word/_rels/document.xml.rels"),
            before.get("word/_rels/document.xml.rels")
        );
    }

    #[test]
    fn test_missing_rels_and_settings_are_skipped() {
        let mut pkg = Package::new();
        pkg.put("word/document.xml", b"<w:document xmlns:w=\"x\"/>".to_vec());
        pkg.put("word/fonts/font1.odttf", vec![0u8; 8]);

        let report = remove_embedded_fonts(&mut pkg).unwrap();
        assert_eq!(report.fonts_removed, ["word/fonts/font1.odttf"]);
        assert_eq!(report.relationships_removed, 0);
        assert_eq!(report.settings_flags_cleared, 0);
        assert!(!pkg.contains("word/_rels/document.xml.rels"));
    }

    #[test]
    fn test_malformed_document_rels_aborts_untouched() {
        let mut pkg = package_with_fonts();
        pkg.put("word/_rels/document.xml.rels", b"<Relationships><oops></Relationships>".to_vec());

        let err = remove_embedded_fonts(&mut pkg).unwrap_err();
        assert!(matches!(err, crate::ooxml::OoxmlError::MalformedXml { .. }));
        assert_eq!(pkg.entries_under(part_name::FONTS_DIR).count(), 2);
    }

    #[test]
    fn test_malformed_settings_only_skips_settings() {
        let mut pkg = package_with_fonts();
        pkg.put("word/settings.xml", b"<w:settings><w:zoom></w:settings>".to_vec());

        let report = remove_embedded_fonts(&mut pkg).unwrap();
        assert_eq!(report.fonts_removed.len(), 2);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(pkg.get("word/settings.xml"), Some(&b"<w:settings><w:zoom></w:settings>"[..]));
    }

    #[test]
    fn test_font_table_kept_when_still_referenced() {
        let mut pkg = package_with_fonts();
        pkg.put(
            "word/glossary/_rels/document.xml.rels",
            rels_xml(&[("rId1", rt::FONT_TABLE, "../fontTable.xml")]),
        );

        let report = remove_embedded_fonts(&mut pkg).unwrap();
        assert!(pkg.contains("word/fontTable.xml"));
        assert!(report.parts_removed.is_empty());

        // The font relationships pointing at deleted binaries are gone.
        let table_rels = load_rels(&pkg, "word/fontTable.xml").unwrap();
        assert!(table_rels.is_empty());
        assert_eq!(report.relationships_removed, 3);

        // So are the elements that referred to them.
        let table = read_xml(&pkg, "word/fontTable.xml").unwrap().unwrap();
        let embeds = table.root().find_all(|el| el.local_name().starts_with("embed"));
        assert!(embeds.is_empty());
        assert_eq!(report.embed_references_removed, 2);
        assert_eq!(table.root().find_all(|el| el.local_name() == "font").len(), 2);
        assert_eq!(table.root().find_all(|el| el.local_name() == "panose1").len(), 1);
    }

    #[test]
    fn test_glossary_font_table_loses_embed_references() {
        let mut pkg = package_with_fonts();
        pkg.put(
            "word/glossary/_rels/document.xml.rels",
            rels_xml(&[("rId1", rt::FONT_TABLE, "fontTable.xml")]),
        );
        pkg.put("word/glossary/fontTable.xml", FONT_TABLE.to_vec());
        pkg.put(
            "word/glossary/_rels/fontTable.xml.rels",
            rels_xml(&[("rId1", rt::FONT, "../fonts/font1.odttf"), ("rId2", rt::FONT, "../fonts/font2.odttf")]),
        );

        let report = remove_embedded_fonts(&mut pkg).unwrap();

        assert!(pkg.contains("word/glossary/fontTable.xml"));
        assert!(load_rels(&pkg, "word/glossary/fontTable.xml").unwrap().is_empty());
        let xml = String::from_utf8(pkg.get("word/glossary/fontTable.xml").unwrap().to_vec()).unwrap();
        assert!(!xml.contains("r:id"));
        assert!(xml.contains(r#"w:name="Calibri""#));
        assert_eq!(report.embed_references_removed, 2);
    }

    #[test]
    fn test_embed_reference_to_live_relationship_is_kept() {
        let mut pkg = package_with_fonts();
        pkg.put(
            "word/glossary/_rels/document.xml.rels",
            rels_xml(&[("rId1", rt::FONT_TABLE, "../fontTable.xml")]),
        );
        let table_rels = format!(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{font}" Target="fonts/font1.odttf"/><Relationship Id="rId2" Type="{font}" Target="https://fonts.example.com/b.odttf" TargetMode="External"/></Relationships>"#,
            font = rt::FONT
        );
        pkg.put("word/_rels/fontTable.xml.rels", table_rels.into_bytes());

        let report = remove_embedded_fonts(&mut pkg).unwrap();
        assert_eq!(report.embed_references_removed, 1);
        let xml = String::from_utf8(pkg.get("word/fontTable.xml").unwrap().to_vec()).unwrap();
        assert!(!xml.contains("embedRegular"));
        assert!(xml.contains(r#"<w:embedBold r:id="rId2""#));
    }
}
