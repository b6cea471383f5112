//! Orphaned media pruning.
//!
//! A media entry is in use as soon as any internal relationship of any part
//! targets it: the main document, headers, footers, footnotes, comments, charts,
//! glossary documents. External relationships never count.

use super::load_all_rels;
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::part_name;
use crate::ooxml::opc::{Package, Relationships};
use log::debug;
use std::collections::HashSet;

/// What the media pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaPruning {
    /// Removed media entries, in archive order
    pub removed: Vec<String>,
    /// Media entries still referenced
    pub retained: usize,
}

/// Lowercased member names of every media entry some relationship targets.
///
/// # Errors
///
/// Fails if any relationship part is malformed: a partial reference set would make
/// referenced media look orphaned.
pub fn used_media(package: &Package) -> Result<HashSet<String>> {
    let all_rels = load_all_rels(package)?;
    Ok(all_rels
        .iter()
        .flat_map(Relationships::resolved_targets)
        .map(|target| target.membername().to_ascii_lowercase())
        .filter(|name| name.starts_with(part_name::MEDIA_DIR))
        .collect())
}

/// Remove every entry under `word/media/` that no relationship targets.
pub fn remove_unused_media(package: &mut Package) -> Result<MediaPruning> {
    let media = package.names_under(part_name::MEDIA_DIR);
    if media.is_empty() {
        return Ok(MediaPruning::default());
    }

    let used = used_media(package)?;
    let (retained, removed): (Vec<String>, Vec<String>) = media
        .into_iter()
        .partition(|name| used.contains(&name.to_ascii_lowercase()));

    for name in &removed {
        package.remove(name);
        debug!("removed orphaned media {}", name);
    }

    Ok(MediaPruning {
        removed,
        retained: retained.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::testing::{minimal_package, rels_xml};
    use crate::ooxml::opc::constants::relationship_type as rt;

    #[test]
    fn test_removes_only_unreferenced_media() {
        let mut pkg = minimal_package(&[("rId5", rt::IMAGE, "media/img1.png")]);
        pkg.put("word/media/img1.png", vec![1; 16]);
        pkg.put("word/media/img2.png", vec![2; 16]);
        pkg.put("word/media/img3.jpeg", vec![3; 16]);

        let report = remove_unused_media(&mut pkg).unwrap();
        assert_eq!(report.removed, ["word/media/img2.png", "word/media/img3.jpeg"]);
        assert_eq!(report.retained, 1);
        assert_eq!(pkg.names_under(part_name::MEDIA_DIR), ["word/media/img1.png"]);
    }

    #[test]
    fn test_header_reference_keeps_media() {
        let mut pkg = minimal_package(&[]);
        pkg.put("word/header1.xml", b"<w:hdr xmlns:w=\"x\"/>".to_vec());
        pkg.put("word/_rels/header1.xml.rels", rels_xml(&[("rId1", rt::IMAGE, "media/logo.png")]));
        pkg.put("word/media/logo.png", vec![0; 8]);

        let report = remove_unused_media(&mut pkg).unwrap();
        assert!(report.removed.is_empty());
        assert!(pkg.contains("word/media/logo.png"));
    }

    #[test]
    fn test_any_relationship_type_counts() {
        // Embedded video is referenced through a non-image relationship.
        let mut pkg = minimal_package(&[("rId9", rt::VIDEO, "media/clip.mp4")]);
        pkg.put("word/media/clip.mp4", vec![0; 8]);

        let report = remove_unused_media(&mut pkg).unwrap();
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_external_target_does_not_count() {
        let mut pkg = Package::new();
        pkg.put(
            "word/_rels/document.xml.rels",
            br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/a.png" TargetMode="External"/></Relationships>"#.to_vec(),
        );
        pkg.put("word/media/a.png", vec![0; 8]);

        let report = remove_unused_media(&mut pkg).unwrap();
        assert_eq!(report.removed, ["word/media/a.png"]);
    }

    #[test]
    fn test_case_insensitive_match() {
        let mut pkg = minimal_package(&[("rId5", rt::IMAGE, "media/Image1.PNG")]);
        pkg.put("word/media/image1.png", vec![0; 8]);

        let report = remove_unused_media(&mut pkg).unwrap();
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_malformed_rels_aborts() {
        let mut pkg = minimal_package(&[]);
        pkg.put("word/_rels/footer1.xml.rels", b"<Relationships>".to_vec());
        pkg.put("word/media/a.png", vec![0; 8]);

        assert!(remove_unused_media(&mut pkg).is_err());
        assert!(pkg.contains("word/media/a.png"));
    }
}
