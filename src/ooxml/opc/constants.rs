//! Constant values related to the Open Packaging Convention.
//!
//! This module contains the relationship types, target modes and well-known
//! part locations of a WordprocessingML package that the optimizer consults.

/// Relationship type URIs used in OPC packages
pub mod relationship_type {
    // Office document
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

    // Document parts
    pub const FONT_TABLE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/fontTable";
    pub const SETTINGS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings";
    pub const STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

    // Embedded font binaries (from the font table part)
    pub const FONT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/font";

    // Images and media
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const AUDIO: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/audio";
    pub const VIDEO: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/video";

    /// Whether a relationship type denotes the font table.
    ///
    /// Strict OOXML uses a different namespace, so only the trailing segment is compared.
    #[inline]
    pub fn is_font_table(reltype: &str) -> bool {
        reltype.rsplit('/').next() == Some("fontTable")
    }

    /// Whether a relationship type denotes an embedded font binary.
    #[inline]
    pub fn is_font(reltype: &str) -> bool {
        reltype.rsplit('/').next() == Some("font")
    }

    /// Whether a relationship type denotes an image.
    #[inline]
    pub fn is_image(reltype: &str) -> bool {
        reltype.rsplit('/').next() == Some("image")
    }
}

/// Values of the `TargetMode` relationship attribute
pub mod target_mode {
    pub const EXTERNAL: &str = "External";
}

/// Namespace of relationship parts
pub const RELATIONSHIPS_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

/// Well-known member names (zip paths, no leading slash) of a WordprocessingML package
pub mod part_name {
    pub const CONTENT_TYPES: &str = "[Content_Types].xml";
    pub const DOCUMENT: &str = "word/document.xml";
    pub const DOCUMENT_RELS: &str = "word/_rels/document.xml.rels";
    pub const STYLES: &str = "word/styles.xml";
    pub const SETTINGS: &str = "word/settings.xml";
    pub const FONT_TABLE: &str = "word/fontTable.xml";

    /// Directory holding embedded font binaries
    pub const FONTS_DIR: &str = "word/fonts/";
    /// Directory holding embedded images and other media
    pub const MEDIA_DIR: &str = "word/media/";
    /// Directory holding WordprocessingML parts
    pub const WORD_DIR: &str = "word/";
}
