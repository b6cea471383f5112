//! Document settings: font embedding flags.
//!
//! Word embeds TrueType fonts on save when `w:embedTrueTypeFonts` is present in
//! `word/settings.xml`. `w:embedSystemFonts` and `w:saveSubsetFonts` only refine
//! that behaviour, so all three are cleared together.

use crate::common::xml::{XmlDocument, XmlElement};

/// Local names of the settings elements that enable font embedding.
pub const FONT_EMBEDDING_FLAGS: [&str; 3] = ["embedTrueTypeFonts", "embedSystemFonts", "saveSubsetFonts"];

#[inline]
fn is_font_embedding_flag(el: &XmlElement) -> bool {
    FONT_EMBEDDING_FLAGS.contains(&el.local_name())
}

/// Check whether the settings ask Word to embed fonts.
///
/// An explicit `w:val="0"`/`"false"`/`"off"` disables the flag.
pub fn font_embedding_enabled(settings: &XmlDocument) -> bool {
    settings
        .root()
        .children_named("embedTrueTypeFonts")
        .any(|el| !matches!(el.attribute_local("val").as_deref(), Some("0" | "false" | "off")))
}

/// Remove all font embedding flags from a settings document.
///
/// Returns the number of removed elements.
pub fn clear_font_embedding(settings: &mut XmlDocument) -> usize {
    settings.root_mut().remove_descendants(&is_font_embedding_flag)
}
