use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use std::borrow::Cow;

// Static initialization: automaton is built only once, thread-safe
static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML escaper")
});

/// Escape XML special characters for use in text or attribute values.
///
/// Returns the input unchanged (borrowed) when nothing needs escaping, which is
/// the common case for style ids and relationship targets.
///
/// # Examples
///
/// ```
/// use longan::common::xml::escape_xml;
/// assert_eq!(escape_xml("Heading1"), "Heading1");
/// assert_eq!(escape_xml("a & \"b\""), "a &amp; &quot;b&quot;");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> Cow<'_, str> {
    if !XML_ESCAPER.is_match(s) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"]))
}

/// Unescape an escaped XML value.
///
/// Handles the five predefined entities and numeric character references
/// (`&#65;`, `&#x41;`). A value holding an unknown or malformed reference is
/// returned as written so it never loses information on the way through.
///
/// # Examples
///
/// ```
/// use longan::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("&lt;a &amp; b&gt;"), "<a & b>");
/// assert_eq!(unescape_xml("&#65;&#x42;"), "AB");
/// assert_eq!(unescape_xml("&amp;lt;"), "&lt;");
/// assert_eq!(unescape_xml("&invalid;"), "&invalid;");
/// assert_eq!(unescape_xml("&amp"), "&amp");
/// ```
pub fn unescape_xml(s: &str) -> Cow<'_, str> {
    quick_xml::escape::unescape(s).unwrap_or(Cow::Borrowed(s))
}
