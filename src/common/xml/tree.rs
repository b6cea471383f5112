//! Attribute-aware XML tree used for in-place part rewriting.
//!
//! Parts are parsed with `quick-xml` into an owned tree and written back as
//! bytes. Names are kept as opaque qualified strings (`w:pStyle` is just a
//! key), text is kept in its escaped form so entity and character references
//! survive untouched, and every repeatable element is simply another entry in
//! the parent's child list.

use super::escape::{escape_xml, unescape_xml};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;
use thiserror::Error;

/// The XML declaration written for every part that had one.
///
/// OOXML producers always declare UTF-8 standalone parts.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Error raised when a part cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct XmlError(pub String);

impl From<quick_xml::Error> for XmlError {
    fn from(err: quick_xml::Error) -> Self {
        XmlError(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for XmlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        XmlError(err.to_string())
    }
}

impl From<std::str::Utf8Error> for XmlError {
    fn from(err: std::str::Utf8Error) -> Self {
        XmlError(format!("invalid UTF-8: {}", err))
    }
}

/// A single attribute with its value stored exactly as it appeared (escaped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    name: String,
    raw_value: String,
}

impl XmlAttribute {
    /// Qualified attribute name, e.g. `w:val`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unescaped attribute value.
    #[inline]
    pub fn value(&self) -> Cow<'_, str> {
        unescape_xml(&self.raw_value)
    }
}

/// A node in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Character data, still escaped.
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<XmlAttribute>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an empty element.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Qualified name, e.g. `w:style`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its namespace prefix.
    #[inline]
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// All attributes in document order.
    #[inline]
    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    /// Value of the attribute with the given qualified name.
    pub fn attribute(&self, name: &str) -> Option<Cow<'_, str>> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(XmlAttribute::value)
    }

    /// Value of the first attribute whose local name matches, ignoring the prefix.
    ///
    /// Namespace declarations (`xmlns:*`) never match.
    pub fn attribute_local(&self, local: &str) -> Option<Cow<'_, str>> {
        self.attributes
            .iter()
            .find(|attr| !attr.name.starts_with("xmlns") && local_part(&attr.name) == local)
            .map(XmlAttribute::value)
    }

    /// Set an attribute, replacing an existing value with the same name.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let raw_value = escape_xml(value).into_owned();
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.raw_value = raw_value,
            None => self.attributes.push(XmlAttribute {
                name: name.to_string(),
                raw_value,
            }),
        }
    }

    /// Remove an attribute. Returns whether it was present.
    pub fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|attr| attr.name != name);
        self.attributes.len() != before
    }

    /// All child nodes.
    #[inline]
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Mutable access to the child nodes.
    #[inline]
    pub fn children_mut(&mut self) -> &mut Vec<XmlNode> {
        &mut self.children
    }

    /// Append a child node.
    pub fn push(&mut self, node: XmlNode) {
        self.children.push(node);
    }

    /// Child elements in order, skipping text and other nodes.
    pub fn elements(&self) -> impl DoubleEndedIterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.local_name() == local)
    }

    /// Child elements with the given local name.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |el| el.local_name() == local)
    }

    /// Collect this element and all descendants matching `predicate`, in document order.
    pub fn find_all<P>(&self, predicate: P) -> Vec<&XmlElement>
    where
        P: Fn(&XmlElement) -> bool,
    {
        let mut found = Vec::new();
        let mut stack = vec![self];
        while let Some(el) = stack.pop() {
            if predicate(el) {
                found.push(el);
            }
            stack.extend(el.elements().rev());
        }
        found
    }

    /// Keep only child elements for which `keep` returns true.
    ///
    /// Non-element children are never removed. Returns the number of removed elements.
    pub fn retain_elements<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&XmlElement) -> bool,
    {
        let before = self.children.len();
        self.children.retain(|node| match node {
            XmlNode::Element(el) => keep(el),
            _ => true,
        });
        before - self.children.len()
    }

    /// Remove every descendant element (at any depth) for which `remove` returns true.
    ///
    /// Returns the number of removed elements; the subtree of a removed element is
    /// not visited.
    pub fn remove_descendants<F>(&mut self, remove: &F) -> usize
    where
        F: Fn(&XmlElement) -> bool,
    {
        let mut removed = self.retain_elements(|el| !remove(el));
        for node in &mut self.children {
            if let XmlNode::Element(el) = node {
                removed += el.remove_descendants(remove);
            }
        }
        removed
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let mut element = XmlElement::new(std::str::from_utf8(start.name().as_ref())?);
        for attr in start.attributes() {
            let attr = attr?;
            element.attributes.push(XmlAttribute {
                name: std::str::from_utf8(attr.key.as_ref())?.to_string(),
                raw_value: std::str::from_utf8(&attr.value)?.to_string(),
            });
        }
        Ok(element)
    }

    fn push_text(&mut self, raw: &str) {
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(raw);
        } else {
            self.children.push(XmlNode::Text(raw.to_string()));
        }
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for attr in &self.attributes {
            out.push(' ');
            out.push_str(&attr.name);
            out.push_str("=\"");
            // Single-quoted source values may carry a bare double quote.
            if attr.raw_value.contains('"') {
                out.push_str(&attr.raw_value.replace('"', "&quot;"));
            } else {
                out.push_str(&attr.raw_value);
            }
            out.push('"');
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

impl XmlNode {
    fn write_to(&self, out: &mut String) {
        match self {
            XmlNode::Element(el) => el.write_to(out),
            XmlNode::Text(raw) => out.push_str(raw),
            XmlNode::CData(data) => {
                out.push_str("<![CDATA[");
                out.push_str(data);
                out.push_str("]]>");
            },
            XmlNode::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            },
            XmlNode::ProcessingInstruction(content) => {
                out.push_str("<?");
                out.push_str(content);
                out.push_str("?>");
            },
        }
    }
}

/// A parsed XML part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    declaration: bool,
    prolog: Vec<XmlNode>,
    root: XmlElement,
    epilog: Vec<XmlNode>,
}

impl XmlDocument {
    /// Create a document with a declaration and the given root.
    pub fn new(root: XmlElement) -> Self {
        Self {
            declaration: true,
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }

    /// Parse a part.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError`] for ill-formed input: mismatched or unclosed tags,
    /// invalid UTF-8, text outside the root, a missing root, or more than one root.
    pub fn parse(bytes: &[u8]) -> Result<Self, XmlError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let mut reader = Reader::from_reader(bytes);

        let mut declaration = false;
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<XmlElement> = None;
        let mut stack: Vec<XmlElement> = Vec::new();

        loop {
            let node = match reader.read_event()? {
                Event::Start(e) => {
                    stack.push(XmlElement::from_start(&e)?);
                    continue;
                },
                Event::Empty(e) => XmlNode::Element(XmlElement::from_start(&e)?),
                Event::End(_) => match stack.pop() {
                    Some(el) => XmlNode::Element(el),
                    None => return Err(XmlError("unexpected end tag".to_string())),
                },
                Event::Text(e) => {
                    let raw = std::str::from_utf8(e.as_ref())?;
                    match stack.last_mut() {
                        Some(parent) => parent.push_text(raw),
                        None if raw.trim().is_empty() => {},
                        None => return Err(XmlError("text outside of the root element".to_string())),
                    }
                    continue;
                },
                Event::GeneralRef(e) => {
                    let raw = format!("&{};", std::str::from_utf8(e.as_ref())?);
                    match stack.last_mut() {
                        Some(parent) => parent.push_text(&raw),
                        None => return Err(XmlError("reference outside of the root element".to_string())),
                    }
                    continue;
                },
                Event::CData(e) => XmlNode::CData(std::str::from_utf8(e.as_ref())?.to_string()),
                Event::Comment(e) => XmlNode::Comment(std::str::from_utf8(e.as_ref())?.to_string()),
                Event::PI(e) => XmlNode::ProcessingInstruction(std::str::from_utf8(e.as_ref())?.to_string()),
                Event::Decl(_) => {
                    declaration = true;
                    continue;
                },
                Event::DocType(_) => continue,
                Event::Eof => break,
            };

            if let Some(parent) = stack.last_mut() {
                parent.push(node);
                continue;
            }
            match node {
                XmlNode::Element(el) => {
                    if root.is_some() {
                        return Err(XmlError("more than one root element".to_string()));
                    }
                    root = Some(el);
                },
                XmlNode::CData(_) => {
                    return Err(XmlError("CDATA outside of the root element".to_string()));
                },
                other if root.is_none() => prolog.push(other),
                other => epilog.push(other),
            }
        }

        if let Some(open) = stack.last() {
            return Err(XmlError(format!("unclosed element <{}>", open.name())));
        }
        let root = root.ok_or_else(|| XmlError("document has no root element".to_string()))?;

        Ok(Self {
            declaration,
            prolog,
            root,
            epilog,
        })
    }

    /// The root element.
    #[inline]
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Mutable access to the root element.
    #[inline]
    pub fn root_mut(&mut self) -> &mut XmlElement {
        &mut self.root
    }

    /// Serialize back to bytes.
    ///
    /// The result is not byte-identical to the parsed input (the declaration is
    /// normalized, empty elements are self-closed, attribute quoting is unified)
    /// but re-parses to an equivalent tree.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::with_capacity(4096);
        if self.declaration {
            out.push_str(XML_DECLARATION);
            out.push_str("\r\n");
        }
        for node in &self.prolog {
            node.write_to(&mut out);
        }
        self.root.write_to(&mut out);
        for node in &self.epilog {
            node.write_to(&mut out);
        }
        out.into_bytes()
    }
}

#[inline]
fn local_part(name: &str) -> &str {
    match name.rfind(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1"><w:basedOn w:val="Normal"/></w:style>
</w:styles>"#;

    #[test]
    fn test_parse_structure() {
        let doc = XmlDocument::parse(STYLES.as_bytes()).unwrap();
        let root = doc.root();
        assert_eq!(root.name(), "w:styles");
        assert_eq!(root.local_name(), "styles");

        let styles: Vec<_> = root.children_named("style").collect();
        assert_eq!(styles.len(), 2);
        assert_eq!(styles[0].attribute("w:styleId").as_deref(), Some("Normal"));
        assert_eq!(styles[1].attribute_local("styleId").as_deref(), Some("Heading1"));
        assert_eq!(
            styles[1].child("basedOn").and_then(|b| b.attribute("w:val")).as_deref(),
            Some("Normal")
        );
    }

    #[test]
    fn test_round_trip_reparses_equal() {
        let doc = XmlDocument::parse(STYLES.as_bytes()).unwrap();
        let reparsed = XmlDocument::parse(&doc.to_bytes()).unwrap();
        assert_eq!(doc, reparsed);
    }

    #[test]
    fn test_entities_and_cdata_survive() {
        let xml = "<r a='say \"hi\" &amp; bye'><t>Tom &amp; Jerry &#169;</t><![CDATA[<raw>]]><!-- note --></r>";
        let doc = XmlDocument::parse(xml.as_bytes()).unwrap();
        assert_eq!(doc.root().attribute("a").as_deref(), Some("say \"hi\" & bye"));

        let out = String::from_utf8(doc.to_bytes()).unwrap();
        assert!(out.contains("<t>Tom &amp; Jerry &#169;</t>"));
        assert!(out.contains("<![CDATA[<raw>]]>"));
        assert!(out.contains("<!-- note -->"));
        assert!(out.contains(r#"a="say &quot;hi&quot; &amp; bye""#));

        let reparsed = XmlDocument::parse(out.as_bytes()).unwrap();
        assert_eq!(reparsed.root().attribute("a").as_deref(), Some("say \"hi\" & bye"));
    }

    #[test]
    fn test_find_all_document_order() {
        let xml = r#"<w:body><w:p><w:pPr><w:pStyle w:val="A"/></w:pPr><w:r><w:rPr><w:rStyle w:val="B"/></w:rPr></w:r></w:p><w:p><w:pPr><w:pStyle w:val="C"/></w:pPr></w:p></w:body>"#;
        let doc = XmlDocument::parse(xml.as_bytes()).unwrap();
        let refs: Vec<String> = doc
            .root()
            .find_all(|el| matches!(el.local_name(), "pStyle" | "rStyle"))
            .into_iter()
            .filter_map(|el| el.attribute("w:val").map(|v| v.into_owned()))
            .collect();
        assert_eq!(refs, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_remove_descendants() {
        let xml = "<s><a/><b><a/><c/></b><a/></s>";
        let mut doc = XmlDocument::parse(xml.as_bytes()).unwrap();
        let removed = doc.root_mut().remove_descendants(&|el: &XmlElement| el.name() == "a");
        assert_eq!(removed, 3);
        assert_eq!(String::from_utf8(doc.to_bytes()).unwrap(), "<s><b><c/></b></s>");
    }

    #[test]
    fn test_set_and_remove_attribute() {
        let mut el = XmlElement::new("Override");
        el.set_attribute("PartName", "/word/a&b.xml");
        assert_eq!(el.attribute("PartName").as_deref(), Some("/word/a&b.xml"));
        el.set_attribute("PartName", "/word/c.xml");
        assert_eq!(el.attributes().len(), 1);
        assert!(el.remove_attribute("PartName"));
        assert!(!el.remove_attribute("PartName"));
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        assert!(XmlDocument::parse(b"<a><b></a>").is_err());
        assert!(XmlDocument::parse(b"<a>").is_err());
        assert!(XmlDocument::parse(b"").is_err());
        assert!(XmlDocument::parse(b"<a/><b/>").is_err());
        assert!(XmlDocument::parse(b"not xml at all").is_err());
    }

    #[test]
    fn test_bom_is_accepted() {
        let doc = XmlDocument::parse(b"\xEF\xBB\xBF<a/>").unwrap();
        assert_eq!(doc.root().name(), "a");
    }
}
