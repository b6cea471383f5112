//! Relationship-related objects for OPC packages.
//!
//! This module provides the relationship index of a single part: the parsed
//! content of its `_rels/*.rels` sibling, with lookup, filtering and
//! serialization back to XML.

use crate::common::xml::{XmlDocument, XmlError, escape_xml};
use crate::ooxml::opc::constants::{RELATIONSHIPS_NAMESPACE, target_mode};
use crate::ooxml::opc::package::Package;
use crate::ooxml::opc::packuri::PackURI;

/// A single relationship from a source part to a target.
///
/// Represents a connection between parts in an OPC package, identified by an rId
/// (relationship ID). Can be either internal (pointing to another part) or external
/// (pointing to an external URL). A relationship does not own its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference - either a relative part reference or external URL
    target_ref: String,

    /// Whether this is an external relationship
    is_external: bool,
}

impl Relationship {
    /// Create a new relationship.
    pub fn new<S: Into<String>>(r_id: S, reltype: S, target_ref: S, is_external: bool) -> Self {
        Self {
            r_id: r_id.into(),
            reltype: reltype.into(),
            target_ref: target_ref.into(),
            is_external,
        }
    }

    /// Get the relationship ID.
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    /// Get the relationship type.
    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Get the target reference.
    ///
    /// For internal relationships, this is a part reference relative to the source.
    /// For external relationships, this is an absolute URL.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    /// Check if this is an external relationship.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }
}

/// Collection of relationships from a single source part, in document order.
#[derive(Debug, Clone)]
pub struct Relationships {
    /// The part these relationships belong to ("/" for the package)
    source: PackURI,

    rels: Vec<Relationship>,
}

impl Relationships {
    /// Create a new empty relationships collection for a source part.
    pub fn new(source: PackURI) -> Self {
        Self {
            source,
            rels: Vec::new(),
        }
    }

    /// Parse the content of a `.rels` part.
    ///
    /// `Relationship` elements without an `Id`, `Type` or `Target` are ignored.
    pub fn parse(source: PackURI, xml: &[u8]) -> Result<Self, XmlError> {
        let doc = XmlDocument::parse(xml)?;
        let mut rels = Self::new(source);
        for el in doc.root().children_named("Relationship") {
            let (Some(r_id), Some(reltype), Some(target_ref)) = (
                el.attribute("Id"),
                el.attribute("Type"),
                el.attribute("Target"),
            ) else {
                continue;
            };
            let is_external = el.attribute("TargetMode").as_deref() == Some(target_mode::EXTERNAL);
            rels.rels.push(Relationship::new(
                r_id.into_owned(),
                reltype.into_owned(),
                target_ref.into_owned(),
                is_external,
            ));
        }
        Ok(rels)
    }

    /// Load the relationships of `source` from the package.
    ///
    /// Returns an empty collection when the part has no `.rels` sibling.
    pub fn load(package: &Package, source: &PackURI) -> Result<Self, XmlError> {
        let rels_uri = source.rels_uri();
        match package.get(rels_uri.membername()) {
            Some(xml) => Self::parse(source.clone(), xml),
            None => Ok(Self::new(source.clone())),
        }
    }

    /// The source part of this collection.
    #[inline]
    pub fn source(&self) -> &PackURI {
        &self.source
    }

    /// Get a relationship by its ID.
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.r_id == r_id)
    }

    /// Add a relationship at the end of the collection.
    pub fn push(&mut self, rel: Relationship) {
        self.rels.push(rel);
    }

    /// Relationships whose type satisfies `predicate`.
    pub fn filter_by_type<P>(&self, predicate: P) -> Vec<&Relationship>
    where
        P: Fn(&str) -> bool,
    {
        self.rels.iter().filter(|rel| predicate(rel.reltype())).collect()
    }

    /// Keep only relationships for which `keep` returns true.
    ///
    /// Returns the number of removed relationships.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&Relationship) -> bool,
    {
        let before = self.rels.len();
        self.rels.retain(keep);
        before - self.rels.len()
    }

    /// Resolve the target of an internal relationship to an absolute part URI.
    ///
    /// Returns `None` for external relationships and unresolvable targets.
    pub fn resolve_target(&self, rel: &Relationship) -> Option<PackURI> {
        if rel.is_external() {
            return None;
        }
        PackURI::from_rel_ref(self.source.base_uri(), rel.target_ref()).ok()
    }

    /// Resolved member names of every internal target.
    pub fn resolved_targets(&self) -> impl Iterator<Item = PackURI> + '_ {
        self.rels.iter().filter_map(|rel| self.resolve_target(rel))
    }

    /// Get an iterator over all relationships.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    /// Get the number of relationships in the collection.
    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    /// Check if the collection is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Serialize relationships to XML format.
    ///
    /// Relationships are written in collection order. An empty collection still
    /// produces a valid, self-closed `Relationships` root.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.rels.len() * 160);

        xml.push_str(crate::common::xml::XML_DECLARATION);
        xml.push_str("\r\n");

        if self.rels.is_empty() {
            xml.push_str(&format!(r#"<Relationships xmlns="{}"/>"#, RELATIONSHIPS_NAMESPACE));
            return xml;
        }

        xml.push_str(&format!(r#"<Relationships xmlns="{}">"#, RELATIONSHIPS_NAMESPACE));
        for rel in &self.rels {
            let target_mode = if rel.is_external() {
                r#" TargetMode="External""#
            } else {
                ""
            };

            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                escape_xml(rel.r_id()),
                escape_xml(rel.reltype()),
                escape_xml(rel.target_ref()),
                target_mode
            ));
        }
        xml.push_str("</Relationships>");

        xml
    }

    /// Write this collection back to the source's `.rels` part.
    pub fn store(&self, package: &mut Package) {
        package.put(self.source.rels_uri().membername(), self.to_xml().into_bytes());
    }
}
