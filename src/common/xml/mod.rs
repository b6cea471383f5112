//! XML part codec.
//!
//! Parses package parts into an owned [`XmlDocument`] tree and writes them back.

mod escape;
mod tree;

pub use escape::{escape_xml, unescape_xml};
pub use tree::{XML_DECLARATION, XmlAttribute, XmlDocument, XmlElement, XmlError, XmlNode};
