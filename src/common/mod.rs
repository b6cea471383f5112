//! Common utilities shared by the package layer and the optimizer stages.

pub mod xml;

pub use xml::{XmlDocument, XmlElement, XmlNode};
