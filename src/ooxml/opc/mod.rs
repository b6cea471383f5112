//! Open Packaging Conventions (OPC) implementation.
//!
//! This module provides the package layer the optimizer works on:
//!
//! - In-memory package model (`Package`) over a ZIP archive
//! - Part names and relative reference resolution (`PackURI`)
//! - Per-part relationship indexes (`Relationships`)
//! - `[Content_Types].xml` consistency after parts are removed
//!
//! # Performance Features
//!
//! - Uses `quick-xml` for efficient XML parsing of relationship parts
//! - Writes every entry with maximum deflate effort in a single pass
//! - Uses hash maps for O(1) entry lookups

pub mod constants;
pub mod content_types;
pub mod error;
pub mod package;
pub mod packuri;
pub mod phys_pkg;
pub mod rel;

// Re-export commonly used types
pub use package::Package;
pub use packuri::PackURI;
pub use rel::{Relationship, Relationships};
