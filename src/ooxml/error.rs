//! Error types for OOXML operations.

use thiserror::Error;

/// Result type for OOXML operations.
pub type Result<T> = std::result::Result<T, OoxmlError>;

/// Error types for OOXML operations.
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// OPC package error (unreadable or corrupt archive)
    #[error("OPC error: {0}")]
    Opc(#[from] crate::ooxml::opc::error::OpcError),

    /// A part could not be parsed as XML
    #[error("Malformed XML in {part}: {message}")]
    MalformedXml { part: String, message: String },

    /// An embedded image could not be decoded or re-encoded
    #[error("Image codec failure for {path}: {message}")]
    Codec { path: String, message: String },

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OoxmlError {
    /// Wrap an XML parse failure with the name of the part that failed.
    pub fn malformed(part: &str, err: crate::common::xml::XmlError) -> Self {
        OoxmlError::MalformedXml {
            part: part.to_string(),
            message: err.0,
        }
    }

    /// Whether the input was not a readable zip archive.
    pub fn is_corrupt_archive(&self) -> bool {
        matches!(
            self,
            OoxmlError::Opc(crate::ooxml::opc::error::OpcError::CorruptArchive(_))
        )
    }
}
