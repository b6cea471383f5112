//! Error types for OPC package operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpcError {
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("ZIP write error: {0}")]
    ZipWrite(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Archives are read from memory, so even an I/O error from the zip reader means
/// the bytes are truncated or inconsistent.
impl From<zip::result::ZipError> for OpcError {
    fn from(err: zip::result::ZipError) -> Self {
        OpcError::CorruptArchive(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OpcError>;
