//! Office Open XML (OOXML) package handling.
//!
//! The module is organized in two layers:
//!
//! 1. **OPC Layer** (`opc`): the in-memory ZIP package, part names,
//!    relationships and content types
//! 2. **WordprocessingML** (`docx`): the optimization passes over a `.docx`
//!    package (fonts, media, styles)
//!
//! # Example
//!
//! ```rust,no_run
//! use longan::ooxml::docx;
//! use longan::ooxml::opc::Package;
//!
//! let mut pkg = Package::open("document.docx")?;
//! let fonts = docx::remove_embedded_fonts(&mut pkg)?;
//! println!("removed {} embedded fonts", fonts.fonts_removed.len());
//! # Ok::<(), longan::OoxmlError>(())
//! ```
pub mod docx;
pub mod error;
pub mod opc;

pub use error::{OoxmlError, Result};
pub use opc::{Package, PackURI};
