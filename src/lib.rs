//! Longan - in-place size optimizer for Word (.docx) packages
//!
//! A `.docx` file is a ZIP archive of interrelated XML parts. This library loads
//! the whole archive into memory, removes what it can prove is unreachable and
//! writes the package back only when the result is strictly smaller.
//!
//! # Stages
//!
//! Stages run in a fixed order and can be toggled independently:
//!
//! 1. **Fonts**: embedded font binaries, their relationships and the settings
//!    flag that makes Word embed them again
//! 2. **Media**: entries under `word/media/` no relationship refers to
//! 3. **Images**: JPEG/PNG media re-encoded, kept only when smaller (feature `imgconv`)
//! 4. **Styles**: style definitions outside the closure of used and default styles
//!
//! A stage that cannot parse a part it needs is skipped and leaves the package
//! unchanged; the other stages still run.
//!
//! # Example - Optimizing a file
//!
//! ```no_run
//! use longan::{OptimizeOptions, Optimizer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let optimizer = Optimizer::new(OptimizeOptions::default())?;
//! let outcome = optimizer.optimize_file("thesis.docx");
//! println!("{}", outcome);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Working on a package in memory
//!
//! ```no_run
//! use longan::ooxml::docx;
//! use longan::ooxml::opc::Package;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pkg = Package::open("thesis.docx")?;
//! let media = docx::remove_unused_media(&mut pkg)?;
//! let styles = docx::remove_unused_styles(&mut pkg)?;
//! println!("{} media, {} styles removed", media.removed.len(), styles.removed.len());
//! std::fs::write("thesis_small.docx", pkg.to_bytes()?)?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod common;
#[cfg(feature = "imgconv")]
pub mod images;
pub mod ooxml;
pub mod optimize;

pub use ooxml::{OoxmlError, Result};
pub use optimize::{
    CommitDecision, FileOutcome, OptimizeOptions, OptimizeReport, Optimizer, Stage, StageOutcome, StageReport,
};
