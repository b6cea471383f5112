//! In-place `.docx` optimization.
//!
//! The [`Optimizer`] loads a package into memory, runs the enabled stages in a
//! fixed order (fonts, media, images, styles), serializes the result and keeps it
//! only when the new archive is strictly smaller than the original.
//!
//! # Example
//!
//! ```rust,no_run
//! use longan::{FileOutcome, OptimizeOptions, Optimizer};
//!
//! let optimizer = Optimizer::new(OptimizeOptions::new().with_image_quality(60))?;
//! match optimizer.optimize_file("report.docx") {
//!     FileOutcome::Written { output, .. } => println!("wrote {}", output.display()),
//!     other => println!("{}", other),
//! }
//! # Ok::<(), longan::OoxmlError>(())
//! ```

pub mod config;

pub use config::{DEFAULT_IMAGE_QUALITY, DEFAULT_OUTPUT_SUFFIX, OptimizeOptions};

use crate::ooxml::docx;
use crate::ooxml::error::Result;
use crate::ooxml::opc::Package;
use crate::ooxml::opc::content_types::prune_stale_overrides;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// The optimization stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fonts,
    Media,
    Images,
    Styles,
}

impl Stage {
    /// Every stage, in the order the optimizer runs them.
    pub const ORDER: [Stage; 4] = [Stage::Fonts, Stage::Media, Stage::Images, Stage::Styles];

    /// Whether `options` enable this stage.
    pub fn is_enabled(self, options: &OptimizeOptions) -> bool {
        match self {
            Stage::Fonts => options.remove_embedded_fonts,
            Stage::Media => options.remove_unused_media,
            Stage::Images => options.recompress_images,
            Stage::Styles => options.prune_unused_styles,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Fonts => "fonts",
            Stage::Media => "media",
            Stage::Images => "images",
            Stage::Styles => "styles",
        })
    }
}

/// Result of running one stage over a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage modified the package; the string summarizes what it did
    Changed(String),
    /// The stage ran and found nothing to do
    Unchanged,
    /// The stage did not run or gave up without modifying the package
    Skipped(String),
}

impl StageOutcome {
    #[inline]
    pub fn is_changed(&self) -> bool {
        matches!(self, StageOutcome::Changed(_))
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOutcome::Changed(summary) => f.write_str(summary),
            StageOutcome::Unchanged => f.write_str("nothing to do"),
            StageOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub outcome: StageOutcome,
}

/// Whole-archive commit judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitDecision {
    pub original_size: u64,
    pub candidate_size: u64,
    /// Whether the candidate should replace the original
    pub written: bool,
}

impl CommitDecision {
    /// Accept the candidate only if it is strictly smaller.
    pub fn evaluate(original_size: u64, candidate_size: u64) -> Self {
        Self {
            original_size,
            candidate_size,
            written: candidate_size < original_size,
        }
    }

    /// Reject the candidate regardless of size.
    pub fn discard(original_size: u64, candidate_size: u64) -> Self {
        Self {
            original_size,
            candidate_size,
            written: false,
        }
    }
}

/// Per-stage reports and the commit decision for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizeReport {
    pub stages: Vec<StageReport>,
    pub decision: CommitDecision,
}

impl OptimizeReport {
    /// Whether any stage modified the package.
    pub fn changed(&self) -> bool {
        self.stages.iter().any(|s| s.outcome.is_changed())
    }
}

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// A smaller package was written to `output`
    Written {
        output: PathBuf,
        original_size: u64,
        new_size: u64,
    },
    /// The candidate was not smaller; nothing was written
    NoImprovement { original_size: u64, candidate_size: u64 },
    /// The file could not be processed
    Failed { reason: String },
}

impl FileOutcome {
    /// Bytes saved on disk; zero unless a file was written.
    pub fn saved_bytes(&self) -> u64 {
        match self {
            FileOutcome::Written {
                original_size,
                new_size,
                ..
            } => original_size.saturating_sub(*new_size),
            _ => 0,
        }
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, FileOutcome::Failed { .. })
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOutcome::Written {
                output,
                original_size,
                new_size,
            } => write!(
                f,
                "wrote {} ({} -> {} bytes, saved {})",
                output.display(),
                original_size,
                new_size,
                self.saved_bytes()
            ),
            FileOutcome::NoImprovement {
                original_size,
                candidate_size,
            } => write!(
                f,
                "no improvement ({} bytes, candidate {} bytes), nothing written",
                original_size, candidate_size
            ),
            FileOutcome::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// Path the optimized package is written to.
///
/// With `overwrite` this is the source itself, otherwise `<stem><suffix>.<ext>`
/// next to it.
pub fn output_path_for(source: &Path, options: &OptimizeOptions) -> PathBuf {
    if options.overwrite {
        return source.to_path_buf();
    }
    let stem = source.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let name = match source.extension() {
        Some(ext) => format!("{}{}.{}", stem, options.output_suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, options.output_suffix),
    };
    source.with_file_name(name)
}

/// Write `bytes` to `target` through a temporary file in the same directory.
///
/// The target is only replaced once the new content is fully on disk, and it
/// takes the permissions of `source`.
fn commit(source: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let permissions = std::fs::metadata(source)?.permissions();
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().set_permissions(permissions)?;
    file.as_file().sync_all()?;
    file.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// Runs the optimization stages over packages and files.
#[derive(Debug, Clone)]
pub struct Optimizer {
    options: OptimizeOptions,
}

impl Optimizer {
    /// Create an optimizer after validating `options`.
    pub fn new(options: OptimizeOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    #[inline]
    pub fn options(&self) -> &OptimizeOptions {
        &self.options
    }

    /// Run every stage over `package`, in order.
    ///
    /// A stage that fails is reported as [`StageOutcome::Skipped`] and leaves the
    /// package as it was; later stages still run. When anything changed, content
    /// type overrides for removed parts are dropped as well.
    pub fn optimize_package(&self, package: &mut Package) -> Vec<StageReport> {
        let stages: Vec<StageReport> = Stage::ORDER
            .into_iter()
            .map(|stage| {
                let outcome = self.run_stage(stage, package);
                debug!("{} stage: {}", stage, outcome);
                StageReport { stage, outcome }
            })
            .collect();

        if stages.iter().any(|s| s.outcome.is_changed()) {
            match prune_stale_overrides(package) {
                Ok(0) => {},
                Ok(n) => debug!("removed {} stale content type override(s)", n),
                Err(e) => warn!("leaving [Content_Types].xml untouched: {}", e),
            }
        }
        stages
    }

    fn run_stage(&self, stage: Stage, package: &mut Package) -> StageOutcome {
        if !stage.is_enabled(&self.options) {
            return StageOutcome::Skipped("disabled by configuration".to_string());
        }

        let result = match stage {
            Stage::Fonts => docx::remove_embedded_fonts(package).map(|r| {
                if r.is_noop() {
                    StageOutcome::Unchanged
                } else {
                    StageOutcome::Changed(format!(
                        "removed {} font(s), {} relationship(s), {} settings flag(s)",
                        r.fonts_removed.len(),
                        r.relationships_removed,
                        r.settings_flags_cleared
                    ))
                }
            }),
            Stage::Media => docx::remove_unused_media(package).map(|r| {
                if r.removed.is_empty() {
                    StageOutcome::Unchanged
                } else {
                    StageOutcome::Changed(format!(
                        "removed {} orphaned media entr{}, {} retained",
                        r.removed.len(),
                        if r.removed.len() == 1 { "y" } else { "ies" },
                        r.retained
                    ))
                }
            }),
            Stage::Images => Ok(self.recompress(package)),
            Stage::Styles => docx::remove_unused_styles(package).map(|r| {
                if r.removed.is_empty() {
                    StageOutcome::Unchanged
                } else {
                    StageOutcome::Changed(format!(
                        "removed {} unused style(s), {} retained",
                        r.removed.len(),
                        r.retained
                    ))
                }
            }),
        };

        result.unwrap_or_else(|e| {
            warn!("{} stage skipped: {}", stage, e);
            StageOutcome::Skipped(e.to_string())
        })
    }

    #[cfg(feature = "imgconv")]
    fn recompress(&self, package: &mut Package) -> StageOutcome {
        let r = crate::images::recompress_images(package, self.options.image_quality);
        if r.replaced.is_empty() {
            StageOutcome::Unchanged
        } else {
            StageOutcome::Changed(format!(
                "recompressed {} image(s), saved {} bytes",
                r.replaced.len(),
                r.bytes_saved
            ))
        }
    }

    #[cfg(not(feature = "imgconv"))]
    fn recompress(&self, _package: &mut Package) -> StageOutcome {
        StageOutcome::Skipped("built without image support".to_string())
    }

    /// Optimize an archive held in memory.
    ///
    /// Returns the report and the candidate archive. The candidate should only be
    /// kept when [`CommitDecision::written`] is set: it is strictly smaller than
    /// `input` and some stage changed the package.
    ///
    /// # Errors
    ///
    /// Fails when `input` is not a readable zip archive or the candidate cannot be
    /// serialized.
    pub fn optimize_bytes(&self, input: &[u8]) -> Result<(OptimizeReport, Vec<u8>)> {
        let mut package = Package::from_bytes(input)?;
        let stages = self.optimize_package(&mut package);
        let candidate = package.to_bytes()?;

        let original_size = input.len() as u64;
        let candidate_size = candidate.len() as u64;
        let decision = if stages.iter().any(|s| s.outcome.is_changed()) {
            CommitDecision::evaluate(original_size, candidate_size)
        } else {
            CommitDecision::discard(original_size, candidate_size)
        };

        Ok((OptimizeReport { stages, decision }, candidate))
    }

    fn try_optimize_file(&self, path: &Path) -> Result<FileOutcome> {
        let input = std::fs::read(path)?;
        let (report, candidate) = self.optimize_bytes(&input)?;
        let CommitDecision {
            original_size,
            candidate_size,
            written,
        } = report.decision;

        if !written {
            info!(
                "{}: no improvement ({} -> {} bytes), nothing written",
                path.display(),
                original_size,
                candidate_size
            );
            return Ok(FileOutcome::NoImprovement {
                original_size,
                candidate_size,
            });
        }

        let output = output_path_for(path, &self.options);
        commit(path, &output, &candidate)?;
        info!(
            "{}: wrote {} ({} -> {} bytes)",
            path.display(),
            output.display(),
            original_size,
            candidate_size
        );
        Ok(FileOutcome::Written {
            output,
            original_size,
            new_size: candidate_size,
        })
    }

    /// Optimize one file and commit the result if it is smaller.
    ///
    /// Failures are reported in the outcome, never returned.
    pub fn optimize_file<P: AsRef<Path>>(&self, path: P) -> FileOutcome {
        let path = path.as_ref();
        self.try_optimize_file(path).unwrap_or_else(|e| {
            warn!("{}: {}", path.display(), e);
            FileOutcome::Failed { reason: e.to_string() }
        })
    }

    /// Optimize several files in parallel.
    ///
    /// Outcomes are returned in input order; a failing file does not affect the others.
    pub fn optimize_batch<P>(&self, paths: &[P]) -> Vec<(PathBuf, FileOutcome)>
    where
        P: AsRef<Path> + Sync,
    {
        paths
            .par_iter()
            .map(|path| {
                let path = path.as_ref();
                (path.to_path_buf(), self.optimize_file(path))
            })
            .collect()
    }
}
