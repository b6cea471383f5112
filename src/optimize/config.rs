//! Configuration for the package optimizer.
//!
//! Options can be built in code with the `with_*` setters or loaded from YAML.
//! Keys use camelCase in YAML and every key is optional:
//!
//! ```yaml
//! removeEmbeddedFonts: true
//! removeUnusedMedia: true
//! recompressImages: true
//! imageQuality: 75
//! pruneUnusedStyles: true
//! overwrite: false
//! force: false
//! outputSuffix: _optimized
//! ```

use crate::ooxml::error::{OoxmlError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// JPEG quality used when none is configured.
pub const DEFAULT_IMAGE_QUALITY: u8 = 75;

/// Suffix appended to the file stem when the source is not overwritten.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_optimized";

/// Options controlling which optimization stages run and where the result goes.
///
/// # Examples
///
/// ```rust
/// use longan::OptimizeOptions;
///
/// let options = OptimizeOptions::new()
///     .with_recompress_images(false)
///     .with_output_suffix("_small");
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OptimizeOptions {
    /// Remove embedded fonts with their relationships and settings flag
    pub remove_embedded_fonts: bool,
    /// Remove media entries no relationship refers to
    pub remove_unused_media: bool,
    /// Re-encode JPEG and PNG media when it makes them smaller
    pub recompress_images: bool,
    /// JPEG quality, 1-100
    pub image_quality: u8,
    /// Remove style definitions nothing reaches
    pub prune_unused_styles: bool,
    /// Write back to the source path instead of a derived one
    pub overwrite: bool,
    /// Skip the confirmation before overwriting (command line only)
    pub force: bool,
    /// Suffix for derived output names
    pub output_suffix: String,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            remove_embedded_fonts: true,
            remove_unused_media: true,
            recompress_images: true,
            image_quality: DEFAULT_IMAGE_QUALITY,
            prune_unused_styles: true,
            overwrite: false,
            force: false,
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
        }
    }
}

impl OptimizeOptions {
    /// Create options with every stage enabled.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_remove_embedded_fonts(mut self, enabled: bool) -> Self {
        self.remove_embedded_fonts = enabled;
        self
    }

    #[inline]
    pub fn with_remove_unused_media(mut self, enabled: bool) -> Self {
        self.remove_unused_media = enabled;
        self
    }

    #[inline]
    pub fn with_recompress_images(mut self, enabled: bool) -> Self {
        self.recompress_images = enabled;
        self
    }

    /// Set the JPEG quality. Checked by [`OptimizeOptions::validate`].
    #[inline]
    pub fn with_image_quality(mut self, quality: u8) -> Self {
        self.image_quality = quality;
        self
    }

    #[inline]
    pub fn with_prune_unused_styles(mut self, enabled: bool) -> Self {
        self.prune_unused_styles = enabled;
        self
    }

    #[inline]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[inline]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[inline]
    pub fn with_output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.output_suffix = suffix.into();
        self
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`OoxmlError::InvalidConfig`] for an image quality outside 1-100, or
    /// an empty output suffix while not overwriting (the output would replace the source).
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.image_quality) {
            return Err(OoxmlError::InvalidConfig(format!(
                "imageQuality must be between 1 and 100, got {}",
                self.image_quality
            )));
        }
        if !self.overwrite && self.output_suffix.is_empty() {
            return Err(OoxmlError::InvalidConfig(
                "outputSuffix must not be empty unless overwrite is set".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse options from a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let options: Self = serde_saphyr::from_str(yaml).map_err(|e| OoxmlError::InvalidConfig(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Read options from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }
}
