//! Lossy JPEG and lossless PNG re-encoding.

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::part_name;
use crate::ooxml::opc::{Package, PackURI};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use log::{debug, warn};
use rayon::prelude::*;
use std::fmt;

/// Raster formats the recompressor knows how to re-encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RasterFormat {
    Jpeg,
    Png,
}

impl RasterFormat {
    /// Detect the format from a member name's extension (case-insensitive).
    pub fn from_path(path: &str) -> Option<Self> {
        match PackURI::from_membername(path).ext().as_str() {
            "jpg" | "jpeg" | "jpe" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    #[inline]
    fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }
}

impl fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => write!(f, "JPEG"),
            Self::Png => write!(f, "PNG"),
        }
    }
}

fn codec_error(path: &str, e: impl fmt::Display) -> OoxmlError {
    OoxmlError::Codec {
        path: path.to_string(),
        message: e.to_string(),
    }
}

/// Decode `data` and encode it again in the same format.
///
/// JPEG is encoded at `quality` (1-100); images the baseline encoder cannot take
/// (alpha, 16-bit, float) are flattened to 8-bit RGB first. PNG is re-encoded
/// losslessly with the best compression and adaptive filtering, so `quality`
/// does not apply to it.
///
/// # Errors
///
/// Returns [`OoxmlError::Codec`] when the data cannot be decoded or encoded.
pub fn recompress(path: &str, data: &[u8], format: RasterFormat, quality: u8) -> Result<Vec<u8>> {
    let img = image::load_from_memory_with_format(data, format.image_format()).map_err(|e| codec_error(path, e))?;

    let mut out = Vec::with_capacity(data.len());
    match format {
        RasterFormat::Jpeg => {
            let img = match img {
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
                other => DynamicImage::ImageRgb8(other.to_rgb8()),
            };
            let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
            img.write_with_encoder(encoder).map_err(|e| codec_error(path, e))?;
        },
        RasterFormat::Png => {
            let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
            img.write_with_encoder(encoder).map_err(|e| codec_error(path, e))?;
        },
    }
    Ok(out)
}

/// Outcome of recompressing the media of a package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recompression {
    /// Entries replaced by a smaller encoding
    pub replaced: Vec<String>,
    /// Raster entries whose new encoding was not smaller
    pub kept: usize,
    /// Entries that could not be decoded or encoded, with the reason
    pub failures: Vec<(String, String)>,
    /// Total bytes saved over the replaced entries
    pub bytes_saved: u64,
}

/// Recompress every JPEG and PNG entry under `word/media/`.
///
/// Images are processed in parallel; the package is updated afterwards by this
/// thread alone. An entry is only replaced when its new encoding is strictly
/// smaller. A failing image is left untouched and recorded in
/// [`Recompression::failures`].
pub fn recompress_images(package: &mut Package, quality: u8) -> Recompression {
    let candidates: Vec<(&str, &[u8], RasterFormat)> = package
        .entries_under(part_name::MEDIA_DIR)
        .filter_map(|(name, data)| RasterFormat::from_path(name).map(|format| (name, data, format)))
        .collect();

    let results: Vec<(String, usize, Result<Vec<u8>>)> = candidates
        .par_iter()
        .map(|&(name, data, format)| (name.to_string(), data.len(), recompress(name, data, format, quality)))
        .collect();

    let mut report = Recompression::default();
    for (name, original_len, result) in results {
        match result {
            Ok(encoded) if encoded.len() < original_len => {
                debug!("{}: {} -> {} bytes", name, original_len, encoded.len());
                report.bytes_saved += (original_len - encoded.len()) as u64;
                package.put(name.as_str(), encoded);
                report.replaced.push(name);
            },
            Ok(_) => report.kept += 1,
            Err(e) => {
                warn!("skipping {}: {}", name, e);
                report.failures.push((name, e.to_string()));
            },
        }
    }
    report
}
