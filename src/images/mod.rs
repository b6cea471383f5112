// Raster image recompression for embedded media.
//
// Office documents carry their pictures as opaque entries under `word/media/`.
// This module re-encodes the raster ones (JPEG and PNG) in place, keeping the
// format and dimensions and only replacing an entry when the new encoding is
// strictly smaller.
//
// Other formats (EMF, WMF, GIF, SVG, TIFF, ...) are never touched.

pub mod recompress;

pub use recompress::{RasterFormat, Recompression, recompress, recompress_images};
