//! Thumbnail generation.
//!
//! Resizes a source image to fit within a bounding box, preserving aspect
//! ratio, and writes the result next to the original. Generation is
//! idempotent: if the derived file already exists it is reused, which makes
//! re-delivered jobs harmless.

use image::imageops::FilterType;
use image::GenericImageView;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Derived thumbnail location: same directory, `<stem>_thumb<ext>`
pub fn thumbnail_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = match source.extension() {
        Some(ext) => format!("{}_thumb.{}", stem, ext.to_string_lossy()),
        None => format!("{}_thumb", stem),
    };

    source.with_file_name(name)
}

/// Produce (or reuse) a thumbnail for `source` bounded by
/// `max_width` x `max_height`.
///
/// CPU-bound and blocking; the job worker wraps this in `spawn_blocking`.
pub fn ensure_thumbnail(source: &Path, max_width: u32, max_height: u32) -> Result<PathBuf> {
    let target = thumbnail_path(source);

    if target.exists() {
        return Ok(target);
    }

    let img = image::open(source)
        .map_err(|e| AppError::ImageLoad(format!("{}: {}", source.display(), e)))?;

    let (width, height) = img.dimensions();

    // Never upscale; small images are written through as-is
    let resized = if width > max_width || height > max_height {
        img.resize(max_width, max_height, FilterType::Lanczos3)
    } else {
        img
    };

    resized
        .save(&target)
        .map_err(|e| AppError::ImageSave(format!("{}: {}", target.display(), e)))?;

    Ok(target)
}
