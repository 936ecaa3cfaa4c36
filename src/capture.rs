//! Capture input and per-cycle copies.
//!
//! The capture itself happens outside this program: a mirroring or
//! screenshot tool writes the current frame to a file, and we read it back.

use anyhow::{Context, Result};
use image::{ImageBuffer, Rgba};
use std::path::{Path, PathBuf};

/// A capture frame in memory.
pub type Frame = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Loads an externally produced capture image from disk.
pub fn load_capture(path: &Path) -> Result<Frame> {
    let img = image::open(path)
        .with_context(|| format!("Failed to load capture image: {}", path.display()))?;
    Ok(img.to_rgba8())
}

/// Saves a copy of the processed capture as `capture_<id>.png` in `dir`.
///
/// Keeps the frame a result record was produced from, for checking the
/// ranking against what was actually on screen.
pub fn save_capture_copy(img: &Frame, dir: &Path, id: &str) -> Result<PathBuf> {
    let path = dir.join(format!("capture_{}.png", id));
    img.save(&path)
        .with_context(|| format!("Failed to save capture copy: {}", path.display()))?;
    Ok(path)
}
