//! Region extraction and OCR backends.
//!
//! `extract_regions` is the entry point: it walks the profile's four
//! rectangles in stacking order, preprocesses each crop, and hands it to an
//! [`OcrBackend`]. Any single region failing invalidates the whole capture,
//! since a partial answer set is not resolvable.

pub mod preprocess;
pub mod tesseract;

pub use tesseract::TesseractBackend;

use image::{ImageBuffer, Luma, Rgba};
use thiserror::Error;

use crate::profile::{GeometryProfile, Region};
use preprocess::{binarize_dark_text, crop_rect};

/// Errors that invalidate a capture during extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The capture does not match the profile's frame size
    #[error("Capture is {actual_width}x{actual_height} but profile \"{profile}\" expects {expected_width}x{expected_height}")]
    FrameMismatch {
        profile: String,
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// The OCR backend failed on one region
    #[error("OCR failed on {region} region: {message}")]
    Ocr { region: Region, message: String },
}

/// Capability: recognize text in a preprocessed (binarized) image region.
///
/// Any implementation satisfying this signature is acceptable; the shipped
/// backend shells out to Tesseract, tests use in-memory fakes.
pub trait OcrBackend {
    fn recognize(&self, img: &ImageBuffer<Luma<u8>, Vec<u8>>) -> anyhow::Result<String>;
}

/// Raw OCR output for the four capture regions, line breaks collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTexts {
    pub question: String,
    pub answer_a: String,
    pub answer_b: String,
    pub answer_c: String,
}

impl RegionTexts {
    /// The three answers in profile order.
    pub fn answers(&self) -> [&str; 3] {
        [&self.answer_a, &self.answer_b, &self.answer_c]
    }
}

/// Crops, binarizes, and recognizes the four profile regions.
///
/// Returns the raw text per region with embedded line breaks collapsed to
/// single spaces. An empty recognition result counts as a failure: every
/// region carries text when the question screen is actually showing.
pub fn extract_regions(
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    profile: &GeometryProfile,
    backend: &dyn OcrBackend,
    threshold: u8,
) -> Result<RegionTexts, ExtractionError> {
    let (width, height) = img.dimensions();
    if width != profile.frame_width || height != profile.frame_height {
        return Err(ExtractionError::FrameMismatch {
            profile: profile.name.clone(),
            expected_width: profile.frame_width,
            expected_height: profile.frame_height,
            actual_width: width,
            actual_height: height,
        });
    }

    let mut texts: Vec<String> = Vec::with_capacity(4);
    for (region, rect) in profile.regions() {
        let cropped = crop_rect(img, &rect);
        let binary = binarize_dark_text(&cropped, threshold);

        let raw = backend
            .recognize(&binary)
            .map_err(|e| ExtractionError::Ocr { region, message: e.to_string() })?;

        let collapsed = collapse_line_breaks(&raw);
        if collapsed.is_empty() {
            return Err(ExtractionError::Ocr {
                region,
                message: "Empty recognition result".to_string(),
            });
        }
        texts.push(collapsed);
    }

    let mut iter = texts.into_iter();
    Ok(RegionTexts {
        question: iter.next().unwrap_or_default(),
        answer_a: iter.next().unwrap_or_default(),
        answer_b: iter.next().unwrap_or_default(),
        answer_c: iter.next().unwrap_or_default(),
    })
}

/// Collapses line breaks (and the form feed Tesseract appends) to spaces.
fn collapse_line_breaks(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace(['\n', '\x0c'], " ")
        .trim()
        .to_string()
}
