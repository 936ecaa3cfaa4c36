//! Tesseract subprocess backend.
//!
//! Writes the preprocessed region to a temporary PNG and runs
//! `tesseract <image> stdout`. Keeping the engine out of process avoids
//! linking against libtesseract and lets users swap in any installed
//! version.

use anyhow::{Result, anyhow};
use image::{ImageBuffer, Luma};
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::OcrBackend;

/// OCR backend shelling out to an installed Tesseract binary.
pub struct TesseractBackend {
    exe: PathBuf,
}

impl TesseractBackend {
    /// Locates an installed Tesseract and builds the backend.
    pub fn discover() -> Result<Self> {
        Ok(Self::with_executable(find_tesseract_executable()?))
    }

    /// Builds the backend against a specific executable path.
    pub fn with_executable(exe: PathBuf) -> Self {
        Self { exe }
    }
}

impl OcrBackend for TesseractBackend {
    fn recognize(&self, img: &ImageBuffer<Luma<u8>, Vec<u8>>) -> Result<String> {
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())?;

        let output = Command::new(&self.exe)
            .arg(temp_input.path())
            .arg("stdout")
            .arg("-l")
            .arg("eng")
            .arg("--psm")
            .arg("6") // Assume single uniform block of text
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Finds the Tesseract executable, checking PATH first, then common
/// install locations.
fn find_tesseract_executable() -> Result<PathBuf> {
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    let common_paths = [
        "/usr/bin/tesseract",
        "/usr/local/bin/tesseract",
        "/opt/homebrew/bin/tesseract",
        r"C:\Program Files\Tesseract-OCR\tesseract.exe",
        r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    ];

    for path in &common_paths {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "Could not find Tesseract. Install it and make sure the \
         `tesseract` binary is on PATH."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_executable_keeps_path() {
        let backend = TesseractBackend::with_executable(PathBuf::from("/opt/bin/tesseract"));
        assert_eq!(backend.exe, PathBuf::from("/opt/bin/tesseract"));
    }

    #[test]
    fn test_recognize_fails_for_missing_executable() {
        let backend = TesseractBackend::with_executable(PathBuf::from("/no/such/tesseract"));
        let img: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::new(10, 10);
        assert!(backend.recognize(&img).is_err());
    }
}
