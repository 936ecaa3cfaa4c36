//! Run configuration.
//!
//! Loaded from an optional JSON file, finalized from CLI flags in main, and
//! passed by reference through the pipeline. There is no process-global
//! configuration state; the only globals are the interactive run-mode flags
//! in `session`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::resolve::ScoreMode;

/// Configuration for the answer resolution engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Number of search result pages to request
    #[serde(default = "default_pages")]
    pub pages: u32,
    /// Scoring strategy (exact phrase counts or fuzzy token-set ratios)
    #[serde(default)]
    pub mode: ScoreMode,
    /// Lower-cased tokens that mark a negated question. A question token
    /// matches when it contains one of these as a substring.
    #[serde(default = "default_negation_markers")]
    pub negation_markers: Vec<String>,
}

fn default_pages() -> u32 {
    3
}

fn default_negation_markers() -> Vec<String> {
    vec!["not".to_string()]
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            pages: default_pages(),
            mode: ScoreMode::default(),
            negation_markers: default_negation_markers(),
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// OCR binarization threshold: grayscale pixels below this become black
    /// (text), the rest white (background)
    #[serde(default = "default_ocr_threshold")]
    pub ocr_threshold: u8,
    /// Resolution engine settings
    #[serde(default)]
    pub resolve: ResolveConfig,
}

fn default_ocr_threshold() -> u8 {
    200
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ocr_threshold: default_ocr_threshold(),
            resolve: ResolveConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}
