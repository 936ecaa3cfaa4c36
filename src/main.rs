//! trivia-scout
//!
//! Reads a multiple-choice trivia question and its three candidate answers
//! from a captured screen image, searches the web for corroborating
//! evidence, and ranks the answers by estimated correctness.

mod capture;
mod config;
mod fallback;
mod normalize;
mod ocr;
mod paths;
mod profile;
mod resolve;
mod search;
mod session;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use config::AppConfig;
use fallback::WebBrowserFallback;
use ocr::TesseractBackend;
use profile::GeometryProfile;
use resolve::ScoreMode;
use search::DuckDuckGoProvider;
use session::Pipeline;

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("trivia_scout.log");
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
        let _ = file.write_all(line.as_bytes());
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "trivia-scout",
    about = "Ranks trivia answers by web evidence read from a screen capture"
)]
struct Args {
    /// Capture image to read; re-read on every trigger in interactive mode
    #[arg(short, long)]
    image: PathBuf,

    /// Geometry profile JSON (defaults to the built-in iPhone X mirror profile)
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// App config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Search result pages to request (overrides config)
    #[arg(long)]
    pages: Option<u32>,

    /// Use fuzzy token-set scoring instead of exact phrase counts
    #[arg(long)]
    fuzzy: bool,

    /// Watch for keyboard commands instead of resolving once
    #[arg(long)]
    interactive: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    paths::ensure_directories().context("Failed to create output directories")?;

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(pages) = args.pages {
        config.resolve.pages = pages;
    }
    if args.fuzzy {
        config.resolve.mode = ScoreMode::Fuzzy;
    }

    let profile = match &args.profile {
        Some(path) => GeometryProfile::load(path)?,
        None => GeometryProfile::default(),
    };
    log(&format!(
        "Using geometry profile \"{}\" v{} ({}x{} frame)",
        profile.name, profile.version, profile.frame_width, profile.frame_height
    ));

    let backend = TesseractBackend::discover()?;
    let provider = DuckDuckGoProvider::new();
    let fallback = WebBrowserFallback;

    let pipeline = Pipeline {
        config: &config,
        profile: &profile,
        backend: &backend,
        provider: &provider,
        fallback: &fallback,
        results_dir: paths::get_results_dir(),
        images_dir: paths::get_images_dir(),
    };

    if args.interactive {
        pipeline.run_interactive(&args.image)
    } else {
        let record = pipeline.run_cycle(&args.image)?;
        session::print_ranking(&record);
        Ok(())
    }
}
