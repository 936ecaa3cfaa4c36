//! Capture cycle sequencing, persistence, and the interactive loop.
//!
//! Each cycle runs strictly sequentially: extract → resolve → persist. A
//! new cycle must not begin until the previous one reaches Done or Failed;
//! the interactive loop guarantees that by driving cycles from a single
//! thread. The stdin listener thread only flips the run-mode flags.

use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;

use crate::capture::{Frame, load_capture, save_capture_copy};
use crate::config::AppConfig;
use crate::fallback::FallbackBrowser;
use crate::normalize::normalize;
use crate::ocr::{OcrBackend, extract_regions};
use crate::profile::GeometryProfile;
use crate::resolve::{ResolutionResult, Resolver, ScoreEntry, ScoreMode};
use crate::search::SearchProvider;

/// Auto mode flag, toggled by the listener with 'a'/'s'.
pub static RUNNING: AtomicBool = AtomicBool::new(false);
/// Shutdown flag, set by the listener on 'q' or stdin EOF.
pub static EXITING: AtomicBool = AtomicBool::new(false);
/// One-shot capture request, set by the listener on 'c'.
static CAPTURE_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Poll granularity of the interactive loop.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// One persisted resolution outcome: `results/results_<id>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionRecord {
    pub id: String,
    pub question: String,
    pub answers: Vec<String>,
    pub scores: Vec<ScoreEntry>,
    pub inverted: bool,
    pub mode: ScoreMode,
}

/// Pipeline position of the current cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleState {
    /// Frame loaded, nothing processed yet
    Idle,
    /// Running OCR over the four profile regions
    Extracting,
    /// Driving the search provider and scoring answers
    Resolving,
    /// Writing the result record and capture copy
    Persisting,
    /// Cycle finished, record available
    Done,
    /// Cycle aborted; the loop waits for the next trigger
    Failed(String),
}

impl std::fmt::Display for CycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleState::Idle => write!(f, "Idle"),
            CycleState::Extracting => write!(f, "Extracting"),
            CycleState::Resolving => write!(f, "Resolving"),
            CycleState::Persisting => write!(f, "Persisting"),
            CycleState::Done => write!(f, "Done"),
            CycleState::Failed(msg) => write!(f, "Failed: {}", msg),
        }
    }
}

/// Everything a cycle needs besides the frame itself.
pub struct Pipeline<'a> {
    pub config: &'a AppConfig,
    pub profile: &'a GeometryProfile,
    pub backend: &'a dyn OcrBackend,
    pub provider: &'a dyn SearchProvider,
    pub fallback: &'a dyn FallbackBrowser,
    pub results_dir: PathBuf,
    pub images_dir: PathBuf,
}

impl Pipeline<'_> {
    /// Runs one full capture cycle over the image at `image_path`.
    pub fn run_cycle(&self, image_path: &Path) -> Result<ResolutionRecord> {
        let frame = load_capture(image_path)?;
        let mut cycle = CycleContext::new(frame, self);
        while cycle.step() {}
        cycle.into_record()
    }

    /// Runs the interactive loop: polls the run-mode flags and drives one
    /// cycle per trigger, re-reading the capture file each time.
    ///
    /// Cycle errors are logged and the loop waits for the next trigger;
    /// there is no automatic retry.
    pub fn run_interactive(&self, image_path: &Path) -> Result<()> {
        crate::log("Monitoring commands: c - capture once, a - auto on, s - auto off, q - quit");
        std::thread::spawn(input_listener);

        while !EXITING.load(Ordering::SeqCst) {
            let triggered = CAPTURE_REQUESTED.swap(false, Ordering::SeqCst);
            if triggered || RUNNING.load(Ordering::SeqCst) {
                match self.run_cycle(image_path) {
                    Ok(record) => print_ranking(&record),
                    Err(e) => crate::log(&format!("Cycle failed: {}", e)),
                }
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        crate::log("Exiting");
        Ok(())
    }
}

/// Drives one capture through the cycle state machine.
pub struct CycleContext<'a> {
    pub state: CycleState,
    pipeline: &'a Pipeline<'a>,
    frame: Frame,
    id: String,
    question: String,
    answers: Vec<String>,
    result: Option<ResolutionResult>,
    record: Option<ResolutionRecord>,
}

impl<'a> CycleContext<'a> {
    pub fn new(frame: Frame, pipeline: &'a Pipeline<'a>) -> Self {
        Self {
            state: CycleState::Idle,
            pipeline,
            frame,
            id: Uuid::new_v4().to_string(),
            question: String::new(),
            answers: Vec::new(),
            result: None,
            record: None,
        }
    }

    /// Advances the state machine by one step.
    ///
    /// Returns `true` while the cycle should continue, `false` once a
    /// terminal state (Done or Failed) is reached.
    pub fn step(&mut self) -> bool {
        match &self.state {
            CycleState::Idle => {
                crate::log(&format!("Cycle {}: starting", self.id));
                self.state = CycleState::Extracting;
                true
            }

            CycleState::Extracting => {
                let extracted = extract_regions(
                    &self.frame,
                    self.pipeline.profile,
                    self.pipeline.backend,
                    self.pipeline.config.ocr_threshold,
                );
                match extracted {
                    Ok(texts) => {
                        self.question = normalize(&texts.question);
                        self.answers = texts.answers().iter().map(|a| normalize(a)).collect();
                        crate::log(&format!("Question: \"{}\"", self.question));
                        for (i, answer) in self.answers.iter().enumerate() {
                            crate::log(&format!("Option {}: \"{}\"", ['A', 'B', 'C'][i], answer));
                        }
                        self.state = CycleState::Resolving;
                        true
                    }
                    Err(e) => {
                        self.state = CycleState::Failed(format!("Extraction failed: {}", e));
                        false
                    }
                }
            }

            CycleState::Resolving => {
                let resolver = Resolver::new(self.pipeline.config.resolve.clone());
                let resolved = resolver.resolve(
                    &self.question,
                    &self.answers,
                    self.pipeline.provider,
                    self.pipeline.fallback,
                );
                match resolved {
                    Ok(result) => {
                        if let Some(best) = result.best() {
                            crate::log(&format!(
                                "Best guess: \"{}\" ({})",
                                best.answer, best.score
                            ));
                        }
                        self.result = Some(result);
                        self.state = CycleState::Persisting;
                        true
                    }
                    Err(e) => {
                        self.state = CycleState::Failed(format!("Retrieval failed: {}", e));
                        false
                    }
                }
            }

            CycleState::Persisting => {
                let Some(result) = self.result.take() else {
                    self.state = CycleState::Failed("No resolution result to persist".to_string());
                    return false;
                };

                let record = ResolutionRecord {
                    id: self.id.clone(),
                    question: self.question.clone(),
                    answers: self.answers.clone(),
                    scores: result.entries,
                    inverted: result.inverted,
                    mode: self.pipeline.config.resolve.mode,
                };

                if let Err(e) = save_record(&record, &self.pipeline.results_dir) {
                    self.state = CycleState::Failed(format!("Persist failed: {}", e));
                    return false;
                }
                if let Err(e) =
                    save_capture_copy(&self.frame, &self.pipeline.images_dir, &record.id)
                {
                    self.state = CycleState::Failed(format!("Persist failed: {}", e));
                    return false;
                }

                crate::log(&format!("Cycle {}: saved results and capture copy", self.id));
                self.record = Some(record);
                self.state = CycleState::Done;
                false
            }

            CycleState::Done | CycleState::Failed(_) => false,
        }
    }

    /// Consumes the finished cycle and returns its record.
    pub fn into_record(self) -> Result<ResolutionRecord> {
        match self.state {
            CycleState::Done => {
                self.record.ok_or_else(|| anyhow!("Cycle finished without a record"))
            }
            CycleState::Failed(msg) => Err(anyhow!(msg)),
            other => Err(anyhow!("Cycle still in progress: {}", other)),
        }
    }
}

/// Writes the record as pretty-printed JSON, named by its cycle id.
pub fn save_record(record: &ResolutionRecord, dir: &Path) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(record)
        .context("Failed to serialize resolution record")?;

    let path = dir.join(format!("results_{}.json", record.id));
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write result file: {}", path.display()))?;

    Ok(path)
}

/// Prints the ranked answers, best guess highlighted.
pub fn print_ranking(record: &ResolutionRecord) {
    println!("=================================");
    for (i, entry) in record.scores.iter().enumerate() {
        let line = format!("{} : {}", entry.answer, entry.score);
        if i == 0 {
            println!("{}", format!("{} <---------------", line).green());
        } else {
            println!("{}", line.red());
        }
    }
    println!("=================================");
}

/// Reads single-letter commands from stdin and flips the run-mode flags.
/// The pipeline loop never blocks on input; it polls the flags instead.
fn input_listener() {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        match line.trim() {
            "c" => {
                crate::log("Capturing one...");
                CAPTURE_REQUESTED.store(true, Ordering::SeqCst);
            }
            "a" => {
                crate::log("Auto capture started");
                RUNNING.store(true, Ordering::SeqCst);
            }
            "s" => {
                crate::log("Auto capture stopped");
                RUNNING.store(false, Ordering::SeqCst);
            }
            "q" => break,
            "" => {}
            other => crate::log(&format!("Unknown command: {}", other)),
        }
    }
    // 'q' and stdin EOF both stop the loop
    RUNNING.store(false, Ordering::SeqCst);
    EXITING.store(true, Ordering::SeqCst);
}
