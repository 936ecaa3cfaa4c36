//! Device geometry profiles.
//!
//! A profile maps a fixed capture frame size to the four text-bearing pixel
//! rectangles: question, answer A, answer B, answer C. Absolute coordinates
//! differ per device (screen resolution, window chrome offset), but the
//! rectangles are always non-overlapping and stacked top to bottom in that
//! order; that stacking is validated at load time, not assumed by the
//! extractor.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// An axis-aligned pixel rectangle within the capture frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// The four named capture regions, in profile stacking order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    Question,
    AnswerA,
    AnswerB,
    AnswerC,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Question => write!(f, "question"),
            Region::AnswerA => write!(f, "answer A"),
            Region::AnswerB => write!(f, "answer B"),
            Region::AnswerC => write!(f, "answer C"),
        }
    }
}

/// Named, versioned region geometry for one device. Immutable once loaded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeometryProfile {
    pub name: String,
    pub version: u32,
    /// Expected capture frame width in pixels
    pub frame_width: u32,
    /// Expected capture frame height in pixels
    pub frame_height: u32,
    pub question: Rect,
    pub answer_a: Rect,
    pub answer_b: Rect,
    pub answer_c: Rect,
}

impl Default for GeometryProfile {
    /// Geometry for an iPhone X screen mirrored into a 810x1600 frame.
    fn default() -> Self {
        Self {
            name: "iphone-x-mirror".to_string(),
            version: 1,
            frame_width: 810,
            frame_height: 1600,
            question: Rect { x: 27, y: 290, width: 758, height: 220 },
            answer_a: Rect { x: 27, y: 560, width: 758, height: 120 },
            answer_b: Rect { x: 27, y: 700, width: 758, height: 120 },
            answer_c: Rect { x: 27, y: 840, width: 758, height: 120 },
        }
    }
}

impl GeometryProfile {
    /// Loads and validates a profile from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile file: {}", path.display()))?;
        let profile: GeometryProfile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse profile file: {}", path.display()))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Checks the profile invariants: every rectangle has a non-zero size
    /// and lies inside the frame, and the four rectangles are stacked top
    /// to bottom without overlap in question → A → B → C order.
    pub fn validate(&self) -> Result<()> {
        for (region, rect) in self.regions() {
            if rect.width == 0 || rect.height == 0 {
                bail!("Profile \"{}\": {} region has zero size", self.name, region);
            }
            if rect.right() > self.frame_width || rect.bottom() > self.frame_height {
                bail!(
                    "Profile \"{}\": {} region extends outside the {}x{} frame",
                    self.name,
                    region,
                    self.frame_width,
                    self.frame_height
                );
            }
        }

        let ordered = self.regions();
        for pair in ordered.windows(2) {
            let (upper_region, upper) = pair[0];
            let (lower_region, lower) = pair[1];
            if upper.bottom() > lower.y {
                bail!(
                    "Profile \"{}\": {} region overlaps or sits below {} region",
                    self.name,
                    upper_region,
                    lower_region
                );
            }
        }

        Ok(())
    }

    /// The four regions in stacking order.
    pub fn regions(&self) -> [(Region, Rect); 4] {
        [
            (Region::Question, self.question),
            (Region::AnswerA, self.answer_a),
            (Region::AnswerB, self.answer_b),
            (Region::AnswerC, self.answer_c),
        ]
    }
}
