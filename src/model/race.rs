//! Race selection, image indices and control commands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Option value of the race selector that switches to the live camera.
pub const PREVIEW_OPTION: &str = "preview";

/// Identifier of a recorded race, as used in static image paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RaceId(String);

impl RaceId {
    /// Create a race id. Returns None for blank input.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the race selector currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RaceSelection {
    /// Live camera preview
    #[default]
    Preview,
    /// Captured images of a recorded race
    Race(RaceId),
}

impl RaceSelection {
    /// Interpret a selector option value.
    ///
    /// `"preview"` and blank values select the live preview.
    pub fn from_option(value: &str) -> Self {
        if value.trim() == PREVIEW_OPTION {
            return Self::Preview;
        }
        match RaceId::new(value) {
            Some(id) => Self::Race(id),
            None => Self::Preview,
        }
    }

    /// The selected race, if any.
    pub fn race(&self) -> Option<&RaceId> {
        match self {
            Self::Preview => None,
            Self::Race(id) => Some(id),
        }
    }

    pub fn is_preview(&self) -> bool {
        matches!(self, Self::Preview)
    }
}

/// 1-based position of the displayed image within a race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageIndex(u32);

impl ImageIndex {
    /// The first image of every race.
    pub const FIRST: Self = Self(1);

    /// Clamp an arbitrary (possibly negative) position into `[1, max_count]`.
    ///
    /// A `max_count` of zero is treated as one so the result is always a valid index.
    pub fn clamped(position: i64, max_count: u32) -> Self {
        let upper = i64::from(max_count.max(1));
        Self(position.clamp(1, upper) as u32)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// The next index, saturating at `max_count`.
    pub fn next(self, max_count: u32) -> Self {
        Self::clamped(i64::from(self.0) + 1, max_count)
    }

    /// The previous index, saturating at 1.
    pub fn previous(self, max_count: u32) -> Self {
        Self::clamped(i64::from(self.0) - 1, max_count)
    }
}

impl Default for ImageIndex {
    fn default() -> Self {
        Self::FIRST
    }
}

/// Build the static resource path of a captured race image.
///
/// Images are stored as `image_0001.jpg` .. `image_NNNN.jpg` under `root/<race>/`.
pub fn race_image_path(root: &str, race: &RaceId, index: ImageIndex) -> String {
    format!(
        "{}/{}/image_{:04}.jpg",
        root.trim_end_matches('/'),
        race,
        index.get()
    )
}

/// Command sent to the control API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceCommand {
    Start,
    Stop,
}

/// JSON body of a race command request.
#[derive(Serialize)]
struct CommandBody {
    race: RaceCommand,
}

impl RaceCommand {
    /// Serialize the request body, e.g. `{"race":"start"}`.
    pub fn body(self) -> String {
        serde_json::to_string(&CommandBody { race: self })
            .unwrap_or_else(|_| format!("{{\"race\":\"{}\"}}", self.name()))
    }

    pub fn name(self) -> &'static str {
        match self {
            RaceCommand::Start => "start",
            RaceCommand::Stop => "stop",
        }
    }
}
