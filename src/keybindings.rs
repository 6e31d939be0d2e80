//! Customizable keybindings for image navigation.
//!
//! Keys are matched against `KeyboardEvent.key` values, so the defaults are the
//! browser names of the arrow keys.

use serde::{Deserialize, Serialize};

/// Direction of a keyboard navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Previous,
    Next,
}

/// Keybinding configuration for image navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationKeys {
    /// Key that moves to the previous image
    #[serde(default = "default_previous")]
    pub previous: String,
    /// Key that moves to the next image
    #[serde(default = "default_next")]
    pub next: String,
}

fn default_previous() -> String {
    "ArrowLeft".to_string()
}

fn default_next() -> String {
    "ArrowRight".to_string()
}

impl Default for NavigationKeys {
    fn default() -> Self {
        Self {
            previous: default_previous(),
            next: default_next(),
        }
    }
}

impl NavigationKeys {
    /// Get the direction that corresponds to a key press, if any.
    pub fn direction_for_key(&self, key: &str) -> Option<NavDirection> {
        if key == self.previous {
            Some(NavDirection::Previous)
        } else if key == self.next {
            Some(NavDirection::Next)
        } else {
            None
        }
    }

    /// Check whether both directions share a key.
    pub fn has_conflict(&self) -> bool {
        self.previous == self.next
    }
}
