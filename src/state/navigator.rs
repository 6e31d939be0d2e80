//! Image navigation within a recorded race.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use thiserror::Error;

use crate::effect::{Effect, Effects};
use crate::keybindings::NavDirection;
use crate::model::{Control, ImageIndex, RaceId, RaceSelection, race_image_path};

/// Characters escaped in a query value.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>');

/// Why an image count response was not applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Response belongs to an older race selection
    #[error("Stale image count response (generation {got}, current {current})")]
    Stale { got: u64, current: u64 },

    /// Server answered with a non-200 status (0 means the request failed)
    #[error("Image count request failed with status {0}")]
    Status(u16),

    /// Body is not an integer
    #[error("Image count response is not a number: {0:?}")]
    Parse(String),
}

/// Why a navigation was not performed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavError {
    #[error("No race selected")]
    NoRace,

    #[error("Navigation already in flight")]
    InFlight,
}

/// Maps the slider position to a race image and owns the slider bounds.
#[derive(Debug, Clone)]
pub struct ImageNavigator {
    race_root: String,
    count_endpoint: String,
    selection: RaceSelection,
    index: ImageIndex,
    max_count: u32,
    /// Bumped on every race selection; responses carrying an older value are dropped
    generation: u64,
    in_flight: bool,
}

impl ImageNavigator {
    pub fn new(race_root: impl Into<String>, count_endpoint: impl Into<String>) -> Self {
        Self {
            race_root: race_root.into(),
            count_endpoint: count_endpoint.into(),
            selection: RaceSelection::Preview,
            index: ImageIndex::FIRST,
            max_count: 1,
            generation: 0,
            in_flight: false,
        }
    }

    pub fn selection(&self) -> &RaceSelection {
        &self.selection
    }

    pub fn index(&self) -> ImageIndex {
        self.index
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Path of the image for the current index, if a race is selected.
    pub fn current_image_path(&self) -> Option<String> {
        self.selection
            .race()
            .map(|race| race_image_path(&self.race_root, race, self.index))
    }

    /// Switch to a new selection.
    ///
    /// For a race this shows its first image right away and requests the image
    /// count; the slider bounds follow once the count arrives.
    pub fn select(&mut self, selection: RaceSelection, out: &mut Effects) {
        self.generation += 1;
        self.index = ImageIndex::FIRST;
        self.selection = selection;

        match self.selection.race().cloned() {
            Some(race) => {
                log::debug!("🏁 Selected race {} (generation {})", race, self.generation);
                // Bounds of the previous race no longer apply until the count arrives
                self.max_count = 1;
                out.push(Effect::SetSliderBounds {
                    max: self.max_count,
                    value: self.index.get(),
                });
                out.push(Effect::FetchImageCount {
                    url: self.count_url(&race),
                    generation: self.generation,
                });
                out.push(Effect::SetImageSource {
                    src: race_image_path(&self.race_root, &race, self.index),
                });
                out.push(Effect::SetDeleteTarget { race: Some(race) });
            }
            None => {
                log::debug!("📷 Selected live preview");
                out.push(Effect::SetDeleteTarget { race: None });
            }
        }
    }

    fn count_url(&self, race: &RaceId) -> String {
        let race = utf8_percent_encode(race.as_str(), QUERY_VALUE);
        format!("{}?race={}", self.count_endpoint, race)
    }

    /// Apply an image count response.
    ///
    /// Only the response to the latest selection is applied; on any error the
    /// bounds stay as they were.
    pub fn on_count_loaded(
        &mut self,
        generation: u64,
        status: u16,
        body: &str,
        out: &mut Effects,
    ) -> Result<u32, FetchError> {
        if generation != self.generation {
            return Err(FetchError::Stale {
                got: generation,
                current: self.generation,
            });
        }
        if status != 200 {
            return Err(FetchError::Status(status));
        }
        let count: u32 = body
            .trim()
            .parse()
            .map_err(|_| FetchError::Parse(body.to_string()))?;

        if count == 0 {
            log::warn!("Race reports no images; keeping a single slider position");
        }
        self.max_count = count.max(1);
        if self.index != ImageIndex::FIRST {
            self.index = ImageIndex::FIRST;
            if let Some(path) = self.current_image_path() {
                out.push(Effect::SetImageSource { src: path });
            }
        }
        out.push(Effect::SetSliderBounds {
            max: self.max_count,
            value: self.index.get(),
        });
        out.push(Effect::FocusSlider);
        Ok(count)
    }

    /// Show the image at `position`, clamped into `[1, max_count]`.
    ///
    /// The slider is disabled while the image is swapped and afterwards restored to
    /// `slider_enabled`, the enablement the status synchronizer currently allows.
    pub fn navigate(
        &mut self,
        position: i64,
        slider_enabled: bool,
        out: &mut Effects,
    ) -> Result<ImageIndex, NavError> {
        if self.in_flight {
            return Err(NavError::InFlight);
        }
        let race = self.selection.race().cloned().ok_or(NavError::NoRace)?;

        self.in_flight = true;
        out.push(Effect::SetControlEnabled {
            control: Control::Slider,
            enabled: false,
        });

        self.index = ImageIndex::clamped(position, self.max_count);
        out.push(Effect::SetSliderValue {
            value: self.index.get(),
        });
        out.push(Effect::SetImageSource {
            src: race_image_path(&self.race_root, &race, self.index),
        });

        out.push(Effect::SetControlEnabled {
            control: Control::Slider,
            enabled: slider_enabled,
        });
        out.push(Effect::FocusSlider);
        self.in_flight = false;

        Ok(self.index)
    }

    /// Move one image in `direction`, saturating at the ends.
    pub fn step(
        &mut self,
        direction: NavDirection,
        slider_enabled: bool,
        out: &mut Effects,
    ) -> Result<ImageIndex, NavError> {
        let target = match direction {
            NavDirection::Previous => self.index.previous(self.max_count),
            NavDirection::Next => self.index.next(self.max_count),
        };
        self.navigate(i64::from(target.get()), slider_enabled, out)
    }

    /// Return to the post-load state. The generation is kept so responses to
    /// requests made before the reset are still recognized as stale.
    pub fn reset(&mut self) {
        self.selection = RaceSelection::Preview;
        self.index = ImageIndex::FIRST;
        self.max_count = 1;
        self.in_flight = false;
        self.generation += 1;
    }
}
