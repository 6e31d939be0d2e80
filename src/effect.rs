//! Side effects requested by the controller.
//!
//! The controller never touches the page directly. Every update returns a list of
//! effects which the host runtime (the browser bindings in `wasm`, the replay
//! binary, or the test host) applies in order.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::model::{Control, FieldValue, Point, RaceCommand, RaceId};

/// Which component owns a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Periodic live-preview refresh
    Preview,
    /// One-shot delay before the next training start
    Training,
}

/// Identifies a timer created through an effect.
///
/// Sequence numbers are never reused by the owning component, so a tick from a
/// cancelled timer can always be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId {
    pub kind: TimerKind,
    pub seq: u64,
}

/// Hands out timer ids for one component.
#[derive(Debug, Clone)]
pub struct TimerSequence {
    kind: TimerKind,
    next: u64,
}

impl TimerSequence {
    pub fn new(kind: TimerKind) -> Self {
        Self { kind, next: 1 }
    }

    pub fn allocate(&mut self) -> TimerId {
        let id = TimerId {
            kind: self.kind,
            seq: self.next,
        };
        self.next += 1;
        id
    }
}

/// Drawing operations on the calibration canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawOp {
    /// Clear the whole surface
    Clear,
    /// Filled square marker centred on a point
    Marker(Point),
    /// Stroked segment between two points
    Segment(Point, Point),
}

/// A single side effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Replace the displayed image
    SetImageSource { src: String },
    SetControlEnabled { control: Control, enabled: bool },
    /// Set the slider range to `[1, max]` and move it to `value`
    SetSliderBounds { max: u32, value: u32 },
    SetSliderValue { value: u32 },
    FocusSlider,
    /// Show an option in the race selector
    SetRaceSelector { value: String },
    /// Suppress the browser default for the event being handled
    PreventDefault,
    StartInterval { timer: TimerId, period: Duration },
    CancelInterval { timer: TimerId },
    ScheduleTimeout { timer: TimerId, delay: Duration },
    CancelTimeout { timer: TimerId },
    /// `GET` the image count; the answer comes back as `Message::ImageCountLoaded`
    FetchImageCount { url: String, generation: u64 },
    /// `POST` a JSON race command; the answer comes back as `Message::CommandSettled`
    PostRaceCommand {
        command: RaceCommand,
        url: String,
        body: String,
    },
    SetRaceStatusLabel { text: String },
    SetCageStatusLabel { text: String },
    /// Toggle the per-field "changed" marker
    SetFieldChanged { name: String, changed: bool },
    /// Put a field back to a given value
    SetFieldValue { name: String, value: FieldValue },
    /// Toggle the form-level "unsaved changes" marker
    SetFormUnsaved { unsaved: bool },
    InstallUnloadGuard,
    RemoveUnloadGuard,
    Draw { op: DrawOp },
    /// Race targeted by the delete button; `None` disables the button
    SetDeleteTarget { race: Option<RaceId> },
}

/// Effects accumulated during one update.
pub type Effects = Vec<Effect>;
