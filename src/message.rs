//! Application message types for the station controller.
//!
//! Every input (user events, timer ticks, network completions and push events) is
//! represented as a message in the Elm architecture style.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::effect::TimerId;
use crate::model::{FieldValue, Point, RaceCommand};
use crate::push::PushEvent;

/// What the page looked like when it finished loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLoad {
    /// Query string of the page URL, with or without the leading `?`
    #[serde(default)]
    pub query: String,
    /// Settings form values at load time
    #[serde(default)]
    pub form: BTreeMap<String, FieldValue>,
}

/// Messages that can be sent to update controller state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message", rename_all = "snake_case")]
pub enum Message {
    /// Page finished loading
    Loaded(PageLoad),

    // Image navigation
    /// Document-level key press
    KeyPressed { key: String, slider_focused: bool },
    /// Slider moved by the user
    SliderInput { value: i64 },
    /// Race selector changed to an option value
    RaceSelected { value: String },
    /// Response to `Effect::FetchImageCount`
    ImageCountLoaded {
        generation: u64,
        status: u16,
        body: String,
    },

    // Live preview
    /// Interval tick
    PreviewTick { timer: TimerId, timestamp_ms: u64 },

    // Race control
    /// Ready button pressed
    StartRequested,
    /// Stop button pressed
    StopRequested,
    /// Response to `Effect::PostRaceCommand`; `None` when the request never completed
    CommandSettled {
        command: RaceCommand,
        status: Option<u16>,
    },
    /// Training settle delay elapsed
    TrainingSettled { timer: TimerId },

    /// Event from the push channel
    Push { event: PushEvent },

    // Settings form
    /// A form field changed
    FieldChanged { name: String, value: FieldValue },
    /// Settings form submitted
    FormSubmitted,

    // Calibration
    /// Calibration mode switched on or off
    CalibrationModeToggled { active: bool },
    /// Click on the calibration canvas, in canvas coordinates
    CanvasClicked { point: Point },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_line_parses() {
        let msg: Message =
            serde_json::from_str(r#"{"message":"race_selected","value":"race7"}"#).unwrap();
        assert_eq!(
            msg,
            Message::RaceSelected {
                value: "race7".to_string()
            }
        );

        let msg: Message = serde_json::from_str(
            r#"{"message":"push","event":{"event":"race","data":"🔴 Pågår"}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            Message::Push {
                event: PushEvent::Race("🔴 Pågår".to_string())
            }
        );

        let msg: Message = serde_json::from_str(
            r#"{"message":"loaded","query":"training=true","form":{"rotation":"5","flip_image":false}}"#,
        )
        .unwrap();
        let Message::Loaded(load) = msg else {
            panic!("expected loaded message");
        };
        assert_eq!(load.form.get("flip_image"), Some(&FieldValue::Checkbox(false)));
    }
}
