//! Global constants for the photofinish controller.

/// Live preview refresh period in milliseconds
pub const DEFAULT_PREVIEW_PERIOD_MS: u64 = 500;

/// Delay before the next start in training mode, in milliseconds
pub const DEFAULT_TRAINING_SETTLE_MS: u64 = 1000;

/// Side length of the calibration point markers in canvas pixels
pub const MARKER_SIZE: f64 = 10.0;

/// Default server paths.
pub mod paths {
    pub const START_RACE: &str = "/start_race";
    pub const STOP_RACE: &str = "/stop_race";
    pub const IMAGE_COUNT: &str = "/image_count";
    pub const CAMERA: &str = "/camera";
    pub const VIDEO_STREAM: &str = "/video_stream";
    pub const RACE_ROOT: &str = "/static/race";
    pub const ACTIVE_RACE_IMAGE: &str = "/static/active_race.png";
    pub const READY_IMAGE: &str = "/static/ready_for_race.png";
    pub const PUSH_SOCKET: &str = "/socket.io/?EIO=4&transport=websocket";
}

/// Element ids of the station page.
pub mod dom {
    pub const IMAGE: &str = "image";
    pub const SLIDER: &str = "image_index";
    pub const RACE_SELECT: &str = "race";
    pub const READY_BUTTON: &str = "ready_button";
    pub const STOP_BUTTON: &str = "stop_button";
    pub const RACE_STATUS: &str = "race_status";
    pub const CAGE_STATUS: &str = "cage_status";
    pub const SETTINGS_FORM: &str = "settings";
    pub const CANVAS: &str = "canvas";
    pub const CALIBRATE_BUTTON: &str = "calibrate_button";
    pub const DELETE_RACE_BUTTON: &str = "deleteRaceButton";
    pub const DELETE_RACE_INPUT: &str = "deleteRaceInput";

    /// Class marking a changed field
    pub const CHANGED_CLASS: &str = "changed";
    /// Class marking a form with unsaved changes
    pub const UNSAVED_CLASS: &str = "unsaved-changes";
}
