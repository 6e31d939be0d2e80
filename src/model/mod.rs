//! Data models for the photofinish station controller.

mod calibration;
mod form;
mod race;
mod status;

pub use calibration::{CalibrationLine, Point};
pub use form::{FieldValue, FormSnapshot};
pub use race::{
    ImageIndex, PREVIEW_OPTION, RaceCommand, RaceId, RaceSelection, race_image_path,
};
pub use status::{
    CageStatus, Control, ControlEnablement, RacePhase, RaceStatus, StatusTable, normalize_token,
};
