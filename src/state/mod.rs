//! Component state owned by the station controller.

mod calibration;
mod form_guard;
mod navigator;
mod preview;
mod race_control;
mod synchronizer;
mod training;

pub use calibration::CalibrationTool;
pub use form_guard::UnsavedChangesGuard;
pub use navigator::{FetchError, ImageNavigator, NavError};
pub use preview::PreviewDriver;
pub use race_control::{PendingCommand, RaceControlClient};
pub use synchronizer::StatusSynchronizer;
pub use training::TrainingLoop;
