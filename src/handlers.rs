//! Message handlers for the station controller.
//!
//! Each handler processes one kind of input against the component state it is
//! given, keeping the `StationApp` update function small. Anything that needs
//! permission checks asks the status synchronizer first.

use crate::effect::{Effect, Effects};
use crate::keybindings::NavigationKeys;
use crate::model::{Point, RaceSelection};
use crate::state::{
    CalibrationTool, FetchError, ImageNavigator, NavError, PreviewDriver, RaceControlClient,
    StatusSynchronizer, TrainingLoop,
};
use crate::storage::KeyValueStore;

/// Handle a document-level key press.
///
/// Ignored while the slider itself has focus (it handles arrows natively) and
/// while the slider is disabled.
pub fn handle_key(
    key: &str,
    slider_focused: bool,
    keys: &NavigationKeys,
    sync: &StatusSynchronizer,
    navigator: &mut ImageNavigator,
    out: &mut Effects,
) {
    if slider_focused {
        return;
    }
    let Some(direction) = keys.direction_for_key(key) else {
        return;
    };
    let slider_enabled = sync.enablement().slider;
    if !slider_enabled {
        log::trace!("Slider disabled, ignoring {}", key);
        return;
    }

    match navigator.step(direction, slider_enabled, out) {
        Ok(index) => log::trace!("⌨️  {:?} to image {}", direction, index.get()),
        Err(NavError::NoRace) => {}
        Err(e) => log::warn!("Keyboard navigation skipped: {}", e),
    }
    out.push(Effect::PreventDefault);
}

/// Handle the slider being moved by the user.
pub fn handle_slider_input(
    value: i64,
    sync: &StatusSynchronizer,
    navigator: &mut ImageNavigator,
    out: &mut Effects,
) {
    let slider_enabled = sync.enablement().slider;
    if !slider_enabled {
        log::warn!("Slider input while disabled, ignoring");
        return;
    }
    match navigator.navigate(value, slider_enabled, out) {
        Ok(index) => log::trace!("🖼️  Slider to image {}", index.get()),
        Err(NavError::NoRace) => log::debug!("Slider moved in preview mode"),
        Err(e) => log::warn!("Slider navigation skipped: {}", e),
    }
}

/// Switch between live preview and a recorded race.
pub fn select_race(
    selection: RaceSelection,
    navigator: &mut ImageNavigator,
    preview: &mut PreviewDriver,
    out: &mut Effects,
) {
    preview.exit(out);
    let entering_preview = selection.is_preview();
    navigator.select(selection, out);
    if entering_preview {
        preview.enter(out);
    }
}

/// Handle the race selector changing.
pub fn handle_race_selected(
    value: &str,
    sync: &StatusSynchronizer,
    navigator: &mut ImageNavigator,
    preview: &mut PreviewDriver,
    out: &mut Effects,
) {
    if !sync.enablement().race_select {
        log::warn!("Race selector is locked, ignoring selection {:?}", value);
        return;
    }
    select_race(RaceSelection::from_option(value), navigator, preview, out);
}

/// Handle an image count response.
pub fn handle_image_count(
    generation: u64,
    status: u16,
    body: &str,
    navigator: &mut ImageNavigator,
    out: &mut Effects,
) {
    match navigator.on_count_loaded(generation, status, body, out) {
        Ok(count) => log::debug!("🖼️  Race has {} images", count),
        Err(e @ FetchError::Stale { .. }) => log::debug!("{}", e),
        Err(e) => log::error!("❌ {}", e),
    }
}

/// Handle the ready button (or a training restart).
pub fn handle_start(
    sync: &StatusSynchronizer,
    preview: &mut PreviewDriver,
    training: &mut TrainingLoop,
    race_control: &mut RaceControlClient,
    out: &mut Effects,
) {
    if !sync.enablement().ready_button {
        log::warn!("Ready button is locked, not starting");
        return;
    }
    training.cancel(out);
    preview.exit(out);
    race_control.request_start(out);
}

/// Handle the stop button.
pub fn handle_stop(
    sync: &StatusSynchronizer,
    race_control: &mut RaceControlClient,
    out: &mut Effects,
) {
    if !sync.enablement().stop_button {
        log::warn!("Stop button is locked, not stopping");
        return;
    }
    race_control.request_stop(out);
}

/// Handle a click on the calibration canvas.
pub fn handle_canvas_click<S: KeyValueStore>(
    point: Point,
    calibration: &mut CalibrationTool<S>,
    out: &mut Effects,
) {
    match calibration.on_click(point, out) {
        Ok(Some(line)) => log::info!("📏 Finish line set: {:?}", line),
        Ok(None) => {}
        Err(e) => log::error!("❌ Failed to persist finish line: {}", e),
    }
}
