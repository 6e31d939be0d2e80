//! Station controller application.
//!
//! `StationApp` owns every component and routes messages to them:
//! - Image navigator: race selection, slider and keyboard navigation
//! - Preview driver and training loop: the two kinds of timers
//! - Race control client: start/stop commands
//! - Status synchronizer: pushed status and control enablement
//! - Unsaved-changes guard and calibration tool
//!
//! A `not ready` status resets every component to its post-load state instead of
//! reloading the page.

use crate::config::{PageOptions, StationConfig};
use crate::effect::{Effect, Effects};
use crate::handlers;
use crate::message::{Message, PageLoad};
use crate::model::{ControlEnablement, FormSnapshot, PREVIEW_OPTION, RacePhase, RaceSelection};
use crate::push::PushEvent;
use crate::state::{
    CalibrationTool, ImageNavigator, PreviewDriver, RaceControlClient, StatusSynchronizer,
    TrainingLoop, UnsavedChangesGuard,
};
use crate::storage::KeyValueStore;

/// Main controller state.
pub struct StationApp<S> {
    config: StationConfig,
    options: PageOptions,
    loaded: bool,

    navigator: ImageNavigator,
    preview: PreviewDriver,
    race_control: RaceControlClient,
    training: TrainingLoop,
    sync: StatusSynchronizer,
    guard: UnsavedChangesGuard,
    calibration: CalibrationTool<S>,
}

impl<S: KeyValueStore> StationApp<S> {
    /// Create the controller. Nothing happens until `Message::Loaded`.
    pub fn new(config: StationConfig, store: S) -> Self {
        let endpoints = &config.endpoints;
        Self {
            navigator: ImageNavigator::new(&endpoints.race_root, &endpoints.image_count),
            preview: PreviewDriver::new(
                config.preview.mode,
                config.preview_period(),
                &endpoints.camera,
                &endpoints.video_stream,
            ),
            race_control: RaceControlClient::new(
                &endpoints.start_race,
                &endpoints.stop_race,
                &endpoints.ready_image,
            ),
            training: TrainingLoop::new(config.training_settle_delay()),
            sync: StatusSynchronizer::new(config.status_table()),
            guard: UnsavedChangesGuard::default(),
            calibration: CalibrationTool::new(store),
            options: PageOptions::default(),
            loaded: false,
            config,
        }
    }

    /// Process one message and return the effects to apply.
    pub fn update(&mut self, message: Message) -> Effects {
        let mut out = Effects::new();
        match message {
            Message::Loaded(load) => self.on_loaded(load, &mut out),

            Message::KeyPressed {
                key,
                slider_focused,
            } => handlers::handle_key(
                &key,
                slider_focused,
                &self.config.navigation_keys,
                &self.sync,
                &mut self.navigator,
                &mut out,
            ),
            Message::SliderInput { value } => {
                handlers::handle_slider_input(value, &self.sync, &mut self.navigator, &mut out)
            }
            Message::RaceSelected { value } => handlers::handle_race_selected(
                &value,
                &self.sync,
                &mut self.navigator,
                &mut self.preview,
                &mut out,
            ),
            Message::ImageCountLoaded {
                generation,
                status,
                body,
            } => handlers::handle_image_count(
                generation,
                status,
                &body,
                &mut self.navigator,
                &mut out,
            ),

            Message::PreviewTick {
                timer,
                timestamp_ms,
            } => {
                self.preview.on_tick(timer, timestamp_ms, &mut out);
            }

            Message::StartRequested => self.start(&mut out),
            Message::StopRequested => {
                handlers::handle_stop(&self.sync, &mut self.race_control, &mut out)
            }
            Message::CommandSettled { command, status } => {
                self.race_control.on_settled(command, status)
            }
            Message::TrainingSettled { timer } => {
                if self.training.on_fired(timer) {
                    log::info!("🔁 Training: starting next race");
                    self.start(&mut out);
                }
            }

            Message::Push { event } => match event {
                PushEvent::Race(raw) => self.on_race_status(&raw, &mut out),
                PushEvent::Cage(raw) => self.sync.apply_cage(&raw, &mut out),
            },

            Message::FieldChanged { name, value } => {
                self.guard.on_field_change(&name, &value, &mut out)
            }
            Message::FormSubmitted => self.guard.on_submit(&mut out),

            Message::CalibrationModeToggled { active } => self.calibration.set_mode(active),
            Message::CanvasClicked { point } => {
                handlers::handle_canvas_click(point, &mut self.calibration, &mut out)
            }
        }
        out
    }

    fn on_loaded(&mut self, load: PageLoad, out: &mut Effects) {
        if self.loaded {
            log::warn!("Page already loaded, ignoring second load");
            return;
        }
        self.loaded = true;
        self.options = PageOptions::from_query(&load.query);
        self.training.set_enabled(self.options.training);
        self.guard = UnsavedChangesGuard::new(FormSnapshot::capture(load.form));
        log::info!(
            "🚀 Station controller loaded (training: {}, {} form fields)",
            self.options.training,
            self.guard.snapshot().len()
        );
        self.post_load(out);
    }

    /// Bring every control into its post-load state.
    fn post_load(&mut self, out: &mut Effects) {
        self.sync.emit_enablement(out);
        self.calibration.restore(out);
        out.push(Effect::SetRaceSelector {
            value: PREVIEW_OPTION.to_string(),
        });
        out.push(Effect::SetSliderBounds {
            max: self.navigator.max_count(),
            value: self.navigator.index().get(),
        });
        handlers::select_race(
            RaceSelection::Preview,
            &mut self.navigator,
            &mut self.preview,
            out,
        );
        self.guard.attach(out);
        self.training.schedule(out);
    }

    fn start(&mut self, out: &mut Effects) {
        handlers::handle_start(
            &self.sync,
            &mut self.preview,
            &mut self.training,
            &mut self.race_control,
            out,
        );
    }

    fn on_race_status(&mut self, raw: &str, out: &mut Effects) {
        let Some(status) = self.sync.apply_race(raw, out) else {
            // A repeated not-ready still discards edits made since the last reset
            if self.sync.phase() == Some(RacePhase::NotReady) {
                self.guard.reset(out);
            }
            return;
        };
        self.race_control.confirm(status.phase);

        match status.phase {
            RacePhase::InProgress => {
                self.training.cancel(out);
                self.preview.exit(out);
                out.push(Effect::SetImageSource {
                    src: self.config.endpoints.active_race_image.clone(),
                });
            }
            RacePhase::Ready => {
                self.training.cancel(out);
                self.preview.exit(out);
            }
            RacePhase::NotReady => self.reset(out),
        }
    }

    /// Restore every component to its post-load state.
    ///
    /// The unload guard is detached first so nothing prompts about state the
    /// controller itself discards.
    pub fn reset(&mut self, out: &mut Effects) {
        log::info!("🔄 Resetting station controls");
        self.guard.detach(out);
        self.preview.exit(out);
        self.training.cancel(out);
        self.navigator.reset();
        self.race_control.reset();
        self.guard.reset(out);
        self.calibration.reset(out);
        self.post_load(out);
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn options(&self) -> PageOptions {
        self.options
    }

    pub fn enablement(&self) -> ControlEnablement {
        self.sync.enablement()
    }

    /// Whether a page unload should prompt the user right now.
    pub fn should_intercept_unload(&self) -> bool {
        self.guard.should_intercept_unload()
    }

    pub fn navigator(&self) -> &ImageNavigator {
        &self.navigator
    }

    pub fn preview(&self) -> &PreviewDriver {
        &self.preview
    }

    pub fn race_control(&self) -> &RaceControlClient {
        &self.race_control
    }

    pub fn training(&self) -> &TrainingLoop {
        &self.training
    }

    pub fn sync(&self) -> &StatusSynchronizer {
        &self.sync
    }

    pub fn guard(&self) -> &UnsavedChangesGuard {
        &self.guard
    }

    pub fn calibration(&self) -> &CalibrationTool<S> {
        &self.calibration
    }
}
