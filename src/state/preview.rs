//! Live camera preview.
//!
//! In polling mode a single interval timer refreshes the displayed image with a
//! cache-busted camera frame. Starting preview always cancels the previous timer
//! first, so there is never more than one.

use std::time::Duration;

use crate::config::PreviewMode;
use crate::effect::{Effect, Effects, TimerId, TimerKind, TimerSequence};

#[derive(Debug, Clone)]
pub struct PreviewDriver {
    mode: PreviewMode,
    period: Duration,
    camera_path: String,
    stream_path: String,
    timers: TimerSequence,
    active: Option<TimerId>,
    streaming: bool,
}

impl PreviewDriver {
    pub fn new(
        mode: PreviewMode,
        period: Duration,
        camera_path: impl Into<String>,
        stream_path: impl Into<String>,
    ) -> Self {
        Self {
            mode,
            period,
            camera_path: camera_path.into(),
            stream_path: stream_path.into(),
            timers: TimerSequence::new(TimerKind::Preview),
            active: None,
            streaming: false,
        }
    }

    /// Currently running refresh timer.
    pub fn active_timer(&self) -> Option<TimerId> {
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some() || self.streaming
    }

    /// Start previewing, replacing any running refresh.
    pub fn enter(&mut self, out: &mut Effects) {
        self.exit(out);
        match self.mode {
            PreviewMode::Polling => {
                let timer = self.timers.allocate();
                self.active = Some(timer);
                log::debug!("📷 Preview refresh every {:?} ({:?})", self.period, timer);
                out.push(Effect::StartInterval {
                    timer,
                    period: self.period,
                });
            }
            PreviewMode::Stream => {
                self.streaming = true;
                out.push(Effect::SetImageSource {
                    src: self.stream_path.clone(),
                });
            }
        }
    }

    /// Stop previewing. In-flight frame requests are left to finish.
    pub fn exit(&mut self, out: &mut Effects) {
        if let Some(timer) = self.active.take() {
            log::debug!("📷 Preview refresh stopped ({:?})", timer);
            out.push(Effect::CancelInterval { timer });
        }
        self.streaming = false;
    }

    /// Handle an interval tick. Ticks from cancelled timers are ignored.
    pub fn on_tick(&self, timer: TimerId, timestamp_ms: u64, out: &mut Effects) -> bool {
        if self.active != Some(timer) {
            log::trace!("Ignoring tick from stale preview timer {:?}", timer);
            return false;
        }
        out.push(Effect::SetImageSource {
            src: format!("{}?{}", self.camera_path, timestamp_ms),
        });
        true
    }
}
