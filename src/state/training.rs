//! Automatic train/race loop enabled by `training=true`.

use std::time::Duration;

use crate::effect::{Effect, Effects, TimerId, TimerKind, TimerSequence};

/// Schedules the delayed start that keeps the training loop going.
#[derive(Debug, Clone)]
pub struct TrainingLoop {
    enabled: bool,
    delay: Duration,
    timers: TimerSequence,
    pending: Option<TimerId>,
}

impl TrainingLoop {
    pub fn new(delay: Duration) -> Self {
        Self {
            enabled: false,
            delay,
            timers: TimerSequence::new(TimerKind::Training),
            pending: None,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn pending(&self) -> Option<TimerId> {
        self.pending
    }

    /// Schedule the next start if training is on. Replaces a pending one.
    pub fn schedule(&mut self, out: &mut Effects) {
        if !self.enabled {
            return;
        }
        self.cancel(out);
        let timer = self.timers.allocate();
        self.pending = Some(timer);
        log::info!("🔁 Training: next start in {:?}", self.delay);
        out.push(Effect::ScheduleTimeout {
            timer,
            delay: self.delay,
        });
    }

    pub fn cancel(&mut self, out: &mut Effects) {
        if let Some(timer) = self.pending.take() {
            out.push(Effect::CancelTimeout { timer });
        }
    }

    /// Whether a fired timeout is the one currently pending. Consumes it.
    pub fn on_fired(&mut self, timer: TimerId) -> bool {
        if self.pending == Some(timer) {
            self.pending = None;
            true
        } else {
            log::debug!("Ignoring stale training timer {:?}", timer);
            false
        }
    }
}
