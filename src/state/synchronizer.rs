//! Status synchronizer: the single owner of control enablement.
//!
//! Enablement is derived from the latest race phase alone. Re-applying the phase
//! that is already in effect changes nothing, so duplicated or replayed push
//! events are harmless.

use crate::effect::{Effect, Effects};
use crate::model::{CageStatus, Control, ControlEnablement, RacePhase, RaceStatus, StatusTable};

#[derive(Debug, Clone)]
pub struct StatusSynchronizer {
    table: StatusTable,
    phase: Option<RacePhase>,
    race_label: Option<String>,
    cage: CageStatus,
    enablement: ControlEnablement,
}

impl StatusSynchronizer {
    pub fn new(table: StatusTable) -> Self {
        Self {
            table,
            phase: None,
            race_label: None,
            cage: CageStatus::default(),
            enablement: ControlEnablement::default(),
        }
    }

    pub fn enablement(&self) -> ControlEnablement {
        self.enablement
    }

    /// Latest applied phase, `None` before the first race event.
    pub fn phase(&self) -> Option<RacePhase> {
        self.phase
    }

    pub fn cage(&self) -> &CageStatus {
        &self.cage
    }

    pub fn race_label(&self) -> Option<&str> {
        self.race_label.as_deref()
    }

    /// Apply a pushed race status.
    ///
    /// Returns the classified status when its phase differs from the one in effect;
    /// the caller then performs the phase's side effects. Returns `None` for a
    /// repeat of the current phase.
    pub fn apply_race(&mut self, raw: &str, out: &mut Effects) -> Option<RaceStatus> {
        let status = self.table.classify(raw);
        if !status.recognized {
            log::warn!(
                "⚠️  Unknown race status {:?}, treating as {}",
                raw,
                status.phase.name()
            );
        }

        if self.race_label.as_deref() != Some(raw) {
            self.race_label = Some(raw.to_string());
            out.push(Effect::SetRaceStatusLabel {
                text: raw.to_string(),
            });
        }

        if self.phase == Some(status.phase) {
            log::trace!("Race phase {} already applied", status.phase.name());
            return None;
        }

        log::info!(
            "🚦 Race phase {} -> {}",
            self.phase.map_or("unknown", |p| p.name()),
            status.phase.name()
        );
        self.phase = Some(status.phase);
        self.enablement = ControlEnablement::for_phase(status.phase);
        self.emit_enablement(out);
        Some(status)
    }

    /// Apply a pushed cage status. Only the label changes.
    pub fn apply_cage(&mut self, raw: &str, out: &mut Effects) {
        if self.cage.0 == raw {
            return;
        }
        log::debug!("🚪 Cage status: {}", raw);
        self.cage = CageStatus(raw.to_string());
        out.push(Effect::SetCageStatusLabel {
            text: raw.to_string(),
        });
    }

    /// Push the current enablement of every control.
    pub fn emit_enablement(&self, out: &mut Effects) {
        for control in Control::ALL {
            out.push(Effect::SetControlEnabled {
                control,
                enabled: self.enablement.is_enabled(control),
            });
        }
    }
}
