//! Race and cage status tokens and the control enablement derived from them.
//!
//! The server pushes free-form, partly localized status strings. They are mapped
//! through a [`StatusTable`] onto the closed [`RacePhase`] enum; anything the table
//! does not know falls back to [`RacePhase::Ready`], which keeps the ready button,
//! race selector and slider locked.

use serde::{Deserialize, Serialize};

/// Phase of the race as far as the controls are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RacePhase {
    /// No race armed; browsing and configuration allowed
    NotReady,
    /// Race armed and about to start
    Ready,
    /// Race running
    InProgress,
}

impl RacePhase {
    pub fn name(&self) -> &'static str {
        match self {
            RacePhase::NotReady => "not ready",
            RacePhase::Ready => "ready",
            RacePhase::InProgress => "in progress",
        }
    }
}

/// Lowercase a token and drop leading decoration such as status emoji.
pub fn normalize_token(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim()
        .to_lowercase()
}

/// Mapping from raw status tokens to phases.
#[derive(Debug, Clone)]
pub struct StatusTable {
    /// Normalized token and its phase
    entries: Vec<(String, RacePhase)>,
}

impl StatusTable {
    /// Tokens observed from the station server, English and Swedish.
    pub const BUILTIN: &'static [(&'static str, RacePhase)] = &[
        ("in progress", RacePhase::InProgress),
        ("🔴 Pågår", RacePhase::InProgress),
        ("not ready", RacePhase::NotReady),
        ("🟡 Inte redo", RacePhase::NotReady),
        ("ready", RacePhase::Ready),
        ("🟢 Redo", RacePhase::Ready),
    ];

    /// An empty table; every token falls back to `Ready`.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a token, replacing an existing mapping for the same normalized text.
    pub fn insert(&mut self, token: &str, phase: RacePhase) {
        let key = normalize_token(token);
        if key.is_empty() {
            log::warn!("Ignoring blank status token mapped to {}", phase.name());
            return;
        }
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = phase,
            None => self.entries.push((key, phase)),
        }
    }

    /// Look up a token without falling back.
    pub fn lookup(&self, raw: &str) -> Option<RacePhase> {
        let key = normalize_token(raw);
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, phase)| *phase)
    }

    /// Classify a raw token, falling back to `Ready` for unknown input.
    pub fn classify(&self, raw: &str) -> RaceStatus {
        match self.lookup(raw) {
            Some(phase) => RaceStatus {
                raw: raw.to_string(),
                phase,
                recognized: true,
            },
            None => RaceStatus {
                raw: raw.to_string(),
                phase: RacePhase::Ready,
                recognized: false,
            },
        }
    }
}

impl Default for StatusTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for (token, phase) in Self::BUILTIN {
            table.insert(token, *phase);
        }
        table
    }
}

/// A race status as received, together with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceStatus {
    /// Token exactly as pushed (shown in the status label)
    pub raw: String,
    pub phase: RacePhase,
    /// False when the token was not in the table and fell back to `Ready`
    pub recognized: bool,
}

/// Cage door status. Display only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CageStatus(pub String);

/// Interactive controls whose enablement is owned by the status synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    ReadyButton,
    RaceSelect,
    Slider,
    StopButton,
}

impl Control {
    pub const ALL: [Control; 4] = [
        Control::ReadyButton,
        Control::RaceSelect,
        Control::Slider,
        Control::StopButton,
    ];
}

/// Which controls may currently be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlEnablement {
    pub ready_button: bool,
    pub race_select: bool,
    pub slider: bool,
    pub stop_button: bool,
}

impl ControlEnablement {
    /// Enablement for a phase. Depends on nothing else.
    pub const fn for_phase(phase: RacePhase) -> Self {
        match phase {
            RacePhase::NotReady => Self {
                ready_button: true,
                race_select: true,
                slider: true,
                stop_button: false,
            },
            RacePhase::Ready | RacePhase::InProgress => Self {
                ready_button: false,
                race_select: false,
                slider: false,
                stop_button: true,
            },
        }
    }

    pub fn is_enabled(&self, control: Control) -> bool {
        match control {
            Control::ReadyButton => self.ready_button,
            Control::RaceSelect => self.race_select,
            Control::Slider => self.slider,
            Control::StopButton => self.stop_button,
        }
    }
}

/// Post-load defaults: everything usable except stop.
impl Default for ControlEnablement {
    fn default() -> Self {
        Self::for_phase(RacePhase::NotReady)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_emoji_and_case() {
        assert_eq!(normalize_token("🔴 Pågår"), "pågår");
        assert_eq!(normalize_token("  Not Ready "), "not ready");
        assert_eq!(normalize_token("🟡"), "");
    }

    #[test]
    fn test_builtin_tokens() {
        let table = StatusTable::default();
        assert_eq!(table.lookup("🔴 Pågår"), Some(RacePhase::InProgress));
        assert_eq!(table.lookup("🟡 Inte redo"), Some(RacePhase::NotReady));
        assert_eq!(table.lookup("🟢 Redo"), Some(RacePhase::Ready));
        assert_eq!(table.lookup("In progress"), Some(RacePhase::InProgress));
        assert_eq!(table.lookup("not ready"), Some(RacePhase::NotReady));
        // Emoji variant differences do not matter
        assert_eq!(table.lookup("🟠 Pågår"), Some(RacePhase::InProgress));
    }

    #[test]
    fn test_unknown_token_falls_back_to_ready() {
        let status = StatusTable::default().classify("kaboom");
        assert_eq!(status.phase, RacePhase::Ready);
        assert!(!status.recognized);
        assert_eq!(status.raw, "kaboom");
    }

    #[test]
    fn test_insert_overrides() {
        let mut table = StatusTable::default();
        table.insert("READY", RacePhase::NotReady);
        assert_eq!(table.lookup("ready"), Some(RacePhase::NotReady));
        table.insert("   ", RacePhase::InProgress);
        assert_eq!(table.lookup(""), None);
    }

    #[test]
    fn test_enablement_per_phase() {
        let idle = ControlEnablement::for_phase(RacePhase::NotReady);
        assert!(idle.ready_button && idle.race_select && idle.slider && !idle.stop_button);

        for phase in [RacePhase::Ready, RacePhase::InProgress] {
            let locked = ControlEnablement::for_phase(phase);
            assert!(!locked.ready_button && !locked.race_select && !locked.slider);
            assert!(locked.stop_button);
        }
        assert_eq!(ControlEnablement::default(), idle);
        assert!(idle.is_enabled(Control::Slider));
        assert!(!idle.is_enabled(Control::StopButton));
    }
}
