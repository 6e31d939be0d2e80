//! Start/stop commands to the control API.
//!
//! Commands are fire-and-forget. The client remembers which command it is waiting
//! on; the race status pushed by the server is what confirms it, not the HTTP
//! response.

use web_time::Instant;

use crate::effect::{Effect, Effects};
use crate::model::{RaceCommand, RacePhase};

/// A command awaiting confirmation by a pushed status.
#[derive(Debug, Clone, Copy)]
pub struct PendingCommand {
    pub command: RaceCommand,
    pub sent_at: Instant,
}

impl PendingCommand {
    /// Whether `phase` is the state this command asks for.
    pub fn confirmed_by(&self, phase: RacePhase) -> bool {
        match self.command {
            RaceCommand::Start => matches!(phase, RacePhase::Ready | RacePhase::InProgress),
            RaceCommand::Stop => phase == RacePhase::NotReady,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RaceControlClient {
    start_url: String,
    stop_url: String,
    ready_image: String,
    expected: Option<PendingCommand>,
}

impl RaceControlClient {
    pub fn new(
        start_url: impl Into<String>,
        stop_url: impl Into<String>,
        ready_image: impl Into<String>,
    ) -> Self {
        Self {
            start_url: start_url.into(),
            stop_url: stop_url.into(),
            ready_image: ready_image.into(),
            expected: None,
        }
    }

    pub fn expected(&self) -> Option<&PendingCommand> {
        self.expected.as_ref()
    }

    /// Ask the server to arm the race and show the "ready" placeholder meanwhile.
    ///
    /// The caller stops the live preview first.
    pub fn request_start(&mut self, out: &mut Effects) {
        out.push(Effect::SetImageSource {
            src: self.ready_image.clone(),
        });
        self.send(RaceCommand::Start, out);
    }

    pub fn request_stop(&mut self, out: &mut Effects) {
        self.send(RaceCommand::Stop, out);
    }

    fn send(&mut self, command: RaceCommand, out: &mut Effects) {
        let url = match command {
            RaceCommand::Start => self.start_url.clone(),
            RaceCommand::Stop => self.stop_url.clone(),
        };
        log::info!("🏁 Requesting race {}", command.name());
        out.push(Effect::PostRaceCommand {
            command,
            url,
            body: command.body(),
        });
        self.expected = Some(PendingCommand {
            command,
            sent_at: Instant::now(),
        });
    }

    /// Log the HTTP outcome. The display is never rolled back here.
    pub fn on_settled(&self, command: RaceCommand, status: Option<u16>) {
        match status {
            Some(code) if (200..300).contains(&code) => {
                log::debug!("Race {} accepted ({})", command.name(), code);
            }
            Some(code) => {
                log::error!("❌ Race {} rejected with status {}", command.name(), code);
            }
            None => {
                log::error!("❌ Race {} request failed", command.name());
            }
        }
    }

    /// Clear the expectation when the pushed phase confirms it.
    pub fn confirm(&mut self, phase: RacePhase) {
        if let Some(pending) = self.expected.filter(|p| p.confirmed_by(phase)) {
            log::info!(
                "✅ Race {} confirmed as {} after {:?}",
                pending.command.name(),
                phase.name(),
                pending.sent_at.elapsed()
            );
            self.expected = None;
        }
    }

    pub fn reset(&mut self) {
        self.expected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RaceControlClient {
        RaceControlClient::new("/start_race", "/stop_race", "/static/ready_for_race.png")
    }

    #[test]
    fn test_start_shows_placeholder_then_posts() {
        let mut race = client();
        let mut out = Vec::new();
        race.request_start(&mut out);

        assert_eq!(
            out,
            vec![
                Effect::SetImageSource {
                    src: "/static/ready_for_race.png".to_string()
                },
                Effect::PostRaceCommand {
                    command: RaceCommand::Start,
                    url: "/start_race".to_string(),
                    body: r#"{"race":"start"}"#.to_string()
                },
            ]
        );
        assert_eq!(race.expected().map(|p| p.command), Some(RaceCommand::Start));
    }

    #[test]
    fn test_confirmation_clears_expectation() {
        let mut race = client();
        let mut out = Vec::new();
        race.request_stop(&mut out);
        assert_eq!(
            out[0],
            Effect::PostRaceCommand {
                command: RaceCommand::Stop,
                url: "/stop_race".to_string(),
                body: r#"{"race":"stop"}"#.to_string()
            }
        );

        race.confirm(RacePhase::InProgress);
        assert!(race.expected().is_some());
        race.confirm(RacePhase::NotReady);
        assert!(race.expected().is_none());
    }

    #[test]
    fn test_failure_keeps_expectation() {
        let mut race = client();
        let mut out = Vec::new();
        race.request_start(&mut out);
        race.on_settled(RaceCommand::Start, None);
        race.on_settled(RaceCommand::Start, Some(500));
        assert!(race.expected().is_some());
    }
}
