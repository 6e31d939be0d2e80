//! Push channel frame decoding.
//!
//! The station server emits two events, `cage` and `race`, each carrying a status
//! string. Frames arrive either as Socket.IO packets (`42["race","🔴 Pågår"]`) or
//! as plain JSON objects (`{"event":"race","data":"🔴 Pågår"}`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A status event from the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum PushEvent {
    /// Cage door status text
    Cage(String),
    /// Race status text
    Race(String),
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushFrame {
    /// Status event for the controller
    Event(PushEvent),
    /// Engine.IO open packet; the client must answer with [`CONNECT_PACKET`]
    Open,
    /// Engine.IO ping; the client must answer with [`PONG_PACKET`]
    Ping,
    /// Anything else the controller does not act on (connect acks, noops)
    Ignored,
}

/// Socket.IO connect request for the default namespace.
pub const CONNECT_PACKET: &str = "40";

/// Engine.IO pong.
pub const PONG_PACKET: &str = "3";

/// Errors decoding a push frame.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("Malformed push frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown push event '{0}'")]
    UnknownEvent(String),

    #[error("Push event '{event}' has a non-text payload")]
    NonTextPayload { event: String },

    #[error("Unsupported push frame: {0}")]
    Unsupported(String),
}

/// Decode one text frame.
pub fn decode_frame(frame: &str) -> Result<PushFrame, PushError> {
    let frame = frame.trim();

    if frame.starts_with('{') {
        let value: serde_json::Value = serde_json::from_str(frame)?;
        let name = value
            .get("event")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let data = value.get("data").cloned().unwrap_or_default();
        return event_from_parts(name, data).map(PushFrame::Event);
    }

    match frame.as_bytes().first() {
        Some(b'0') => Ok(PushFrame::Open),
        Some(b'2') if frame.len() == 1 => Ok(PushFrame::Ping),
        Some(b'4') => decode_socketio_packet(&frame[1..]),
        Some(b'6') => Ok(PushFrame::Ignored),
        _ => Err(PushError::Unsupported(frame.chars().take(32).collect())),
    }
}

/// Decode the Socket.IO part of an Engine.IO message packet.
fn decode_socketio_packet(packet: &str) -> Result<PushFrame, PushError> {
    let Some(rest) = packet.strip_prefix('2') else {
        // Connect acks, disconnects and acks carry nothing for us
        return Ok(PushFrame::Ignored);
    };

    // Optional namespace ("/ns,") and ack id precede the payload
    let rest = match rest.strip_prefix('/') {
        Some(ns) => ns.split_once(',').map(|(_, tail)| tail).unwrap_or(""),
        None => rest,
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());

    let mut parts: Vec<serde_json::Value> = serde_json::from_str(rest)?;
    if parts.is_empty() {
        return Err(PushError::Unsupported(rest.chars().take(32).collect()));
    }
    let name = match parts.remove(0) {
        serde_json::Value::String(name) => name,
        other => return Err(PushError::UnknownEvent(other.to_string())),
    };
    let data = parts.into_iter().next().unwrap_or_default();
    event_from_parts(name, data).map(PushFrame::Event)
}

fn event_from_parts(name: String, data: serde_json::Value) -> Result<PushEvent, PushError> {
    let text = match data {
        serde_json::Value::String(text) => text,
        _ => return Err(PushError::NonTextPayload { event: name }),
    };
    match name.as_str() {
        "cage" => Ok(PushEvent::Cage(text)),
        "race" => Ok(PushEvent::Race(text)),
        _ => Err(PushError::UnknownEvent(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socketio_event() {
        let frame = decode_frame(r#"42["race","🔴 Pågår"]"#).unwrap();
        assert_eq!(
            frame,
            PushFrame::Event(PushEvent::Race("🔴 Pågår".to_string()))
        );

        let frame = decode_frame(r#"42/station,7["cage","Stängd"]"#).unwrap();
        assert_eq!(frame, PushFrame::Event(PushEvent::Cage("Stängd".to_string())));
    }

    #[test]
    fn test_plain_json_event() {
        let frame = decode_frame(r#"{"event":"cage","data":"Öppen"}"#).unwrap();
        assert_eq!(frame, PushFrame::Event(PushEvent::Cage("Öppen".to_string())));
    }

    #[test]
    fn test_engine_packets() {
        assert_eq!(
            decode_frame(r#"0{"sid":"abc","pingInterval":25000}"#).unwrap(),
            PushFrame::Open
        );
        assert_eq!(decode_frame("2").unwrap(), PushFrame::Ping);
        assert_eq!(decode_frame(r#"40{"sid":"x"}"#).unwrap(), PushFrame::Ignored);
        assert_eq!(decode_frame("6").unwrap(), PushFrame::Ignored);
    }

    #[test]
    fn test_rejects_unknown_and_malformed() {
        assert!(matches!(
            decode_frame(r#"42["lap","3"]"#),
            Err(PushError::UnknownEvent(name)) if name == "lap"
        ));
        assert!(matches!(
            decode_frame(r#"42["race",5]"#),
            Err(PushError::NonTextPayload { .. })
        ));
        assert!(matches!(decode_frame("42[oops"), Err(PushError::Json(_))));
        assert!(matches!(decode_frame("hello"), Err(PushError::Unsupported(_))));
    }
}
