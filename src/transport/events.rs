//! Wire protocol for the session channel
//!
//! Inbound frames are JSON objects discriminated by a `type` field; outbound
//! control frames use the same shape. Audio itself travels as raw binary
//! PCM16 and never appears here.

use serde::{Deserialize, Serialize};

/// Structured event received from the backend over the session channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Transcript of what the user said, for display
    Transcript { text: String },

    /// Generated response text, to be spoken by the avatar
    TextResponse { text: String },

    /// Backend acknowledged the start of audio streaming
    RecordingStarted,

    /// Backend acknowledged the end of audio streaming
    RecordingStopped,

    /// Backend allocated its own session identifier
    SessionCreated { session_id: String },

    /// Backend-side failure; the session stays up
    Error { message: String },
}

/// Small JSON control message sent alongside binary audio frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    StartRecording,
    StopRecording,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transcript() {
        let event: InboundEvent =
            serde_json::from_str(r#"{"type": "transcript", "text": "hello there"}"#).unwrap();
        assert_eq!(
            event,
            InboundEvent::Transcript {
                text: "hello there".to_string()
            }
        );
    }

    #[test]
    fn test_parse_text_response() {
        let event: InboundEvent =
            serde_json::from_str(r#"{"type": "text_response", "text": "Hi!"}"#).unwrap();
        assert_eq!(
            event,
            InboundEvent::TextResponse {
                text: "Hi!".to_string()
            }
        );
    }

    #[test]
    fn test_parse_recording_markers() {
        let started: InboundEvent =
            serde_json::from_str(r#"{"type": "recording_started"}"#).unwrap();
        assert_eq!(started, InboundEvent::RecordingStarted);

        let stopped: InboundEvent =
            serde_json::from_str(r#"{"type": "recording_stopped"}"#).unwrap();
        assert_eq!(stopped, InboundEvent::RecordingStopped);
    }

    #[test]
    fn test_parse_session_created() {
        let event: InboundEvent = serde_json::from_str(
            r#"{"type": "session_created", "session_id": "123e4567-e89b-12d3-a456-426614174000"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            InboundEvent::SessionCreated {
                session_id: "123e4567-e89b-12d3-a456-426614174000".to_string()
            }
        );
    }

    #[test]
    fn test_parse_error() {
        let event: InboundEvent =
            serde_json::from_str(r#"{"type": "error", "message": "session expired"}"#).unwrap();
        assert_eq!(
            event,
            InboundEvent::Error {
                message: "session expired".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(serde_json::from_str::<InboundEvent>(r#"{"type": "telemetry"}"#).is_err());
        assert!(serde_json::from_str::<InboundEvent>("not json at all").is_err());
    }

    #[test]
    fn test_control_message_wire_format() {
        assert_eq!(
            serde_json::to_string(&ControlMessage::StartRecording).unwrap(),
            r#"{"type":"start_recording"}"#
        );
        assert_eq!(
            serde_json::to_string(&ControlMessage::StopRecording).unwrap(),
            r#"{"type":"stop_recording"}"#
        );
    }
}
