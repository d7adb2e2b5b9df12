//! Application state management
//!
//! Central state for the Caresma UI: orchestrator events are polled once
//! per frame and folded into plain state the views render from.

use crate::api::types::Assessment;
use crate::avatar::backend::AvatarStreamInfo;
use crate::integration::{OrchestratorHandle, SessionCommand, SessionEvent};
use crate::messages::ConversationLog;
use std::path::PathBuf;
use tracing::warn;

/// Extensions accepted for transcript upload
pub const ALLOWED_EXTENSIONS: [&str; 3] = [".txt", ".md", ".text"];

/// Upload size cap
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Which top-level view is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveView {
    Home,
    Assessment,
}

/// Live-session state the session panel renders from
#[derive(Debug, Clone, Default)]
pub struct SessionUiState {
    pub started: bool,
    pub session_id: Option<String>,
    pub channel_connected: bool,
    pub recording: bool,
    pub channel_status: String,
    pub avatar_loading: bool,
    pub avatar_ready: bool,
    pub avatar_error: Option<String>,
    pub avatar_speaking: bool,
    pub avatar_stream: Option<AvatarStreamInfo>,
}

/// A file picked (or dropped) for upload
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
}

/// Transcript-upload form state
#[derive(Debug, Clone, Default)]
pub struct UploadState {
    pub path_input: String,
    pub session_id_input: String,
    pub selected: Option<SelectedFile>,
    pub error: Option<String>,
    pub in_flight: bool,
}

/// Derived status line, evaluated fresh on every render.
///
/// Priority order: not-started, avatar loading, avatar error, avatar
/// initializing, connecting, speaking, listening, then whatever the
/// channel last reported.
pub fn derive_status(s: &SessionUiState) -> String {
    if !s.started {
        "Not started".to_string()
    } else if s.avatar_loading {
        "Loading avatar...".to_string()
    } else if let Some(error) = &s.avatar_error {
        format!("Avatar error: {}", error)
    } else if !s.avatar_ready {
        "Initializing avatar...".to_string()
    } else if !s.channel_connected {
        "Connecting...".to_string()
    } else if s.avatar_speaking {
        "Avatar speaking...".to_string()
    } else if s.recording {
        "Listening...".to_string()
    } else {
        s.channel_status.clone()
    }
}

/// Validate a transcript file by name and size.
///
/// Used identically for manual selection and drag-and-drop.
pub fn validate_transcript_file(name: &str, size_bytes: u64) -> std::result::Result<(), String> {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(format!(
            "Invalid file type. Please upload {} files only.",
            ALLOWED_EXTENSIONS.join(", ")
        ));
    }

    if size_bytes > MAX_FILE_BYTES {
        return Err("File size must be less than 10MB".to_string());
    }

    Ok(())
}

/// Central application state
pub struct AppState {
    handle: OrchestratorHandle,
    pub view: ActiveView,
    pub session: SessionUiState,
    pub conversation: ConversationLog,
    pub upload: UploadState,
    pub assessment: Option<Assessment>,
    pub cleanup_notice: Option<String>,
    pub last_error: Option<String>,
}

impl AppState {
    pub fn new(handle: OrchestratorHandle) -> Self {
        Self {
            handle,
            view: ActiveView::Home,
            session: SessionUiState {
                channel_status: "Not connected".to_string(),
                ..SessionUiState::default()
            },
            conversation: ConversationLog::new(),
            upload: UploadState::default(),
            assessment: None,
            cleanup_notice: None,
            last_error: None,
        }
    }

    /// Drain pending orchestrator events into state
    pub fn poll_events(&mut self) {
        while let Some(event) = self.handle.try_recv_event() {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::SessionStarting { session_id } => {
                self.session.started = true;
                self.session.session_id = Some(session_id);
                self.session.channel_status = "Connecting...".to_string();
                self.conversation.clear();
                self.last_error = None;
            }
            SessionEvent::SessionAdopted { session_id } => {
                self.session.session_id = Some(session_id);
            }
            SessionEvent::ChannelConnected => {
                self.session.channel_connected = true;
                self.session.channel_status = "Connected".to_string();
            }
            SessionEvent::ChannelDisconnected => {
                self.session.channel_connected = false;
                self.session.recording = false;
                self.session.channel_status = "Disconnected".to_string();
            }
            SessionEvent::ChannelStatus(status) => {
                self.session.channel_status = status;
            }
            SessionEvent::RecordingStarted => self.session.recording = true,
            SessionEvent::RecordingStopped => self.session.recording = false,
            SessionEvent::Transcript(text) => self.conversation.add_user(text),
            SessionEvent::Response(text) => self.conversation.add_assistant(text),
            SessionEvent::AvatarLoading => {
                self.session.avatar_loading = true;
                self.session.avatar_error = None;
            }
            SessionEvent::AvatarReady { stream } => {
                self.session.avatar_loading = false;
                self.session.avatar_ready = true;
                self.session.avatar_stream = Some(stream);
            }
            SessionEvent::AvatarError(message) => {
                self.session.avatar_loading = false;
                self.session.avatar_ready = false;
                self.session.avatar_error = Some(message);
            }
            SessionEvent::AvatarSpeaking(speaking) => self.session.avatar_speaking = speaking,
            SessionEvent::AvatarDisconnected => {
                self.session.avatar_ready = false;
                self.session.avatar_speaking = false;
            }
            SessionEvent::AssessmentReady(assessment) => {
                self.assessment = Some(*assessment);
                self.upload.in_flight = false;
                self.upload.error = None;
            }
            SessionEvent::AssessmentFailed(message) => {
                self.upload.in_flight = false;
                self.upload.error = Some(message);
            }
            SessionEvent::CleanupFinished { sessions_closed } => {
                self.cleanup_notice =
                    Some(format!("Closed {} remote avatar sessions", sessions_closed));
            }
            SessionEvent::SessionEnded => {
                self.session = SessionUiState {
                    channel_status: "Not connected".to_string(),
                    ..SessionUiState::default()
                };
                self.conversation.clear();
            }
            SessionEvent::Error(message) => {
                self.last_error = Some(message);
            }
        }
    }

    fn send(&mut self, cmd: SessionCommand) {
        if let Err(e) = self.handle.send_command(cmd) {
            warn!("Failed to send command: {}", e);
            self.last_error = Some(e.user_message());
        }
    }

    pub fn start_session(&mut self) {
        self.send(SessionCommand::StartSession);
    }

    pub fn end_session(&mut self) {
        self.send(SessionCommand::EndSession);
    }

    pub fn toggle_recording(&mut self) {
        if self.session.recording {
            self.send(SessionCommand::StopRecording);
        } else {
            self.send(SessionCommand::StartRecording);
        }
    }

    pub fn stop_speaking(&mut self) {
        self.send(SessionCommand::StopSpeaking);
    }

    pub fn cleanup_avatar_sessions(&mut self) {
        self.cleanup_notice = None;
        self.send(SessionCommand::CleanupAvatarSessions);
    }

    /// Select a transcript file, validating name and size.
    ///
    /// Drag-and-drop and the manual picker both land here, so validation is
    /// identical for both paths.
    pub fn select_file(&mut self, path: PathBuf) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size_bytes = match std::fs::metadata(&path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                self.upload.error = Some(format!("Cannot read file: {}", e));
                return;
            }
        };

        match validate_transcript_file(&name, size_bytes) {
            Ok(()) => {
                self.upload.selected = Some(SelectedFile {
                    path,
                    name,
                    size_bytes,
                });
                self.upload.error = None;
            }
            Err(message) => {
                self.upload.error = Some(message);
            }
        }
    }

    pub fn clear_selected_file(&mut self) {
        self.upload.selected = None;
    }

    /// Submit the selected file for analysis
    pub fn submit_upload(&mut self) {
        let Some(selected) = self.upload.selected.clone() else {
            self.upload.error = Some("Please select a file".to_string());
            return;
        };

        let session_id = {
            let trimmed = self.upload.session_id_input.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        };

        self.upload.in_flight = true;
        self.upload.error = None;
        self.send(SessionCommand::AnalyzeFile {
            path: selected.path,
            session_id,
        });
    }

    /// Back from the results view to a fresh upload form
    pub fn reset_assessment(&mut self) {
        self.assessment = None;
        self.upload = UploadState::default();
    }

    /// Release everything on window close
    pub fn shutdown(&mut self) {
        self.send(SessionCommand::EndSession);
        self.send(SessionCommand::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        let (_orchestrator, handle) =
            crate::integration::SessionOrchestrator::new(crate::integration::AppConfig::default());
        AppState::new(handle)
    }

    #[test]
    fn test_status_priority_order() {
        let mut s = SessionUiState {
            channel_status: "Connected".to_string(),
            ..SessionUiState::default()
        };
        assert_eq!(derive_status(&s), "Not started");

        s.started = true;
        s.avatar_loading = true;
        s.avatar_error = Some("boom".to_string());
        assert_eq!(derive_status(&s), "Loading avatar...");

        s.avatar_loading = false;
        assert_eq!(derive_status(&s), "Avatar error: boom");

        s.avatar_error = None;
        assert_eq!(derive_status(&s), "Initializing avatar...");

        s.avatar_ready = true;
        assert_eq!(derive_status(&s), "Connecting...");

        s.channel_connected = true;
        s.avatar_speaking = true;
        s.recording = true;
        assert_eq!(derive_status(&s), "Avatar speaking...");

        s.avatar_speaking = false;
        assert_eq!(derive_status(&s), "Listening...");

        s.recording = false;
        assert_eq!(derive_status(&s), "Connected");
    }

    #[test]
    fn test_validation_accepts_allowed_extensions() {
        assert!(validate_transcript_file("notes.txt", 2048).is_ok());
        assert!(validate_transcript_file("NOTES.TXT", 2048).is_ok());
        assert!(validate_transcript_file("journal.md", 1).is_ok());
        assert!(validate_transcript_file("old.text", 500).is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_extension() {
        let err = validate_transcript_file("audio.wav", 1000).unwrap_err();
        assert_eq!(
            err,
            "Invalid file type. Please upload .txt, .md, .text files only."
        );
        assert!(validate_transcript_file("no_extension", 10).is_err());
        assert!(validate_transcript_file("archive.txt.gz", 10).is_err());
    }

    #[test]
    fn test_validation_rejects_oversized_file() {
        assert!(validate_transcript_file("big.txt", MAX_FILE_BYTES).is_ok());
        let err = validate_transcript_file("big.txt", MAX_FILE_BYTES + 1).unwrap_err();
        assert_eq!(err, "File size must be less than 10MB");
    }

    #[test]
    fn test_events_fold_into_session_state() {
        let mut state = state();

        state.apply_event(SessionEvent::SessionStarting {
            session_id: "s-1".to_string(),
        });
        assert!(state.session.started);
        assert_eq!(state.session.session_id.as_deref(), Some("s-1"));

        state.apply_event(SessionEvent::ChannelConnected);
        assert!(state.session.channel_connected);
        assert_eq!(state.session.channel_status, "Connected");

        state.apply_event(SessionEvent::SessionAdopted {
            session_id: "backend-1".to_string(),
        });
        assert_eq!(state.session.session_id.as_deref(), Some("backend-1"));

        state.apply_event(SessionEvent::Transcript("hi".to_string()));
        state.apply_event(SessionEvent::Response("hello".to_string()));
        assert_eq!(state.conversation.len(), 2);

        state.apply_event(SessionEvent::SessionEnded);
        assert!(!state.session.started);
        assert!(state.conversation.is_empty());
        assert_eq!(state.session.channel_status, "Not connected");
    }

    #[test]
    fn test_assessment_events_toggle_upload_state() {
        let mut state = state();
        state.upload.in_flight = true;

        state.apply_event(SessionEvent::AssessmentFailed("too short".to_string()));
        assert!(!state.upload.in_flight);
        assert_eq!(state.upload.error.as_deref(), Some("too short"));

        state.upload.in_flight = true;
        state.apply_event(SessionEvent::AssessmentReady(Box::new(Assessment {
            overall_score: Some(7.2),
            ..Assessment::default()
        })));
        assert!(!state.upload.in_flight);
        assert!(state.upload.error.is_none());
        assert_eq!(state.assessment.as_ref().unwrap().overall_score, Some(7.2));
    }

    #[test]
    fn test_select_file_validates_like_drop() {
        let mut state = state();
        let dir = std::env::temp_dir();

        let good = dir.join("caresma_test_transcript.txt");
        std::fs::write(&good, b"hello world").unwrap();
        state.select_file(good.clone());
        assert!(state.upload.error.is_none());
        assert_eq!(state.upload.selected.as_ref().unwrap().size_bytes, 11);
        std::fs::remove_file(&good).ok();

        let bad = dir.join("caresma_test_audio.wav");
        std::fs::write(&bad, b"RIFF").unwrap();
        state.select_file(bad.clone());
        assert!(state
            .upload
            .error
            .as_deref()
            .unwrap()
            .starts_with("Invalid file type"));
        std::fs::remove_file(&bad).ok();
    }

    #[test]
    fn test_submit_without_file_sets_error() {
        let mut state = state();
        state.submit_upload();
        assert_eq!(state.upload.error.as_deref(), Some("Please select a file"));
        assert!(!state.upload.in_flight);
    }
}
