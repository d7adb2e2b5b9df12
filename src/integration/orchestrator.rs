//! Session orchestrator
//!
//! Composes the transport channel, the audio capture unit, and the avatar
//! session unit, routes inbound events to their consumers, and owns the
//! session lifecycle. Runs on its own worker thread driving a
//! current-thread tokio runtime; the UI talks to it through a command
//! channel and polls a bounded event channel once per frame.

use crate::api::types::Assessment;
use crate::api::BackendClient;
use crate::avatar::backend::{AvatarSignal, AvatarStreamInfo};
use crate::avatar::heygen::HeygenBackend;
use crate::avatar::session::{AvatarEvent, AvatarSession};
use crate::integration::config::AppConfig;
use crate::transport::channel::{ChannelEvent, ChannelHandle, SessionChannel};
use crate::transport::events::{ControlMessage, InboundEvent};
use crate::{CaresmaError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[cfg(feature = "audio-io")]
use crate::audio::AudioInput;

/// Commands that can be sent to the orchestrator
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Start a new session (channel + avatar)
    StartSession,

    /// End the current session, releasing all resources
    EndSession,

    /// Start streaming microphone audio
    StartRecording,

    /// Stop streaming microphone audio
    StopRecording,

    /// Interrupt the avatar mid-speech
    StopSpeaking,

    /// Upload a transcript file for analysis
    AnalyzeFile {
        path: PathBuf,
        session_id: Option<String>,
    },

    /// Force-close orphaned remote avatar sessions
    CleanupAvatarSessions,

    /// Shut down the orchestrator
    Shutdown,
}

/// Events emitted by the orchestrator
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A session is being established
    SessionStarting { session_id: String },

    /// The backend allocated its own identifier for this session
    SessionAdopted { session_id: String },

    /// Transport channel is up; audio can flow
    ChannelConnected,

    /// Transport channel dropped; no automatic reconnect
    ChannelDisconnected,

    /// Channel-level status line (backend acks, backend errors)
    ChannelStatus(String),

    /// Microphone capture started
    RecordingStarted,

    /// Microphone capture stopped
    RecordingStopped,

    /// Transcript of what the user said
    Transcript(String),

    /// Generated response text
    Response(String),

    /// Avatar credential fetch / vendor start in progress
    AvatarLoading,

    /// Avatar session live
    AvatarReady { stream: AvatarStreamInfo },

    /// Avatar initialization failed
    AvatarError(String),

    /// Avatar started or stopped talking
    AvatarSpeaking(bool),

    /// Avatar stream dropped
    AvatarDisconnected,

    /// Transcript analysis finished
    AssessmentReady(Box<Assessment>),

    /// Transcript analysis failed
    AssessmentFailed(String),

    /// Orphaned avatar sessions were closed
    CleanupFinished { sessions_closed: u32 },

    /// Session fully torn down
    SessionEnded,

    /// A component failed; the message is user-displayable
    Error(String),
}

/// Tracks the recording transition so start/stop control messages are sent
/// exactly once per matching transition, never duplicated by repeated calls
/// in the same state.
#[derive(Debug, Default)]
pub struct RecordingGate {
    active: bool,
}

impl RecordingGate {
    /// Returns true only on an idle -> recording transition
    pub fn begin(&mut self) -> bool {
        if self.active {
            false
        } else {
            self.active = true;
            true
        }
    }

    /// Returns true only on a recording -> idle transition
    pub fn end(&mut self) -> bool {
        if self.active {
            self.active = false;
            true
        } else {
            false
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Handle for controlling the orchestrator from the UI
#[derive(Clone)]
pub struct OrchestratorHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    event_rx: Receiver<SessionEvent>,
}

impl OrchestratorHandle {
    /// Send a command to the orchestrator
    pub fn send_command(&self, cmd: SessionCommand) -> Result<()> {
        self.command_tx
            .try_send(cmd)
            .map_err(|e| CaresmaError::ChannelError(format!("Failed to send command: {}", e)))
    }

    /// Try to receive an event from the orchestrator
    pub fn try_recv_event(&self) -> Option<SessionEvent> {
        self.event_rx.try_recv().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Starting,
    Active,
    Ending,
}

/// Main orchestrator that owns the session worker thread
pub struct SessionOrchestrator {
    config: AppConfig,
    command_rx: mpsc::Receiver<SessionCommand>,
    event_tx: Sender<SessionEvent>,
}

impl SessionOrchestrator {
    /// Create the orchestrator and the handle the UI keeps
    pub fn new(config: AppConfig) -> (Self, OrchestratorHandle) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (event_tx, event_rx) = bounded(256);

        let handle = OrchestratorHandle {
            command_tx,
            event_rx,
        };
        let orchestrator = Self {
            config,
            command_rx,
            event_tx,
        };
        (orchestrator, handle)
    }

    /// Start the worker thread. All session I/O is cooperatively scheduled
    /// on one current-thread runtime.
    pub fn start(self) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("session-orchestrator".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!("Failed to build session runtime: {}", e);
                        let _ = self.event_tx.try_send(SessionEvent::Error(
                            "Session error occurred. Please try again.".to_string(),
                        ));
                        return;
                    }
                };
                rt.block_on(run(self.config, self.command_rx, self.event_tx));
            })
            .map_err(|e| CaresmaError::SessionError(format!("Failed to spawn worker: {}", e)))
    }
}

async fn run(
    config: AppConfig,
    mut command_rx: mpsc::Receiver<SessionCommand>,
    event_tx: Sender<SessionEvent>,
) {
    let api = match BackendClient::new(&config.api_base_url) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create backend client: {}", e);
            let _ = event_tx.try_send(SessionEvent::Error(e.user_message()));
            return;
        }
    };

    let (channel_events_tx, mut channel_events_rx) = mpsc::channel(256);
    let (signals_tx, signals_rx) = mpsc::channel(64);
    let (avatar_events_tx, mut avatar_events_rx) = mpsc::channel(64);

    let backend = match HeygenBackend::new(
        &config.avatar_api_url,
        &config.avatar_name,
        &config.avatar_quality,
        signals_tx,
    ) {
        Ok(backend) => backend,
        Err(e) => {
            error!("Failed to create avatar backend: {}", e);
            let _ = event_tx.try_send(SessionEvent::Error(e.user_message()));
            return;
        }
    };
    let avatar = AvatarSession::new(Arc::clone(&api), Box::new(backend), signals_rx, avatar_events_tx);

    let mut worker = SessionWorker::new(config, api, avatar, channel_events_tx, event_tx);
    info!("Session orchestrator started");

    loop {
        tokio::select! {
            cmd = command_rx.recv() => match cmd {
                Some(SessionCommand::Shutdown) | None => {
                    info!("Orchestrator shutdown requested");
                    worker.end_session().await;
                    break;
                }
                Some(cmd) => worker.handle_command(cmd).await,
            },
            Some(event) = channel_events_rx.recv() => worker.handle_channel_event(event).await,
            Some(event) = avatar_events_rx.recv() => worker.handle_avatar_event(event),
        }
    }

    info!("Session orchestrator stopped");
}

/// The session state machine, separated from the runtime plumbing
struct SessionWorker {
    config: AppConfig,
    api: Arc<BackendClient>,
    avatar: AvatarSession,
    channel_events_tx: mpsc::Sender<ChannelEvent>,
    event_tx: Sender<SessionEvent>,
    lifecycle: Lifecycle,
    session_id: Option<String>,
    channel: Option<ChannelHandle>,
    recording: RecordingGate,
    #[cfg(feature = "audio-io")]
    capture: Option<AudioInput>,
}

impl SessionWorker {
    fn new(
        config: AppConfig,
        api: Arc<BackendClient>,
        avatar: AvatarSession,
        channel_events_tx: mpsc::Sender<ChannelEvent>,
        event_tx: Sender<SessionEvent>,
    ) -> Self {
        Self {
            config,
            api,
            avatar,
            channel_events_tx,
            event_tx,
            lifecycle: Lifecycle::Idle,
            session_id: None,
            channel: None,
            recording: RecordingGate::default(),
            #[cfg(feature = "audio-io")]
            capture: None,
        }
    }

    fn emit(&self, event: SessionEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            warn!("UI event queue full, dropping event: {}", e);
        }
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::StartSession => self.start_session().await,
            SessionCommand::EndSession => self.end_session().await,
            SessionCommand::StartRecording => self.start_recording(),
            SessionCommand::StopRecording => self.stop_recording(),
            SessionCommand::StopSpeaking => self.avatar.interrupt().await,
            SessionCommand::AnalyzeFile { path, session_id } => {
                self.analyze_file(path, session_id)
            }
            SessionCommand::CleanupAvatarSessions => self.cleanup_avatar_sessions(),
            SessionCommand::Shutdown => unreachable!("handled by the run loop"),
        }
    }

    async fn start_session(&mut self) {
        if self.lifecycle != Lifecycle::Idle {
            warn!("Session already in progress");
            return;
        }

        self.lifecycle = Lifecycle::Starting;
        let session_id = Uuid::new_v4().to_string();
        self.session_id = Some(session_id.clone());
        self.emit(SessionEvent::SessionStarting {
            session_id: session_id.clone(),
        });

        // Avatar and channel initialize independently; either may come up
        // first and the session is usable with whichever subset succeeded
        self.avatar.start();

        let url = self.config.session_ws_url(&session_id);
        match SessionChannel::open(&url, self.channel_events_tx.clone()).await {
            Ok(handle) => self.channel = Some(handle),
            Err(e) => {
                error!("Failed to open session channel: {}", e);
                self.emit(SessionEvent::ChannelStatus("Connection error".to_string()));
            }
        }
    }

    /// Teardown order matters: audio stops before the channel closes so
    /// nothing sends into a dead socket, and every release runs regardless
    /// of the others failing.
    async fn end_session(&mut self) {
        if self.lifecycle == Lifecycle::Idle && self.channel.is_none() {
            return;
        }
        self.lifecycle = Lifecycle::Ending;

        self.stop_recording();
        self.avatar.close().await;
        if let Some(channel) = self.channel.take() {
            channel.close();
        }

        self.session_id = None;
        self.lifecycle = Lifecycle::Idle;
        self.emit(SessionEvent::SessionEnded);
    }

    fn start_recording(&mut self) {
        let Some(channel) = self.channel.clone() else {
            self.emit(SessionEvent::Error("Not connected".to_string()));
            return;
        };
        if !channel.is_connected() {
            self.emit(SessionEvent::Error("Not connected".to_string()));
            return;
        }
        if !self.recording.begin() {
            warn!("Already recording");
            return;
        }

        #[cfg(feature = "audio-io")]
        if self.config.enable_audio_input {
            let mut capture =
                match AudioInput::new(self.config.sample_rate, self.config.frame_samples) {
                    Ok(capture) => capture,
                    Err(e) => {
                        error!("Microphone unavailable: {}", e);
                        self.recording.end();
                        self.emit(SessionEvent::Error(e.user_message()));
                        return;
                    }
                };

            let frames = channel.clone();
            if let Err(e) = capture.start(move |frame| frames.send_frame(frame)) {
                error!("Failed to start capture: {}", e);
                self.recording.end();
                self.emit(SessionEvent::Error(e.user_message()));
                return;
            }
            self.capture = Some(capture);
        }

        channel.send_control(ControlMessage::StartRecording);
        self.emit(SessionEvent::RecordingStarted);
        debug!("Recording started");
    }

    fn stop_recording(&mut self) {
        if !self.recording.end() {
            return;
        }

        #[cfg(feature = "audio-io")]
        if let Some(mut capture) = self.capture.take() {
            capture.stop();
        }

        if let Some(channel) = &self.channel {
            channel.send_control(ControlMessage::StopRecording);
        }
        self.emit(SessionEvent::RecordingStopped);
        debug!("Recording stopped");
    }

    async fn handle_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Connected => {
                if self.lifecycle == Lifecycle::Starting {
                    self.lifecycle = Lifecycle::Active;
                }
                self.emit(SessionEvent::ChannelConnected);
            }
            ChannelEvent::Inbound(inbound) => self.dispatch_inbound(inbound).await,
            ChannelEvent::ChannelError(msg) => {
                error!("Channel error: {}", msg);
                self.emit(SessionEvent::ChannelStatus("Connection error".to_string()));
            }
            ChannelEvent::Disconnected => {
                // Capture cannot continue without a channel; the guarded
                // no-op sends cover the window until it is released
                self.stop_recording();
                self.emit(SessionEvent::ChannelDisconnected);
            }
        }
    }

    /// Inbound events are dispatched in arrival order, one at a time
    async fn dispatch_inbound(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::Transcript { text } => {
                debug!("User said: {}", text);
                self.emit(SessionEvent::Transcript(text));
            }
            InboundEvent::TextResponse { text } => {
                debug!("AI response: {}", text);
                self.emit(SessionEvent::Response(text.clone()));
                if !self.avatar.speak(&text).await {
                    debug!("Avatar unavailable, response shown as text only");
                }
            }
            InboundEvent::RecordingStarted => {
                self.emit(SessionEvent::ChannelStatus("Recording...".to_string()));
            }
            InboundEvent::RecordingStopped => {
                self.emit(SessionEvent::ChannelStatus("Processing...".to_string()));
            }
            InboundEvent::SessionCreated { session_id } => {
                // The backend-supplied identifier wins for any reconnect
                info!("Adopting backend session id: {}", session_id);
                self.session_id = Some(session_id.clone());
                self.emit(SessionEvent::SessionAdopted { session_id });
            }
            InboundEvent::Error { message } => {
                error!("Backend error: {}", message);
                self.emit(SessionEvent::ChannelStatus(format!("Error: {}", message)));
            }
        }
    }

    fn handle_avatar_event(&mut self, event: AvatarEvent) {
        match event {
            AvatarEvent::Loading => self.emit(SessionEvent::AvatarLoading),
            AvatarEvent::Ready(stream) => self.emit(SessionEvent::AvatarReady { stream }),
            AvatarEvent::Failed(msg) => self.emit(SessionEvent::AvatarError(msg)),
            AvatarEvent::Signal(signal) => match signal {
                AvatarSignal::StartedTalking => self.emit(SessionEvent::AvatarSpeaking(true)),
                AvatarSignal::StoppedTalking => self.emit(SessionEvent::AvatarSpeaking(false)),
                AvatarSignal::StreamReady => {}
                AvatarSignal::StreamDisconnected => self.emit(SessionEvent::AvatarDisconnected),
            },
        }
    }

    fn analyze_file(&self, path: PathBuf, session_id: Option<String>) {
        let api = Arc::clone(&self.api);
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "transcript.txt".to_string());

            let result = match tokio::fs::read(&path).await {
                Ok(bytes) => api.analyze_file(&file_name, bytes, session_id.as_deref()).await,
                Err(e) => Err(CaresmaError::from(e)),
            };

            match result {
                Ok(assessment) => {
                    info!("Assessment completed");
                    let _ = event_tx.try_send(SessionEvent::AssessmentReady(Box::new(assessment)));
                }
                Err(e) => {
                    warn!("Assessment failed: {}", e);
                    let _ = event_tx.try_send(SessionEvent::AssessmentFailed(e.user_message()));
                }
            }
        });
    }

    fn cleanup_avatar_sessions(&self) {
        let api = Arc::clone(&self.api);
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            match api.cleanup_avatar_sessions().await {
                Ok(sessions_closed) => {
                    let _ = event_tx.try_send(SessionEvent::CleanupFinished { sessions_closed });
                }
                Err(e) => {
                    warn!("Cleanup failed: {}", e);
                    let _ = event_tx.try_send(SessionEvent::Error(e.user_message()));
                }
            }
        });
    }
}
