//! HeyGen streaming-avatar backend
//!
//! Control-plane client for HeyGen's streaming API: `streaming.new` +
//! `streaming.start` open a session, `streaming.task` submits speech,
//! `streaming.interrupt` cancels it, `streaming.stop` releases the slot.
//! The media plane (WebRTC) is not consumed here; the stream URL from
//! session creation is handed to the display surface as-is.

use crate::avatar::backend::{AvatarBackend, AvatarSignal, AvatarStreamInfo};
use crate::{CaresmaError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Fallback speech duration when the vendor omits one
const DEFAULT_TASK_DURATION: Duration = Duration::from_millis(1500);

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct NewSessionData {
    session_id: String,
    url: String,
}

#[derive(Deserialize)]
struct TaskData {
    #[serde(default)]
    duration_ms: Option<f64>,
}

struct ActiveSession {
    session_id: String,
    token: String,
}

/// HeyGen implementation of the avatar adapter.
pub struct HeygenBackend {
    http: Client,
    api_url: String,
    avatar_name: String,
    quality: String,
    signals: mpsc::Sender<AvatarSignal>,
    active: Option<ActiveSession>,
}

impl HeygenBackend {
    pub fn new(
        api_url: impl Into<String>,
        avatar_name: impl Into<String>,
        quality: impl Into<String>,
        signals: mpsc::Sender<AvatarSignal>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CaresmaError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            avatar_name: avatar_name.into(),
            quality: quality.into(),
            signals,
            active: None,
        })
    }

    async fn post(
        &self,
        endpoint: &str,
        token: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(format!("{}/{}", self.api_url, endpoint))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| CaresmaError::AvatarError(format!("{} failed: {}", endpoint, e)))?;

        if !response.status().is_success() {
            return Err(CaresmaError::AvatarError(format!(
                "{} failed with status {}",
                endpoint,
                response.status()
            )));
        }
        Ok(response)
    }

    fn emit(&self, signal: AvatarSignal) {
        if self.signals.try_send(signal).is_err() {
            debug!("Avatar signal receiver gone, dropping {:?}", signal);
        }
    }
}

#[async_trait]
impl AvatarBackend for HeygenBackend {
    async fn start(&mut self, token: &str) -> Result<AvatarStreamInfo> {
        info!("Creating avatar session ({})", self.avatar_name);

        let response = self
            .post(
                "streaming.new",
                token,
                json!({
                    "quality": self.quality,
                    "avatar_name": self.avatar_name,
                }),
            )
            .await?;

        let session: Envelope<NewSessionData> = response
            .json()
            .await
            .map_err(|e| CaresmaError::AvatarError(format!("Invalid session response: {}", e)))?;

        self.post(
            "streaming.start",
            token,
            json!({ "session_id": session.data.session_id }),
        )
        .await?;

        info!("Avatar session started: {}", session.data.session_id);

        self.active = Some(ActiveSession {
            session_id: session.data.session_id.clone(),
            token: token.to_string(),
        });
        self.emit(AvatarSignal::StreamReady);

        Ok(AvatarStreamInfo {
            session_id: session.data.session_id,
            stream_url: session.data.url,
        })
    }

    async fn speak(&mut self, text: &str) -> Result<()> {
        let active = self
            .active
            .as_ref()
            .ok_or_else(|| CaresmaError::AvatarError("No active avatar session".into()))?;

        let result = self
            .post(
                "streaming.task",
                &active.token,
                json!({
                    "session_id": active.session_id,
                    "text": text,
                    "task_type": "repeat",
                }),
            )
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                // A rejected task usually means the remote session is gone
                warn!("Speak task rejected, marking stream disconnected");
                self.active = None;
                self.emit(AvatarSignal::StreamDisconnected);
                return Err(e);
            }
        };

        let task: Envelope<TaskData> = response
            .json()
            .await
            .map_err(|e| CaresmaError::AvatarError(format!("Invalid task response: {}", e)))?;

        self.emit(AvatarSignal::StartedTalking);

        // The vendor reports how long the rendered speech runs; raise the
        // stop signal when it elapses
        let duration = task
            .data
            .duration_ms
            .map(|ms| Duration::from_millis(ms.max(0.0) as u64))
            .unwrap_or(DEFAULT_TASK_DURATION);
        let signals = self.signals.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = signals.send(AvatarSignal::StoppedTalking).await;
        });

        Ok(())
    }

    async fn interrupt(&mut self) -> Result<()> {
        let active = self
            .active
            .as_ref()
            .ok_or_else(|| CaresmaError::AvatarError("No active avatar session".into()))?;

        self.post(
            "streaming.interrupt",
            &active.token,
            json!({ "session_id": active.session_id }),
        )
        .await?;

        self.emit(AvatarSignal::StoppedTalking);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(active) = self.active.take() else {
            return Ok(());
        };

        self.post(
            "streaming.stop",
            &active.token,
            json!({ "session_id": active.session_id }),
        )
        .await?;

        info!("Avatar session stopped: {}", active.session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn backend_with_server() -> (HeygenBackend, MockServer, mpsc::Receiver<AvatarSignal>) {
        let server = MockServer::start().await;
        let (tx, rx) = mpsc::channel(16);
        let backend = HeygenBackend::new(server.uri(), "default", "medium", tx).unwrap();
        (backend, server, rx)
    }

    #[tokio::test]
    async fn test_start_opens_and_starts_session() {
        let (mut backend, server, mut signals) = backend_with_server().await;

        Mock::given(method("POST"))
            .and(path("/streaming.new"))
            .and(body_partial_json(json!({ "avatar_name": "default" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "session_id": "av-1", "url": "wss://stream.example/av-1" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/streaming.start"))
            .and(body_partial_json(json!({ "session_id": "av-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
            .expect(1)
            .mount(&server)
            .await;

        let stream = backend.start("tok-1").await.unwrap();
        assert_eq!(stream.session_id, "av-1");
        assert_eq!(stream.stream_url, "wss://stream.example/av-1");
        assert_eq!(signals.recv().await.unwrap(), AvatarSignal::StreamReady);
    }

    #[tokio::test]
    async fn test_speak_signals_talking_lifecycle() {
        let (mut backend, server, mut signals) = backend_with_server().await;

        Mock::given(method("POST"))
            .and(path("/streaming.new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "session_id": "av-2", "url": "wss://stream.example/av-2" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/streaming.start"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/streaming.task"))
            .and(body_partial_json(json!({ "text": "Hello", "task_type": "repeat" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "duration_ms": 10.0 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        backend.start("tok-2").await.unwrap();
        assert_eq!(signals.recv().await.unwrap(), AvatarSignal::StreamReady);

        backend.speak("Hello").await.unwrap();
        assert_eq!(signals.recv().await.unwrap(), AvatarSignal::StartedTalking);
        assert_eq!(signals.recv().await.unwrap(), AvatarSignal::StoppedTalking);
    }

    #[tokio::test]
    async fn test_speak_without_session_fails() {
        let (mut backend, _server, _signals) = backend_with_server().await;
        assert!(backend.speak("Hello").await.is_err());
    }

    #[tokio::test]
    async fn test_rejected_speak_marks_stream_disconnected() {
        let (mut backend, server, mut signals) = backend_with_server().await;

        Mock::given(method("POST"))
            .and(path("/streaming.new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "session_id": "av-3", "url": "wss://stream.example/av-3" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/streaming.start"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/streaming.task"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&server)
            .await;

        backend.start("tok-3").await.unwrap();
        assert_eq!(signals.recv().await.unwrap(), AvatarSignal::StreamReady);

        assert!(backend.speak("Hello").await.is_err());
        assert_eq!(
            signals.recv().await.unwrap(),
            AvatarSignal::StreamDisconnected
        );

        // Session is gone; further speaks fail fast without HTTP traffic
        assert!(backend.speak("again").await.is_err());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (mut backend, server, mut signals) = backend_with_server().await;

        Mock::given(method("POST"))
            .and(path("/streaming.new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "session_id": "av-4", "url": "wss://stream.example/av-4" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/streaming.start"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/streaming.stop"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
            .expect(1)
            .mount(&server)
            .await;

        backend.start("tok-4").await.unwrap();
        assert_eq!(signals.recv().await.unwrap(), AvatarSignal::StreamReady);

        backend.stop().await.unwrap();
        backend.stop().await.unwrap();
    }
}
