//! Avatar session unit
//!
//! Owns one avatar slot end to end: fetches the short-lived credential from
//! the backend, starts the vendor session through the adapter, tracks
//! readiness and speaking state, and guarantees the slot is released on
//! close. Initialization is guarded by a cancellation flag so a teardown
//! racing an in-flight start never leaves stale state behind.

use crate::api::BackendClient;
use crate::avatar::backend::{AvatarBackend, AvatarSignal, AvatarStreamInfo};
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Events the unit reports to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum AvatarEvent {
    /// Credential fetch / vendor start in progress
    Loading,
    /// Vendor session live; stream handle ready for the display surface
    Ready(AvatarStreamInfo),
    /// Start failed; terminal for this attempt
    Failed(String),
    /// A vendor signal, forwarded after internal state is updated
    Signal(AvatarSignal),
}

struct AvatarInner {
    api: Arc<BackendClient>,
    backend: Mutex<Box<dyn AvatarBackend>>,
    ready: AtomicBool,
    speaking: AtomicBool,
    loading: AtomicBool,
    cancelled: AtomicBool,
    events: mpsc::Sender<AvatarEvent>,
}

/// Handle to the avatar slot. Clones share one slot.
#[derive(Clone)]
pub struct AvatarSession {
    inner: Arc<AvatarInner>,
}

impl AvatarSession {
    /// Wire up the unit: vendor signals flow in through `signals`, unit
    /// events flow out through `events`.
    pub fn new(
        api: Arc<BackendClient>,
        backend: Box<dyn AvatarBackend>,
        mut signals: mpsc::Receiver<AvatarSignal>,
        events: mpsc::Sender<AvatarEvent>,
    ) -> Self {
        let inner = Arc::new(AvatarInner {
            api,
            backend: Mutex::new(backend),
            ready: AtomicBool::new(false),
            speaking: AtomicBool::new(false),
            loading: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            events,
        });

        // Vendor signals update unit state before anyone else sees them
        let forward = Arc::clone(&inner);
        tokio::spawn(async move {
            while let Some(signal) = signals.recv().await {
                match signal {
                    AvatarSignal::StartedTalking => forward.speaking.store(true, Ordering::SeqCst),
                    AvatarSignal::StoppedTalking => forward.speaking.store(false, Ordering::SeqCst),
                    AvatarSignal::StreamReady => {}
                    AvatarSignal::StreamDisconnected => {
                        forward.ready.store(false, Ordering::SeqCst)
                    }
                }
                if forward.events.send(AvatarEvent::Signal(signal)).await.is_err() {
                    break;
                }
            }
        });

        Self { inner }
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::SeqCst)
    }

    pub fn is_speaking(&self) -> bool {
        self.inner.speaking.load(Ordering::SeqCst)
    }

    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::SeqCst)
    }

    /// Begin initialization in the background.
    ///
    /// Emits `Loading` immediately, then `Ready` or `Failed`. A second call
    /// while one is in flight is ignored.
    pub fn start(&self) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if inner.loading.swap(true, Ordering::SeqCst) {
                debug!("Avatar start already in flight");
                return;
            }
            inner.cancelled.store(false, Ordering::SeqCst);
            let _ = inner.events.send(AvatarEvent::Loading).await;

            let result = Self::run_start(&inner).await;
            inner.loading.store(false, Ordering::SeqCst);

            match result {
                Ok(Some(stream)) => {
                    info!("Avatar ready");
                    let _ = inner.events.send(AvatarEvent::Ready(stream)).await;
                }
                Ok(None) => debug!("Avatar start cancelled"),
                Err(e) => {
                    if !inner.cancelled.load(Ordering::SeqCst) {
                        warn!("Avatar initialization failed: {}", e);
                        let _ = inner.events.send(AvatarEvent::Failed(e.to_string())).await;
                    }
                }
            }
        });
    }

    async fn run_start(inner: &AvatarInner) -> Result<Option<AvatarStreamInfo>> {
        let token = inner.api.avatar_session_token().await?;

        // Checked before every state change: a completion that lost the
        // race against close() must not resurrect the unit
        if inner.cancelled.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let mut backend = inner.backend.lock().await;
        let stream = backend.start(&token).await?;

        if inner.cancelled.load(Ordering::SeqCst) {
            // The slot was opened after teardown began; release it
            let _ = backend.stop().await;
            return Ok(None);
        }

        inner.ready.store(true, Ordering::SeqCst);
        Ok(Some(stream))
    }

    /// Ask the avatar to speak. Fails fast with `false` when the unit is
    /// not ready or the text is blank; never panics or throws.
    pub async fn speak(&self, text: &str) -> bool {
        if !self.is_ready() {
            warn!("Avatar not ready, cannot speak");
            return false;
        }
        if text.trim().is_empty() {
            warn!("Empty text provided to avatar");
            return false;
        }

        match self.inner.backend.lock().await.speak(text).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Avatar speak failed: {}", e);
                false
            }
        }
    }

    /// Best-effort stop of the current speech.
    pub async fn interrupt(&self) {
        if !self.is_ready() {
            return;
        }
        if let Err(e) = self.inner.backend.lock().await.interrupt().await {
            warn!("Avatar interrupt failed: {}", e);
        }
    }

    /// Release the avatar slot. Idempotent; clears readiness and speaking
    /// state even when the vendor call fails.
    pub async fn close(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);

        if let Err(e) = self.inner.backend.lock().await.stop().await {
            warn!("Error closing avatar session: {}", e);
        }

        self.inner.ready.store(false, Ordering::SeqCst);
        self.inner.speaking.store(false, Ordering::SeqCst);
        debug!("Avatar session closed");
    }
}
