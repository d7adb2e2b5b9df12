//! Vendor adapter for the remote avatar service
//!
//! The avatar vendor is isolated behind this narrow interface: the four
//! signals and four operations the rest of the system consumes. Nothing
//! vendor-specific leaks past it.

use crate::Result;
use async_trait::async_trait;

/// Events the vendor raises during a live rendering session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarSignal {
    StartedTalking,
    StoppedTalking,
    StreamReady,
    StreamDisconnected,
}

/// Handle to one live remote rendering session.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarStreamInfo {
    /// Vendor-side session identifier
    pub session_id: String,
    /// Media stream locator to attach to the display surface
    pub stream_url: String,
}

/// Control-plane operations on the vendor's streaming session.
///
/// Implementations emit [`AvatarSignal`]s through the channel they were
/// constructed with. `stop` must be idempotent.
#[async_trait]
pub trait AvatarBackend: Send {
    /// Open a remote session using a short-lived credential.
    async fn start(&mut self, token: &str) -> Result<AvatarStreamInfo>;

    /// Submit text for the avatar to speak.
    async fn speak(&mut self, text: &str) -> Result<()>;

    /// Best-effort cancel of the current speech task.
    async fn interrupt(&mut self) -> Result<()>;

    /// Stop the remote session, releasing its slot. Safe to call twice.
    async fn stop(&mut self) -> Result<()>;
}
