//! WebSocket session channel
//!
//! One full-duplex connection per session: binary PCM16 frames and JSON
//! control messages out, tagged JSON events in. There is no reconnection
//! logic here; when the connection drops the channel reports `Disconnected`
//! and recovery is left to the orchestrator and the user.

use crate::transport::events::{ControlMessage, InboundEvent};
use crate::{CaresmaError, Result};
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Capacity of the outbound message queue.
const OUTBOUND_CAPACITY: usize = 256;

/// Lifecycle and data signals emitted by an open channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected,
    Inbound(InboundEvent),
    ChannelError(String),
    Disconnected,
}

enum Outbound {
    Frame(Vec<u8>),
    Control(ControlMessage),
    Close,
}

/// Sender half of an open session channel.
///
/// Cheap to clone; safe to use from the capture callback thread. All sends
/// are non-blocking: when the channel is not connected they are logged
/// no-ops, with no buffering or retry.
#[derive(Clone)]
pub struct ChannelHandle {
    outbound_tx: mpsc::Sender<Outbound>,
    connected: Arc<AtomicBool>,
}

impl ChannelHandle {
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Send one binary PCM16 audio frame
    pub fn send_frame(&self, bytes: Vec<u8>) {
        if !self.is_connected() {
            debug!("Channel not connected, dropping audio frame");
            return;
        }
        if let Err(e) = self.outbound_tx.try_send(Outbound::Frame(bytes)) {
            debug!("Failed to queue audio frame: {}", e);
        }
    }

    /// Send a JSON control message
    pub fn send_control(&self, msg: ControlMessage) {
        if !self.is_connected() {
            warn!("Channel not connected, dropping control message {:?}", msg);
            return;
        }
        if let Err(e) = self.outbound_tx.try_send(Outbound::Control(msg)) {
            warn!("Failed to queue control message: {}", e);
        }
    }

    /// Close the channel. Idempotent; callable from any state.
    pub fn close(&self) {
        let _ = self.outbound_tx.try_send(Outbound::Close);
    }
}

/// Factory for session channels.
pub struct SessionChannel;

impl SessionChannel {
    /// Connect to the session endpoint and spawn the message pump.
    ///
    /// Emits `Connected` on success, then one event per inbound message,
    /// and a final `Disconnected` when the pump ends for any reason.
    pub async fn open(url: &str, events: mpsc::Sender<ChannelEvent>) -> Result<ChannelHandle> {
        let (ws, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| CaresmaError::TransportError(format!("Failed to connect: {}", e)))?;

        info!("Session channel connected: {}", url);

        let (sink, stream) = ws.split();
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let connected = Arc::new(AtomicBool::new(true));

        let _ = events.send(ChannelEvent::Connected).await;

        tokio::spawn(pump(sink, stream, outbound_rx, events, connected.clone()));

        Ok(ChannelHandle {
            outbound_tx,
            connected,
        })
    }
}

async fn pump<S, R>(
    mut sink: S,
    mut stream: R,
    mut outbound_rx: mpsc::Receiver<Outbound>,
    events: mpsc::Sender<ChannelEvent>,
    connected: Arc<AtomicBool>,
) where
    S: SinkExt<Message> + Unpin,
    S::Error: std::fmt::Display,
    R: StreamExt<Item = std::result::Result<Message, tokio_tungstenite::tungstenite::Error>>
        + Unpin,
{
    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => match outbound {
                Some(Outbound::Frame(bytes)) => {
                    if let Err(e) = sink.send(Message::Binary(bytes)).await {
                        error!("Failed to send audio frame: {}", e);
                        break;
                    }
                }
                Some(Outbound::Control(msg)) => {
                    let json = match serde_json::to_string(&msg) {
                        Ok(json) => json,
                        Err(e) => {
                            error!("Failed to serialize control message: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::Text(json)).await {
                        error!("Failed to send control message: {}", e);
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },

            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<InboundEvent>(&text) {
                        Ok(event) => {
                            if events.send(ChannelEvent::Inbound(event)).await.is_err() {
                                break;
                            }
                        }
                        // Malformed payloads are dropped without tearing
                        // down the channel
                        Err(e) => warn!("Dropping unparseable message: {}", e),
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = sink.send(Message::Pong(data)).await {
                        error!("Failed to send pong: {}", e);
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    info!("Session channel closed by server");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!("Session channel error: {}", e);
                    let _ = events.send(ChannelEvent::ChannelError(e.to_string())).await;
                    break;
                }
                None => break,
            },
        }
    }

    connected.store(false, Ordering::SeqCst);
    let _ = events.send(ChannelEvent::Disconnected).await;
    debug!("Session channel pump stopped");
}

/// Handle wired to in-memory receivers, for orchestrator tests that need to
/// observe outbound traffic without a live socket.
#[cfg(test)]
pub(crate) fn test_handle() -> (
    ChannelHandle,
    mpsc::Receiver<Vec<u8>>,
    mpsc::Receiver<ControlMessage>,
) {
    let (outbound_tx, mut outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
    let (frame_tx, frame_rx) = mpsc::channel(OUTBOUND_CAPACITY);
    let (control_tx, control_rx) = mpsc::channel(OUTBOUND_CAPACITY);

    tokio::spawn(async move {
        while let Some(out) = outbound_rx.recv().await {
            match out {
                Outbound::Frame(bytes) => {
                    let _ = frame_tx.send(bytes).await;
                }
                Outbound::Control(msg) => {
                    let _ = control_tx.send(msg).await;
                }
                Outbound::Close => break,
            }
        }
    });

    let handle = ChannelHandle {
        outbound_tx,
        connected: Arc::new(AtomicBool::new(true)),
    };
    (handle, frame_rx, control_rx)
}
