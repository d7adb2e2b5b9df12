//! Session channel integration tests against a local WebSocket server

use caresma::transport::{ChannelEvent, ControlMessage, InboundEvent, SessionChannel};
use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

type ServerSocket = WebSocketStream<TcpStream>;

/// Accept one connection and run the given server-side script on it.
async fn start_server<F, Fut>(script: F) -> String
where
    F: FnOnce(ServerSocket) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        script(ws).await;
    });
    format!("ws://{}/api/v1/ws/session/test", addr)
}

async fn next_event(events: &mut mpsc::Receiver<ChannelEvent>) -> ChannelEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for channel event")
        .expect("event stream ended")
}

#[tokio::test]
async fn test_connect_then_receive_events_in_order() {
    let url = start_server(|mut ws| async move {
        ws.send(Message::Text(
            r#"{"type": "transcript", "text": "hello"}"#.to_string(),
        ))
        .await
        .unwrap();
        ws.send(Message::Text(
            r#"{"type": "text_response", "text": "hi there"}"#.to_string(),
        ))
        .await
        .unwrap();
        // Keep the connection open until the client is done
        while ws.next().await.is_some() {}
    })
    .await;

    let (events_tx, mut events) = mpsc::channel(32);
    let handle = SessionChannel::open(&url, events_tx).await.unwrap();

    assert_eq!(next_event(&mut events).await, ChannelEvent::Connected);
    assert!(handle.is_connected());

    assert_eq!(
        next_event(&mut events).await,
        ChannelEvent::Inbound(InboundEvent::Transcript {
            text: "hello".to_string()
        })
    );
    assert_eq!(
        next_event(&mut events).await,
        ChannelEvent::Inbound(InboundEvent::TextResponse {
            text: "hi there".to_string()
        })
    );

    handle.close();
}

#[tokio::test]
async fn test_malformed_payloads_are_dropped_silently() {
    let url = start_server(|mut ws| async move {
        ws.send(Message::Text("this is not json".to_string()))
            .await
            .unwrap();
        ws.send(Message::Text(r#"{"type": "mystery_event"}"#.to_string()))
            .await
            .unwrap();
        // Channel must still be alive to deliver this one
        ws.send(Message::Text(
            r#"{"type": "session_created", "session_id": "s-9"}"#.to_string(),
        ))
        .await
        .unwrap();
        while ws.next().await.is_some() {}
    })
    .await;

    let (events_tx, mut events) = mpsc::channel(32);
    let handle = SessionChannel::open(&url, events_tx).await.unwrap();
    assert_eq!(next_event(&mut events).await, ChannelEvent::Connected);

    assert_eq!(
        next_event(&mut events).await,
        ChannelEvent::Inbound(InboundEvent::SessionCreated {
            session_id: "s-9".to_string()
        })
    );

    handle.close();
}

#[tokio::test]
async fn test_outbound_controls_and_frames_reach_server() {
    let (seen_tx, mut seen) = mpsc::channel::<Message>(32);
    let url = start_server(move |mut ws| async move {
        while let Some(Ok(msg)) = ws.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
            let _ = seen_tx.send(msg).await;
        }
    })
    .await;

    let (events_tx, mut events) = mpsc::channel(32);
    let handle = SessionChannel::open(&url, events_tx).await.unwrap();
    assert_eq!(next_event(&mut events).await, ChannelEvent::Connected);

    handle.send_control(ControlMessage::StartRecording);
    handle.send_frame(vec![1, 2, 3, 4]);
    handle.send_control(ControlMessage::StopRecording);

    let first = seen.recv().await.unwrap();
    assert_eq!(
        first,
        Message::Text(r#"{"type":"start_recording"}"#.to_string())
    );

    let second = seen.recv().await.unwrap();
    assert_eq!(second, Message::Binary(vec![1, 2, 3, 4]));

    let third = seen.recv().await.unwrap();
    assert_eq!(
        third,
        Message::Text(r#"{"type":"stop_recording"}"#.to_string())
    );

    handle.close();
}

#[tokio::test]
async fn test_server_close_surfaces_disconnected() {
    let url = start_server(|mut ws| async move {
        ws.send(Message::Close(None)).await.unwrap();
    })
    .await;

    let (events_tx, mut events) = mpsc::channel(32);
    let handle = SessionChannel::open(&url, events_tx).await.unwrap();
    assert_eq!(next_event(&mut events).await, ChannelEvent::Connected);
    assert_eq!(next_event(&mut events).await, ChannelEvent::Disconnected);

    assert!(!handle.is_connected());
    // Sends into the dead channel are guarded no-ops
    handle.send_frame(vec![0u8; 8]);
    handle.send_control(ControlMessage::StopRecording);
    handle.close();
}

#[tokio::test]
async fn test_client_close_is_clean_and_idempotent() {
    let url = start_server(|mut ws| async move {
        while ws.next().await.is_some() {}
    })
    .await;

    let (events_tx, mut events) = mpsc::channel(32);
    let handle = SessionChannel::open(&url, events_tx).await.unwrap();
    assert_eq!(next_event(&mut events).await, ChannelEvent::Connected);

    handle.close();
    handle.close();

    assert_eq!(next_event(&mut events).await, ChannelEvent::Disconnected);
    assert!(!handle.is_connected());
}
