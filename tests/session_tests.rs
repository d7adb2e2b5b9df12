//! End-to-end flows through the orchestrator worker thread

use caresma::integration::{AppConfig, SessionCommand, SessionEvent, SessionOrchestrator};
use caresma::integration::OrchestratorHandle;
use caresma::ui::components::results_view::{format_score, risk_color, score_fraction};
use egui::Color32;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Poll the UI-facing event queue until `pred` matches or time runs out
async fn wait_for<F>(handle: &OrchestratorHandle, mut pred: F) -> SessionEvent
where
    F: FnMut(&SessionEvent) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        while let Some(event) = handle.try_recv_event() {
            if pred(&event) {
                return event;
            }
        }
        if Instant::now() > deadline {
            panic!("timed out waiting for event");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_transcript_upload_produces_rendered_scores() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/assessments/analyze-file"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a-1",
            "session_id": "s-1",
            "overall_score": 7.2,
            "risk_level": "moderate",
            "memory_score": 6.5,
            "language_score": 7.8,
            "executive_function_score": 7.0,
            "orientation_score": 7.5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = AppConfig {
        api_base_url: server.uri(),
        ..AppConfig::default()
    }
    .without_audio_input();

    let (orchestrator, handle) = SessionOrchestrator::new(config);
    orchestrator.start().unwrap();

    // A small transcript, as a user would upload it
    let file_path = std::env::temp_dir().join("caresma_e2e_transcript.txt");
    std::fs::write(&file_path, vec![b'x'; 2048]).unwrap();

    handle
        .send_command(SessionCommand::AnalyzeFile {
            path: file_path.clone(),
            session_id: None,
        })
        .unwrap();

    let event = wait_for(&handle, |e| matches!(e, SessionEvent::AssessmentReady(_))).await;
    let SessionEvent::AssessmentReady(assessment) = event else {
        unreachable!()
    };

    // What the results view renders from this payload
    assert_eq!(format!("{}/10", format_score(assessment.overall_score)), "7.2/10");
    let risk = assessment.risk_level.unwrap();
    assert_eq!(risk.label(), "MODERATE");
    assert_eq!(risk_color(risk), Color32::from_rgb(245, 158, 11));
    assert_eq!(score_fraction(assessment.memory_score), 0.65);

    std::fs::remove_file(&file_path).ok();
    handle.send_command(SessionCommand::Shutdown).unwrap();
}

#[tokio::test]
async fn test_live_session_flow_with_unready_avatar() {
    // One local WebSocket endpoint plays the backend's session channel
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (inbound_tx, mut inbound) = mpsc::channel::<Message>(32);

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let inbound_tx = inbound_tx.clone();
            tokio::spawn(async move {
                // The avatar token fetch also lands on this port; anything
                // that is not a WebSocket upgrade is dropped, which makes
                // the avatar fail the way an unreachable backend would
                let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };

                // Greet immediately, the way the conversational backend does
                ws.send(Message::Text(
                    r#"{"type": "text_response", "text": "Hello"}"#.to_string(),
                ))
                .await
                .unwrap();

                while let Some(Ok(msg)) = ws.next().await {
                    if matches!(msg, Message::Close(_)) {
                        break;
                    }
                    let _ = inbound_tx.send(msg).await;
                }
            });
        }
    });

    // The avatar token endpoint is unreachable on this port, so the avatar
    // fails while the channel comes up: a partial session
    let config = AppConfig {
        api_base_url: format!("http://{}", addr),
        ..AppConfig::default()
    }
    .without_audio_input();

    let (orchestrator, handle) = SessionOrchestrator::new(config);
    orchestrator.start().unwrap();

    handle.send_command(SessionCommand::StartSession).unwrap();
    wait_for(&handle, |e| matches!(e, SessionEvent::ChannelConnected)).await;

    // The backend's greeting reaches the UI even though the avatar cannot
    // speak it
    let event = wait_for(&handle, |e| matches!(e, SessionEvent::Response(_))).await;
    let SessionEvent::Response(text) = event else {
        unreachable!()
    };
    assert_eq!(text, "Hello");

    // Recording transition sends exactly one start and one stop control
    handle.send_command(SessionCommand::StartRecording).unwrap();
    wait_for(&handle, |e| matches!(e, SessionEvent::RecordingStarted)).await;
    handle.send_command(SessionCommand::StartRecording).unwrap();
    handle.send_command(SessionCommand::StopRecording).unwrap();
    wait_for(&handle, |e| matches!(e, SessionEvent::RecordingStopped)).await;

    let first = inbound.recv().await.unwrap();
    assert_eq!(
        first,
        Message::Text(r#"{"type":"start_recording"}"#.to_string())
    );
    let second = inbound.recv().await.unwrap();
    assert_eq!(
        second,
        Message::Text(r#"{"type":"stop_recording"}"#.to_string())
    );
    assert!(
        tokio::time::timeout(Duration::from_millis(300), inbound.recv())
            .await
            .is_err(),
        "no duplicate control messages"
    );

    handle.send_command(SessionCommand::EndSession).unwrap();
    wait_for(&handle, |e| matches!(e, SessionEvent::SessionEnded)).await;

    handle.send_command(SessionCommand::Shutdown).unwrap();
}
