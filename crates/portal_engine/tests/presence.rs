use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use portal_engine::{
    presence_url, AnalysisOutcome, DeleteOutcome, EngineEvent, EngineHandle, FailureKind,
    PortalService, PresenceClient, PresenceEvent, ServiceError, UploadReceipt,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use url::Url;

const HANDSHAKE: &str = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

struct Unreachable;

fn unreachable() -> ServiceError {
    ServiceError {
        kind: FailureKind::Network,
        message: "not used".to_string(),
    }
}

#[async_trait::async_trait]
impl PortalService for Unreachable {
    async fn analyze(&self, _identifier: &str) -> Result<AnalysisOutcome, ServiceError> {
        Err(unreachable())
    }

    async fn delete(&self, _identifier: &str) -> Result<DeleteOutcome, ServiceError> {
        Err(unreachable())
    }

    async fn upload(&self, _roll_no: &str, _file: &Path) -> Result<UploadReceipt, ServiceError> {
        Err(unreachable())
    }

    async fn download(&self, _identifier: &str) -> Result<Vec<u8>, ServiceError> {
        Err(unreachable())
    }
}

async fn bind() -> (TcpListener, Url) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
    (listener, presence_url(&base).unwrap())
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.unwrap();
    tokio_tungstenite::accept_async(stream).await.unwrap()
}

async fn next_text(ws: &mut WebSocketStream<TcpStream>) -> String {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return text.as_str().to_owned(),
            Some(Ok(_)) => continue,
            other => panic!("channel ended early: {other:?}"),
        }
    }
}

fn engine_with_presence(dir: &TempDir, url: Url) -> EngineHandle {
    EngineHandle::with_service(
        Arc::new(Unreachable),
        dir.path().to_path_buf(),
        Some(PresenceClient::new(url, Duration::from_secs(5))),
    )
}

/// Collects presence events until the channel reports closed, announcing
/// presence as soon as it opens the way the console does.
async fn presence_events(engine: &EngineHandle) -> Vec<PresenceEvent> {
    let start = Instant::now();
    let mut events = Vec::new();
    while start.elapsed() < Duration::from_secs(5) {
        match engine.try_recv() {
            Some(EngineEvent::Presence(event)) => {
                let closed = matches!(event, PresenceEvent::Closed { .. });
                if event == PresenceEvent::Opened {
                    engine.announce_presence();
                }
                events.push(event);
                if closed {
                    break;
                }
            }
            Some(other) => panic!("unexpected event {other:?}"),
            None => tokio::time::sleep(Duration::from_millis(10)).await,
        }
    }
    events
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn relays_counts_and_answers_the_server() {
    engine_logging::initialize_for_tests();
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        let mut sent_by_client = Vec::new();

        ws.send(Message::text(HANDSHAKE)).await.unwrap();
        sent_by_client.push(next_text(&mut ws).await);
        ws.send(Message::text(r#"40{"sid":"def"}"#)).await.unwrap();
        sent_by_client.push(next_text(&mut ws).await);

        ws.send(Message::text(r#"42["user_count",{"count":7}]"#))
            .await
            .unwrap();
        ws.send(Message::text("garbage")).await.unwrap();
        ws.send(Message::text(r#"42["user_count",{"count":3}]"#))
            .await
            .unwrap();
        ws.send(Message::text("2")).await.unwrap();
        sent_by_client.push(next_text(&mut ws).await);

        let _ = ws.close(None).await;
        sent_by_client
    });

    let dir = TempDir::new().unwrap();
    let engine = engine_with_presence(&dir, url);
    let events = presence_events(&engine).await;
    let sent_by_client = server.await.unwrap();

    assert_eq!(sent_by_client, vec!["40", r#"42["user_connected"]"#, "3"]);
    assert_eq!(
        events,
        vec![
            PresenceEvent::Opened,
            PresenceEvent::Count(7),
            PresenceEvent::Count(3),
            PresenceEvent::Closed { reason: None },
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn refused_connect_closes_with_a_reason() {
    engine_logging::initialize_for_tests();
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        ws.send(Message::text(HANDSHAKE)).await.unwrap();
        let connect = next_text(&mut ws).await;
        ws.send(Message::text(r#"44{"message":"not allowed"}"#))
            .await
            .unwrap();
        connect
    });

    let dir = TempDir::new().unwrap();
    let engine = engine_with_presence(&dir, url);
    let events = presence_events(&engine).await;

    assert_eq!(server.await.unwrap(), "40");
    match events.as_slice() {
        [PresenceEvent::Closed {
            reason: Some(reason),
        }] => assert!(reason.contains("not allowed"), "{reason}"),
        other => panic!("unexpected presence events {other:?}"),
    }
}
