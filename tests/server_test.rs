//! Integration tests for the tracker's HTTP/WebSocket control surface.

use activity_tracker::aggregate::AggregationService;
use activity_tracker::hub::BroadcastHub;
use activity_tracker::log::{ActivitySample, CsvLog, PersistentLog};
use activity_tracker::server::{run, AppState, ServerConfig};
use activity_tracker::state::TrackerState;
use chrono::{Duration as ChronoDuration, Utc};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message as WsMessage;

struct TestServer {
    addr: SocketAddr,
    shutdown: tokio::sync::oneshot::Sender<()>,
    shutdown_requests: tokio::sync::mpsc::UnboundedReceiver<()>,
    log_path: PathBuf,
}

/// Start a server on a random port over a log seeded with the given
/// (app, title, category) rows, two seconds apart.
async fn start_test_server(rows: &[(&str, &str, &str)]) -> TestServer {
    let log_path = std::env::temp_dir().join(format!(
        "activity-tracker-server-test-{}.csv",
        uuid::Uuid::new_v4()
    ));
    let log = CsvLog::new(log_path.clone());
    log.initialize().expect("Failed to initialize log");

    let base = Utc::now();
    for (i, (app, title, category)) in rows.iter().enumerate() {
        log.append(&ActivitySample {
            timestamp: base + ChronoDuration::seconds(2 * i as i64),
            app_name: app.to_string(),
            window_title: title.to_string(),
            category: category.to_string(),
        })
        .expect("Failed to seed log");
    }

    let log: Arc<dyn PersistentLog> = Arc::new(log);
    let interval = Duration::from_secs(2);
    let state = Arc::new(TrackerState::new());
    let hub = Arc::new(BroadcastHub::new(
        Arc::clone(&state),
        AggregationService::new(Arc::clone(&log), interval),
    ));
    let (shutdown_req_tx, shutdown_requests) = tokio::sync::mpsc::unbounded_channel();

    let app = Arc::new(AppState {
        state,
        hub,
        aggregator: Arc::new(AggregationService::new(log, interval)),
        shutdown_requests: shutdown_req_tx,
    });

    let (addr, shutdown) = run(ServerConfig::new("127.0.0.1", 0), app)
        .await
        .expect("Failed to start server");

    // Give server time to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    TestServer {
        addr,
        shutdown,
        shutdown_requests,
        log_path,
    }
}

impl TestServer {
    fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = std::fs::remove_file(&self.log_path);
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = start_test_server(&[]).await;

    let response = reqwest::get(format!("http://{}/health", server.addr))
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert!(body["version"].as_str().is_some());

    server.stop();
}

#[tokio::test]
async fn test_data_endpoint_sorted_longest_first() {
    let server = start_test_server(&[
        ("Code", "main.rs", "Programming - Code"),
        ("Code", "lib.rs", "Programming - Code"),
        ("Slack", "general", "Communication - Slack"),
        ("Code", "mod.rs", "Programming - Code"),
    ])
    .await;

    let response = reqwest::get(format!("http://{}/data", server.addr))
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let rows = body.as_array().expect("Expected an array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["category"], "Programming - Code");
    assert_eq!(rows[0]["time_str"], "00:00:06");
    assert_eq!(rows[1]["category"], "Communication - Slack");
    assert_eq!(rows[1]["time_str"], "00:00:02");

    server.stop();
}

#[tokio::test]
async fn test_status_and_toggle_pause() {
    let server = start_test_server(&[]).await;
    let client = reqwest::Client::new();

    let status: serde_json::Value = client
        .get(format!("http://{}/status", server.addr))
        .send()
        .await
        .expect("Failed to get status")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(status["is_paused"], false);
    assert_eq!(status["connected_clients"], 0);
    assert!(status["last_activity"].is_null());

    let toggled: serde_json::Value = client
        .post(format!("http://{}/toggle_pause", server.addr))
        .send()
        .await
        .expect("Failed to toggle pause")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(toggled["success"], true);
    assert_eq!(toggled["is_paused"], true);

    let status: serde_json::Value = client
        .get(format!("http://{}/status", server.addr))
        .send()
        .await
        .expect("Failed to get status")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(status["is_paused"], true);

    server.stop();
}

#[tokio::test]
async fn test_shutdown_endpoint_fires_request() {
    let mut server = start_test_server(&[]).await;

    let response: serde_json::Value = reqwest::Client::new()
        .post(format!("http://{}/shutdown", server.addr))
        .send()
        .await
        .expect("Failed to request shutdown")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(response["success"], true);

    tokio::time::timeout(Duration::from_secs(1), server.shutdown_requests.recv())
        .await
        .expect("Shutdown request never arrived")
        .expect("Shutdown channel closed");

    server.stop();
}

#[tokio::test]
async fn test_websocket_subscriber_receives_immediate_update() {
    let server = start_test_server(&[("Code", "main.rs", "Programming - Code")]).await;

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", server.addr))
        .await
        .expect("Failed to connect websocket");

    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("No update received")
        .expect("Socket closed")
        .expect("Socket error");
    let text = msg.into_text().expect("Expected text frame");
    let update: serde_json::Value = serde_json::from_str(&text).expect("Failed to parse JSON");

    assert_eq!(update["type"], "activity_update");
    assert_eq!(update["activities"][0]["category"], "Programming - Code");
    assert_eq!(update["status"]["connected_clients"], 1);

    server.stop();
}

#[tokio::test]
async fn test_websocket_toggle_pause_broadcasts_new_status() {
    let server = start_test_server(&[]).await;

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", server.addr))
        .await
        .expect("Failed to connect websocket");

    // Drain the initial update.
    let _ = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("No initial update");

    ws.send(WsMessage::Text("toggle_pause".to_string()))
        .await
        .expect("Failed to send toggle");

    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("No update after toggle")
        .expect("Socket closed")
        .expect("Socket error");
    let update: serde_json::Value =
        serde_json::from_str(&msg.into_text().expect("Expected text frame"))
            .expect("Failed to parse JSON");

    assert_eq!(update["type"], "activity_update");
    assert_eq!(update["status"]["is_paused"], true);

    server.stop();
}
