//! HTTP/WebSocket control surface for the tracker.
//!
//! This module binds the logical endpoint contracts to axum:
//! - `GET /health`: liveness and version
//! - `GET /data`: aggregated time per category, longest first
//! - `GET /status`: pause flag, startup/last-activity times, client count
//! - `POST /toggle_pause`: flip the pause flag and broadcast an update
//! - `POST /shutdown`: broadcast a shutdown notice, then stop after a grace
//!   delay
//! - `GET /ws`: live update subscription; connecting immediately delivers
//!   one update, and the inbound text `toggle_pause` flips the flag

use crate::aggregate::{format_hms, AggregationService};
use crate::hub::{BroadcastHub, CategoryTime, Update};
use crate::state::{StatusSnapshot, TrackerState};
use axum::{
    extract::ws::{Message, WebSocket},
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: String,
    /// Port to bind to (0 for random)
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// Shared server state handed to every handler.
pub struct AppState {
    pub state: Arc<TrackerState>,
    pub hub: Arc<BroadcastHub>,
    pub aggregator: Arc<AggregationService>,
    /// Fires once per accepted shutdown request; the binary listens on the
    /// other end and performs the actual stop.
    pub shutdown_requests: mpsc::UnboundedSender<()>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Response from the pause toggle endpoint
#[derive(Serialize)]
pub struct ToggleResponse {
    pub success: bool,
    pub is_paused: bool,
}

/// Response from the shutdown endpoint
#[derive(Serialize)]
pub struct ShutdownResponse {
    pub success: bool,
    pub message: String,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /data
async fn data(State(app): State<Arc<AppState>>) -> Json<Vec<CategoryTime>> {
    let activities = app
        .aggregator
        .aggregate()
        .into_iter()
        .map(|(category, total)| CategoryTime {
            category,
            time_str: format_hms(total),
        })
        .collect();
    Json(activities)
}

/// GET /status
async fn status(State(app): State<Arc<AppState>>) -> Json<StatusSnapshot> {
    Json(app.state.status())
}

/// POST /toggle_pause
async fn toggle_pause(State(app): State<Arc<AppState>>) -> Json<ToggleResponse> {
    let is_paused = app.state.toggle_pause();
    tracing::info!(
        "Activity tracking {}",
        if is_paused { "paused" } else { "resumed" }
    );
    app.hub.notify_update();
    Json(ToggleResponse {
        success: true,
        is_paused,
    })
}

/// POST /shutdown
///
/// Accepts the request and hands it to the binary's shutdown path, which
/// broadcasts the notice and stops after a grace delay. The response goes
/// out before the server is torn down.
async fn shutdown(State(app): State<Arc<AppState>>) -> Json<ShutdownResponse> {
    tracing::info!("Shutdown request received");
    let _ = app.shutdown_requests.send(());

    Json(ShutdownResponse {
        success: true,
        message: "Server shutting down...".to_string(),
    })
}

/// GET /ws
async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(app): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app))
}

async fn handle_socket(socket: WebSocket, app: Arc<AppState>) {
    let id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel::<Update>();
    app.hub.subscribe(id, tx);
    tracing::info!("Subscriber {id} connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Forward hub updates to the socket until either side closes.
    let mut send_task = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&update) else {
                continue;
            };
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let recv_app = Arc::clone(&app);
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            match msg {
                Message::Text(text) if text.trim() == "toggle_pause" => {
                    let is_paused = recv_app.state.toggle_pause();
                    tracing::info!(
                        "Activity tracking {} (websocket)",
                        if is_paused { "paused" } else { "resumed" }
                    );
                    recv_app.hub.notify_update();
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    app.hub.unsubscribe(id);
    tracing::info!("Subscriber {id} disconnected");
}

/// Build the router with all control-surface routes.
pub fn router(app: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/data", get(data))
        .route("/status", get(status))
        .route("/toggle_pause", post(toggle_pause))
        .route("/shutdown", post(shutdown))
        .route("/ws", get(ws_upgrade))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app)
}

/// Run the HTTP server.
///
/// Returns the bound address and a sender that stops the server when fired.
pub async fn run(
    config: ServerConfig,
    app: Arc<AppState>,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let router = router(app);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Control server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
