//! Websocket push server.
//!
//! Dashboards connect to `/ws`. Each new fleet snapshot is pushed as a
//! `miner_data` frame with a fresh ack id; the dashboard's ack string is
//! logged. `pause` and `light` command frames coming back from
//! dashboards are logged and, for `pause`, acknowledged with
//! `{"ip": ..., "result": "success"}`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use minerview_core::Snapshot;
use minerview_ws::{Frame, PauseCommand, EVENT_LIGHT, EVENT_PAUSE};

use crate::config::AgentConfig;
use crate::error::AgentResult;

/// Connection limiter to prevent too many concurrent dashboards.
pub struct ConnectionLimiter {
    current: AtomicUsize,
    max: usize,
}

impl ConnectionLimiter {
    pub fn new(max: usize) -> Self {
        Self {
            current: AtomicUsize::new(0),
            max,
        }
    }

    pub fn try_acquire(&self) -> Option<ConnectionGuard<'_>> {
        loop {
            let current = self.current.load(Ordering::Acquire);
            if current >= self.max {
                return None;
            }
            if self
                .current
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(ConnectionGuard { limiter: self });
            }
        }
    }

    pub fn current_count(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }
}

pub struct ConnectionGuard<'a> {
    limiter: &'a ConnectionLimiter,
}

impl Drop for ConnectionGuard<'_> {
    fn drop(&mut self) {
        self.limiter.current.fetch_sub(1, Ordering::Release);
    }
}

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    snapshot_tx: broadcast::Sender<Snapshot>,
    connection_limiter: Arc<ConnectionLimiter>,
}

impl AppState {
    pub fn new(snapshot_tx: broadcast::Sender<Snapshot>, config: &AgentConfig) -> Self {
        Self {
            snapshot_tx,
            connection_limiter: Arc::new(ConnectionLimiter::new(config.max_connections)),
        }
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(state)
}

/// Run the push server until the process exits.
pub async fn run_server(
    snapshot_tx: broadcast::Sender<Snapshot>,
    config: &AgentConfig,
) -> AgentResult<()> {
    let state = AppState::new(snapshot_tx, config);
    let router = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "Agent push server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

/// WebSocket upgrade handler.
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    if state.connection_limiter.try_acquire().is_none() {
        warn!(
            current = state.connection_limiter.current_count(),
            "Dashboard connection limit reached"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Too many connections").into_response();
    }
    // The guard from the probe above is dropped here; the connection
    // task re-acquires and holds its own slot for its lifetime.

    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Handle one dashboard connection.
async fn handle_ws_connection(socket: WebSocket, state: AppState) {
    let _guard = match state.connection_limiter.try_acquire() {
        Some(guard) => guard,
        None => {
            warn!("Connection limit reached during upgrade");
            return;
        }
    };

    info!(
        connections = state.connection_limiter.current_count(),
        "Dashboard connected"
    );

    let (mut sender, mut receiver) = socket.split();
    let mut snapshot_rx = state.snapshot_tx.subscribe();
    let mut ack_seq: u64 = 1;

    loop {
        tokio::select! {
            result = snapshot_rx.recv() => {
                match result {
                    Ok(snapshot) => {
                        let payload = match snapshot.to_payload() {
                            Ok(payload) => payload,
                            Err(e) => {
                                warn!(error = %e, "Failed to serialize snapshot");
                                continue;
                            }
                        };
                        let frame = Frame::miner_data(payload, ack_seq);
                        ack_seq += 1;

                        let Ok(text) = serde_json::to_string(&frame) else { continue };
                        if sender.send(Message::Text(text.into())).await.is_err() {
                            debug!("Failed to push snapshot, dashboard disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "Dashboard lagged, catching up");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Snapshot channel closed");
                        break;
                    }
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_dashboard_frame(&text) {
                            let Ok(out) = serde_json::to_string(&reply) else { continue };
                            if sender.send(Message::Text(out.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!("Dashboard sent close frame");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "WebSocket receive error");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    info!(
        connections = state.connection_limiter.current_count().saturating_sub(1),
        "Dashboard disconnected"
    );
}

/// Route one frame from a dashboard, returning an optional reply.
fn handle_dashboard_frame(text: &str) -> Option<Frame> {
    let frame: Frame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "Unparseable dashboard frame");
            return None;
        }
    };

    if frame.is_ack() {
        debug!(ack = ?frame.ack, data = ?frame.data, "Dashboard acknowledged");
        return None;
    }

    match frame.event.as_str() {
        EVENT_PAUSE => {
            let command: PauseCommand = match serde_json::from_value(frame.data.clone()) {
                Ok(command) => command,
                Err(e) => {
                    warn!(error = %e, "Malformed pause command");
                    return None;
                }
            };
            info!(ip = %command.ip, "Pausing miner");

            frame.ack.map(|ack_id| {
                Frame::ack(
                    ack_id,
                    serde_json::json!({ "ip": command.ip, "result": "success" }),
                )
            })
        }
        EVENT_LIGHT => {
            match frame.data.as_str() {
                Some(ip) => info!(%ip, "Toggling miner light"),
                None => warn!("Malformed light command"),
            }
            None
        }
        other => {
            debug!(event = %other, "Ignoring unknown dashboard event");
            None
        }
    }
}
