//! WebSocket connection manager.
//!
//! Handles connection lifecycle, automatic reconnection with exponential
//! backoff, inbound event routing and ack replies. Snapshots are
//! forwarded to the renderer channel strictly in arrival order; a
//! payload that fails to parse drops that render cycle only.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{mpsc, Mutex as TokioMutex};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use minerview_core::Snapshot;

use crate::command::CommandHandle;
use crate::error::{WsError, WsResult};
use crate::frame::{CommandOutcome, Frame, PauseReply, EVENT_MINER_DATA, MINER_DATA_ACK};

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// WebSocket URL of the agent, e.g. `ws://127.0.0.1:8080/ws`.
    pub url: String,
    /// Maximum reconnection attempts (0 = infinite).
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential backoff.
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for exponential backoff.
    pub reconnect_max_delay_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080/ws".to_string(),
            max_reconnect_attempts: 0, // Infinite
            reconnect_base_delay_ms: 1000,
            reconnect_max_delay_ms: 60000,
        }
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// WebSocket connection manager.
pub struct ConnectionManager {
    config: ConnectionConfig,
    state: Arc<RwLock<ConnectionState>>,
    snapshot_tx: mpsc::Sender<Snapshot>,
    reconnect_count: Arc<RwLock<u32>>,
    /// Pending pause acks: ack id -> target address.
    pending_acks: Arc<Mutex<HashMap<u64, String>>>,
    ack_seq: Arc<AtomicU64>,
    /// Outbound frame sender (for CommandHandle and ack replies).
    outbound_tx: mpsc::Sender<Frame>,
    /// Outbound frame receiver (consumed by message loop).
    outbound_rx: Arc<TokioMutex<mpsc::Receiver<Frame>>>,
    /// Cancellation token for graceful shutdown.
    shutdown_token: CancellationToken,
}

impl ConnectionManager {
    /// Create a new connection manager. Parsed snapshots are delivered
    /// on `snapshot_tx` in arrival order.
    pub fn new(config: ConnectionConfig, snapshot_tx: mpsc::Sender<Snapshot>) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(100);
        Self {
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            snapshot_tx,
            reconnect_count: Arc::new(RwLock::new(0)),
            pending_acks: Arc::new(Mutex::new(HashMap::new())),
            ack_seq: Arc::new(AtomicU64::new(1)),
            outbound_tx,
            outbound_rx: Arc::new(TokioMutex::new(outbound_rx)),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Get a command handle for emitting `pause` / `light` frames.
    ///
    /// The handle can be cloned and shared across tasks. It is
    /// channel-based and reconnect-safe.
    pub fn command_handle(&self) -> CommandHandle {
        CommandHandle::new(
            self.outbound_tx.clone(),
            self.state.clone(),
            self.pending_acks.clone(),
            self.ack_seq.clone(),
        )
    }

    /// Get current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Signal graceful shutdown.
    pub fn shutdown(&self) {
        info!("ConnectionManager shutdown requested");
        self.shutdown_token.cancel();
    }

    /// Check if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Connect to the agent and run the message loop, reconnecting on
    /// failure until shutdown.
    pub async fn connect(&self) -> WsResult<()> {
        let mut attempt = 0u32;

        loop {
            if self.is_shutdown() {
                info!("Shutdown requested, exiting connect loop");
                *self.state.write() = ConnectionState::Disconnected;
                return Ok(());
            }

            *self.state.write() = ConnectionState::Connecting;

            match self.try_connect().await {
                Ok(()) => {
                    info!("WebSocket connection closed");
                }
                Err(e) => {
                    error!(?e, "WebSocket connection error");
                }
            }

            if self.is_shutdown() {
                info!("Shutdown requested after disconnect, not reconnecting");
                *self.state.write() = ConnectionState::Disconnected;
                return Ok(());
            }

            attempt += 1;
            *self.reconnect_count.write() = attempt;

            if self.config.max_reconnect_attempts > 0
                && attempt >= self.config.max_reconnect_attempts
            {
                error!(attempt, "Max reconnection attempts reached");
                return Err(WsError::ConnectionFailed(
                    "Max reconnection attempts reached".to_string(),
                ));
            }

            *self.state.write() = ConnectionState::Reconnecting;

            let delay = self.backoff_delay(attempt);
            warn!(attempt, delay_ms = delay.as_millis(), "Reconnecting");

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown requested during backoff, exiting");
                    *self.state.write() = ConnectionState::Disconnected;
                    return Ok(());
                }
            }

            // Pending pause acks will never be answered on the old
            // connection; drop them so the map does not grow.
            self.pending_acks.lock().clear();
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let delay = self
            .config
            .reconnect_base_delay_ms
            .saturating_mul(1u64 << exp)
            .min(self.config.reconnect_max_delay_ms);
        Duration::from_millis(delay)
    }

    async fn try_connect(&self) -> WsResult<()> {
        info!(url = %self.config.url, "Connecting to agent");

        let (ws_stream, _response) = connect_async(&self.config.url).await?;
        let (mut write, mut read) = ws_stream.split();

        *self.state.write() = ConnectionState::Connected;
        *self.reconnect_count.write() = 0;
        info!("Agent connected");

        loop {
            let outbound_recv = async { self.outbound_rx.lock().await.recv().await };

            tokio::select! {
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received in message loop");
                    if let Err(e) = write.send(Message::Close(None)).await {
                        warn!(?e, "Failed to send Close frame during shutdown");
                    }
                    *self.state.write() = ConnectionState::Disconnected;
                    return Ok(());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_text_message(&text).await;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            debug!("Received ping, sending pong");
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            debug!("Received pong");
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((1000, "Normal close".to_string()));
                            warn!(code, %reason, "WebSocket closed by agent");
                            return Err(WsError::ConnectionClosed { code, reason });
                        }
                        Some(Err(e)) => {
                            error!(?e, "WebSocket read error");
                            return Err(e.into());
                        }
                        None => {
                            warn!("WebSocket stream ended");
                            return Ok(());
                        }
                        _ => {}
                    }
                }

                outbound = outbound_recv => {
                    if let Some(frame) = outbound {
                        let text = serde_json::to_string(&frame)?;
                        write.send(Message::Text(text.into())).await?;
                        debug!(event = %frame.event, "Frame sent");
                    }
                }
            }
        }
    }

    /// Route one inbound text message.
    ///
    /// Errors here are confined to the current render cycle: a payload
    /// that fails to parse is logged and dropped, the connection stays up.
    async fn handle_text_message(&self, text: &str) {
        let frame: Frame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Unparseable frame, dropping");
                return;
            }
        };

        if frame.is_ack() {
            self.handle_ack(&frame);
            return;
        }

        if frame.event == EVENT_MINER_DATA {
            self.handle_miner_data(&frame).await;
            return;
        }

        debug!(event = %frame.event, "Ignoring unknown event");
    }

    async fn handle_miner_data(&self, frame: &Frame) {
        // The payload is the snapshot serialized as a JSON string.
        let snapshot = match frame.data.as_str().map(Snapshot::parse) {
            Some(Ok(snapshot)) => snapshot,
            Some(Err(e)) => {
                warn!(error = %e, "Snapshot parse failed, dropping render cycle");
                return;
            }
            None => {
                warn!("miner_data payload is not a string, dropping render cycle");
                return;
            }
        };

        debug!(miners = snapshot.miners.len(), "Snapshot received");

        if self.snapshot_tx.send(snapshot).await.is_err() {
            warn!("Snapshot receiver dropped");
        }

        // Acknowledge receipt back to the agent.
        if let Some(ack_id) = frame.ack {
            let reply = Frame::ack(ack_id, Value::String(MINER_DATA_ACK.to_string()));
            if self.outbound_tx.send(reply).await.is_err() {
                warn!(ack_id, "Failed to queue miner_data ack");
            }
        }
    }

    fn handle_ack(&self, frame: &Frame) {
        let Some(ack_id) = frame.ack else {
            debug!("Ack frame without id, ignoring");
            return;
        };

        let Some(ip) = self.pending_acks.lock().remove(&ack_id) else {
            debug!(ack_id, "Ack for unknown id, ignoring");
            return;
        };

        match serde_json::from_value::<PauseReply>(frame.data.clone()) {
            Ok(reply) => {
                let outcome = CommandOutcome::classify(&reply.result);
                info!(%ip, %outcome, "Pause command acknowledged");
            }
            Err(e) => {
                warn!(%ip, error = %e, "Unparseable pause ack");
            }
        }
    }
}
