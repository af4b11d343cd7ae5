//! Command write handle.
//!
//! Cloneable handle for emitting `pause` / `light` frames from the UI
//! without direct access to the websocket. Fire-and-forget: a `pause`
//! ack is matched and logged by the connection manager, never surfaced
//! to the caller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::debug;

use crate::connection::ConnectionState;
use crate::frame::Frame;

/// Error type for command emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Channel closed (websocket task gone or shutting down).
    ChannelClosed,
    /// Not connected to the agent.
    NotConnected,
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChannelClosed => write!(f, "channel closed"),
            Self::NotConnected => write!(f, "not connected"),
        }
    }
}

impl std::error::Error for CommandError {}

/// Write handle for emitting command frames.
///
/// Channel-based, reconnect-safe, cloneable across tasks. One flip of a
/// toggle emits exactly one frame regardless of prior toggle state.
#[derive(Clone)]
pub struct CommandHandle {
    tx: mpsc::Sender<Frame>,
    state: Arc<RwLock<ConnectionState>>,
    /// Pending pause acks: ack id -> target address.
    pending: Arc<Mutex<HashMap<u64, String>>>,
    ack_seq: Arc<AtomicU64>,
}

impl CommandHandle {
    pub(crate) fn new(
        tx: mpsc::Sender<Frame>,
        state: Arc<RwLock<ConnectionState>>,
        pending: Arc<Mutex<HashMap<u64, String>>>,
        ack_seq: Arc<AtomicU64>,
    ) -> Self {
        Self {
            tx,
            state,
            pending,
            ack_seq,
        }
    }

    fn is_connected(&self) -> bool {
        *self.state.read() == ConnectionState::Connected
    }

    /// Emit a `pause` command for a miner address.
    ///
    /// Registers a pending ack so the connection manager can classify
    /// and log the agent's reply. No timeout: an ack that never arrives
    /// simply never logs an outcome.
    pub async fn pause(&self, ip: &str) -> Result<(), CommandError> {
        if !self.is_connected() {
            return Err(CommandError::NotConnected);
        }

        let ack_id = self.ack_seq.fetch_add(1, Ordering::Relaxed);
        self.pending.lock().insert(ack_id, ip.to_string());

        let frame = Frame::pause(ip, ack_id);
        if self.tx.send(frame).await.is_err() {
            self.pending.lock().remove(&ack_id);
            return Err(CommandError::ChannelClosed);
        }

        debug!(ip, ack_id, "Pause command queued");
        Ok(())
    }

    /// Emit a `light` command for a miner address. No ack is requested.
    pub async fn light(&self, ip: &str) -> Result<(), CommandError> {
        if !self.is_connected() {
            return Err(CommandError::NotConnected);
        }

        let frame = Frame::light(ip);
        self.tx
            .send(frame)
            .await
            .map_err(|_| CommandError::ChannelClosed)?;

        debug!(ip, "Light command queued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn handle_with_capture() -> (CommandHandle, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(8);
        let handle = CommandHandle::new(
            tx,
            Arc::new(RwLock::new(ConnectionState::Connected)),
            Arc::new(Mutex::new(HashMap::new())),
            Arc::new(AtomicU64::new(1)),
        );
        (handle, rx)
    }

    #[tokio::test]
    async fn test_pause_emits_exactly_one_frame() {
        let (handle, mut rx) = handle_with_capture();

        handle.pause("10.0.0.5").await.unwrap();

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.event, "pause");
        assert_eq!(frame.data, json!({"ip": "10.0.0.5"}));
        assert!(frame.ack.is_some());

        // No second frame queued for a single flip.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_pause_registers_pending_ack() {
        let (tx, _rx) = mpsc::channel(8);
        let pending = Arc::new(Mutex::new(HashMap::new()));
        let handle = CommandHandle::new(
            tx,
            Arc::new(RwLock::new(ConnectionState::Connected)),
            pending.clone(),
            Arc::new(AtomicU64::new(42)),
        );

        handle.pause("172.16.1.99").await.unwrap();

        assert_eq!(pending.lock().get(&42).map(String::as_str), Some("172.16.1.99"));
    }

    #[tokio::test]
    async fn test_light_has_no_pending_ack() {
        let (tx, mut rx) = mpsc::channel(8);
        let pending = Arc::new(Mutex::new(HashMap::new()));
        let handle = CommandHandle::new(
            tx,
            Arc::new(RwLock::new(ConnectionState::Connected)),
            pending.clone(),
            Arc::new(AtomicU64::new(1)),
        );

        handle.light("10.0.0.5").await.unwrap();

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.event, "light");
        assert_eq!(frame.data, json!("10.0.0.5"));
        assert!(frame.ack.is_none());
        assert!(pending.lock().is_empty());
    }

    #[tokio::test]
    async fn test_commands_fail_when_disconnected() {
        let (tx, _rx) = mpsc::channel(8);
        let handle = CommandHandle::new(
            tx,
            Arc::new(RwLock::new(ConnectionState::Disconnected)),
            Arc::new(Mutex::new(HashMap::new())),
            Arc::new(AtomicU64::new(1)),
        );

        assert_eq!(
            handle.pause("10.0.0.5").await,
            Err(CommandError::NotConnected)
        );
        assert_eq!(
            handle.light("10.0.0.5").await,
            Err(CommandError::NotConnected)
        );
    }
}
