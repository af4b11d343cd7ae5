//! WebSocket transport shim for the minerview dashboard.
//!
//! Maintains a single long-lived bidirectional channel to the agent:
//! - Inbound `miner_data` events are parsed into snapshots, forwarded to
//!   the renderer channel, and acknowledged with a fixed string
//! - Outbound `pause` / `light` commands are emitted per miner; the
//!   `pause` reply is classified into one of four outcomes, logged only
//! - Automatic reconnection with exponential backoff

pub mod command;
pub mod connection;
pub mod error;
pub mod frame;

pub use command::{CommandError, CommandHandle};
pub use connection::{ConnectionConfig, ConnectionManager, ConnectionState};
pub use error::{WsError, WsResult};
pub use frame::{
    CommandOutcome, Frame, PauseCommand, PauseReply, EVENT_ACK, EVENT_LIGHT, EVENT_MINER_DATA,
    EVENT_PAUSE, MINER_DATA_ACK,
};
