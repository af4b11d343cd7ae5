//! minerview terminal dashboard.
//!
//! Receives fleet snapshots from the agent over the transport shim and
//! rebuilds the whole display on every update: one column per miner
//! with hashrate and temperature bar charts, fan gauges and
//! pause / light toggles.

pub mod app;
pub mod config;
pub mod error;
pub mod ui;

pub use app::{App, DashboardTui, UiCommand};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
