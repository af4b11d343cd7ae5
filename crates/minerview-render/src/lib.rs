//! Pure widget-tree renderer for the minerview dashboard.
//!
//! `build_tree` is a pure function from a snapshot to a freshly built
//! widget tree: one column per miner, each with a hashrate bar chart, a
//! temperature bar chart, two fan gauges and two toggles. No state
//! survives between calls; the caller swaps the new tree in wholesale.

pub mod error;
pub mod palette;
pub mod tree;

pub use error::{RenderError, RenderResult};
pub use palette::Rgb;
pub use tree::{
    build_tree, BarChartModel, DashboardTree, Dataset, GaugeModel, MinerColumn, ToggleKind,
    ToggleModel,
};
