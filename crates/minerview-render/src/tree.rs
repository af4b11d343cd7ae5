//! Widget tree construction.
//!
//! Per miner, in snapshot order:
//! 1. Read `fan_0` / `fan_1`; each gauge's segments are
//!    `[rpm, 6000 - rpm]`, not clamped.
//! 2. Scan boards 6, 7, 8 in order; each present board contributes one
//!    hashrate dataset (fixed per-board color) and a Chip + Board pair
//!    of temperature datasets.
//! 3. Two toggles whose ids derive from the miner address; toggle state
//!    is always fresh (unchecked) because the tree is rebuilt wholesale.

use minerview_core::{MinerStatus, Snapshot, CANDIDATE_BOARDS, FAN_RPM_CEILING};

use crate::error::{RenderError, RenderResult};
use crate::palette::{self, Rgb};

/// The whole dashboard for one snapshot. Ephemeral: rebuilt from
/// scratch on every update, nothing carries over.
#[derive(Debug, Clone, Default)]
pub struct DashboardTree {
    /// One column per miner, in snapshot order.
    pub columns: Vec<MinerColumn>,
}

/// Everything rendered for a single miner.
#[derive(Debug, Clone)]
pub struct MinerColumn {
    /// Miner address, shown as the column header.
    pub ip: String,
    /// Hashrate per board.
    pub hashrate_chart: BarChartModel,
    /// Chip and board-surface temperature per board.
    pub temp_chart: BarChartModel,
    /// Fan gauges for `fan_0` and `fan_1`.
    pub fan_gauges: [GaugeModel; 2],
    /// Light and pause toggles.
    pub toggles: [ToggleModel; 2],
}

/// One dataset in a bar chart.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Bar label.
    pub label: String,
    /// Bar value.
    pub value: f64,
    /// Fixed bar color.
    pub color: Rgb,
}

/// Bar chart model. An empty dataset list renders as an empty chart,
/// never suppressed.
#[derive(Debug, Clone)]
pub struct BarChartModel {
    /// Chart title.
    pub title: String,
    /// Datasets, in board scan order.
    pub datasets: Vec<Dataset>,
}

/// Two-segment radial gauge for one fan against the fixed RPM ceiling.
#[derive(Debug, Clone)]
pub struct GaugeModel {
    /// Display label, e.g. `Fan 1: 4620 RPM`.
    pub label: String,
    /// Raw RPM reading.
    pub rpm: f64,
    /// `[rpm, ceiling - rpm]`. The second segment goes negative for
    /// readings above the ceiling; accepted, not an error.
    pub segments: [f64; 2],
    /// Segment colors: fill, remainder.
    pub colors: [Rgb; 2],
}

impl GaugeModel {
    fn for_fan(fan_number: u8, rpm: f64) -> Self {
        Self {
            label: format!("Fan {}: {:.0} RPM", fan_number, rpm),
            rpm,
            segments: [rpm, FAN_RPM_CEILING - rpm],
            colors: [palette::FAN_FILL, palette::FAN_REMAINDER],
        }
    }
}

/// Which command a toggle emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleKind {
    Pause,
    Light,
}

impl ToggleKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Light => "light",
        }
    }

    /// Label shown next to the toggle.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pause => "Pause",
            Self::Light => "Light",
        }
    }
}

/// A toggle switch with its explicit per-miner context. Handlers read
/// the target address from here, never from captured scope.
#[derive(Debug, Clone)]
pub struct ToggleModel {
    /// Unique id, `pause_<addr>` or `light_<addr>`.
    pub id: String,
    /// Command this toggle emits.
    pub kind: ToggleKind,
    /// Target miner address.
    pub ip: String,
    /// Always starts unchecked on a fresh tree.
    pub checked: bool,
}

impl ToggleModel {
    fn new(kind: ToggleKind, ip: &str) -> Self {
        Self {
            id: format!("{}_{}", kind.prefix(), ip),
            kind,
            ip: ip.to_string(),
            checked: false,
        }
    }
}

/// Build the whole dashboard tree for a snapshot.
///
/// Pure: the caller owns swapping the result in over the previous tree.
/// Fails if any miner is missing a fan reading; the cycle is dropped
/// and the previous tree stays on screen.
pub fn build_tree(snapshot: &Snapshot) -> RenderResult<DashboardTree> {
    let columns = snapshot
        .miners
        .iter()
        .map(build_column)
        .collect::<RenderResult<Vec<_>>>()?;

    Ok(DashboardTree { columns })
}

fn build_column(miner: &MinerStatus) -> RenderResult<MinerColumn> {
    let fan_rpm = |fan: u8| {
        miner.fan_rpm(fan).ok_or_else(|| RenderError::MissingFan {
            ip: miner.ip.clone(),
            fan: minerview_core::fan_key(fan),
        })
    };
    let fan_rpm_1 = fan_rpm(0)?;
    let fan_rpm_2 = fan_rpm(1)?;

    Ok(MinerColumn {
        ip: miner.ip.clone(),
        hashrate_chart: build_hashrate_chart(miner),
        temp_chart: build_temp_chart(miner),
        fan_gauges: [
            GaugeModel::for_fan(1, fan_rpm_1),
            GaugeModel::for_fan(2, fan_rpm_2),
        ],
        toggles: [
            ToggleModel::new(ToggleKind::Light, &miner.ip),
            ToggleModel::new(ToggleKind::Pause, &miner.ip),
        ],
    })
}

fn build_hashrate_chart(miner: &MinerStatus) -> BarChartModel {
    let mut datasets = Vec::new();
    for board in CANDIDATE_BOARDS {
        if let Some(hashrate) = miner.hashrate(board) {
            // Candidate boards always have a palette entry.
            let color = palette::hashrate_color(board).unwrap_or(palette::HASHRATE_BOARD_6);
            datasets.push(Dataset {
                label: board.to_string(),
                value: hashrate,
                color,
            });
        }
    }

    BarChartModel {
        title: "Hashrate".to_string(),
        datasets,
    }
}

fn build_temp_chart(miner: &MinerStatus) -> BarChartModel {
    let mut datasets = Vec::new();
    for board in CANDIDATE_BOARDS {
        if let Some(temps) = miner.board_temps(board) {
            datasets.push(Dataset {
                label: format!("{board}Chip"),
                value: temps.chip,
                color: palette::TEMP_CHIP,
            });
            datasets.push(Dataset {
                label: format!("{board}Board"),
                value: temps.board,
                color: palette::TEMP_BOARD,
            });
        }
    }

    BarChartModel {
        title: "Temps".to_string(),
        datasets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: serde_json::Value) -> Snapshot {
        Snapshot::parse(&value.to_string()).unwrap()
    }

    fn miner(ip: &str) -> serde_json::Value {
        json!({
            "IP": ip,
            "HR": {"board_7": {"HR": 4.2}},
            "Temps": {"board_7": {"Chip": 70.0, "Board": 55.0}},
            "Fans": {"fan_0": {"RPM": 4000}, "fan_1": {"RPM": 4200}}
        })
    }

    #[test]
    fn test_one_column_per_miner_in_snapshot_order() {
        let snapshot = snapshot(json!({"miners": [
            miner("10.0.0.1"), miner("10.0.0.2"), miner("10.0.0.3")
        ]}));

        let tree = build_tree(&snapshot).unwrap();
        let ips: Vec<&str> = tree.columns.iter().map(|c| c.ip.as_str()).collect();
        assert_eq!(ips, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
    }

    #[test]
    fn test_gauge_segments_sum_to_ceiling() {
        let snapshot = snapshot(json!({"miners": [miner("10.0.0.1")]}));
        let tree = build_tree(&snapshot).unwrap();

        for gauge in &tree.columns[0].fan_gauges {
            assert_eq!(gauge.segments[0] + gauge.segments[1], FAN_RPM_CEILING);
        }
        assert_eq!(tree.columns[0].fan_gauges[0].segments, [4000.0, 2000.0]);
        assert_eq!(tree.columns[0].fan_gauges[0].label, "Fan 1: 4000 RPM");
        assert_eq!(tree.columns[0].fan_gauges[1].label, "Fan 2: 4200 RPM");
    }

    #[test]
    fn test_reading_above_ceiling_goes_negative() {
        let snapshot = snapshot(json!({"miners": [{
            "IP": "10.0.0.1",
            "HR": {}, "Temps": {},
            "Fans": {"fan_0": {"RPM": 6500}, "fan_1": {"RPM": 100}}
        }]}));

        let tree = build_tree(&snapshot).unwrap();
        assert_eq!(tree.columns[0].fan_gauges[0].segments, [6500.0, -500.0]);
    }

    #[test]
    fn test_single_board_hashrate_dataset_and_color() {
        let snapshot = snapshot(json!({"miners": [miner("10.0.0.1")]}));
        let tree = build_tree(&snapshot).unwrap();

        let chart = &tree.columns[0].hashrate_chart;
        assert_eq!(chart.datasets.len(), 1);
        assert_eq!(chart.datasets[0].label, "7");
        assert_eq!(chart.datasets[0].color, palette::HASHRATE_BOARD_7);
        assert_eq!(chart.datasets[0].value, 4.2);
    }

    #[test]
    fn test_board_scan_ignores_non_candidates() {
        let snapshot = snapshot(json!({"miners": [{
            "IP": "10.0.0.1",
            "HR": {"board_5": {"HR": 1.0}, "board_6": {"HR": 2.0}, "board_9": {"HR": 3.0}},
            "Temps": {},
            "Fans": {"fan_0": {"RPM": 1}, "fan_1": {"RPM": 1}}
        }]}));

        let tree = build_tree(&snapshot).unwrap();
        let chart = &tree.columns[0].hashrate_chart;
        assert_eq!(chart.datasets.len(), 1);
        assert_eq!(chart.datasets[0].label, "6");
    }

    #[test]
    fn test_two_boards_make_four_temp_datasets() {
        let snapshot = snapshot(json!({"miners": [{
            "IP": "10.0.0.1",
            "HR": {},
            "Temps": {
                "board_6": {"Chip": 71.0, "Board": 58.0},
                "board_8": {"Chip": 69.0, "Board": 57.0}
            },
            "Fans": {"fan_0": {"RPM": 1}, "fan_1": {"RPM": 1}}
        }]}));

        let tree = build_tree(&snapshot).unwrap();
        let chart = &tree.columns[0].temp_chart;
        assert_eq!(chart.datasets.len(), 4);

        let labels: Vec<&str> = chart.datasets.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["6Chip", "6Board", "8Chip", "8Board"]);
        assert_eq!(chart.datasets[0].color, palette::TEMP_CHIP);
        assert_eq!(chart.datasets[1].color, palette::TEMP_BOARD);
    }

    #[test]
    fn test_no_boards_yields_empty_charts_not_suppressed() {
        let snapshot = snapshot(json!({"miners": [{
            "IP": "10.0.0.1",
            "HR": {}, "Temps": {},
            "Fans": {"fan_0": {"RPM": 1}, "fan_1": {"RPM": 1}}
        }]}));

        let tree = build_tree(&snapshot).unwrap();
        let column = &tree.columns[0];
        assert!(column.hashrate_chart.datasets.is_empty());
        assert!(column.temp_chart.datasets.is_empty());
        // The column itself still renders.
        assert_eq!(column.ip, "10.0.0.1");
    }

    #[test]
    fn test_missing_fan_fails_the_cycle() {
        let snapshot = snapshot(json!({"miners": [{
            "IP": "10.0.0.1",
            "HR": {}, "Temps": {},
            "Fans": {"fan_0": {"RPM": 1}}
        }]}));

        let err = build_tree(&snapshot).unwrap_err();
        match err {
            RenderError::MissingFan { ip, fan } => {
                assert_eq!(ip, "10.0.0.1");
                assert_eq!(fan, "fan_1");
            }
        }
    }

    #[test]
    fn test_toggle_ids_and_fresh_state() {
        let snapshot = snapshot(json!({"miners": [miner("10.0.0.5")]}));
        let tree = build_tree(&snapshot).unwrap();

        let toggles = &tree.columns[0].toggles;
        assert_eq!(toggles[0].id, "light_10.0.0.5");
        assert_eq!(toggles[0].kind, ToggleKind::Light);
        assert_eq!(toggles[1].id, "pause_10.0.0.5");
        assert_eq!(toggles[1].kind, ToggleKind::Pause);
        for toggle in toggles {
            assert_eq!(toggle.ip, "10.0.0.5");
            assert!(!toggle.checked);
        }
    }

    #[test]
    fn test_rebuild_replaces_everything() {
        let first = snapshot(json!({"miners": [miner("10.0.0.1"), miner("10.0.0.2")]}));
        let second = snapshot(json!({"miners": [miner("10.0.0.3")]}));

        let _old = build_tree(&first).unwrap();
        let new = build_tree(&second).unwrap();

        assert_eq!(new.columns.len(), 1);
        assert!(new.columns.iter().all(|c| c.ip == "10.0.0.3"));
    }
}
