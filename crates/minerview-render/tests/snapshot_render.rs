//! End-to-end renderer test: wire payload in, widget tree out.

use minerview_core::Snapshot;
use minerview_render::{build_tree, ToggleKind};

const FLEET_PAYLOAD: &str = r#"{
    "miners": [
        {
            "IP": "172.16.1.99",
            "Time": "12:03:17.532101",
            "HR": {
                "board_6": {"HR": 4.31},
                "board_7": {"HR": 4.18},
                "board_8": {"HR": 4.25}
            },
            "Temps": {
                "board_6": {"Chip": 71.0, "Board": 58.0},
                "board_7": {"Chip": 73.5, "Board": 60.0},
                "board_8": {"Chip": 70.0, "Board": 57.5}
            },
            "Fans": {
                "fan_0": {"RPM": 4620, "Speed": 77},
                "fan_1": {"RPM": 4500, "Speed": 75}
            }
        },
        {
            "IP": "172.16.1.98",
            "Time": "12:03:17.618220",
            "HR": {
                "board_7": {"HR": 3.96}
            },
            "Temps": {
                "board_7": {"Chip": 75.0, "Board": 61.0}
            },
            "Fans": {
                "fan_0": {"RPM": 5280, "Speed": 88},
                "fan_1": {"RPM": 5340, "Speed": 89}
            }
        }
    ]
}"#;

#[test]
fn full_fleet_payload_renders_column_per_miner() {
    let snapshot = Snapshot::parse(FLEET_PAYLOAD).unwrap();
    let tree = build_tree(&snapshot).unwrap();

    assert_eq!(tree.columns.len(), 2);
    assert_eq!(tree.columns[0].ip, "172.16.1.99");
    assert_eq!(tree.columns[1].ip, "172.16.1.98");

    // Full miner: three hashrate bars, six temperature bars.
    let full = &tree.columns[0];
    assert_eq!(full.hashrate_chart.datasets.len(), 3);
    assert_eq!(full.temp_chart.datasets.len(), 6);
    assert_eq!(full.fan_gauges[0].segments, [4620.0, 1380.0]);
    assert_eq!(full.fan_gauges[1].segments, [4500.0, 1500.0]);

    // Degraded miner: one board reporting.
    let degraded = &tree.columns[1];
    assert_eq!(degraded.hashrate_chart.datasets.len(), 1);
    assert_eq!(degraded.hashrate_chart.datasets[0].label, "7");
    assert_eq!(degraded.temp_chart.datasets.len(), 2);

    for column in &tree.columns {
        assert_eq!(column.toggles[0].kind, ToggleKind::Light);
        assert_eq!(column.toggles[1].kind, ToggleKind::Pause);
        assert_eq!(column.toggles[1].id, format!("pause_{}", column.ip));
    }
}

#[test]
fn rerender_with_new_snapshot_drops_old_columns() {
    let snapshot = Snapshot::parse(FLEET_PAYLOAD).unwrap();
    let _first = build_tree(&snapshot).unwrap();

    let smaller = Snapshot::parse(
        r#"{"miners": [{"IP": "172.16.1.98", "HR": {}, "Temps": {},
            "Fans": {"fan_0": {"RPM": 100}, "fan_1": {"RPM": 100}}}]}"#,
    )
    .unwrap();
    let second = build_tree(&smaller).unwrap();

    assert_eq!(second.columns.len(), 1);
    assert_eq!(second.columns[0].ip, "172.16.1.98");
}
