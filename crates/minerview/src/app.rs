//! Application state and TUI event loop.
//!
//! All rendering state is a function of the latest snapshot: each
//! inbound snapshot rebuilds the whole widget tree, which also resets
//! every toggle to unchecked. Keyboard input drives toggle flips, each
//! of which emits exactly one command frame.

use std::{io, time::Duration};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use minerview_core::Snapshot;
use minerview_render::{build_tree, DashboardTree, RenderError, ToggleKind};

use crate::ui;

/// A command requested from the UI, forwarded to the transport shim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    Pause(String),
    Light(String),
}

/// Dashboard application state.
#[derive(Debug, Default)]
pub struct App {
    /// Current widget tree; fully replaced on every snapshot.
    pub tree: DashboardTree,
    /// Selected miner column.
    pub selected_miner: usize,
    /// Selected toggle within the column.
    pub selected_toggle: usize,
    /// Snapshots rendered since start.
    pub snapshots_rendered: u64,
    /// Render cycles dropped due to bad data.
    pub dropped_cycles: u64,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the widget tree from a new snapshot.
    ///
    /// A failed build keeps the previous tree on screen and counts a
    /// dropped cycle.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), RenderError> {
        match build_tree(snapshot) {
            Ok(tree) => {
                self.tree = tree;
                self.snapshots_rendered += 1;
                self.clamp_selection();
                Ok(())
            }
            Err(e) => {
                self.dropped_cycles += 1;
                Err(e)
            }
        }
    }

    fn clamp_selection(&mut self) {
        if self.tree.columns.is_empty() {
            self.selected_miner = 0;
            self.selected_toggle = 0;
            return;
        }
        self.selected_miner = self.selected_miner.min(self.tree.columns.len() - 1);
        let toggles = self.tree.columns[self.selected_miner].toggles.len();
        self.selected_toggle = self.selected_toggle.min(toggles - 1);
    }

    pub fn select_next_miner(&mut self) {
        if !self.tree.columns.is_empty() {
            self.selected_miner = (self.selected_miner + 1) % self.tree.columns.len();
        }
    }

    pub fn select_prev_miner(&mut self) {
        if !self.tree.columns.is_empty() {
            let len = self.tree.columns.len();
            self.selected_miner = (self.selected_miner + len - 1) % len;
        }
    }

    pub fn select_next_toggle(&mut self) {
        if let Some(column) = self.tree.columns.get(self.selected_miner) {
            self.selected_toggle = (self.selected_toggle + 1) % column.toggles.len();
        }
    }

    /// Flip the selected toggle and return the command to emit.
    ///
    /// Exactly one command per flip, whatever the prior checked state.
    pub fn flip_selected(&mut self) -> Option<UiCommand> {
        let column = self.tree.columns.get_mut(self.selected_miner)?;
        let toggle = column.toggles.get_mut(self.selected_toggle)?;
        toggle.checked = !toggle.checked;

        Some(match toggle.kind {
            ToggleKind::Pause => UiCommand::Pause(toggle.ip.clone()),
            ToggleKind::Light => UiCommand::Light(toggle.ip.clone()),
        })
    }
}

/// The terminal frontend.
///
/// Runs a synchronous draw/input loop: drain pending snapshots, redraw,
/// poll the keyboard. Commands go out through a channel consumed by an
/// async forwarder task.
pub struct DashboardTui {
    snapshot_rx: mpsc::Receiver<Snapshot>,
    command_tx: mpsc::Sender<UiCommand>,
    tick_rate: Duration,
}

impl DashboardTui {
    pub fn new(
        snapshot_rx: mpsc::Receiver<Snapshot>,
        command_tx: mpsc::Sender<UiCommand>,
        tick_rate: Duration,
    ) -> Self {
        Self {
            snapshot_rx,
            command_tx,
            tick_rate,
        }
    }

    /// Run the TUI - blocks until the user quits.
    pub fn run(mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = ratatui::init();

        let mut app = App::new();
        let result = self.event_loop(&mut terminal, &mut app);

        disable_raw_mode()?;
        execute!(io::stdout(), LeaveAlternateScreen)?;
        ratatui::restore();

        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal, app: &mut App) -> io::Result<()> {
        loop {
            // Drain inbound snapshots, newest last, in arrival order.
            while let Ok(snapshot) = self.snapshot_rx.try_recv() {
                if let Err(e) = app.apply_snapshot(&snapshot) {
                    warn!(error = %e, "Render cycle dropped");
                }
            }

            terminal.draw(|frame| ui::draw(frame, app))?;

            if event::poll(self.tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            return Ok(());
                        }
                        KeyCode::Left => app.select_prev_miner(),
                        KeyCode::Right => app.select_next_miner(),
                        KeyCode::Tab => app.select_next_toggle(),
                        KeyCode::Char(' ') | KeyCode::Enter => {
                            if let Some(command) = app.flip_selected() {
                                debug!(?command, "Toggle flipped");
                                if self.command_tx.try_send(command).is_err() {
                                    warn!("Command channel full, dropping command");
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(ips: &[&str]) -> Snapshot {
        let miners: Vec<_> = ips
            .iter()
            .map(|ip| {
                json!({
                    "IP": ip,
                    "HR": {"board_7": {"HR": 4.0}},
                    "Temps": {},
                    "Fans": {"fan_0": {"RPM": 3000}, "fan_1": {"RPM": 3000}}
                })
            })
            .collect();
        Snapshot::parse(&json!({ "miners": miners }).to_string()).unwrap()
    }

    #[test]
    fn test_apply_snapshot_replaces_tree() {
        let mut app = App::new();
        app.apply_snapshot(&snapshot(&["10.0.0.1", "10.0.0.2"])).unwrap();
        assert_eq!(app.tree.columns.len(), 2);

        app.apply_snapshot(&snapshot(&["10.0.0.3"])).unwrap();
        assert_eq!(app.tree.columns.len(), 1);
        assert_eq!(app.tree.columns[0].ip, "10.0.0.3");
        assert_eq!(app.snapshots_rendered, 2);
    }

    #[test]
    fn test_failed_snapshot_keeps_previous_tree() {
        let mut app = App::new();
        app.apply_snapshot(&snapshot(&["10.0.0.1"])).unwrap();

        let bad = Snapshot::parse(
            &json!({"miners": [{"IP": "10.0.0.2", "HR": {}, "Temps": {}, "Fans": {}}]})
                .to_string(),
        )
        .unwrap();
        assert!(app.apply_snapshot(&bad).is_err());

        // Previous render survives the dropped cycle.
        assert_eq!(app.tree.columns[0].ip, "10.0.0.1");
        assert_eq!(app.dropped_cycles, 1);
    }

    #[test]
    fn test_selection_clamped_when_fleet_shrinks() {
        let mut app = App::new();
        app.apply_snapshot(&snapshot(&["a", "b", "c"])).unwrap();
        app.selected_miner = 2;

        app.apply_snapshot(&snapshot(&["a"])).unwrap();
        assert_eq!(app.selected_miner, 0);
    }

    #[test]
    fn test_flip_pause_emits_pause_command() {
        let mut app = App::new();
        app.apply_snapshot(&snapshot(&["10.0.0.5"])).unwrap();

        // Toggle order within a column is light, pause.
        app.selected_toggle = 1;
        assert_eq!(
            app.flip_selected(),
            Some(UiCommand::Pause("10.0.0.5".to_string()))
        );

        // Flipping back still emits a command - one frame per flip.
        assert_eq!(
            app.flip_selected(),
            Some(UiCommand::Pause("10.0.0.5".to_string()))
        );
    }

    #[test]
    fn test_flip_light_emits_light_command() {
        let mut app = App::new();
        app.apply_snapshot(&snapshot(&["10.0.0.5"])).unwrap();

        app.selected_toggle = 0;
        assert_eq!(
            app.flip_selected(),
            Some(UiCommand::Light("10.0.0.5".to_string()))
        );
    }

    #[test]
    fn test_new_snapshot_resets_toggle_state() {
        let mut app = App::new();
        app.apply_snapshot(&snapshot(&["10.0.0.5"])).unwrap();

        app.selected_toggle = 1;
        app.flip_selected();
        assert!(app.tree.columns[0].toggles[1].checked);

        app.apply_snapshot(&snapshot(&["10.0.0.5"])).unwrap();
        assert!(!app.tree.columns[0].toggles[1].checked);
    }

    #[test]
    fn test_flip_on_empty_tree_is_noop() {
        let mut app = App::new();
        assert_eq!(app.flip_selected(), None);
    }

    #[test]
    fn test_miner_selection_wraps() {
        let mut app = App::new();
        app.apply_snapshot(&snapshot(&["a", "b"])).unwrap();

        app.select_next_miner();
        assert_eq!(app.selected_miner, 1);
        app.select_next_miner();
        assert_eq!(app.selected_miner, 0);
        app.select_prev_miner();
        assert_eq!(app.selected_miner, 1);
    }
}
