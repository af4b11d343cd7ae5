//! Widget-tree drawing.
//!
//! Translates the pure tree models into ratatui widgets. Bar values are
//! scaled per chart so fractional hashrates survive the integer bar
//! heights; the printed value on each bar stays the raw reading. Gauge
//! ratios are clamped to the unit range only here, the model keeps raw
//! segments.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph},
    Frame,
};

use minerview_core::FAN_RPM_CEILING;
use minerview_render::{BarChartModel, GaugeModel, MinerColumn, Rgb, ToggleModel};

use crate::app::App;

/// Multiplier applied to hashrate values before the integer bar height.
const HASHRATE_BAR_SCALE: f64 = 100.0;

const HELP_LINE: &str = " \u{2190}/\u{2192} miner   Tab toggle   Space flip   q quit";

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Draw one full frame from the current tree.
pub fn draw(frame: &mut Frame, app: &App) {
    let [body, footer] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(frame.area());

    if app.tree.columns.is_empty() {
        let waiting = Paragraph::new("Waiting for miner data...")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("minerview"));
        frame.render_widget(waiting, body);
    } else {
        let constraints =
            vec![Constraint::Ratio(1, app.tree.columns.len() as u32); app.tree.columns.len()];
        let areas = Layout::horizontal(constraints).split(body);

        for (index, column) in app.tree.columns.iter().enumerate() {
            let selected_toggle = (index == app.selected_miner).then_some(app.selected_toggle);
            draw_column(frame, areas[index], column, selected_toggle);
        }
    }

    frame.render_widget(
        Paragraph::new(HELP_LINE).style(Style::default().fg(Color::DarkGray)),
        footer,
    );
}

fn draw_column(frame: &mut Frame, area: Rect, column: &MinerColumn, selected: Option<usize>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(column.ip.clone())
        .border_style(if selected.is_some() {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        });
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [charts, gauges, toggles] = Layout::vertical([
        Constraint::Min(8),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(inner);

    let [hashrate_area, temp_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(charts);
    draw_bar_chart(frame, hashrate_area, &column.hashrate_chart, HASHRATE_BAR_SCALE);
    draw_bar_chart(frame, temp_area, &column.temp_chart, 1.0);

    let [fan_1_area, fan_2_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(gauges);
    draw_fan_gauge(frame, fan_1_area, &column.fan_gauges[0]);
    draw_fan_gauge(frame, fan_2_area, &column.fan_gauges[1]);

    draw_toggles(frame, toggles, &column.toggles, selected);
}

fn draw_bar_chart(frame: &mut Frame, area: Rect, model: &BarChartModel, scale: f64) {
    let bars: Vec<Bar> = model
        .datasets
        .iter()
        .map(|dataset| {
            // Negative readings bottom out at an empty bar.
            let height = (dataset.value * scale).max(0.0).round() as u64;
            Bar::default()
                .label(Line::from(dataset.label.clone()))
                .value(height)
                .text_value(format!("{:.2}", dataset.value))
                .style(Style::default().fg(to_color(dataset.color)))
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(model.title.clone()),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(6)
        .bar_gap(1);

    frame.render_widget(chart, area);
}

fn draw_fan_gauge(frame: &mut Frame, area: Rect, model: &GaugeModel) {
    let ratio = (model.rpm / FAN_RPM_CEILING).clamp(0.0, 1.0);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(
            Style::default()
                .fg(to_color(model.colors[0]))
                .bg(to_color(model.colors[1])),
        )
        .ratio(ratio)
        .label(model.label.clone());

    frame.render_widget(gauge, area);
}

fn draw_toggles(frame: &mut Frame, area: Rect, toggles: &[ToggleModel; 2], selected: Option<usize>) {
    let mut spans = Vec::with_capacity(toggles.len() * 2);
    for (index, toggle) in toggles.iter().enumerate() {
        let mark = if toggle.checked { "[x]" } else { "[ ]" };
        let mut style = Style::default();
        if selected == Some(index) {
            style = style.add_modifier(Modifier::REVERSED);
        }
        spans.push(Span::styled(
            format!(" {} {} ", mark, toggle.kind.label()),
            style,
        ));
        spans.push(Span::raw(" "));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_maps_to_terminal_color() {
        assert_eq!(to_color(Rgb(12, 58, 242)), Color::Rgb(12, 58, 242));
    }

    #[test]
    fn test_hashrate_scale_preserves_fractions() {
        // A 4.31 MH/s reading must not collapse to the same bar height
        // as 4.99 after integer conversion.
        let low = (4.31 * HASHRATE_BAR_SCALE).round() as u64;
        let high = (4.99 * HASHRATE_BAR_SCALE).round() as u64;
        assert!(high > low);
    }
}
