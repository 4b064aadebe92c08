use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::engine::Snapshot;
use crate::metrics::CategoryProgress;

fn progress_color(percent: u8) -> Color {
    match percent {
        100 => Color::Green,
        50..=99 => Color::Yellow,
        _ => Color::Red,
    }
}

/// Overall completion gauge with the status counts as its label.
pub fn draw_progress(area: Rect, f: &mut Frame, snapshot: &Snapshot) {
    let counts = &snapshot.counts;
    let label = format!(
        "{}%  {} done, {} skipped, {} pending",
        snapshot.progress_percent, counts.completed, counts.skipped, counts.pending
    );
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(
            Style::default()
                .fg(progress_color(snapshot.progress_percent))
                .bg(Color::DarkGray),
        )
        .percent(u16::from(snapshot.progress_percent))
        .label(Span::styled(
            label,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ));
    f.render_widget(gauge, area);
}

/// Per-category completion as a bar chart, one bar per category in catalog order.
pub fn draw_category_chart(area: Rect, f: &mut Frame, progress: &[CategoryProgress]) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Progress by category (%)");

    if progress.is_empty() {
        f.render_widget(Paragraph::new("No steps").block(block), area);
        return;
    }

    // Split into the chart and a one-line legend of full category names.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)].as_ref())
        .split(area);

    let inner_width = chunks[0].width.saturating_sub(2) as usize;
    let n = progress.len();
    let bar_gap = 1usize;
    let bar_width = (inner_width.saturating_sub(bar_gap * n.saturating_sub(1)) / n).max(1);

    let bars: Vec<Bar> = progress
        .iter()
        .map(|p| {
            let percent = p.percent();
            let label: String = p.category.name().chars().take(bar_width).collect();
            Bar::default()
                .value(u64::from(percent))
                .text_value(format!("{}/{}", p.completed, p.total))
                .label(Line::from(label))
                .style(Style::default().fg(progress_color(percent)))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width as u16)
        .bar_gap(bar_gap as u16)
        .max(100);
    f.render_widget(chart, chunks[0]);

    let legend: Vec<Span> = progress
        .iter()
        .flat_map(|p| {
            [
                Span::styled(
                    p.category.name(),
                    Style::default().fg(progress_color(p.percent())),
                ),
                Span::raw(format!(" {}%  ", p.percent())),
            ]
        })
        .collect();
    f.render_widget(
        Paragraph::new(Line::from(legend))
            .wrap(ratatui::widgets::Wrap { trim: true })
            .style(Style::default().fg(Color::Gray)),
        chunks[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_track_completion() {
        assert_eq!(progress_color(0), Color::Red);
        assert_eq!(progress_color(49), Color::Red);
        assert_eq!(progress_color(50), Color::Yellow);
        assert_eq!(progress_color(100), Color::Green);
    }
}
