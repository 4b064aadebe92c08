use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

fn key_line(keys: &[&str], action: &str) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    let mut width = 0;
    for (i, k) in keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" / "));
            width += 3;
        }
        spans.push(Span::styled(
            k.to_string(),
            Style::default().fg(Color::Magenta),
        ));
        width += k.chars().count();
    }
    spans.push(Span::raw(" ".repeat(14usize.saturating_sub(width).max(1))));
    spans.push(Span::raw(action.to_string()));
    Line::from(spans)
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line(&["q", "Ctrl-C"], "Quit"),
        key_line(&["tab"], "Switch tabs"),
        key_line(&["?"], "Show this help"),
        Line::from(""),
        Line::from("Checklist tab:"),
        key_line(&["↑/↓", "j/k"], "Previous / next step"),
        key_line(&["space", "enter"], "Toggle done (moves to next open step)"),
        key_line(&["s"], "Skip step"),
        key_line(&["/"], "Search title, description or category"),
        key_line(&["esc"], "Clear search"),
        key_line(&["[", "]"], "Select command or link"),
        key_line(&["y"], "Copy selected command or link"),
        key_line(&["e"], "Export audit report as JSON"),
        key_line(&["c"], "Export audit report as CSV"),
        key_line(&["Y"], "Copy exported path to clipboard"),
        key_line(&["R"], "Reset all steps (asks first)"),
        Line::from(""),
        Line::from("Incident tab:"),
        key_line(&["↑/↓", "j/k"], "Select field"),
        key_line(&["enter"], "Edit field (cycles severity)"),
        key_line(&["esc"], "Cancel edit"),
        Line::from(""),
        Line::from(vec![
            Span::raw("Progress is saved after every change. Incident details last for this session only; "),
            Span::styled("export", Style::default().fg(Color::Cyan)),
            Span::raw(" to keep them."),
        ]),
    ])
    .wrap(Wrap { trim: false })
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
