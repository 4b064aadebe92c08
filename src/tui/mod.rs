mod charts;
mod export;
mod help;
mod state;

use crate::cli::Cli;
use crate::engine::{format_timestamp, Change, Session};
use crate::model::{MetadataField, Status};
use crate::orchestrator::{self, ExportFormat, Intent};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{
    annex_entries, push_wrapped_status_kv, shorten, AnnexKind, InputMode, UiState, TAB_CHECKLIST,
    TAB_COUNT, TAB_HELP, TAB_INCIDENT,
};
use std::sync::mpsc::Receiver;
use std::{io, time::Duration, time::Instant};

/// Whether the loop should keep running after a key press.
enum Flow {
    Continue,
    Quit,
}

/// Run the interactive checklist until the operator quits.
pub fn run(args: &Cli, mut session: Session) -> Result<()> {
    let changes = session.subscribe();
    let mut state = UiState::new(&session, Duration::from(args.copied_indicator));

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let res = match Terminal::new(backend).context("create terminal") {
        Ok(mut terminal) => {
            terminal.clear().ok();
            event_loop(&mut terminal, &mut session, &mut state, &changes)
        }
        Err(e) => Err(e),
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    tracing::info!(progress = session.progress(), "TUI closed");
    res
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut Session,
    state: &mut UiState,
    changes: &Receiver<Change>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut dirty = true;

    loop {
        // Drain change notifications; the snapshot is re-pulled once per batch.
        let mut changed = false;
        for change in changes.try_iter() {
            if change == Change::Cursor || change == Change::StatusReset {
                state.annex_selected = 0;
            }
            changed = true;
        }
        if changed {
            state.refresh(session);
            dirty = true;
        }

        // Redraw on tick too so the copied indicator can expire.
        if dirty || last_tick.elapsed() >= tick_rate {
            terminal
                .draw(|f| draw(f.area(), f, state, session))
                .context("draw frame")?;
            last_tick = Instant::now();
            dirty = false;
        }

        if event::poll(Duration::from_millis(50)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                dirty = true;
                if let Flow::Quit = handle_key(k, session, state) {
                    return Ok(());
                }
            }
        }
    }
}

fn handle_key(k: KeyEvent, session: &mut Session, state: &mut UiState) -> Flow {
    if let (KeyModifiers::CONTROL, KeyCode::Char('c')) = (k.modifiers, k.code) {
        return Flow::Quit;
    }
    match state.mode {
        InputMode::Search => handle_search_key(k, session, state),
        InputMode::EditMeta(field) => handle_edit_key(k, field, session, state),
        InputMode::ConfirmReset => {
            if let KeyCode::Char('y') | KeyCode::Char('Y') = k.code {
                apply(session, state, Intent::Reset);
                state.info = "All steps reset to pending".into();
            } else {
                state.info = "Reset cancelled".into();
            }
            state.mode = InputMode::Normal;
        }
        InputMode::Normal => return handle_normal_key(k, session, state),
    }
    Flow::Continue
}

fn handle_normal_key(k: KeyEvent, session: &mut Session, state: &mut UiState) -> Flow {
    match (k.modifiers, k.code) {
        (_, KeyCode::Char('q')) => return Flow::Quit,
        (_, KeyCode::Tab) => {
            state.tab = (state.tab + 1) % TAB_COUNT;
        }
        (_, KeyCode::BackTab) => {
            state.tab = (state.tab + TAB_COUNT - 1) % TAB_COUNT;
        }
        (_, KeyCode::Char('?')) => {
            state.tab = TAB_HELP;
        }
        (_, KeyCode::Char('e')) => {
            export::export_and_show(session, state, ExportFormat::Json);
        }
        (_, KeyCode::Char('c')) => {
            export::export_and_show(session, state, ExportFormat::Csv);
        }
        (_, KeyCode::Char('Y')) => match state.last_exported_path.clone() {
            Some(path) => copy(state, &path, "exported path"),
            None => {
                state.info = "No exported file path to copy. Export a file first (e/c)".into();
            }
        },
        (_, KeyCode::Char('R')) => {
            state.mode = InputMode::ConfirmReset;
            state.info = "Reset every step to pending? (y to confirm)".into();
        }
        _ if state.tab == TAB_INCIDENT => handle_incident_key(k, session, state),
        _ if state.tab == TAB_CHECKLIST => handle_checklist_key(k, session, state),
        _ => {}
    }
    Flow::Continue
}

fn handle_checklist_key(k: KeyEvent, session: &mut Session, state: &mut UiState) {
    match k.code {
        KeyCode::Down | KeyCode::Char('j') => apply(session, state, Intent::GoNext),
        KeyCode::Up | KeyCode::Char('k') => apply(session, state, Intent::GoPrevious),
        KeyCode::Char(' ') | KeyCode::Enter => {
            let Some(step) = session.current() else {
                state.info = "No step selected".into();
                return;
            };
            let id = step.id.clone();
            let done = session.status(&id) != Some(Status::Completed);
            apply(session, state, Intent::MarkDone { id, done });
        }
        KeyCode::Char('s') => {
            let Some(step) = session.current() else {
                state.info = "No step selected".into();
                return;
            };
            let id = step.id.clone();
            apply(session, state, Intent::Skip(id));
        }
        KeyCode::Char('/') => {
            state.input = session.query().to_string();
            state.mode = InputMode::Search;
        }
        KeyCode::Esc => {
            if !session.query().is_empty() {
                apply(session, state, Intent::SetQuery(String::new()));
                state.info = "Search cleared".into();
            }
        }
        KeyCode::Char(']') | KeyCode::Char('[') => {
            let len = session.current().map(|s| annex_entries(s).len()).unwrap_or(0);
            state.move_annex_selection(len, k.code == KeyCode::Char(']'));
        }
        KeyCode::Char('y') => {
            let entry = session
                .current()
                .map(annex_entries)
                .and_then(|entries| entries.into_iter().nth(state.annex_selected));
            match entry {
                Some(entry) => {
                    let what = match entry.kind {
                        AnnexKind::Command => "command",
                        AnnexKind::Link => "link",
                    };
                    copy(state, &entry.value, what);
                }
                None => state.info = "This step has no commands or links".into(),
            }
        }
        _ => {}
    }
}

fn handle_incident_key(k: KeyEvent, session: &mut Session, state: &mut UiState) {
    match k.code {
        KeyCode::Down | KeyCode::Char('j') => state.move_meta_selection(true),
        KeyCode::Up | KeyCode::Char('k') => state.move_meta_selection(false),
        KeyCode::Enter => {
            let field = state.selected_meta_field();
            if field == MetadataField::Severity {
                let next = session.metadata().severity.next();
                apply(
                    session,
                    state,
                    Intent::EditMetadata(crate::model::MetadataEdit::Severity(next)),
                );
            } else {
                state.input = session.metadata().value(field);
                state.mode = InputMode::EditMeta(field);
            }
        }
        _ => {}
    }
}

fn handle_search_key(k: KeyEvent, session: &mut Session, state: &mut UiState) {
    match k.code {
        KeyCode::Enter => {
            state.mode = InputMode::Normal;
            state.info = format!("{} matching steps", state.snapshot.visible.len());
        }
        KeyCode::Esc => {
            state.input.clear();
            state.mode = InputMode::Normal;
            apply(session, state, Intent::SetQuery(String::new()));
        }
        KeyCode::Backspace => {
            state.input.pop();
            let query = state.input.clone();
            apply(session, state, Intent::SetQuery(query));
        }
        KeyCode::Char(c) => {
            state.input.push(c);
            let query = state.input.clone();
            apply(session, state, Intent::SetQuery(query));
        }
        _ => {}
    }
}

fn handle_edit_key(k: KeyEvent, field: MetadataField, session: &mut Session, state: &mut UiState) {
    match k.code {
        KeyCode::Enter => {
            let value = std::mem::take(&mut state.input);
            match field.edit(value.trim().to_string()) {
                Ok(edit) => {
                    apply(session, state, Intent::EditMetadata(edit));
                    state.info = format!("{} updated", field.label());
                }
                Err(e) => state.info = e,
            }
            state.mode = InputMode::Normal;
        }
        KeyCode::Esc => {
            state.input.clear();
            state.mode = InputMode::Normal;
            state.info = "Edit cancelled".into();
        }
        KeyCode::Backspace => {
            state.input.pop();
        }
        KeyCode::Char(c) => state.input.push(c),
        _ => {}
    }
}

fn apply(session: &mut Session, state: &mut UiState, intent: Intent) {
    if let Err(e) = orchestrator::dispatch(session, intent) {
        tracing::warn!(error = %e, "Intent rejected");
        state.info = e.to_string();
    }
}

fn copy(state: &mut UiState, text: &str, what: &str) {
    match export::copy_to_clipboard(text) {
        Ok(()) => {
            state.mark_copied(Instant::now());
            state.info = format!("Copied {what}: {}", shorten(text, 60));
        }
        Err(e) => {
            state.info = format!("Clipboard copy failed: {e:#}");
        }
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState, session: &Session) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    let title = format!("incident-runbook: {}", session.catalog().name());
    let tabs = Tabs::new(vec![
        Line::from("Checklist"),
        Line::from("Incident"),
        Line::from("Help"),
    ])
    .select(state.tab)
    .block(Block::default().borders(Borders::ALL).title(title))
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        TAB_CHECKLIST => draw_checklist(chunks[1], f, state, session),
        TAB_INCIDENT => draw_incident(chunks[1], f, state, session),
        _ => help::draw_help(chunks[1], f),
    }

    draw_status(chunks[2], f, state);
}

fn status_style(status: Status) -> (&'static str, Style) {
    match status {
        Status::Completed => ("[x]", Style::default().fg(Color::Green)),
        Status::Skipped => ("[-]", Style::default().fg(Color::DarkGray)),
        Status::Pending => ("[ ]", Style::default()),
    }
}

fn draw_checklist(area: Rect, f: &mut ratatui::Frame, state: &UiState, session: &Session) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);
    charts::draw_progress(rows[0], f, &state.snapshot);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)].as_ref())
        .split(rows[1]);

    let snap = &state.snapshot;
    let mut items = Vec::with_capacity(snap.visible.len());
    let mut last_category = None;
    let mut selected = None;
    for step in &snap.visible {
        // Category headers only make sense when the list is unfiltered.
        if snap.query.trim().is_empty() && last_category != Some(step.category) {
            last_category = Some(step.category);
            items.push(ListItem::new(Line::from(Span::styled(
                step.category.name(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))));
        }
        if snap.cursor == Some(step.index) {
            selected = Some(items.len());
        }
        let (marker, style) = status_style(step.status);
        let mut spans = vec![
            Span::styled(format!("{marker} "), style),
            Span::styled(step.title.clone(), style),
        ];
        if step.critical && step.status != Status::Completed {
            spans.push(Span::styled(" !", Style::default().fg(Color::Red)));
        }
        items.push(ListItem::new(Line::from(spans)));
    }

    let list_title = if snap.query.trim().is_empty() {
        format!("Steps ({})", snap.visible.len())
    } else {
        format!("Steps matching \"{}\" ({})", snap.query, snap.visible.len())
    };
    let list = if items.is_empty() {
        List::new(vec![ListItem::new("No steps match the search")])
    } else {
        List::new(items)
    }
    .block(Block::default().borders(Borders::ALL).title(list_title))
    .highlight_style(Style::default().bg(Color::DarkGray))
    .highlight_symbol("> ");
    let mut list_state = ListState::default().with_selected(selected);
    f.render_stateful_widget(list, cols[0], &mut list_state);

    draw_step_detail(cols[1], f, state, session);
}

fn draw_step_detail(area: Rect, f: &mut ratatui::Frame, state: &UiState, session: &Session) {
    let block = Block::default().borders(Borders::ALL).title("Step");
    let Some(step) = session.current() else {
        f.render_widget(Paragraph::new("Nothing selected").block(block), area);
        return;
    };
    let status = session.statuses().iter().find(|s| s.id == step.id);

    let mut lines: Vec<Line<'static>> = vec![Line::from(Span::styled(
        step.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    push_wrapped_status_kv(&mut lines, "Category", step.category.name(), area.width);
    if step.critical {
        lines.push(Line::from(Span::styled(
            "Critical step",
            Style::default().fg(Color::Red),
        )));
    }
    if let Some(st) = status {
        let (_, style) = status_style(st.status);
        lines.push(Line::from(vec![
            Span::styled("Status:", Style::default().fg(Color::Gray)),
            Span::raw(" "),
            Span::styled(st.status.to_string(), style),
        ]));
        if let Some(ts) = st.completed_at {
            push_wrapped_status_kv(&mut lines, "Completed", &format_timestamp(ts), area.width);
        }
    }
    if !step.description.trim().is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(step.description.trim().to_string()));
    }

    let entries = annex_entries(step);
    if !entries.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Commands & links ([ ] select, y copy):",
            Style::default().fg(Color::Gray),
        )));
        for (i, entry) in entries.iter().enumerate() {
            let selected = i == state.annex_selected;
            let pointer = if selected { "> " } else { "  " };
            let value_style = match entry.kind {
                AnnexKind::Command => Style::default().fg(Color::Yellow),
                AnnexKind::Link => Style::default().fg(Color::Cyan),
            };
            let value_style = if selected {
                value_style.add_modifier(Modifier::BOLD)
            } else {
                value_style
            };
            lines.push(Line::from(vec![
                Span::raw(pointer),
                Span::raw(format!("{}: ", entry.label)),
            ]));
            lines.push(Line::from(vec![
                Span::raw("    "),
                Span::styled(entry.value.clone(), value_style),
            ]));
        }
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(block);
    f.render_widget(p, area);
}

fn draw_incident(area: Rect, f: &mut ratatui::Frame, state: &UiState, session: &Session) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(area);

    let meta = &state.snapshot.metadata;
    let editing = match state.mode {
        InputMode::EditMeta(field) => Some(field),
        _ => None,
    };
    let mut lines = Vec::new();
    for (i, field) in MetadataField::ALL.into_iter().enumerate() {
        let selected = i == state.meta_selected;
        let value = if editing == Some(field) {
            format!("{}_", state.input)
        } else {
            meta.value(field)
        };
        let value = if value.is_empty() { "-".to_string() } else { value };
        let label_style = if selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(vec![
            Span::raw(if selected { "> " } else { "  " }),
            Span::styled(format!("{}:", field.label()), label_style),
        ]));
        lines.push(Line::from(vec![Span::raw("    "), Span::raw(value)]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter edits; severity cycles on Enter.",
        Style::default().fg(Color::DarkGray),
    )));
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Incident")),
        cols[0],
    );

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(cols[1]);
    charts::draw_progress(right[0], f, &state.snapshot);
    let progress = crate::metrics::category_progress(session.catalog(), session.statuses());
    charts::draw_category_chart(right[1], f, &progress);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut spans = Vec::new();
    match state.mode {
        InputMode::Search => {
            spans.push(Span::styled("Search: ", Style::default().fg(Color::Yellow)));
            spans.push(Span::raw(format!("{}_", state.input)));
            spans.push(Span::styled(
                "  (enter keep, esc clear)",
                Style::default().fg(Color::DarkGray),
            ));
        }
        InputMode::EditMeta(field) => {
            spans.push(Span::styled(
                format!("Editing {}", field.label()),
                Style::default().fg(Color::Yellow),
            ));
            spans.push(Span::styled(
                "  (enter save, esc cancel)",
                Style::default().fg(Color::DarkGray),
            ));
        }
        InputMode::ConfirmReset => {
            spans.push(Span::styled(
                state.info.clone(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
        }
        InputMode::Normal => spans.push(Span::raw(state.info.clone())),
    }

    let critical = state.snapshot.critical_outstanding;
    if critical > 0 {
        spans.push(Span::styled(
            format!("  {critical} critical open"),
            Style::default().fg(Color::Red),
        ));
    }
    if state.copied_visible(Instant::now()) {
        spans.push(Span::styled(
            "  ✓ copied",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
    }

    f.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title("Status")),
        area,
    );
}
