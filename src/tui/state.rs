use crate::engine::{Session, Snapshot};
use crate::model::{MetadataField, StepDefinition};
use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};
use std::time::{Duration, Instant};

pub const TAB_CHECKLIST: usize = 0;
pub const TAB_INCIDENT: usize = 1;
pub const TAB_HELP: usize = 2;
pub const TAB_COUNT: usize = 3;

/// What keystrokes currently mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    EditMeta(MetadataField),
    ConfirmReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnexKind {
    Command,
    Link,
}

/// One copyable item attached to a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnexEntry {
    pub kind: AnnexKind,
    pub label: String,
    pub value: String,
}

/// Commands first, then links, in catalog order.
pub fn annex_entries(step: &StepDefinition) -> Vec<AnnexEntry> {
    let commands = step.commands.iter().map(|c| AnnexEntry {
        kind: AnnexKind::Command,
        label: c.label.clone(),
        value: c.command.clone(),
    });
    let links = step.links.iter().map(|l| AnnexEntry {
        kind: AnnexKind::Link,
        label: l.label.clone(),
        value: l.url.clone(),
    });
    commands.chain(links).collect()
}

/// Presentation-only state. Everything about the runbook itself lives in the session
/// and reaches the UI through `snapshot`.
pub struct UiState {
    pub tab: usize,
    pub mode: InputMode,
    pub info: String,
    pub snapshot: Snapshot,

    pub annex_selected: usize,
    pub meta_selected: usize,
    /// Text being typed in search or metadata edit mode.
    pub input: String,

    pub last_exported_path: Option<String>,
    pub copied_at: Option<Instant>,
    pub copied_indicator: Duration,
}

impl UiState {
    pub fn new(session: &Session, copied_indicator: Duration) -> Self {
        Self {
            tab: TAB_CHECKLIST,
            mode: InputMode::Normal,
            info: "Press ? for keybinds".into(),
            snapshot: session.snapshot(),
            annex_selected: 0,
            meta_selected: 0,
            input: String::new(),
            last_exported_path: None,
            copied_at: None,
            copied_indicator,
        }
    }

    pub fn refresh(&mut self, session: &Session) {
        self.snapshot = session.snapshot();
    }

    /// Position of the cursor inside the visible list.
    pub fn selected_row(&self) -> Option<usize> {
        let cursor = self.snapshot.cursor?;
        self.snapshot.visible.iter().position(|v| v.index == cursor)
    }

    pub fn selected_meta_field(&self) -> MetadataField {
        MetadataField::ALL[self.meta_selected % MetadataField::ALL.len()]
    }

    pub fn move_meta_selection(&mut self, forward: bool) {
        let n = MetadataField::ALL.len();
        self.meta_selected = if forward {
            (self.meta_selected + 1) % n
        } else {
            (self.meta_selected + n - 1) % n
        };
    }

    /// Step the annex selection, wrapping within `len` entries.
    pub fn move_annex_selection(&mut self, len: usize, forward: bool) {
        if len == 0 {
            self.annex_selected = 0;
            return;
        }
        let cur = self.annex_selected.min(len - 1);
        self.annex_selected = if forward {
            (cur + 1) % len
        } else {
            (cur + len - 1) % len
        };
    }

    pub fn mark_copied(&mut self, now: Instant) {
        self.copied_at = Some(now);
    }

    pub fn copied_visible(&self, now: Instant) -> bool {
        self.copied_at
            .is_some_and(|at| now.saturating_duration_since(at) < self.copied_indicator)
    }
}

/// Truncate for the status line, keeping the tail of long paths readable.
pub fn shorten(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max || max < 4 {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - (max - 3)).collect();
    format!("...{tail}")
}

pub fn push_wrapped_status_kv(
    out: &mut Vec<Line<'static>>,
    label: &str,
    value: &str,
    area_width: u16,
) {
    let value = value.trim();
    let value = if value.is_empty() { "-" } else { value };

    // Borders take two columns on each side.
    let usable_width = area_width.saturating_sub(4).max(1) as usize;
    let label_text = format!("{label}:");
    let first_width = usable_width
        .saturating_sub(label_text.chars().count() + 1)
        .max(1);
    let rest_width = usable_width.saturating_sub(2).max(1);

    let chars: Vec<char> = value.chars().collect();
    let (head, mut tail) = chars.split_at(first_width.min(chars.len()));
    out.push(Line::from(vec![
        Span::styled(label_text, Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::raw(head.iter().collect::<String>()),
    ]));
    while !tail.is_empty() {
        let (line, rest) = tail.split_at(rest_width.min(tail.len()));
        out.push(Line::from(vec![
            Span::raw("  "),
            Span::raw(line.iter().collect::<String>()),
        ]));
        tail = rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{test_step, Catalog};
    use crate::model::{Category, CommandAnnex, IncidentMetadata, ReferenceLink};
    use crate::storage::MemoryStore;

    fn session() -> Session {
        let steps = vec![
            test_step("a", "Open channel", Category::Preparation),
            test_step("b", "Disable keys", Category::Containment),
        ];
        Session::new(
            Catalog::new("t", steps).unwrap(),
            Box::new(MemoryStore::default()),
            IncidentMetadata::default(),
        )
    }

    #[test]
    fn annex_lists_commands_before_links() {
        let mut step = test_step("a", "A", Category::Triage);
        step.links.push(ReferenceLink {
            label: "Guide".into(),
            url: "https://example.org".into(),
        });
        step.commands.push(CommandAnnex {
            label: "List keys".into(),
            command: "aws iam list-access-keys".into(),
        });
        let entries = annex_entries(&step);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, AnnexKind::Command);
        assert_eq!(entries[1].value, "https://example.org");
    }

    #[test]
    fn selected_row_follows_cursor_within_filter() {
        let mut s = session();
        let mut state = UiState::new(&s, Duration::from_secs(2));
        assert_eq!(state.selected_row(), Some(0));

        s.set_query("keys");
        state.refresh(&s);
        assert_eq!(state.snapshot.visible.len(), 1);
        assert_eq!(state.selected_row(), Some(0));

        s.set_query("zzz");
        state.refresh(&s);
        assert_eq!(state.selected_row(), None);
    }

    #[test]
    fn selections_wrap() {
        let s = session();
        let mut state = UiState::new(&s, Duration::from_secs(2));
        state.move_meta_selection(false);
        assert_eq!(state.selected_meta_field(), MetadataField::Scribe);
        state.move_annex_selection(3, false);
        assert_eq!(state.annex_selected, 2);
        state.move_annex_selection(3, true);
        assert_eq!(state.annex_selected, 0);
        state.move_annex_selection(0, true);
        assert_eq!(state.annex_selected, 0);
    }

    #[test]
    fn copied_indicator_expires() {
        let s = session();
        let mut state = UiState::new(&s, Duration::from_millis(500));
        let t0 = Instant::now();
        assert!(!state.copied_visible(t0));
        state.mark_copied(t0);
        assert!(state.copied_visible(t0 + Duration::from_millis(100)));
        assert!(!state.copied_visible(t0 + Duration::from_millis(600)));
    }

    #[test]
    fn shorten_keeps_tail() {
        assert_eq!(shorten("short", 10), "short");
        assert_eq!(shorten("/very/long/path/audit.json", 14), ".../audit.json");
    }

    #[test]
    fn wrapped_kv_splits_long_values() {
        let mut out = Vec::new();
        push_wrapped_status_kv(&mut out, "Region", "abcdefghij", 14);
        // usable 10, first line 10 - 8 = 2 chars, then 8 per line.
        assert_eq!(out.len(), 2);
        push_wrapped_status_kv(&mut out, "Scribe", "", 40);
        assert_eq!(out.len(), 3);
    }
}
