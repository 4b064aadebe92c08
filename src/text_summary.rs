//! Text summary builder for CLI output.
//!
//! This module formats the session state as human-readable lines for text mode.

use crate::engine::{format_timestamp, Session};
use crate::metrics;
use crate::model::Status;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

fn marker(status: Status) -> &'static str {
    match status {
        Status::Completed => "[x]",
        Status::Skipped => "[-]",
        Status::Pending => "[ ]",
    }
}

/// Build a text summary: incident details, overall and per-category progress, then
/// every step grouped by category.
pub(crate) fn build_text_summary(session: &Session) -> TextSummary {
    let mut lines = Vec::new();
    let catalog = session.catalog();
    let statuses = session.statuses();
    let meta = session.metadata();

    lines.push(format!("Runbook: {}", catalog.name()));
    if !meta.name.trim().is_empty() {
        lines.push(format!("Incident: {}", meta.name));
    }
    lines.push(format!("Severity: {}", meta.severity));
    for (label, value) in [
        ("Account", &meta.account),
        ("Region", &meta.region),
        ("Commander", &meta.commander),
        ("Scribe", &meta.scribe),
    ] {
        if !value.trim().is_empty() {
            lines.push(format!("{label}: {value}"));
        }
    }

    let counts = metrics::status_counts(statuses);
    lines.push(format!(
        "Progress: {}% ({} completed, {} skipped, {} pending)",
        session.progress(),
        counts.completed,
        counts.skipped,
        counts.pending
    ));
    let critical = metrics::critical_outstanding(catalog, statuses);
    if critical > 0 {
        lines.push(format!("Critical steps outstanding: {critical}"));
    }

    let categories = metrics::category_progress(catalog, statuses);
    let mut current = None;
    for (step, status) in catalog.steps().iter().zip(statuses) {
        if current != Some(step.category) {
            current = Some(step.category);
            let progress = categories.iter().find(|p| p.category == step.category);
            lines.push(String::new());
            match progress {
                Some(p) => lines.push(format!(
                    "== {} ({}/{}) ==",
                    step.category, p.completed, p.total
                )),
                None => lines.push(format!("== {} ==", step.category)),
            }
        }
        let mut line = format!(
            "{} {}{}",
            marker(status.status),
            step.title,
            if step.critical { " (critical)" } else { "" }
        );
        if let Some(ts) = status.completed_at {
            line.push_str(&format!("  done {}", format_timestamp(ts)));
        }
        lines.push(line);
    }

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{test_step, Catalog};
    use crate::model::{Category, IncidentMetadata};
    use crate::storage::MemoryStore;

    #[test]
    fn summary_groups_steps_and_reports_progress() {
        let mut critical = test_step("b", "Revoke sessions", Category::Containment);
        critical.critical = true;
        let catalog = Catalog::new(
            "mini",
            vec![
                test_step("a", "Scope accounts", Category::Triage),
                critical,
                test_step("c", "Snapshot disks", Category::Containment),
            ],
        )
        .unwrap();
        let meta = IncidentMetadata {
            name: "Leaked key".into(),
            region: "us-east-1".into(),
            ..Default::default()
        };
        let mut s = Session::new(catalog, Box::new(MemoryStore::default()), meta);
        s.mark_done("a", true).unwrap();
        s.skip("c").unwrap();

        let lines = build_text_summary(&s).lines;
        assert_eq!(lines[0], "Runbook: mini");
        assert!(lines.contains(&"Incident: Leaked key".to_string()));
        assert!(lines.contains(&"Region: us-east-1".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("Account:")));
        assert!(lines.contains(&"Progress: 33% (1 completed, 1 skipped, 1 pending)".to_string()));
        assert!(lines.contains(&"Critical steps outstanding: 1".to_string()));
        assert!(lines.contains(&"== Containment (0/2) ==".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("[x] Scope accounts  done ")));
        assert!(lines.contains(&"[ ] Revoke sessions (critical)".to_string()));
        assert!(lines.contains(&"[-] Snapshot disks".to_string()));
    }
}
