//! Audit report projection.
//!
//! The serialized shape of [`AuditReport`] is consumed by downstream audit tooling;
//! field names and nesting must stay stable.

use crate::catalog::Catalog;
use crate::metrics;
use crate::model::{Category, IncidentMetadata, Status, StepStatus};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    pub incident: IncidentMetadata,
    pub progress_percent: u8,
    pub steps: Vec<AuditStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub critical: bool,
    pub status: Status,
    /// `null` unless the step is completed.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

/// Snapshot catalog, statuses and metadata into a report. `statuses` is in catalog order.
pub fn export_audit(
    catalog: &Catalog,
    statuses: &[StepStatus],
    metadata: &IncidentMetadata,
    now: OffsetDateTime,
) -> AuditReport {
    let steps = catalog
        .steps()
        .iter()
        .map(|step| {
            let status = statuses.iter().find(|s| s.id == step.id);
            AuditStep {
                id: step.id.clone(),
                title: step.title.clone(),
                category: step.category,
                critical: step.critical,
                status: status.map(|s| s.status).unwrap_or_default(),
                completed_at: status.and_then(|s| s.completed_at),
            }
        })
        .collect();

    AuditReport {
        generated_at: now,
        incident: metadata.clone(),
        progress_percent: metrics::percent_complete(statuses),
        steps,
    }
}

/// Default export file name derived from the incident name.
///
/// Runs of characters other than ASCII letters and digits collapse into one `-`.
pub fn suggested_filename(incident_name: &str, extension: &str) -> String {
    let mut slug = String::with_capacity(incident_name.len());
    for ch in incident_name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    let stem = if slug.is_empty() { "incident" } else { slug };
    format!("{stem}-audit.{extension}")
}

/// RFC 3339 text for a timestamp, as used in exports and summaries.
pub fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| ts.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_step;
    use time::macros::datetime;

    fn catalog() -> Catalog {
        Catalog::new(
            "t",
            vec![
                test_step("a", "First", Category::Triage),
                test_step("b", "Second", Category::Containment),
                test_step("c", "Third", Category::Recovery),
            ],
        )
        .unwrap()
    }

    #[test]
    fn untouched_statuses_export_as_pending_with_null_timestamps() {
        let c = catalog();
        let statuses: Vec<_> = c.identities().map(StepStatus::pending).collect();
        let report = export_audit(&c, &statuses, &IncidentMetadata::default(), datetime!(2024-03-01 12:00 UTC));
        assert_eq!(report.progress_percent, 0);
        assert!(report
            .steps
            .iter()
            .all(|s| s.status == Status::Pending && s.completed_at.is_none()));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["steps"][0]["completed_at"].is_null());
        assert_eq!(json["generated_at"], "2024-03-01T12:00:00Z");
        assert_eq!(json["incident"]["severity"], "undetermined");
    }

    #[test]
    fn report_shape_is_stable() {
        let c = catalog();
        let mut statuses: Vec<_> = c.identities().map(StepStatus::pending).collect();
        statuses[0].status = Status::Completed;
        statuses[0].completed_at = Some(datetime!(2024-03-01 11:30 UTC));
        let meta = IncidentMetadata {
            name: "Leaked key".into(),
            ..Default::default()
        };
        let report = export_audit(&c, &statuses, &meta, datetime!(2024-03-01 12:00 UTC));
        let json = serde_json::to_value(&report).unwrap();

        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        for key in ["generated_at", "incident", "progress_percent", "steps"] {
            assert!(keys.contains(&key), "missing {key}");
        }
        let step = &json["steps"][0];
        assert_eq!(step["id"], "a");
        assert_eq!(step["category"], "Triage");
        assert_eq!(step["status"], "completed");
        assert_eq!(step["completed_at"], "2024-03-01T11:30:00Z");
        assert_eq!(json["incident"]["name"], "Leaked key");

        let back: AuditReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn filename_collapses_non_alphanumeric_runs() {
        assert_eq!(suggested_filename("Prod key leak #42", "json"), "Prod-key-leak-42-audit.json");
        assert_eq!(suggested_filename("  a//b  ", "csv"), "a-b-audit.csv");
        assert_eq!(suggested_filename("", "json"), "incident-audit.json");
        assert_eq!(suggested_filename("***", "json"), "incident-audit.json");
    }
}
