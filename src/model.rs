use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Runbook phase a step belongs to. Catalog order decides grouping, not this enum's order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Preparation,
    Triage,
    Containment,
    Forensics,
    Eradication,
    Recovery,
    Hardening,
    #[serde(rename = "Post-Incident", alias = "PostIncident")]
    PostIncident,
}

impl Category {
    #[cfg(test)]
    pub const ALL: [Category; 8] = [
        Category::Preparation,
        Category::Triage,
        Category::Containment,
        Category::Forensics,
        Category::Eradication,
        Category::Recovery,
        Category::Hardening,
        Category::PostIncident,
    ];

    /// Display name, also the text matched by search.
    pub fn name(self) -> &'static str {
        match self {
            Category::Preparation => "Preparation",
            Category::Triage => "Triage",
            Category::Containment => "Containment",
            Category::Forensics => "Forensics",
            Category::Eradication => "Eradication",
            Category::Recovery => "Recovery",
            Category::Hardening => "Hardening",
            Category::PostIncident => "Post-Incident",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandAnnex {
    pub label: String,
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceLink {
    pub label: String,
    pub url: String,
}

/// One immutable runbook step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub id: String,
    pub title: String,
    pub category: Category,
    #[serde(default)]
    pub critical: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub commands: Vec<CommandAnnex>,
    #[serde(default)]
    pub links: Vec<ReferenceLink>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Completed,
    Skipped,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
            Status::Skipped => "skipped",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable status of one step. `completed_at` is set iff `status` is `Completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStatus {
    pub id: String,
    pub status: Status,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<OffsetDateTime>,
}

impl StepStatus {
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: Status::Pending,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Undetermined,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Undetermined,
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Undetermined => "undetermined",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Next severity in escalation order, wrapping back to `Undetermined`.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|sev| sev.as_str() == needle)
            .ok_or_else(|| {
                format!(
                    "unknown severity '{s}' (expected one of: undetermined, low, medium, high, critical)"
                )
            })
    }
}

/// Free-form incident details captured into audit exports. Session-scoped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentMetadata {
    pub name: String,
    pub severity: Severity,
    pub account: String,
    pub region: String,
    pub commander: String,
    pub scribe: String,
}

/// Editable metadata fields, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    Name,
    Severity,
    Account,
    Region,
    Commander,
    Scribe,
}

impl MetadataField {
    pub const ALL: [MetadataField; 6] = [
        MetadataField::Name,
        MetadataField::Severity,
        MetadataField::Account,
        MetadataField::Region,
        MetadataField::Commander,
        MetadataField::Scribe,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MetadataField::Name => "Incident name",
            MetadataField::Severity => "Severity",
            MetadataField::Account => "Account / tenant",
            MetadataField::Region => "Region",
            MetadataField::Commander => "Incident commander",
            MetadataField::Scribe => "Scribe",
        }
    }

    /// Build an edit from free text. Severity is parsed; text fields are taken as-is.
    pub fn edit(self, value: String) -> Result<MetadataEdit, String> {
        Ok(match self {
            MetadataField::Name => MetadataEdit::Name(value),
            MetadataField::Severity => MetadataEdit::Severity(value.parse()?),
            MetadataField::Account => MetadataEdit::Account(value),
            MetadataField::Region => MetadataEdit::Region(value),
            MetadataField::Commander => MetadataEdit::Commander(value),
            MetadataField::Scribe => MetadataEdit::Scribe(value),
        })
    }
}

/// A single metadata field update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataEdit {
    Name(String),
    Severity(Severity),
    Account(String),
    Region(String),
    Commander(String),
    Scribe(String),
}

impl IncidentMetadata {
    pub fn apply(&mut self, edit: MetadataEdit) {
        match edit {
            MetadataEdit::Name(v) => self.name = v,
            MetadataEdit::Severity(v) => self.severity = v,
            MetadataEdit::Account(v) => self.account = v,
            MetadataEdit::Region(v) => self.region = v,
            MetadataEdit::Commander(v) => self.commander = v,
            MetadataEdit::Scribe(v) => self.scribe = v,
        }
    }

    /// Current value of a field as display text.
    pub fn value(&self, field: MetadataField) -> String {
        match field {
            MetadataField::Name => self.name.clone(),
            MetadataField::Severity => self.severity.to_string(),
            MetadataField::Account => self.account.clone(),
            MetadataField::Region => self.region.clone(),
            MetadataField::Commander => self.commander.clone(),
            MetadataField::Scribe => self.scribe.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_with_display_name() {
        let json = serde_json::to_string(&Category::PostIncident).unwrap();
        assert_eq!(json, "\"Post-Incident\"");
        let back: Category = serde_json::from_str("\"PostIncident\"").unwrap();
        assert_eq!(back, Category::PostIncident);
    }

    #[test]
    fn step_status_omits_missing_timestamp() {
        let json = serde_json::to_string(&StepStatus::pending("a")).unwrap();
        assert_eq!(json, r#"{"id":"a","status":"pending"}"#);
    }

    #[test]
    fn severity_parses_case_insensitively_and_cycles() {
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
        assert!("sev1".parse::<Severity>().is_err());
        assert_eq!(Severity::Critical.next(), Severity::Undetermined);
        assert_eq!(Severity::Undetermined.next(), Severity::Low);
    }

    #[test]
    fn metadata_edit_updates_single_field() {
        let mut meta = IncidentMetadata::default();
        meta.apply(MetadataField::Region.edit("eu-west-1".into()).unwrap());
        meta.apply(MetadataField::Severity.edit("medium".into()).unwrap());
        assert_eq!(meta.region, "eu-west-1");
        assert_eq!(meta.severity, Severity::Medium);
        assert_eq!(meta.value(MetadataField::Severity), "medium");
        assert!(meta.name.is_empty());
    }
}
