//! Step catalog: the ordered, immutable list of runbook steps.
//!
//! The built-in runbook is embedded YAML; `--catalog` accepts a file with the same shape.

use crate::error::{RunbookError, RunbookResult};
use crate::model::StepDefinition;
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

const BUILTIN_RUNBOOK: &str = include_str!("../runbooks/cloud-account-compromise.yaml");

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    name: String,
    steps: Vec<StepDefinition>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    name: String,
    steps: Vec<StepDefinition>,
}

impl Catalog {
    /// Build a catalog, rejecting empty catalogs, blank ids/titles and duplicate ids.
    pub fn new(name: impl Into<String>, steps: Vec<StepDefinition>) -> RunbookResult<Self> {
        if steps.is_empty() {
            return Err(RunbookError::EmptyCatalog);
        }
        let mut seen = HashSet::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            if step.id.trim().is_empty() {
                return Err(RunbookError::InvalidStep { index, field: "id" });
            }
            if step.title.trim().is_empty() {
                return Err(RunbookError::InvalidStep {
                    index,
                    field: "title",
                });
            }
            if !seen.insert(step.id.as_str()) {
                return Err(RunbookError::DuplicateStep(step.id.clone()));
            }
        }
        Ok(Self {
            name: name.into(),
            steps,
        })
    }

    /// The incident-response runbook shipped with the binary.
    pub fn builtin() -> RunbookResult<Self> {
        Self::from_yaml_str(BUILTIN_RUNBOOK)
    }

    pub fn from_yaml_str(content: &str) -> RunbookResult<Self> {
        let doc: CatalogDocument = serde_yaml::from_str(content)?;
        Self::new(doc.name, doc.steps)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read catalog {}", path.display()))?;
        let catalog = Self::from_yaml_str(&content)
            .with_context(|| format!("parse catalog {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            steps = catalog.len(),
            "Loaded custom catalog"
        );
        Ok(catalog)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> + '_ {
        self.steps.iter().map(|s| s.id.as_str())
    }
}

#[cfg(test)]
pub(crate) fn test_step(id: &str, title: &str, category: crate::model::Category) -> StepDefinition {
    StepDefinition {
        id: id.to_string(),
        title: title.to_string(),
        category,
        critical: false,
        description: String::new(),
        commands: Vec::new(),
        links: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    #[test]
    fn builtin_catalog_is_valid_and_covers_every_category() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.len() >= Category::ALL.len());
        for category in Category::ALL {
            assert!(
                catalog.steps().iter().any(|s| s.category == category),
                "no step in {category}"
            );
        }
        assert!(catalog.steps().iter().any(|s| s.critical));
        assert!(catalog.steps().iter().any(|s| !s.commands.is_empty()));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let steps = vec![
            test_step("a", "First", Category::Triage),
            test_step("a", "Again", Category::Triage),
        ];
        let err = Catalog::new("dup", steps).unwrap_err();
        assert!(matches!(err, RunbookError::DuplicateStep(id) if id == "a"));
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(matches!(
            Catalog::new("empty", Vec::new()),
            Err(RunbookError::EmptyCatalog)
        ));
    }

    #[test]
    fn blank_title_is_rejected() {
        let steps = vec![test_step("a", "  ", Category::Triage)];
        assert!(matches!(
            Catalog::new("blank", steps),
            Err(RunbookError::InvalidStep { index: 0, field: "title" })
        ));
    }

    #[test]
    fn yaml_catalog_keeps_order_and_annexes() {
        let yaml = r#"
name: mini
steps:
  - id: notify
    title: Notify the team
    category: Preparation
    critical: true
    commands:
      - label: Page
        command: pagerduty trigger
  - id: lessons
    title: Write lessons learned
    category: Post-Incident
    links:
      - label: Template
        url: https://example.com/pir
"#;
        let catalog = Catalog::from_yaml_str(yaml).unwrap();
        assert_eq!(catalog.name(), "mini");
        assert_eq!(catalog.identities().collect::<Vec<_>>(), ["notify", "lessons"]);
        assert_eq!(catalog.position("lessons"), Some(1));
        assert!(catalog.get(0).unwrap().critical);
        assert_eq!(catalog.get(0).unwrap().commands[0].command, "pagerduty trigger");
        assert_eq!(catalog.get(1).unwrap().links.len(), 1);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = Catalog::from_yaml_str("name: x\nsteps: [").unwrap_err();
        assert!(matches!(err, RunbookError::InvalidCatalog(_)));
    }
}
