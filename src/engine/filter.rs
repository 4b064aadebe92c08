//! Search projection over the catalog.

use crate::catalog::Catalog;
use crate::model::StepDefinition;
use std::iter::Enumerate;
use std::slice::Iter;

/// Lazy, restartable view of the steps matching a query, in catalog order.
///
/// Yields `(catalog_index, step)`. Clone it to iterate again.
#[derive(Debug, Clone)]
pub struct Visible<'a> {
    steps: Enumerate<Iter<'a, StepDefinition>>,
    needle: Option<String>,
}

impl<'a> Iterator for Visible<'a> {
    type Item = (usize, &'a StepDefinition);

    fn next(&mut self) -> Option<Self::Item> {
        let needle = self.needle.as_deref();
        self.steps
            .by_ref()
            .find(|(_, step)| needle.map_or(true, |n| matches(step, n)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (_, upper) = self.steps.size_hint();
        (0, upper)
    }
}

/// Steps whose title, description or category name contain `query`, ignoring case.
/// A blank query matches everything; any other query is matched as typed, whitespace
/// included.
pub fn filter<'a>(catalog: &'a Catalog, query: &str) -> Visible<'a> {
    Visible {
        steps: catalog.steps().iter().enumerate(),
        needle: (!query.trim().is_empty()).then(|| query.to_lowercase()),
    }
}

/// `needle` must already be lowercase.
fn matches(step: &StepDefinition, needle: &str) -> bool {
    step.title.to_lowercase().contains(needle)
        || step.description.to_lowercase().contains(needle)
        || step.category.name().to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_step;
    use crate::model::Category;

    fn catalog() -> Catalog {
        let mut snapshot = test_step("snap", "Snapshot volumes", Category::Forensics);
        snapshot.description = "Preserve EBS disks before remediation".into();
        Catalog::new(
            "t",
            vec![
                test_step("keys", "Deactivate access keys", Category::Containment),
                snapshot,
                test_step("mfa", "Enforce MFA", Category::Hardening),
                test_step("review", "Hold the review", Category::PostIncident),
            ],
        )
        .unwrap()
    }

    fn ids(v: Visible<'_>) -> Vec<&str> {
        v.map(|(_, s)| s.id.as_str()).collect()
    }

    #[test]
    fn blank_query_returns_full_catalog_in_order() {
        let c = catalog();
        assert_eq!(ids(filter(&c, "")), ["keys", "snap", "mfa", "review"]);
        assert_eq!(ids(filter(&c, "   \t")), ["keys", "snap", "mfa", "review"]);
    }

    #[test]
    fn matches_title_description_and_category_case_insensitively() {
        let c = catalog();
        assert_eq!(ids(filter(&c, "ACCESS")), ["keys"]);
        assert_eq!(ids(filter(&c, "ebs")), ["snap"]);
        assert_eq!(ids(filter(&c, "hardening")), ["mfa"]);
        assert_eq!(ids(filter(&c, "post-inc")), ["review"]);
        assert_eq!(ids(filter(&c, "e")), ["keys", "snap", "mfa", "review"]);
        assert!(ids(filter(&c, "kubernetes")).is_empty());
    }

    #[test]
    fn surrounding_whitespace_is_part_of_the_query() {
        let c = catalog();
        assert!(ids(filter(&c, "MFA ")).is_empty());
        assert_eq!(ids(filter(&c, " MFA")), ["mfa"]);
        assert_eq!(ids(filter(&c, "access keys")), ["keys"]);
        assert_eq!(ids(filter(&c, " keys")), ["keys"]);
    }

    #[test]
    fn yields_catalog_indices_and_is_restartable() {
        let c = catalog();
        let visible = filter(&c, "re");
        let first: Vec<usize> = visible.clone().map(|(i, _)| i).collect();
        let second: Vec<usize> = visible.map(|(i, _)| i).collect();
        assert_eq!(first, second);
        assert_eq!(first, [1, 3]);
    }
}
