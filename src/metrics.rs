use crate::catalog::Catalog;
use crate::model::{Category, Status, StepStatus};

/// Completion percentage: `round(100 * completed / total)`, 0 for an empty set.
/// Skipped steps do not count as complete.
pub fn percent_complete(statuses: &[StepStatus]) -> u8 {
    let completed = statuses.iter().filter(|s| s.is_completed()).count();
    rounded_percent(completed, statuses.len())
}

/// Integer round-half-up of `100 * part / total`.
pub fn rounded_percent(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (200 * part + total) / (2 * total);
    pct.min(100) as u8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub completed: usize,
    pub skipped: usize,
    pub pending: usize,
}

pub fn status_counts(statuses: &[StepStatus]) -> StatusCounts {
    statuses
        .iter()
        .fold(StatusCounts::default(), |mut acc, s| {
            match s.status {
                Status::Completed => acc.completed += 1,
                Status::Skipped => acc.skipped += 1,
                Status::Pending => acc.pending += 1,
            }
            acc
        })
}

/// Progress of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryProgress {
    pub category: Category,
    pub completed: usize,
    pub skipped: usize,
    pub total: usize,
}

impl CategoryProgress {
    pub fn percent(&self) -> u8 {
        rounded_percent(self.completed, self.total)
    }
}

/// Per-category progress in order of first appearance in the catalog.
/// `statuses` must be in catalog order.
pub fn category_progress(catalog: &Catalog, statuses: &[StepStatus]) -> Vec<CategoryProgress> {
    let mut out: Vec<CategoryProgress> = Vec::new();
    for (step, status) in catalog.steps().iter().zip(statuses) {
        let idx = match out.iter().position(|p| p.category == step.category) {
            Some(i) => i,
            None => {
                out.push(CategoryProgress {
                    category: step.category,
                    completed: 0,
                    skipped: 0,
                    total: 0,
                });
                out.len() - 1
            }
        };
        let entry = &mut out[idx];
        entry.total += 1;
        match status.status {
            Status::Completed => entry.completed += 1,
            Status::Skipped => entry.skipped += 1,
            Status::Pending => {}
        }
    }
    out
}

/// Number of critical steps that are not completed yet.
pub fn critical_outstanding(catalog: &Catalog, statuses: &[StepStatus]) -> usize {
    catalog
        .steps()
        .iter()
        .zip(statuses)
        .filter(|(step, status)| step.critical && !status.is_completed())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_step;

    fn with(statuses: &[Status]) -> Vec<StepStatus> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, s)| StepStatus {
                id: format!("s{i}"),
                status: *s,
                completed_at: (*s == Status::Completed).then(time::OffsetDateTime::now_utc),
            })
            .collect()
    }

    #[test]
    fn percent_rounds_to_nearest() {
        use crate::model::Status::*;
        assert_eq!(percent_complete(&with(&[Completed, Skipped, Pending])), 33);
        assert_eq!(percent_complete(&with(&[Completed, Completed, Pending])), 67);
        assert_eq!(percent_complete(&with(&[Completed, Pending])), 50);
        assert_eq!(percent_complete(&with(&[Completed; 3])), 100);
        assert_eq!(percent_complete(&with(&[Skipped; 3])), 0);
        assert_eq!(rounded_percent(1, 8), 13);
    }

    #[test]
    fn empty_set_is_zero() {
        assert_eq!(percent_complete(&[]), 0);
    }

    #[test]
    fn completing_more_never_decreases_and_reverting_restores() {
        use crate::model::Status::*;
        let mut statuses = with(&[Pending, Skipped, Pending, Completed, Pending, Pending, Pending]);
        let mut last = percent_complete(&statuses);
        for i in 0..statuses.len() {
            let before = percent_complete(&statuses);
            let previous = statuses[i].status;
            statuses[i].status = Completed;
            let after = percent_complete(&statuses);
            assert!(after >= last && after >= before);
            statuses[i].status = previous;
            assert_eq!(percent_complete(&statuses), before);
            statuses[i].status = Completed;
            last = after;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn category_breakdown_follows_catalog_order() {
        use crate::model::Category::*;
        let catalog = Catalog::new(
            "t",
            vec![
                test_step("a", "A", Triage),
                test_step("b", "B", Containment),
                test_step("c", "C", Triage),
            ],
        )
        .unwrap();
        let mut statuses = with(&[Status::Completed, Status::Skipped, Status::Pending]);
        for (s, id) in statuses.iter_mut().zip(["a", "b", "c"]) {
            s.id = id.into();
        }
        let progress = category_progress(&catalog, &statuses);
        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].category, Triage);
        assert_eq!((progress[0].completed, progress[0].total), (1, 2));
        assert_eq!(progress[0].percent(), 50);
        assert_eq!(progress[1].skipped, 1);

        let counts = status_counts(&statuses);
        assert_eq!((counts.completed, counts.skipped, counts.pending), (1, 1, 1));
    }

    #[test]
    fn critical_outstanding_ignores_completed() {
        use crate::model::Category::*;
        let mut a = test_step("a", "A", Triage);
        a.critical = true;
        let mut b = test_step("b", "B", Triage);
        b.critical = true;
        let catalog = Catalog::new("t", vec![a, b, test_step("c", "C", Triage)]).unwrap();
        let statuses = with(&[Status::Completed, Status::Skipped, Status::Pending]);
        assert_eq!(critical_outstanding(&catalog, &statuses), 1);
    }
}
