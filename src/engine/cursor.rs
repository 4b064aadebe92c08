//! Navigation cursor over catalog positions.

use crate::model::StepStatus;

/// Index of the displayed catalog step, or `None` when nothing is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    position: Option<usize>,
}

impl Cursor {
    /// Start on the first step.
    pub fn new(len: usize) -> Self {
        Self {
            position: (len > 0).then_some(0),
        }
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn go_to(&mut self, index: usize) {
        self.position = Some(index);
    }

    /// Move to the next visible step, clamped at the last one. No-op while unresolved.
    ///
    /// `visible` holds catalog indices in catalog order.
    pub fn go_next(&mut self, visible: &[usize]) {
        if let Some(p) = self.position {
            if let Some(&next) = visible.iter().find(|&&i| i > p) {
                self.position = Some(next);
            }
        }
    }

    /// Move to the previous visible step, clamped at the first one. No-op while unresolved.
    pub fn go_previous(&mut self, visible: &[usize]) {
        if let Some(p) = self.position {
            if let Some(&prev) = visible.iter().rev().find(|&&i| i < p) {
                self.position = Some(prev);
            }
        }
    }

    /// Jump to the nearest visible step after `from` that is not completed. Stays put if none.
    pub fn advance_to_incomplete(&mut self, from: usize, visible: &[usize], statuses: &[StepStatus]) {
        if let Some(&next) = visible
            .iter()
            .find(|&&i| i > from && statuses.get(i).is_some_and(|s| !s.is_completed()))
        {
            self.position = Some(next);
        }
    }

    /// Land on the first visible step after `from`, clamped at the last visible step.
    pub fn step_after(&mut self, from: usize, visible: &[usize]) {
        if let Some(&next) = visible.iter().find(|&&i| i > from).or(visible.last()) {
            self.position = Some(next);
        }
    }

    /// Keep the cursor on a visible step after the visible set changed.
    ///
    /// `visible` holds catalog indices in catalog order.
    pub fn reconcile(&mut self, visible: &[usize]) {
        match self.position {
            Some(p) if visible.contains(&p) => {}
            _ => self.position = visible.first().copied(),
        }
    }
}
