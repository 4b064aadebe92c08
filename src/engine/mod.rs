//! Runbook session engine.
//!
//! [`Session`] owns the status store, navigation cursor, search query and incident
//! metadata for one operator session. Presentation layers send intents through the
//! methods below, subscribe for change notifications and pull a fresh [`Snapshot`]
//! whenever one arrives. Derived views (visible steps, progress) are recomputed on
//! every read.

mod audit;
mod cursor;
mod filter;
mod status;

pub use audit::{export_audit, format_timestamp, suggested_filename, AuditReport, AuditStep};
pub use cursor::Cursor;
pub use filter::{filter, Visible};
pub use status::StatusStore;

use crate::catalog::Catalog;
use crate::error::{RunbookError, RunbookResult};
use crate::metrics::{self, StatusCounts};
use crate::model::{
    Category, IncidentMetadata, MetadataEdit, Status, StepDefinition, StepStatus,
};
use crate::storage::Persistence;
use std::sync::mpsc;
use time::OffsetDateTime;

/// What changed in the session. Receivers re-read the snapshot rather than
/// applying the change themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Status { id: String },
    StatusReset,
    Cursor,
    Query,
    Metadata,
}

/// Read-only view of one step for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    pub index: usize,
    pub id: String,
    pub title: String,
    pub category: Category,
    pub critical: bool,
    pub status: Status,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub query: String,
    pub visible: Vec<StepView>,
    /// Catalog index of the current step, `None` when nothing is visible.
    pub cursor: Option<usize>,
    pub progress_percent: u8,
    pub counts: StatusCounts,
    pub critical_outstanding: usize,
    pub metadata: IncidentMetadata,
}

pub struct Session {
    catalog: Catalog,
    store: StatusStore,
    cursor: Cursor,
    query: String,
    metadata: IncidentMetadata,
    subscribers: Vec<mpsc::Sender<Change>>,
}

impl Session {
    /// Load persisted statuses for `catalog` and start on the first step.
    pub fn new(
        catalog: Catalog,
        persistence: Box<dyn Persistence>,
        metadata: IncidentMetadata,
    ) -> Self {
        let store = StatusStore::load(catalog.identities(), persistence);
        let cursor = Cursor::new(catalog.len());
        tracing::info!(
            catalog = catalog.name(),
            steps = catalog.len(),
            progress = metrics::percent_complete(store.entries()),
            "Session started"
        );
        Self {
            catalog,
            store,
            cursor,
            query: String::new(),
            metadata,
            subscribers: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Statuses in catalog order.
    pub fn statuses(&self) -> &[StepStatus] {
        self.store.entries()
    }

    pub fn status(&self, id: &str) -> Option<Status> {
        self.store.get(id).map(|s| s.status)
    }

    pub fn metadata(&self) -> &IncidentMetadata {
        &self.metadata
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn cursor_index(&self) -> Option<usize> {
        self.cursor.position()
    }

    /// The step currently presented, if any.
    pub fn current(&self) -> Option<&StepDefinition> {
        self.cursor.position().and_then(|i| self.catalog.get(i))
    }

    /// Steps matching the active query.
    pub fn visible(&self) -> Visible<'_> {
        filter(&self.catalog, &self.query)
    }

    pub fn progress(&self) -> u8 {
        metrics::percent_complete(self.store.entries())
    }

    /// Register for change notifications. Dropped receivers are pruned on the next change.
    pub fn subscribe(&mut self) -> mpsc::Receiver<Change> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn snapshot(&self) -> Snapshot {
        let statuses = self.store.entries();
        let visible = self
            .visible()
            .map(|(index, step)| StepView {
                index,
                id: step.id.clone(),
                title: step.title.clone(),
                category: step.category,
                critical: step.critical,
                status: statuses[index].status,
            })
            .collect();
        Snapshot {
            query: self.query.clone(),
            visible,
            cursor: self.cursor.position(),
            progress_percent: metrics::percent_complete(statuses),
            counts: metrics::status_counts(statuses),
            critical_outstanding: metrics::critical_outstanding(&self.catalog, statuses),
            metadata: self.metadata.clone(),
        }
    }

    /// Replace the search query and keep the cursor on a visible step.
    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query == self.query {
            return;
        }
        self.query = query;
        let before = self.cursor;
        let visible = self.visible_indices();
        self.cursor.reconcile(&visible);
        tracing::debug!(query = %self.query, visible = visible.len(), "Query changed");
        self.notify(Change::Query);
        if self.cursor != before {
            self.notify(Change::Cursor);
        }
    }

    /// Jump to a step, whether or not it matches the query.
    pub fn go_to(&mut self, id: &str) -> RunbookResult<()> {
        let index = self.index_of(id)?;
        self.move_cursor(|c| c.go_to(index));
        Ok(())
    }

    pub fn go_next(&mut self) {
        let visible = self.visible_indices();
        self.move_cursor(|c| {
            c.go_next(&visible);
            c.reconcile(&visible);
        });
    }

    pub fn go_previous(&mut self) {
        let visible = self.visible_indices();
        self.move_cursor(|c| {
            c.go_previous(&visible);
            c.reconcile(&visible);
        });
    }

    /// Check or uncheck a step.
    ///
    /// Checking completes it and moves to the nearest following visible step that is
    /// not completed. Unchecking returns it to pending and leaves the cursor alone.
    pub fn mark_done(&mut self, id: &str, done: bool) -> RunbookResult<()> {
        let index = self.index_of(id)?;
        if done {
            self.store.set_status(id, Status::Completed)?;
            self.notify(Change::Status { id: id.to_string() });
            let visible = self.visible_indices();
            let mut cursor = self.cursor;
            cursor.advance_to_incomplete(index, &visible, self.store.entries());
            cursor.reconcile(&visible);
            self.move_cursor(|c| *c = cursor);
        } else {
            self.store.set_status(id, Status::Pending)?;
            self.notify(Change::Status { id: id.to_string() });
        }
        Ok(())
    }

    /// Defer a step and move exactly one visible step forward.
    pub fn skip(&mut self, id: &str) -> RunbookResult<()> {
        let index = self.index_of(id)?;
        self.store.set_status(id, Status::Skipped)?;
        self.notify(Change::Status { id: id.to_string() });
        let visible = self.visible_indices();
        self.move_cursor(|c| {
            c.step_after(index, &visible);
            c.reconcile(&visible);
        });
        Ok(())
    }

    pub fn edit_metadata(&mut self, edit: MetadataEdit) {
        self.metadata.apply(edit);
        self.notify(Change::Metadata);
    }

    /// Return every step to pending and go back to the first visible step.
    pub fn reset(&mut self) {
        self.store.reset();
        self.notify(Change::StatusReset);
        let first = self.visible().next().map(|(i, _)| i);
        self.move_cursor(|c| match first {
            Some(i) => c.go_to(i),
            None => c.reconcile(&[]),
        });
    }

    /// Build an audit report stamped with `now`.
    pub fn export_audit(&self, now: OffsetDateTime) -> AuditReport {
        export_audit(&self.catalog, self.store.entries(), &self.metadata, now)
    }

    fn visible_indices(&self) -> Vec<usize> {
        self.visible().map(|(i, _)| i).collect()
    }

    fn index_of(&self, id: &str) -> RunbookResult<usize> {
        self.catalog
            .position(id)
            .ok_or_else(|| RunbookError::UnknownStep(id.to_string()))
    }

    fn move_cursor(&mut self, f: impl FnOnce(&mut Cursor)) {
        let before = self.cursor;
        f(&mut self.cursor);
        if self.cursor != before {
            self.notify(Change::Cursor);
        }
    }

    fn notify(&mut self, change: Change) {
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }
}
