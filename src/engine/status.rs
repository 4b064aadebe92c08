//! Status store: one `StepStatus` per catalog step, persisted write-through.

use crate::error::{RunbookError, RunbookResult};
use crate::model::{Status, StepStatus};
use crate::storage::{Persistence, STATUS_KEY};
use std::collections::HashMap;
use time::OffsetDateTime;

pub struct StatusStore {
    // Kept in catalog order so index `i` is the status of catalog step `i`.
    entries: Vec<StepStatus>,
    persistence: Box<dyn Persistence>,
}

impl StatusStore {
    /// Load statuses for `identities`, reconciling against whatever was persisted.
    ///
    /// Identities missing from storage start pending; persisted records for identities
    /// not in the list are dropped. Unreadable data falls back to all-pending.
    pub fn load<'a, I>(identities: I, persistence: Box<dyn Persistence>) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let persisted = match read_persisted(persistence.as_ref()) {
            Ok(Some(records)) => records,
            Ok(None) => {
                tracing::debug!("No persisted step status, starting with all steps pending");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Falling back to all steps pending");
                Vec::new()
            }
        };

        let mut by_id: HashMap<String, StepStatus> = HashMap::with_capacity(persisted.len());
        for record in persisted {
            by_id.entry(record.id.clone()).or_insert(record);
        }

        let entries: Vec<StepStatus> = identities
            .into_iter()
            .map(|id| {
                by_id
                    .remove(id)
                    .map(normalize)
                    .unwrap_or_else(|| StepStatus::pending(id))
            })
            .collect();

        if !by_id.is_empty() {
            tracing::debug!(stale = by_id.len(), "Discarded status for steps no longer in catalog");
        }

        Self {
            entries,
            persistence,
        }
    }

    /// All statuses, in catalog order.
    pub fn entries(&self) -> &[StepStatus] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&StepStatus> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Set a step's status, stamping the current instant when it becomes completed.
    pub fn set_status(&mut self, id: &str, status: Status) -> RunbookResult<()> {
        self.set_status_at(id, status, OffsetDateTime::now_utc())
    }

    pub fn set_status_at(
        &mut self,
        id: &str,
        status: Status,
        now: OffsetDateTime,
    ) -> RunbookResult<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| RunbookError::UnknownStep(id.to_string()))?;
        entry.status = status;
        entry.completed_at = (status == Status::Completed).then_some(now);
        tracing::debug!(step = id, status = %status, "Step status changed");
        self.persist();
        Ok(())
    }

    /// Return every step to pending and clear all completion times.
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.status = Status::Pending;
            entry.completed_at = None;
        }
        tracing::info!(steps = self.entries.len(), "Reset all step statuses");
        self.persist();
    }

    fn persist(&mut self) {
        let bytes = match serde_json::to_vec_pretty(&self.entries) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize step status");
                return;
            }
        };
        // Write failures leave the in-memory state authoritative for this session.
        if let Err(e) = self.persistence.write(STATUS_KEY, &bytes) {
            tracing::warn!(error = %e, "Failed to persist step status");
        }
    }
}

/// Parse the persisted status list. Individual malformed records are skipped.
fn read_persisted(persistence: &dyn Persistence) -> RunbookResult<Option<Vec<StepStatus>>> {
    let Some(bytes) = persistence
        .read(STATUS_KEY)
        .map_err(|e| RunbookError::PersistenceRead(e.to_string()))?
    else {
        return Ok(None);
    };

    let raw: Vec<serde_json::Value> =
        serde_json::from_slice(&bytes).map_err(|e| RunbookError::PersistenceRead(e.to_string()))?;

    let records = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<StepStatus>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed status record");
                None
            }
        })
        .collect();
    Ok(Some(records))
}

/// Enforce "timestamp iff completed" on a record read from storage.
fn normalize(mut record: StepStatus) -> StepStatus {
    match (record.status, record.completed_at) {
        (Status::Completed, None) => {
            tracing::warn!(step = %record.id, "Completed step has no timestamp, resetting to pending");
            record.status = Status::Pending;
        }
        (Status::Pending | Status::Skipped, Some(_)) => record.completed_at = None,
        _ => {}
    }
    record
}
