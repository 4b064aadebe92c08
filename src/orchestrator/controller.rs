//! Intent dispatch.
//!
//! Presentation layers translate input into [`Intent`]s and hand them to [`dispatch`],
//! which applies them to the session.

use crate::engine::{AuditReport, Session};
use crate::error::RunbookResult;
use crate::model::MetadataEdit;
use time::OffsetDateTime;

/// User intents emitted by UI layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Intent {
    SetQuery(String),
    SelectStep(String),
    MarkDone { id: String, done: bool },
    Skip(String),
    GoNext,
    GoPrevious,
    EditMetadata(MetadataEdit),
    Reset,
    ExportAudit,
}

/// What the caller gets back from a dispatched intent.
#[derive(Debug)]
pub(crate) enum Outcome {
    Applied,
    /// Audit report ready to hand to an export sink.
    Exported(Box<AuditReport>),
}

/// Apply one intent to the session.
pub(crate) fn dispatch(session: &mut Session, intent: Intent) -> RunbookResult<Outcome> {
    tracing::trace!(?intent, "Dispatching intent");
    match intent {
        Intent::SetQuery(q) => session.set_query(q),
        Intent::SelectStep(id) => session.go_to(&id)?,
        Intent::MarkDone { id, done } => session.mark_done(&id, done)?,
        Intent::Skip(id) => session.skip(&id)?,
        Intent::GoNext => session.go_next(),
        Intent::GoPrevious => session.go_previous(),
        Intent::EditMetadata(edit) => session.edit_metadata(edit),
        Intent::Reset => session.reset(),
        Intent::ExportAudit => {
            let report = session.export_audit(OffsetDateTime::now_utc());
            return Ok(Outcome::Exported(Box::new(report)));
        }
    }
    Ok(Outcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::error::RunbookError;
    use crate::model::{IncidentMetadata, Status};
    use crate::storage::MemoryStore;

    fn session() -> Session {
        Session::new(
            Catalog::builtin().unwrap(),
            Box::new(MemoryStore::default()),
            IncidentMetadata::default(),
        )
    }

    #[test]
    fn intents_drive_the_session() {
        let mut s = session();
        let first = s.catalog().get(0).unwrap().id.clone();
        let second = s.catalog().get(1).unwrap().id.clone();

        dispatch(&mut s, Intent::MarkDone { id: first.clone(), done: true }).unwrap();
        assert_eq!(s.status(&first), Some(Status::Completed));
        assert_eq!(s.current().unwrap().id, second);

        dispatch(&mut s, Intent::GoPrevious).unwrap();
        assert_eq!(s.current().unwrap().id, first);

        dispatch(&mut s, Intent::EditMetadata(MetadataEdit::Name("Key leak".into()))).unwrap();
        assert_eq!(s.metadata().name, "Key leak");

        dispatch(&mut s, Intent::SetQuery("containment".into())).unwrap();
        let snap = s.snapshot();
        assert!(snap.visible.iter().any(|v| v.id == "contain-disable-keys"));
        assert!(snap.visible.iter().any(|v| Some(v.index) == snap.cursor));

        match dispatch(&mut s, Intent::ExportAudit).unwrap() {
            Outcome::Exported(report) => {
                assert_eq!(report.incident.name, "Key leak");
                assert_eq!(report.steps.len(), s.catalog().len());
            }
            Outcome::Applied => panic!("expected an audit report"),
        }

        dispatch(&mut s, Intent::Reset).unwrap();
        assert_eq!(s.progress(), 0);
    }

    #[test]
    fn unknown_step_intent_is_an_error() {
        let mut s = session();
        let err = dispatch(&mut s, Intent::Skip("not-a-step".into())).unwrap_err();
        assert!(matches!(err, RunbookError::UnknownStep(_)));
        let err = dispatch(&mut s, Intent::SelectStep("nope".into())).unwrap_err();
        assert!(matches!(err, RunbookError::UnknownStep(_)));
    }
}
