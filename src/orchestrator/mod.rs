//! Application-level orchestration utilities.
//!
//! This module turns user intents into session operations and hands finished audit
//! reports to the export sink. UI/CLI layers call into this module to keep
//! responsibilities separated.

mod controller;
mod post_process;

pub(crate) use controller::{dispatch, Intent, Outcome};
pub(crate) use post_process::{process_export, ExportFormat, ProcessedExport};
