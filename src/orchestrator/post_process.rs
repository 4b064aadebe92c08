//! Export sink.
//!
//! Materializes audit reports on disk, picking a file name from the incident name when
//! the caller does not supply a path.

use crate::engine::{suggested_filename, AuditReport};
use crate::storage;
use anyhow::Result;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Csv => "CSV",
        }
    }
}

/// Result of an export, ready for presentation layers.
pub(crate) struct ProcessedExport {
    pub path: PathBuf,
    pub message: String,
}

/// Write `report` to `target`, or to the suggested file name inside `dir`.
pub(crate) fn process_export(
    report: &AuditReport,
    format: ExportFormat,
    target: Option<&Path>,
    dir: &Path,
) -> Result<ProcessedExport> {
    let path = match target {
        Some(p) => p.to_path_buf(),
        None => dir.join(suggested_filename(&report.incident.name, format.extension())),
    };
    match format {
        ExportFormat::Json => storage::export_json(&path, report)?,
        ExportFormat::Csv => storage::export_csv(&path, report)?,
    }
    let message = format!("Exported {}: {}", format.label(), path.display());
    Ok(ProcessedExport { path, message })
}
