//! Durable key-value storage for step statuses, plus audit report file writers.

use crate::engine::AuditReport;
use anyhow::{Context, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Fixed key the status set is stored under.
pub const STATUS_KEY: &str = "step-status";

/// Key-value store the status store persists into.
pub trait Persistence {
    /// Raw bytes stored under `key`, or `None` when nothing has been written yet.
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>>;

    fn write(&mut self, key: &str, bytes: &[u8]) -> io::Result<()>;
}

/// Default data directory, e.g. `~/.local/share/incident-runbook`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("incident-runbook")
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Persistence for FileStore {
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, key: &str, bytes: &[u8]) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        // Write then rename so a crash never leaves a truncated file behind.
        let tmp = path.with_extension("json.tmp");
        {
            let mut f = std::fs::File::create(&tmp)?;
            f.write_all(bytes)?;
            f.sync_all()?;
        }
        std::fs::rename(&tmp, &path)
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, Vec<u8>>,
    writes: usize,
}

/// In-memory store. Clones share the same backing map, so a test can keep a handle
/// after moving one into a session.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    #[cfg(test)]
    pub fn with_value(key: &str, bytes: impl Into<Vec<u8>>) -> Self {
        let store = Self::default();
        store
            .inner
            .borrow_mut()
            .values
            .insert(key.to_string(), bytes.into());
        store
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.borrow().values.get(key).cloned()
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.inner.borrow().writes
    }
}

impl Persistence for MemoryStore {
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.get(key))
    }

    fn write(&mut self, key: &str, bytes: &[u8]) -> io::Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.values.insert(key.to_string(), bytes.to_vec());
        inner.writes += 1;
        Ok(())
    }
}

/// Write the audit report as pretty JSON.
pub fn export_json(path: &Path, report: &AuditReport) -> Result<()> {
    let data = serde_json::to_vec_pretty(report).context("serialize audit report")?;
    std::fs::write(path, data).with_context(|| format!("write {}", path.display()))?;
    tracing::info!(path = %path.display(), "Exported audit report (JSON)");
    Ok(())
}

/// Write the audit report as CSV, one row per step.
pub fn export_csv(path: &Path, report: &AuditReport) -> Result<()> {
    let mut out = String::new();
    out.push_str("incident,severity,account,region,generated_at,id,title,category,critical,status,completed_at\n");

    let generated_at = crate::engine::format_timestamp(report.generated_at);
    let meta = &report.incident;
    for step in &report.steps {
        let completed_at = step
            .completed_at
            .map(crate::engine::format_timestamp)
            .unwrap_or_default();
        let row = [
            meta.name.as_str(),
            meta.severity.as_str(),
            meta.account.as_str(),
            meta.region.as_str(),
            generated_at.as_str(),
            step.id.as_str(),
            step.title.as_str(),
            step.category.name(),
            if step.critical { "true" } else { "false" },
            step.status.as_str(),
            completed_at.as_str(),
        ];
        let fields: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    std::fs::write(path, out).with_context(|| format!("write {}", path.display()))?;
    tracing::info!(path = %path.display(), "Exported audit report (CSV)");
    Ok(())
}

/// Quote a CSV field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_reads_none_before_first_write() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.read(STATUS_KEY).unwrap().is_none());
    }

    #[test]
    fn file_store_creates_directory_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::new(dir.path().join("nested"));
        store.write(STATUS_KEY, b"[1]").unwrap();
        store.write(STATUS_KEY, b"[2]").unwrap();
        assert_eq!(store.read(STATUS_KEY).unwrap().unwrap(), b"[2]");
        assert!(!store.path_for(STATUS_KEY).with_extension("json.tmp").exists());
    }

    #[test]
    fn memory_store_clones_share_state() {
        let handle = MemoryStore::default();
        let mut moved = handle.clone();
        moved.write("k", b"v").unwrap();
        assert_eq!(handle.get("k").unwrap(), b"v");
        assert_eq!(handle.writes(), 1);
    }

    #[test]
    fn csv_fields_are_quoted_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
