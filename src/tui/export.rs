use crate::engine::Session;
use crate::orchestrator::{self, ExportFormat, Intent, Outcome, ProcessedExport};
use anyhow::{Context, Result};
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

use super::state::UiState;

/// How long each clipboard owner stays alive so clipboard managers can read it.
const CLIPBOARD_HOLD: Duration = Duration::from_secs(2);

static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Build the audit report and write it into the current directory under its
/// suggested file name.
pub fn export_audit(session: &mut Session, format: ExportFormat) -> Result<ProcessedExport> {
    let report = match orchestrator::dispatch(session, Intent::ExportAudit)? {
        Outcome::Exported(report) => report,
        Outcome::Applied => anyhow::bail!("audit export produced no report"),
    };
    let cwd = std::env::current_dir().context("get current directory")?;
    orchestrator::process_export(&report, format, None, &cwd)
}

/// Export and report the outcome on the status line.
pub fn export_and_show(session: &mut Session, state: &mut UiState, format: ExportFormat) {
    match export_audit(session, format) {
        Ok(done) => {
            state.last_exported_path = Some(done.path.to_string_lossy().into_owned());
            state.info = format!("{} (press Y to copy path)", done.message);
        }
        Err(e) => {
            let error = format!("{e:#}");
            tracing::warn!(%error, format = format.label(), "Audit export failed");
            state.info = format!("{} export failed: {e:#}", format.label());
        }
    }
}

/// Start the clipboard thread on first use. On Linux the clipboard contents vanish
/// with their owner, so each copy is held for [`CLIPBOARD_HOLD`] on a background
/// thread instead of blocking the UI.
fn clipboard_sender() -> &'static std_mpsc::Sender<String> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();
        std::thread::spawn(move || {
            for text in rx {
                match arboard::Clipboard::new() {
                    Ok(mut clipboard) => match clipboard.set_text(text) {
                        Ok(()) => std::thread::sleep(CLIPBOARD_HOLD),
                        Err(e) => tracing::warn!(error = %e, "Clipboard write failed"),
                    },
                    Err(e) => tracing::warn!(error = %e, "Clipboard unavailable"),
                }
            }
        });
        tx
    })
}

/// Queue `text` for the clipboard. Returns once queued.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    clipboard_sender()
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))
}

