//! Logging initialization.
//!
//! TUI mode: logs to `<data-dir>/logs/incident-runbook-{datetime}.log`
//! Text/JSON mode: logs to stderr

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the file writer alive; dropping it flushes buffered log lines.
pub struct LoggingHandle {
    pub _guard: Option<WorkerGuard>,
    pub log_file_path: Option<PathBuf>,
}

pub fn logs_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("logs")
}

fn log_file_name() -> String {
    let stamp = time::OffsetDateTime::now_utc()
        .format(format_description!("[year][month][day]T[hour][minute][second]Z"))
        .unwrap_or_else(|_| "session".into());
    format!("incident-runbook-{stamp}.log")
}

/// `RUST_LOG` wins over `level` when set.
pub fn init_logging(data_dir: &Path, is_tui_mode: bool, level: &str) -> Result<LoggingHandle> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if is_tui_mode {
        // The alternate screen owns the terminal, so logs go to a file.
        let dir = logs_dir(data_dir);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create log directory {}", dir.display()))?;
        let file_name = log_file_name();
        let log_file_path = dir.join(&file_name);

        let appender = tracing_appender::rolling::never(&dir, &file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .try_init()
            .context("install log subscriber")?;

        Ok(LoggingHandle {
            _guard: Some(guard),
            log_file_path: Some(log_file_path),
        })
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("install log subscriber")?;

        Ok(LoggingHandle {
            _guard: None,
            log_file_path: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_live_under_data_dir() {
        let dir = logs_dir(Path::new("/tmp/runbook"));
        assert!(dir.ends_with("logs"));
        assert!(dir.starts_with("/tmp/runbook"));
    }

    #[test]
    fn log_file_name_is_timestamped() {
        let name = log_file_name();
        assert!(name.starts_with("incident-runbook-"));
        assert!(name.ends_with("Z.log"));
    }
}
