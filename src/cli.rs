use crate::catalog::Catalog;
use crate::engine::Session;
use crate::model::{IncidentMetadata, Severity};
use crate::orchestrator::{self, ExportFormat, Intent, Outcome};
use crate::storage::{self, FileStore, MemoryStore, Persistence};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "incident-runbook",
    version,
    about = "Incident-response runbook checklist with optional TUI"
)]
pub struct Cli {
    /// Directory holding step status and logs
    #[arg(long, env = "RUNBOOK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Load a YAML runbook instead of the built-in one
    #[arg(long, env = "RUNBOOK_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Incident name recorded in audit exports
    #[arg(long)]
    pub incident_name: Option<String>,

    /// Incident severity (undetermined, low, medium, high, critical)
    #[arg(long)]
    pub severity: Option<Severity>,

    /// Affected account or tenant
    #[arg(long)]
    pub account: Option<String>,

    /// Affected region
    #[arg(long)]
    pub region: Option<String>,

    /// Incident commander
    #[arg(long)]
    pub commander: Option<String>,

    /// Scribe keeping the timeline
    #[arg(long)]
    pub scribe: Option<String>,

    /// Print the audit report as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print a text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Export the audit report as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Export the audit report as CSV
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Return every step to pending before doing anything else
    #[arg(long)]
    pub reset: bool,

    /// Keep step status in memory only
    #[arg(long)]
    pub ephemeral: bool,

    /// How long the TUI shows the "copied" indicator
    #[arg(long, default_value = "2s")]
    pub copied_indicator: humantime::Duration,

    /// Log filter when RUST_LOG is unset (e.g. info, debug, incident_runbook=trace)
    #[arg(long, env = "RUNBOOK_LOG", default_value = "info")]
    pub log_level: String,

    /// Shorthand for --log-level debug
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// True when no flag asks for one-shot output.
    pub fn is_interactive(&self) -> bool {
        !(self.json || self.text || self.export_json.is_some() || self.export_csv.is_some())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(storage::default_data_dir)
    }

    fn log_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }
}

pub fn run(args: Cli) -> Result<()> {
    let data_dir = args.data_dir();
    let tui_mode = cfg!(feature = "tui") && args.is_interactive();
    let logging = crate::logging::init_logging(&data_dir, tui_mode, args.log_level())?;
    if let Some(path) = logging.log_file_path.as_ref() {
        tracing::debug!(path = %path.display(), "Logging to file");
    }

    let mut session = build_session(&args, &data_dir)?;
    if args.reset {
        orchestrator::dispatch(&mut session, Intent::Reset)?;
        tracing::info!("Statuses reset");
    }

    if args.is_interactive() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(&args, session);
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_text(&session);
        }
    }

    handle_exports(&args, &mut session)?;

    if args.json {
        return run_json(&mut session);
    }
    if args.text {
        return run_text(&session);
    }
    Ok(())
}

/// Load the catalog, open the store and seed incident metadata from flags.
pub fn build_session(args: &Cli, data_dir: &Path) -> Result<Session> {
    let catalog = match args.catalog.as_deref() {
        Some(path) => Catalog::from_path(path)?,
        None => Catalog::builtin().context("parse built-in runbook")?,
    };

    let persistence: Box<dyn Persistence> = if args.ephemeral {
        Box::new(MemoryStore::default())
    } else {
        Box::new(FileStore::new(data_dir))
    };

    Ok(Session::new(catalog, persistence, build_metadata(args)))
}

pub fn build_metadata(args: &Cli) -> IncidentMetadata {
    IncidentMetadata {
        name: args.incident_name.clone().unwrap_or_default(),
        severity: args.severity.unwrap_or_default(),
        account: args.account.clone().unwrap_or_default(),
        region: args.region.clone().unwrap_or_default(),
        commander: args.commander.clone().unwrap_or_default(),
        scribe: args.scribe.clone().unwrap_or_default(),
    }
}

fn run_json(session: &mut Session) -> Result<()> {
    let report = match orchestrator::dispatch(session, Intent::ExportAudit)? {
        Outcome::Exported(report) => report,
        Outcome::Applied => anyhow::bail!("audit export produced no report"),
    };
    let out = serde_json::to_string_pretty(&report).context("serialize audit report")?;
    println!("{out}");
    Ok(())
}

fn run_text(session: &Session) -> Result<()> {
    let summary = crate::text_summary::build_text_summary(session);
    for line in summary.lines {
        println!("{line}");
    }
    Ok(())
}

/// Handle export operations (JSON and CSV) for non-interactive modes.
fn handle_exports(args: &Cli, session: &mut Session) -> Result<()> {
    let targets = [
        (ExportFormat::Json, args.export_json.as_deref()),
        (ExportFormat::Csv, args.export_csv.as_deref()),
    ];
    if targets.iter().all(|(_, p)| p.is_none()) {
        return Ok(());
    }

    let report = match orchestrator::dispatch(session, Intent::ExportAudit)? {
        Outcome::Exported(report) => report,
        Outcome::Applied => anyhow::bail!("audit export produced no report"),
    };
    let cwd = std::env::current_dir().context("get current directory")?;
    for (format, target) in targets {
        if let Some(path) = target {
            let done = orchestrator::process_export(&report, format, Some(path), &cwd)?;
            eprintln!("{}", done.message);
        }
    }
    Ok(())
}
