pub mod analyze;
pub mod status;
pub mod summarize;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Subcommand};

use strata_core::config::StrataConfig;
use strata_core::llm::OpenAiCompatBackend;
use strata_core::scan::{RunLocator, ScanResults};
use strata_core::store::sqlite::SqliteStore;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the bottom-up summarization pipeline over saved scan results
    Summarize(summarize::SummarizeArgs),
    /// Show node counts and run state for a scanned application
    Status(status::StatusArgs),
    /// Produce the codebase-level JSON analysis from persisted summaries
    Analyze(analyze::AnalyzeArgs),
}

pub async fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Summarize(args) => summarize::run(args).await,
        Command::Status(args) => status::run(args).await,
        Command::Analyze(args) => analyze::run(args).await,
    }
}

/// Flags shared by every subcommand that touches a scan directory.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Saved scan-results directory (<base>/<app>/<run>)
    #[arg(long)]
    pub scan_dir: PathBuf,

    /// Base output directory for per-app/run summary databases
    #[arg(long, default_value = "code_summary_results")]
    pub base_dir: PathBuf,

    /// Config file path (defaults to ./strata.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl CommonArgs {
    /// Load configuration: an explicit `--config` must exist; the implicit
    /// default is optional.
    pub fn load_config(&self) -> anyhow::Result<StrataConfig> {
        match &self.config {
            Some(path) => StrataConfig::load(path)
                .with_context(|| format!("Cannot load config: {}", path.display())),
            None => StrataConfig::load_or_default(Path::new("strata.toml"))
                .context("Cannot load config: strata.toml"),
        }
    }

    pub fn read_scan(&self) -> anyhow::Result<ScanResults> {
        ScanResults::read(&self.scan_dir)
            .with_context(|| format!("Cannot read scan results: {}", self.scan_dir.display()))
    }

    pub fn locator(&self) -> anyhow::Result<RunLocator> {
        RunLocator::from_scan_dir(&self.scan_dir, &self.base_dir)
            .with_context(|| format!("Cannot locate run for: {}", self.scan_dir.display()))
    }

    /// Open (creating directories as needed) the run's summary database.
    pub fn open_store(&self, locator: &RunLocator) -> anyhow::Result<SqliteStore> {
        if let Some(parent) = locator.db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create output dir: {}", parent.display()))?;
        }
        SqliteStore::open(&locator.db_path)
            .with_context(|| format!("Cannot open database: {}", locator.db_path.display()))
    }
}

/// Build the backend client from config plus command-line overrides.
pub fn build_backend(
    config: &StrataConfig,
    base_url: Option<&str>,
    timeout_seconds: Option<u64>,
) -> anyhow::Result<OpenAiCompatBackend> {
    let url = base_url.unwrap_or(&config.backend.base_url);
    let timeout = Duration::from_secs(timeout_seconds.unwrap_or(config.backend.timeout_seconds));
    OpenAiCompatBackend::new(url, timeout).context("Cannot build backend client")
}
