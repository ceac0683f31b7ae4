use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use strata_core::llm::{PromptBundle, SummaryBackend};
use strata_core::pipeline::{BottomUpPipeline, RunLimits};
use strata_core::progress::IndicatifReporter;
use strata_core::store::SummaryStore;

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    #[command(flatten)]
    pub common: super::CommonArgs,

    /// Backend base URL (overrides config)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Model id (defaults to the first model the server lists)
    #[arg(long)]
    pub model: Option<String>,

    /// Directory holding prompt overrides
    #[arg(long, default_value = "prompts")]
    pub prompts_dir: PathBuf,

    /// Limit number of files processed (for smoke tests)
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Limit number of folders processed (for smoke tests)
    #[arg(long)]
    pub max_folders: Option<usize>,

    /// Skip method extraction and summaries
    #[arg(long)]
    pub skip_methods: bool,

    /// Backend timeout in seconds (overrides config)
    #[arg(long)]
    pub timeout_seconds: Option<u64>,
}

pub async fn run(args: SummarizeArgs) -> anyhow::Result<()> {
    let config = args.common.load_config()?;
    let scan = args.common.read_scan()?;
    let locator = args.common.locator()?;

    let store = args.common.open_store(&locator)?;
    let app = store
        .register_application(
            &locator.application,
            &locator.run,
            &scan.root.display().to_string(),
        )
        .await
        .context("Cannot register application")?;

    let backend = super::build_backend(
        &config,
        args.base_url.as_deref(),
        args.timeout_seconds,
    )?;
    let preferred = args.model.as_deref().or(config.backend.model.as_deref());
    let model = backend
        .resolve_model(preferred)
        .await
        .context("Cannot resolve backend model")?;
    info!(model = %model, app = %app, "Starting bottom-up run");

    store
        .put_run_state(
            app,
            "run.base_url",
            args.base_url.as_deref().unwrap_or(&config.backend.base_url),
        )
        .await?;

    let prompts = PromptBundle::load_or_default(&args.prompts_dir);
    let limits = RunLimits {
        max_files: args.max_files.or(config.run.max_files),
        max_folders: args.max_folders.or(config.run.max_folders),
        skip_methods: args.skip_methods || config.run.skip_methods,
    };

    let pipeline = BottomUpPipeline::new(&backend, &store, &prompts, model, app);
    let progress = IndicatifReporter::new();
    let result = pipeline
        .run(&scan, &limits, &progress)
        .await
        .context("Pipeline run failed")?;

    let total = store.count_nodes(app).await?;
    println!(
        "Summarized {} ({}/{})",
        scan.root.display(),
        locator.application,
        locator.run
    );
    println!();
    println!("  Methods processed: {}", result.processed_methods);
    println!("  Files processed:   {}", result.processed_files);
    println!("  Folders processed: {}", result.processed_folders);
    println!("  Nodes in store:    {total}");
    println!();
    println!("  Database: {}", locator.db_path.display());

    Ok(())
}
