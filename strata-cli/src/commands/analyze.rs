use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use strata_core::llm::{PromptBundle, SummaryBackend};
use strata_core::pipeline::BottomUpPipeline;
use strata_core::store::SummaryStore;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
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

    /// Backend timeout in seconds (overrides config)
    #[arg(long)]
    pub timeout_seconds: Option<u64>,
}

pub async fn run(args: AnalyzeArgs) -> anyhow::Result<()> {
    let config = args.common.load_config()?;
    let scan = args.common.read_scan()?;
    let locator = args.common.locator()?;

    if !locator.db_path.exists() {
        anyhow::bail!(
            "No summary database for {}/{} yet. Run `strata summarize` first.",
            locator.application,
            locator.run
        );
    }

    let store = args.common.open_store(&locator)?;
    let app = store
        .find_application(&locator.application, &locator.run)
        .await?
        .with_context(|| {
            format!(
                "Application {}/{} is not registered. Run `strata summarize` first.",
                locator.application, locator.run
            )
        })?;

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

    let prompts = PromptBundle::load_or_default(&args.prompts_dir);
    let pipeline = BottomUpPipeline::new(&backend, &store, &prompts, model, app);

    match pipeline
        .run_codebase_analysis(&scan)
        .await
        .context("Codebase analysis failed")?
    {
        Some(analysis) => {
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        None => {
            println!(
                "Codebase analysis already recorded for {}/{} (see `strata status`).",
                locator.application, locator.run
            );
        }
    }

    Ok(())
}
