use anyhow::Context;
use clap::Args;

use strata_core::store::SummaryStore;

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub common: super::CommonArgs,
}

pub async fn run(args: StatusArgs) -> anyhow::Result<()> {
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
        .await
        .context("Cannot query applications")?
        .with_context(|| {
            format!(
                "Application {}/{} is not registered in {}",
                locator.application,
                locator.run,
                locator.db_path.display()
            )
        })?;

    let total = store.count_nodes(app).await?;

    println!("Strata status for {}/{}", locator.application, locator.run);
    println!();
    println!("  Database: {}", locator.db_path.display());
    println!("  Nodes:    {total}");
    println!();

    let state = store.run_state_all(app).await?;
    if state.is_empty() {
        println!("  No run state recorded.");
    } else {
        println!("  Run state:");
        for (key, value) in &state {
            // Long values (analysis JSON) would drown the table.
            let shown = if value.chars().count() > 60 {
                let cut: String = value.chars().take(60).collect();
                format!("{cut}…")
            } else {
                value.clone()
            };
            println!("    {key:<28} {shown}");
        }
    }

    Ok(())
}
