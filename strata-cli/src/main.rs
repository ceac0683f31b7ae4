use clap::Parser;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "strata",
    version,
    about = "Build hierarchical bottom-up summaries of a scanned codebase"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Classify an error into an exit code.
///
/// Exit codes:
///   0 — success
///   1 — general/unknown error
///   2 — configuration error
///   3 — scan inputs missing or malformed
///   4 — database error
///   6 — backend error
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    let msg = format!("{err:#}");
    let lower = msg.to_lowercase();

    if lower.contains("summary.txt") || lower.contains("scan directory") {
        3 // scan inputs
    } else if lower.contains("sqlite") || lower.contains("database") {
        4 // database error
    } else if lower.contains("backend")
        || lower.contains("api error")
        || lower.contains("no models")
    {
        6 // backend error
    } else if lower.contains("config") {
        2 // config error
    } else {
        1 // general error
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create runtime: {e}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(commands::run(cli.command)) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_scan_inputs() {
        let err = anyhow::anyhow!("Scan input error: Missing summary.txt in /results/a/b");
        assert_eq!(classify_exit_code(&err), 3);
    }

    #[test]
    fn exit_code_config() {
        let err = anyhow::anyhow!("Cannot parse config: strata.toml");
        assert_eq!(classify_exit_code(&err), 2);
    }

    #[test]
    fn exit_code_database() {
        let err = anyhow::anyhow!("Store error: SQLite error: unable to open");
        assert_eq!(classify_exit_code(&err), 4);
    }

    #[test]
    fn exit_code_backend() {
        let err = anyhow::anyhow!("Backend error: API error (HTTP 500): boom");
        assert_eq!(classify_exit_code(&err), 6);
    }

    #[test]
    fn exit_code_general() {
        let err = anyhow::anyhow!("Something unexpected happened");
        assert_eq!(classify_exit_code(&err), 1);
    }
}
