use clap::Parser;
use log::{error, info};
use miette::IntoDiagnostic;
use nba_db::get_pool;
use nba_ingest::config::IngestConfig;
use nba_ingest::orchestrator::run_silver_load;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "silver-load")]
#[command(about = "Transforms one day's raw NBA stats API responses into the silver schema")]
struct Cli {
    /// Date to load, YYYY-MM-DD.
    #[arg(long)]
    date: String,

    /// Raw tree root. Defaults to the configured raw_root.
    #[arg(long)]
    raw_root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = IngestConfig::load().unwrap_or_default();
    let raw_root = cli.raw_root.unwrap_or_else(|| PathBuf::from(&config.raw_root));

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received ctrl-c, finishing in-flight games and stopping");
                cancel.cancel();
            }
        }
    });

    let pool = get_pool(config.db_pool_size).into_diagnostic()?;

    info!("loading {} from {}", cli.date, raw_root.display());

    let summary = run_silver_load(pool, &raw_root, &cli.date, config.load_concurrency, cancel.clone()).await;

    let total_errors = summary.total_errors();
    info!(
        "{}: {} games processed, {} total errors",
        summary.date,
        summary.games.len(),
        total_errors
    );

    if total_errors > 0 {
        let examples: Vec<String> = summary
            .games
            .iter()
            .flat_map(|g| g.errors.iter().map(move |e| format!("{}: {e}", g.game_id)))
            .take(5)
            .collect();
        error!("first errors: {examples:?}");
    }

    if cancel.is_cancelled() || total_errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}
