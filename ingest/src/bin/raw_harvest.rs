use clap::Parser;
use log::{error, info};
use miette::IntoDiagnostic;
use nba_fetch::{Fetcher, FetcherConfig};
use nba_ingest::config::IngestConfig;
use nba_ingest::harvester::harvest_date;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "raw-harvest")]
#[command(about = "Fetches one day's NBA stats API endpoints into the raw tree")]
struct Cli {
    /// Date to harvest, YYYY-MM-DD.
    #[arg(long)]
    date: String,

    /// Raw tree root. Defaults to the configured raw_root.
    #[arg(long)]
    root: Option<PathBuf>,

    #[arg(long)]
    rate_limit: Option<f64>,

    #[arg(long)]
    retries: Option<u32>,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = IngestConfig::load().unwrap_or_default();
    if let Some(rate_limit) = cli.rate_limit {
        config.api_rate_limit = rate_limit;
    }
    if let Some(retries) = cli.retries {
        config.api_max_retries = retries;
    }
    let raw_root = cli.root.unwrap_or_else(|| PathBuf::from(&config.raw_root));

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received ctrl-c, finishing in-flight work and stopping");
                cancel.cancel();
            }
        }
    });

    let fetcher_config = FetcherConfig {
        max_retries: config.api_max_retries,
        request_timeout: std::time::Duration::from_secs(config.api_timeout),
        connect_timeout: std::time::Duration::from_secs(config.connect_timeout_secs),
        proxy: config.api_proxy.clone(),
    };
    let fetcher = Fetcher::new(fetcher_config, config.api_rate_limit).into_diagnostic()?;

    info!("harvesting {} into {}", cli.date, raw_root.display());

    let summary = harvest_date(
        &fetcher,
        &raw_root,
        &cli.date,
        config.regular_season_only,
        config.inter_game_sleep_ms,
    )
    .await;

    info!(
        "{}: {} games found, {} excluded (non-regular-season), {} ok, {} quarantined",
        summary.date,
        summary.games_found,
        summary.games_excluded_non_regular_season,
        summary.games_ok,
        summary.quarantined_games.len()
    );

    if cancel.is_cancelled() {
        error!("interrupted by ctrl-c");
        std::process::exit(1);
    }

    if !summary.quarantined_games.is_empty() {
        error!(
            "quarantined games (first 5): {:?}",
            summary.quarantined_games.iter().take(5).collect::<Vec<_>>()
        );
        std::process::exit(1);
    }

    Ok(())
}
