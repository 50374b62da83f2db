use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use parking_lot::Mutex;
use tokio::signal;
use tracing::{error, info, warn};

use spreadhawk::cli::{render_snapshot, Cli, Command};
use spreadhawk::config::mappings::MappingsStore;
use spreadhawk::config::teams::TeamsStore;
use spreadhawk::config::Config;
use spreadhawk::error::{Error, Result};
use spreadhawk::matching::fuzzy::MatchCache;
use spreadhawk::scanner::{ScanOrchestrator, SnapshotCache};
use spreadhawk::stream::{EngineEvent, MarketPairRegistry, StreamEngine};
use spreadhawk::venues::kalshi::KalshiClient;
use spreadhawk::venues::polymarket::PolymarketClient;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    config.init_logging();

    info!("spreadhawk starting");

    tokio::select! {
        result = run(cli, config) => {
            if let Err(e) = result {
                error!(error = %e, "Fatal error");
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("spreadhawk stopped");
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    // Mapping files are required at startup; a missing file is fatal.
    let mappings = Arc::new(MappingsStore::init(&config.paths.mappings)?);
    let teams = Arc::new(TeamsStore::init(&config.paths.teams)?);
    let match_cache = Arc::new(Mutex::new(MatchCache::load(&config.paths.match_cache)?));

    let polymarket = Arc::new(PolymarketClient::new(
        config.network.polymarket_api_url.clone(),
        config.network.polymarket_clob_url.clone(),
        config.scanner.timeout_ms,
    ));
    let kalshi = Arc::new(KalshiClient::new(
        config.network.kalshi_api_url.clone(),
        config.scanner.timeout_ms,
    ));

    let snapshot = Arc::new(SnapshotCache::new(Duration::from_millis(
        config.scanner.poll_interval_ms,
    )));

    let orchestrator = ScanOrchestrator::new(
        config.scanner.clone(),
        polymarket,
        kalshi,
        mappings,
        teams,
        match_cache,
        snapshot.clone(),
    );

    match cli.command {
        Command::Scan => {
            let today = chrono::Utc::now().date_naive();
            let summary = orchestrator.scan_tick(today).await?;
            info!(
                resolved = summary.resolved_pairs,
                fetched = summary.fetched_pairs,
                opportunities = summary.opportunities,
                "Scan complete"
            );
            if let Some(snapshot) = snapshot.get() {
                println!("{}", render_snapshot(&snapshot));
            } else {
                println!("No snapshot published.");
            }
            Ok(())
        }
        Command::Watch => {
            orchestrator.run_loop().await;
            Ok(())
        }
        Command::Stream => run_stream(&config, &orchestrator).await,
    }
}

/// Seed the registry from one scan pass, then run the streaming engine.
async fn run_stream(config: &Config, orchestrator: &ScanOrchestrator) -> Result<()> {
    let kalshi_token = std::env::var("KALSHI_WS_TOKEN")
        .map_err(|_| Error::Auth("KALSHI_WS_TOKEN is required for stream mode".into()))?;

    let today = chrono::Utc::now().date_naive();
    let collected = orchestrator.collect_market_pairs(today).await?;
    if collected.market_pairs.is_empty() {
        warn!("No market pairs to stream");
        return Ok(());
    }

    let registry = Arc::new(MarketPairRegistry::new());
    for pair in collected.market_pairs {
        registry.register(pair);
    }
    info!(pairs = registry.len(), "Registered pairs for streaming");

    let engine = StreamEngine::new(config, registry, kalshi_token);

    let mut events = engine.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(EngineEvent::Opportunity(update)) => {
                    info!(
                        pair = %update.pair_id,
                        name = %update.name,
                        kind = ?update.kind,
                        spread_pct = %update.spread_pct,
                        max_contracts = %update.max_contracts,
                        max_profit = %update.max_profit,
                        limited_by = ?update.limited_by,
                        "OPPORTUNITY"
                    );
                }
                Ok(EngineEvent::OpportunityClosed { pair_id }) => {
                    info!(pair = %pair_id, "Opportunity closed");
                }
                Ok(EngineEvent::OrderbookUpdate { .. }) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event consumer lagging");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    engine.run().await
}
