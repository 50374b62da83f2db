//! Batch scan orchestration.
//!
//! One tick: resolve candidate pairs, fetch both venues' event data under
//! bounded concurrency with rate-limit backoff, align markets, price
//! opportunities, walk order books for the top spreads, and atomically swap
//! the published snapshot. Per-pair failures never fail the tick; a tick that
//! fetches too little keeps the previous snapshot.

pub mod discover;
pub mod report;
pub mod snapshot;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::arb::{create_opportunities_from_all_pairs, ArbConfig, LiquidityAnalyzer};
use crate::config::mappings::MappingsStore;
use crate::config::teams::TeamsStore;
use crate::config::ScannerConfig;
use crate::domain::{
    ArbitrageOpportunity, BookKey, EventRef, Fees, LiquidityAnalysis, MarketPair, MarketRef,
    MatchedPair, OpportunitiesSnapshot, UnifiedOrderBook, Venue,
};
use crate::error::{Error, Result};
use crate::matching::fuzzy::MatchCache;
use crate::matching::market::MarketMatcher;
use crate::resolver::{catalog, PairResolver};
use crate::venues::MarketDataSource;

pub use snapshot::SnapshotCache;

/// One resolved pair with both venues' data in hand.
struct FetchedPair {
    matched: MatchedPair,
    polymarket_event: EventRef,
    polymarket_markets: Vec<MarketRef>,
    kalshi_event: EventRef,
    kalshi_markets: Vec<MarketRef>,
}

/// Resolve/fetch/match output for one tick.
pub struct CollectedPairs {
    pub resolved: usize,
    pub fetched: usize,
    pub market_pairs: Vec<MarketPair>,
}

/// Counters reported per tick.
#[derive(Debug, Clone, Copy)]
pub struct ScanSummary {
    pub resolved_pairs: usize,
    pub fetched_pairs: usize,
    pub market_pairs: usize,
    pub opportunities: usize,
    pub published: bool,
}

pub struct ScanOrchestrator {
    config: ScannerConfig,
    polymarket: Arc<dyn MarketDataSource>,
    kalshi: Arc<dyn MarketDataSource>,
    mappings: Arc<MappingsStore>,
    teams: Arc<TeamsStore>,
    match_cache: Arc<Mutex<MatchCache>>,
    snapshot: Arc<SnapshotCache>,
}

impl ScanOrchestrator {
    #[must_use]
    pub fn new(
        config: ScannerConfig,
        polymarket: Arc<dyn MarketDataSource>,
        kalshi: Arc<dyn MarketDataSource>,
        mappings: Arc<MappingsStore>,
        teams: Arc<TeamsStore>,
        match_cache: Arc<Mutex<MatchCache>>,
        snapshot: Arc<SnapshotCache>,
    ) -> Self {
        Self {
            config,
            polymarket,
            kalshi,
            mappings,
            teams,
            match_cache,
            snapshot,
        }
    }

    #[must_use]
    pub fn snapshot_cache(&self) -> Arc<SnapshotCache> {
        self.snapshot.clone()
    }

    /// Scan forever at the configured poll interval.
    pub async fn run_loop(&self) {
        let mut interval =
            tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));
        loop {
            interval.tick().await;
            let today = Utc::now().date_naive();
            match self.scan_tick(today).await {
                Ok(summary) => {
                    info!(
                        resolved = summary.resolved_pairs,
                        fetched = summary.fetched_pairs,
                        market_pairs = summary.market_pairs,
                        opportunities = summary.opportunities,
                        published = summary.published,
                        "Scan tick complete"
                    );
                }
                Err(e) => warn!(error = %e, "Scan tick failed, keeping previous snapshot"),
            }
        }
    }

    /// Resolve, fetch and align market pairs for one tick.
    ///
    /// Shared by the batch scan and the streaming engine's startup.
    pub async fn collect_market_pairs(&self, today: NaiveDate) -> Result<CollectedPairs> {
        let teams = self.teams.get();
        let mappings = self.mappings.get();
        let resolver = PairResolver::new(mappings, teams.clone());

        let pairs = self.resolve_pairs(&resolver, today).await;
        let resolved = pairs.len();
        debug!(pairs = resolved, "Resolved candidate pairs");

        let fetched = timeout(
            Duration::from_millis(self.config.timeout_ms),
            self.fetch_pairs(pairs),
        )
        .await
        .map_err(|_| Error::Timeout(self.config.timeout_ms))?;

        // Feed this tick's corpora through the fuzzy matcher so uncatalogued
        // events start resolving on later ticks.
        {
            let poly_events: Vec<(EventRef, Vec<MarketRef>)> = fetched
                .iter()
                .map(|f| (f.polymarket_event.clone(), f.polymarket_markets.clone()))
                .collect();
            let kalshi_events: Vec<(EventRef, Vec<MarketRef>)> = fetched
                .iter()
                .map(|f| (f.kalshi_event.clone(), f.kalshi_markets.clone()))
                .collect();
            let mut cache = self.match_cache.lock();
            discover::discover_fuzzy(&poly_events, &kalshi_events, &mut cache);
            if let Err(e) = cache.save() {
                warn!(error = %e, "Failed to persist match cache");
            }
        }

        let matcher = MarketMatcher::new(&teams);
        let market_pairs: Vec<MarketPair> = fetched
            .iter()
            .flat_map(|f| {
                matcher.match_event(
                    &f.matched,
                    &f.polymarket_markets,
                    &f.kalshi_markets,
                    f.polymarket_event.image_url.as_deref(),
                )
            })
            .collect();

        Ok(CollectedPairs {
            resolved,
            fetched: fetched.len(),
            market_pairs,
        })
    }

    /// One full scan pass.
    pub async fn scan_tick(&self, today: NaiveDate) -> Result<ScanSummary> {
        let collected = self.collect_market_pairs(today).await?;
        let CollectedPairs {
            resolved: resolved_pairs,
            fetched: fetched_pairs,
            market_pairs,
        } = collected;

        let arb_config = ArbConfig::from_fees(
            self.config.polymarket_fee_pct,
            self.config.kalshi_fee_pct,
        );
        let opportunities = create_opportunities_from_all_pairs(&market_pairs, &arb_config);

        let analyses = self.analyze_top_spreads(&opportunities).await;

        let fees = Fees {
            polymarket: self.config.polymarket_fee_pct,
            kalshi: self.config.kalshi_fee_pct,
        };
        let dtos = opportunities
            .iter()
            .enumerate()
            .map(|(i, opp)| {
                let entry = analyses.get(i).and_then(Option::as_ref);
                report::build_dto(
                    opp,
                    entry.map(|(analysis, _, _)| analysis),
                    entry.map(|(_, poly, kalshi)| (poly, kalshi)),
                    fees,
                )
            })
            .collect();

        let published = self.should_publish(resolved_pairs, fetched_pairs);
        let opportunity_count = opportunities.len();
        if published {
            self.snapshot
                .publish(OpportunitiesSnapshot::from_opportunities(dtos));
        } else {
            warn!(
                resolved = resolved_pairs,
                fetched = fetched_pairs,
                "Too many pair fetches failed, discarding partial scan"
            );
        }

        Ok(ScanSummary {
            resolved_pairs,
            fetched_pairs,
            market_pairs: market_pairs.len(),
            opportunities: opportunity_count,
            published,
        })
    }

    /// Static catalog, dynamic templates over the scan window, live game
    /// events, and previously confirmed fuzzy matches.
    async fn resolve_pairs(&self, resolver: &PairResolver, today: NaiveDate) -> Vec<MatchedPair> {
        let mappings = self.mappings.get();
        let mut pairs: Vec<MatchedPair> = mappings
            .static_mappings
            .iter()
            .map(|m| catalog::to_matched_pair(m, None))
            .collect();

        pairs.extend(resolver.expand_dynamic(today, self.config.dynamic_scan_days));
        pairs.extend(self.discover_game_pairs(resolver).await);

        {
            let cache = self.match_cache.lock();
            pairs.extend(resolver.from_confirmed(&cache.confirmed_matches()));
        }

        // Dedup by identifier tuple; first source wins, matching resolver
        // priority order.
        let mut seen: HashSet<(String, String)> = HashSet::new();
        pairs.retain(|p| seen.insert((p.polymarket_slug.clone(), p.kalshi_ticker.clone())));
        pairs
    }

    /// Resolve live NBA game events from the Kalshi game series.
    async fn discover_game_pairs(&self, resolver: &PairResolver) -> Vec<MatchedPair> {
        let today = Utc::now().date_naive();
        match self.kalshi.fetch_series("KXNBAGAME").await {
            Ok(events) => events
                .iter()
                .filter_map(|(event, _)| {
                    resolver.find_match(&event.identifier, Venue::Kalshi, today)
                })
                .collect(),
            Err(e) => {
                debug!(error = %e, "Game series fetch failed, skipping games");
                Vec::new()
            }
        }
    }

    /// Fetch both venues for every pair under bounded concurrency.
    async fn fetch_pairs(&self, pairs: Vec<MatchedPair>) -> Vec<FetchedPair> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_fetches));
        let mut handles = Vec::with_capacity(pairs.len());

        for pair in pairs {
            let semaphore = semaphore.clone();
            let polymarket = self.polymarket.clone();
            let kalshi = self.kalshi.clone();
            let delay = Duration::from_millis(self.config.rate_limit_delay_ms);
            let retries = self.config.retry_max_attempts;
            let base_backoff = self.config.retry_base_backoff_ms;

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return None;
                };
                fetch_one_pair(&*polymarket, &*kalshi, pair, delay, retries, base_backoff).await
            }));
        }

        let mut fetched = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(Some(pair)) => fetched.push(pair),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Fetch task panicked"),
            }
        }
        fetched
    }

    /// Walk order books for the top spreads, keeping index alignment with the
    /// opportunity list.
    #[allow(clippy::type_complexity)]
    async fn analyze_top_spreads(
        &self,
        opportunities: &[ArbitrageOpportunity],
    ) -> Vec<Option<(LiquidityAnalysis, UnifiedOrderBook, UnifiedOrderBook)>> {
        let analyzer = LiquidityAnalyzer::from_fee_pcts(
            self.config.polymarket_fee_pct,
            self.config.kalshi_fee_pct,
            self.config.min_profit_pct,
        );

        let mut analyses = Vec::with_capacity(opportunities.len());
        for (i, opportunity) in opportunities.iter().enumerate() {
            if i >= self.config.max_liquidity_analysis {
                analyses.push(None);
                continue;
            }

            let pair = &opportunity.pair;
            let poly_key = BookKey::Tokens {
                yes: pair.polymarket_tokens.0.clone(),
                no: pair.polymarket_tokens.1.clone(),
            };
            let kalshi_key = BookKey::Ticker(pair.kalshi_ticker.clone());

            sleep(Duration::from_millis(self.config.rate_limit_delay_ms)).await;

            let poly_book = self
                .polymarket
                .fetch_order_book(&pair.polymarket_slug, &poly_key)
                .await;
            let kalshi_book = self
                .fetch_kalshi_book_with_retry(pair.kalshi_ticker.as_str(), &kalshi_key)
                .await;

            match (poly_book, kalshi_book) {
                (Ok(poly), Ok(kalshi)) => {
                    let analysis = analyzer.analyze(opportunity, &poly, &kalshi);
                    analyses.push(Some((analysis, poly, kalshi)));
                }
                (poly, kalshi) => {
                    if let Err(e) = poly {
                        warn!(pair = %pair.name, error = %e, "Polymarket book fetch failed");
                    }
                    if let Err(e) = kalshi {
                        warn!(pair = %pair.name, error = %e, "Kalshi book fetch failed");
                    }
                    analyses.push(None);
                }
            }
        }
        analyses
    }

    /// Kalshi book fetch with exponential backoff on 429.
    async fn fetch_kalshi_book_with_retry(
        &self,
        market_id: &str,
        key: &BookKey,
    ) -> Result<UnifiedOrderBook> {
        let max_attempts = self.config.retry_max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.kalshi.fetch_order_book(market_id, key).await {
                Err(Error::RateLimited { venue }) if attempt < max_attempts => {
                    let backoff = self.config.retry_base_backoff_ms << (attempt - 1);
                    warn!(market = market_id, attempt, backoff_ms = backoff, venue, "Rate limited, backing off");
                    sleep(Duration::from_millis(backoff)).await;
                }
                other => return other,
            }
        }
    }

    fn should_publish(&self, resolved: usize, fetched: usize) -> bool {
        if resolved == 0 {
            return true;
        }
        let ratio = fetched as f64 / resolved as f64;
        ratio >= self.config.min_scan_success_ratio
    }
}

/// Fetch one pair's events from both venues. Rate limits retry with
/// exponential backoff on either venue; any other failure skips the pair.
async fn fetch_one_pair(
    polymarket: &dyn MarketDataSource,
    kalshi: &dyn MarketDataSource,
    pair: MatchedPair,
    delay: Duration,
    retries: u32,
    base_backoff_ms: u64,
) -> Option<FetchedPair> {
    let max_attempts = retries.max(1);

    let mut attempt = 0;
    let (polymarket_event, polymarket_markets) = loop {
        attempt += 1;
        match polymarket.fetch_event(&pair.polymarket_slug).await {
            Ok(Some(event)) => break event,
            Ok(None) => {
                debug!(slug = %pair.polymarket_slug, "No Polymarket event, skipping pair");
                return None;
            }
            Err(Error::RateLimited { venue }) if attempt < max_attempts => {
                let backoff = base_backoff_ms << (attempt - 1);
                warn!(slug = %pair.polymarket_slug, attempt, backoff_ms = backoff, venue, "Rate limited, backing off");
                sleep(Duration::from_millis(backoff)).await;
            }
            Err(e) => {
                warn!(slug = %pair.polymarket_slug, error = %e, "Polymarket fetch failed");
                return None;
            }
        }
    };

    // Space out the second venue's request within this task's stream.
    sleep(delay).await;

    let mut attempt = 0;
    let (kalshi_event, kalshi_markets) = loop {
        attempt += 1;
        match kalshi.fetch_event(&pair.kalshi_ticker).await {
            Ok(Some(event)) => break event,
            Ok(None) => {
                debug!(ticker = %pair.kalshi_ticker, "No Kalshi event, skipping pair");
                return None;
            }
            Err(Error::RateLimited { venue }) if attempt < max_attempts => {
                let backoff = base_backoff_ms << (attempt - 1);
                warn!(ticker = %pair.kalshi_ticker, attempt, backoff_ms = backoff, venue, "Rate limited, backing off");
                sleep(Duration::from_millis(backoff)).await;
            }
            Err(e) => {
                warn!(ticker = %pair.kalshi_ticker, error = %e, "Kalshi fetch failed");
                return None;
            }
        }
    };

    Some(FetchedPair {
        matched: pair,
        polymarket_event,
        polymarket_markets,
        kalshi_event,
        kalshi_markets,
    })
}
