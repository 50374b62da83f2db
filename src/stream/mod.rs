//! Real-time streaming engine.
//!
//! One worker owns each venue's WebSocket and is the single writer of that
//! venue's book state; the aggregator worker receives pair-keyed update
//! notifications over a bounded channel and reevaluates opportunities. On
//! disconnect a worker marks its books desynced, backs off with jitter,
//! reconnects and resubscribes everything.

pub mod aggregator;
pub mod reconnect;
pub mod registry;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::arb::{ArbConfig, LiquidityAnalyzer};
use crate::config::Config;
use crate::domain::{Ticker, TokenId, Venue};
use crate::error::Result;
use crate::venues::kalshi::{KalshiStream, KalshiStreamEvent};
use crate::venues::polymarket::{PolymarketStream, PolymarketStreamEvent};

pub use aggregator::{Aggregator, EngineEvent, OpportunityUpdate, PairUpdate};
pub use reconnect::ReconnectPolicy;
pub use registry::{MarketPairRegistry, TokenSide};
pub use state::{DeltaOutcome, KalshiBooks, PolymarketBooks, SubscriptionState};

pub struct StreamEngine {
    registry: Arc<MarketPairRegistry>,
    polymarket_books: Arc<RwLock<PolymarketBooks>>,
    kalshi_books: Arc<RwLock<KalshiBooks>>,
    events: broadcast::Sender<EngineEvent>,
    polymarket_ws_url: String,
    kalshi_ws_url: String,
    kalshi_token: String,
    arb_config: ArbConfig,
    analyzer: LiquidityAnalyzer,
    debounce: Duration,
    reconnect: ReconnectPolicy,
    channel_capacity: usize,
}

impl StreamEngine {
    #[must_use]
    pub fn new(config: &Config, registry: Arc<MarketPairRegistry>, kalshi_token: String) -> Self {
        let (events, _) = broadcast::channel(config.stream.update_channel_capacity);
        Self {
            registry,
            polymarket_books: Arc::new(RwLock::new(PolymarketBooks::new())),
            kalshi_books: Arc::new(RwLock::new(KalshiBooks::new())),
            events,
            polymarket_ws_url: config.network.polymarket_ws_url.clone(),
            kalshi_ws_url: config.network.kalshi_ws_url.clone(),
            kalshi_token,
            arb_config: ArbConfig::from_fees(
                config.scanner.polymarket_fee_pct,
                config.scanner.kalshi_fee_pct,
            ),
            analyzer: LiquidityAnalyzer::from_fee_pcts(
                config.scanner.polymarket_fee_pct,
                config.scanner.kalshi_fee_pct,
                config.scanner.min_profit_pct,
            ),
            debounce: Duration::from_millis(config.stream.debounce_ms),
            reconnect: ReconnectPolicy::new(
                Duration::from_millis(config.stream.reconnect_base_ms),
                Duration::from_millis(config.stream.reconnect_cap_ms),
            ),
            channel_capacity: config.stream.update_channel_capacity,
        }
    }

    /// Subscribe to engine output events.
    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Run both venue workers and the aggregator until shutdown.
    pub async fn run(self) -> Result<()> {
        let (update_tx, update_rx) = mpsc::channel(self.channel_capacity);

        let aggregator = Aggregator::new(
            self.registry.clone(),
            self.polymarket_books.clone(),
            self.kalshi_books.clone(),
            self.arb_config.clone(),
            self.analyzer.clone(),
            self.debounce,
            self.events.clone(),
        );

        info!(
            pairs = self.registry.len(),
            "Starting streaming engine"
        );

        let aggregator_task = tokio::spawn(aggregator.run(update_rx));

        let polymarket_task = tokio::spawn(polymarket_worker(
            self.polymarket_ws_url,
            self.registry.clone(),
            self.polymarket_books,
            update_tx.clone(),
            self.reconnect,
        ));

        let kalshi_task = tokio::spawn(kalshi_worker(
            self.kalshi_ws_url,
            self.kalshi_token,
            self.registry,
            self.kalshi_books,
            update_tx,
            self.reconnect,
        ));

        // Workers run until cancelled from outside; surface the first exit.
        let _ = tokio::join!(polymarket_task, kalshi_task, aggregator_task);
        Ok(())
    }
}

/// Own the Polymarket socket: maintain token books, notify the aggregator.
async fn polymarket_worker(
    url: String,
    registry: Arc<MarketPairRegistry>,
    books: Arc<RwLock<PolymarketBooks>>,
    updates: mpsc::Sender<PairUpdate>,
    reconnect: ReconnectPolicy,
) {
    let mut attempt: u32 = 0;
    loop {
        let mut stream = PolymarketStream::new(url.clone());
        if let Err(e) = stream.connect().await {
            warn!(error = %e, attempt, "Polymarket connect failed");
            sleep(reconnect.delay(attempt)).await;
            attempt = attempt.saturating_add(1);
            continue;
        }

        let tokens = registry.token_ids();
        books.write().mark_subscribing(&tokens);
        if let Err(e) = stream.subscribe(&tokens).await {
            warn!(error = %e, "Polymarket subscribe failed");
            sleep(reconnect.delay(attempt)).await;
            attempt = attempt.saturating_add(1);
            continue;
        }
        attempt = 0;

        while let Some(event) = stream.next_event().await {
            match event {
                PolymarketStreamEvent::Book { token, bids, asks } => {
                    books.write().apply_snapshot(&token, &bids, &asks);
                    if notify_token(&registry, &updates, &token).await.is_err() {
                        return;
                    }
                }
                PolymarketStreamEvent::PriceChange {
                    token,
                    side,
                    price,
                    size,
                } => {
                    books.write().apply_price_change(&token, side, price, size);
                    if notify_token(&registry, &updates, &token).await.is_err() {
                        return;
                    }
                }
                PolymarketStreamEvent::Disconnected { reason } => {
                    warn!(reason = %reason, "Polymarket stream disconnected");
                    break;
                }
            }
        }

        books.write().mark_all_desynced();
        sleep(reconnect.delay(attempt)).await;
        attempt = attempt.saturating_add(1);
    }
}

/// Own the Kalshi socket: maintain ticker books in `seq` order, trigger
/// resubscribes on gaps, notify the aggregator.
async fn kalshi_worker(
    url: String,
    token: String,
    registry: Arc<MarketPairRegistry>,
    books: Arc<RwLock<KalshiBooks>>,
    updates: mpsc::Sender<PairUpdate>,
    reconnect: ReconnectPolicy,
) {
    let mut attempt: u32 = 0;
    loop {
        let mut stream = KalshiStream::new(url.clone(), token.clone());
        if let Err(e) = stream.connect().await {
            warn!(error = %e, attempt, "Kalshi connect failed");
            sleep(reconnect.delay(attempt)).await;
            attempt = attempt.saturating_add(1);
            continue;
        }

        let tickers = registry.tickers();
        books.write().mark_subscribing(&tickers);
        if let Err(e) = stream.subscribe(&tickers).await {
            warn!(error = %e, "Kalshi subscribe failed");
            sleep(reconnect.delay(attempt)).await;
            attempt = attempt.saturating_add(1);
            continue;
        }
        attempt = 0;

        while let Some(event) = stream.next_event().await {
            match event {
                KalshiStreamEvent::Snapshot {
                    ticker,
                    seq,
                    yes,
                    no,
                } => {
                    books.write().apply_snapshot(&ticker, seq, &yes, &no);
                    if notify_ticker(&registry, &updates, &ticker).await.is_err() {
                        return;
                    }
                }
                KalshiStreamEvent::Delta {
                    ticker,
                    seq,
                    side,
                    price_cents,
                    delta,
                } => {
                    let outcome =
                        books
                            .write()
                            .apply_delta(&ticker, seq, &side, price_cents, delta);
                    match outcome {
                        DeltaOutcome::Applied => {
                            if notify_ticker(&registry, &updates, &ticker).await.is_err() {
                                return;
                            }
                        }
                        DeltaOutcome::Gap { expected, received } => {
                            warn!(
                                ticker = %ticker,
                                expected,
                                received,
                                "Sequence gap, resubscribing"
                            );
                            books.write().mark_subscribing(std::slice::from_ref(&ticker));
                            if let Err(e) = stream.subscribe(std::slice::from_ref(&ticker)).await {
                                warn!(error = %e, "Resubscribe failed, reconnecting");
                                break;
                            }
                        }
                        DeltaOutcome::NotSynced => {}
                    }
                }
                KalshiStreamEvent::SubscriptionError { detail } => {
                    warn!(detail = %detail, "Kalshi subscription error");
                }
                KalshiStreamEvent::Disconnected { reason } => {
                    warn!(reason = %reason, "Kalshi stream disconnected");
                    break;
                }
            }
        }

        books.write().mark_all_desynced();
        sleep(reconnect.delay(attempt)).await;
        attempt = attempt.saturating_add(1);
    }
}

async fn notify_token(
    registry: &MarketPairRegistry,
    updates: &mpsc::Sender<PairUpdate>,
    token: &TokenId,
) -> std::result::Result<(), ()> {
    if let Some((pair_id, _)) = registry.pair_for_token(token) {
        updates
            .send(PairUpdate {
                pair_id,
                venue: Venue::Polymarket,
            })
            .await
            .map_err(|_| ())?;
    }
    Ok(())
}

async fn notify_ticker(
    registry: &MarketPairRegistry,
    updates: &mpsc::Sender<PairUpdate>,
    ticker: &Ticker,
) -> std::result::Result<(), ()> {
    if let Some(pair_id) = registry.pair_for_ticker(ticker) {
        updates
            .send(PairUpdate {
                pair_id,
                venue: Venue::Kalshi,
            })
            .await
            .map_err(|_| ())?;
    }
    Ok(())
}
