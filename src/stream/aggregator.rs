//! Cross-feed opportunity aggregator.
//!
//! Both venue workers push pair-keyed update notifications into a bounded
//! channel. The aggregator debounces per pair, then reevaluates the pair
//! against the authoritative state of both books at evaluation time. No
//! cross-venue ordering is assumed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, trace};

use super::registry::MarketPairRegistry;
use super::state::{KalshiBooks, PolymarketBooks};
use crate::arb::{calculate_arbitrage, ArbConfig, LiquidityAnalyzer};
use crate::domain::{
    ArbitrageOpportunity, LiquidityLimit, MarketPair, OpportunityKind, PairId, Strategy,
    UnifiedOrderBook, Venue,
};

/// Notification from a venue worker that one of a pair's books changed.
#[derive(Debug, Clone)]
pub struct PairUpdate {
    pub pair_id: PairId,
    pub venue: Venue,
}

/// Snapshot of a live opportunity pushed to subscribers.
#[derive(Debug, Clone)]
pub struct OpportunityUpdate {
    pub pair_id: PairId,
    pub name: String,
    pub strategy: Strategy,
    pub kind: OpportunityKind,
    pub spread_pct: Decimal,
    pub max_contracts: Decimal,
    pub max_profit: Decimal,
    pub limited_by: LiquidityLimit,
}

#[derive(Debug, Clone)]
pub enum EngineEvent {
    Opportunity(OpportunityUpdate),
    OpportunityClosed { pair_id: PairId },
    OrderbookUpdate { pair_id: PairId, venue: Venue },
}

/// Change below which a re-emitted opportunity is considered unchanged.
const EPSILON_SPREAD_PCT: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01
const EPSILON_CONTRACTS: Decimal = Decimal::ONE;

pub struct Aggregator {
    registry: Arc<MarketPairRegistry>,
    polymarket_books: Arc<RwLock<PolymarketBooks>>,
    kalshi_books: Arc<RwLock<KalshiBooks>>,
    arb_config: ArbConfig,
    analyzer: LiquidityAnalyzer,
    debounce: Duration,
    /// Last emitted (spread_pct, max_contracts) per active pair.
    active: HashMap<PairId, (Decimal, Decimal)>,
    events: broadcast::Sender<EngineEvent>,
}

impl Aggregator {
    #[must_use]
    pub fn new(
        registry: Arc<MarketPairRegistry>,
        polymarket_books: Arc<RwLock<PolymarketBooks>>,
        kalshi_books: Arc<RwLock<KalshiBooks>>,
        arb_config: ArbConfig,
        analyzer: LiquidityAnalyzer,
        debounce: Duration,
        events: broadcast::Sender<EngineEvent>,
    ) -> Self {
        Self {
            registry,
            polymarket_books,
            kalshi_books,
            arb_config,
            analyzer,
            debounce,
            active: HashMap::new(),
            events,
        }
    }

    /// Consume update notifications until the channel closes.
    ///
    /// A pair's first notification schedules a reevaluation `debounce` later;
    /// further notifications within the window coalesce into that run.
    pub async fn run(mut self, mut updates: mpsc::Receiver<PairUpdate>) {
        let mut pending: HashMap<PairId, Instant> = HashMap::new();

        loop {
            let next_deadline = pending.values().min().copied();

            tokio::select! {
                update = updates.recv() => {
                    let Some(update) = update else {
                        debug!("Update channel closed, aggregator stopping");
                        break;
                    };
                    let _ = self.events.send(EngineEvent::OrderbookUpdate {
                        pair_id: update.pair_id.clone(),
                        venue: update.venue,
                    });
                    pending
                        .entry(update.pair_id)
                        .or_insert_with(|| Instant::now() + self.debounce);
                }
                () = async {
                    match next_deadline {
                        Some(deadline) => sleep_until(deadline).await,
                        None => std::future::pending::<()>().await,
                    }
                } => {
                    let now = Instant::now();
                    let due: Vec<PairId> = pending
                        .iter()
                        .filter(|(_, deadline)| **deadline <= now)
                        .map(|(pair_id, _)| pair_id.clone())
                        .collect();
                    for pair_id in due {
                        pending.remove(&pair_id);
                        self.evaluate(&pair_id);
                    }
                }
            }
        }
    }

    /// Reevaluate one pair from the authoritative books.
    fn evaluate(&mut self, pair_id: &PairId) {
        let Some(pair) = self.registry.get(pair_id) else {
            return;
        };

        let polymarket_book = self.polymarket_books.read().unified_book(
            &pair.polymarket_tokens.0,
            &pair.polymarket_tokens.1,
        );
        let kalshi_book = self.kalshi_books.read().unified_book(&pair.kalshi_ticker);

        // Stale or missing books make the pair unpriceable.
        let (Some(polymarket_book), Some(kalshi_book)) = (polymarket_book, kalshi_book) else {
            trace!(pair = %pair_id, "Books unavailable, skipping evaluation");
            self.close_if_active(pair_id);
            return;
        };

        let Some(live_pair) = reprice_pair(&pair, &polymarket_book, &kalshi_book) else {
            self.close_if_active(pair_id);
            return;
        };

        match calculate_arbitrage(&live_pair, &self.arb_config) {
            Some(opportunity) => {
                let analysis =
                    self.analyzer
                        .analyze(&opportunity, &polymarket_book, &kalshi_book);
                self.emit_if_changed(pair_id, &opportunity, analysis.max_contracts, analysis.max_profit, analysis.limited_by);
            }
            None => self.close_if_active(pair_id),
        }
    }

    fn emit_if_changed(
        &mut self,
        pair_id: &PairId,
        opportunity: &ArbitrageOpportunity,
        max_contracts: Decimal,
        max_profit: Decimal,
        limited_by: LiquidityLimit,
    ) {
        let key = (opportunity.profit_pct, max_contracts);
        let changed = match self.active.get(pair_id) {
            None => true,
            Some((prev_spread, prev_contracts)) => {
                (key.0 - prev_spread).abs() > EPSILON_SPREAD_PCT
                    || (key.1 - prev_contracts).abs() > EPSILON_CONTRACTS
            }
        };

        if changed {
            info!(
                pair = %pair_id,
                spread_pct = %opportunity.profit_pct,
                contracts = %max_contracts,
                "Opportunity update"
            );
            self.active.insert(pair_id.clone(), key);
            let _ = self.events.send(EngineEvent::Opportunity(OpportunityUpdate {
                pair_id: pair_id.clone(),
                name: opportunity.pair.name.clone(),
                strategy: opportunity.strategy,
                kind: opportunity.kind,
                spread_pct: opportunity.profit_pct,
                max_contracts,
                max_profit,
                limited_by,
            }));
        }
    }

    fn close_if_active(&mut self, pair_id: &PairId) {
        if self.active.remove(pair_id).is_some() {
            info!(pair = %pair_id, "Opportunity closed");
            let _ = self.events.send(EngineEvent::OpportunityClosed {
                pair_id: pair_id.clone(),
            });
        }
    }
}

/// Refresh a pair's midpoint quotes from live books.
///
/// Midpoint is the bid/ask mean when both sides rest, otherwise the best ask.
/// A side with no usable price makes the pair unpriceable.
fn reprice_pair(
    pair: &MarketPair,
    polymarket_book: &UnifiedOrderBook,
    kalshi_book: &UnifiedOrderBook,
) -> Option<MarketPair> {
    let yes_polymarket = midpoint(polymarket_book.yes_bids(), polymarket_book.yes_asks())?;
    let yes_kalshi = midpoint(kalshi_book.yes_bids(), kalshi_book.yes_asks())?;

    let mut live = pair.clone();
    live.polymarket.yes_price = yes_polymarket;
    live.polymarket.no_price = Decimal::ONE - yes_polymarket;
    live.kalshi.yes_price = yes_kalshi;
    live.kalshi.no_price = Decimal::ONE - yes_kalshi;
    Some(live)
}

fn midpoint(
    bids: &[crate::domain::BookLevel],
    asks: &[crate::domain::BookLevel],
) -> Option<Decimal> {
    match (bids.first(), asks.first()) {
        (Some(bid), Some(ask)) => Some((bid.price() + ask.price()) / Decimal::TWO),
        (None, Some(ask)) => Some(ask.price()),
        (Some(bid), None) => Some(bid.price()),
        (None, None) => None,
    }
}
