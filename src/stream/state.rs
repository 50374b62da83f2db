//! Authoritative per-market book state for the streaming engine.
//!
//! Each venue worker is the single writer of its own state; the aggregator
//! reads snapshots through a lock. Every subscribed market moves through the
//! same lifecycle:
//!
//! `unsubscribed -> subscribing -> synced`, dropping to `desynced` on a
//! sequence gap (Kalshi) or reconnect, and back through `subscribing` after a
//! resubscribe. `error` is terminal per subscription.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use crate::domain::{BookLevel, Price, Size, Ticker, TokenId, UnifiedOrderBook, Venue};
use crate::venues::kalshi::dto::{cents_to_dollars, CentLevel};
use crate::venues::polymarket::stream::LadderSide;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionState {
    Unsubscribed,
    Subscribing,
    Synced { last_seq: u64 },
    Desynced,
    Error(String),
}

/// Result of applying a Kalshi delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOutcome {
    Applied,
    /// Sequence gap; the market needs a resubscribe.
    Gap { expected: u64, received: u64 },
    /// Delta arrived before a snapshot; ignored.
    NotSynced,
}

// ---------------------------------------------------------------------------
// Polymarket
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct TokenBook {
    state: SubscriptionState,
    bids: BTreeMap<Price, Size>,
    asks: BTreeMap<Price, Size>,
}

impl Default for SubscriptionState {
    fn default() -> Self {
        SubscriptionState::Unsubscribed
    }
}

/// Book state for all subscribed Polymarket tokens.
///
/// The CLOB feed has no sequence numbers; a full book message is always
/// authoritative and price changes mutate single levels.
#[derive(Debug, Default)]
pub struct PolymarketBooks {
    books: HashMap<TokenId, TokenBook>,
}

impl PolymarketBooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_subscribing(&mut self, tokens: &[TokenId]) {
        for token in tokens {
            self.books.entry(token.clone()).or_default().state = SubscriptionState::Subscribing;
        }
    }

    pub fn mark_all_desynced(&mut self) {
        for book in self.books.values_mut() {
            book.state = SubscriptionState::Desynced;
        }
    }

    pub fn apply_snapshot(&mut self, token: &TokenId, bids: &[BookLevel], asks: &[BookLevel]) {
        let book = self.books.entry(token.clone()).or_default();
        book.bids = bids.iter().map(|l| (l.price(), l.size())).collect();
        book.asks = asks.iter().map(|l| (l.price(), l.size())).collect();
        book.state = SubscriptionState::Synced { last_seq: 0 };
    }

    /// Mutate one level; a zero size removes it. Changes before the first
    /// snapshot are dropped.
    pub fn apply_price_change(&mut self, token: &TokenId, side: LadderSide, price: Price, size: Size) {
        let Some(book) = self.books.get_mut(token) else {
            return;
        };
        if !matches!(book.state, SubscriptionState::Synced { .. }) {
            return;
        }
        let ladder = match side {
            LadderSide::Bids => &mut book.bids,
            LadderSide::Asks => &mut book.asks,
        };
        if size.is_zero() {
            ladder.remove(&price);
        } else {
            ladder.insert(price, size);
        }
    }

    #[must_use]
    pub fn state(&self, token: &TokenId) -> SubscriptionState {
        self.books
            .get(token)
            .map_or(SubscriptionState::Unsubscribed, |b| b.state.clone())
    }

    /// Unified book for a YES/NO token pair, only when both sides are synced.
    #[must_use]
    pub fn unified_book(&self, yes: &TokenId, no: &TokenId) -> Option<UnifiedOrderBook> {
        let yes_book = self.synced(yes)?;
        let no_book = self.synced(no)?;

        Some(UnifiedOrderBook::new(
            Venue::Polymarket,
            yes.as_str(),
            to_levels(&yes_book.bids),
            to_levels(&yes_book.asks),
            to_levels(&no_book.bids),
            to_levels(&no_book.asks),
        ))
    }

    fn synced(&self, token: &TokenId) -> Option<&TokenBook> {
        self.books
            .get(token)
            .filter(|b| matches!(b.state, SubscriptionState::Synced { .. }))
    }
}

fn to_levels(ladder: &BTreeMap<Price, Size>) -> Vec<BookLevel> {
    ladder
        .iter()
        .map(|(price, size)| BookLevel::new(*price, *size))
        .collect()
}

// ---------------------------------------------------------------------------
// Kalshi
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct TickerBook {
    state: SubscriptionState,
    /// Resting YES bids, cents -> quantity.
    yes: BTreeMap<u32, u64>,
    /// Resting NO bids, cents -> quantity.
    no: BTreeMap<u32, u64>,
}

/// Book state for all subscribed Kalshi tickers, ordered by `seq`.
#[derive(Debug, Default)]
pub struct KalshiBooks {
    books: HashMap<Ticker, TickerBook>,
}

impl KalshiBooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_subscribing(&mut self, tickers: &[Ticker]) {
        for ticker in tickers {
            self.books.entry(ticker.clone()).or_default().state = SubscriptionState::Subscribing;
        }
    }

    pub fn mark_all_desynced(&mut self) {
        for book in self.books.values_mut() {
            book.state = SubscriptionState::Desynced;
        }
    }

    pub fn mark_error(&mut self, ticker: &Ticker, detail: String) {
        self.books.entry(ticker.clone()).or_default().state = SubscriptionState::Error(detail);
    }

    /// Seed the book from a snapshot; zero-quantity levels are dropped.
    pub fn apply_snapshot(&mut self, ticker: &Ticker, seq: u64, yes: &[CentLevel], no: &[CentLevel]) {
        let book = self.books.entry(ticker.clone()).or_default();
        book.yes = yes
            .iter()
            .filter(|(_, qty)| *qty > 0)
            .map(|(price, qty)| (*price, *qty))
            .collect();
        book.no = no
            .iter()
            .filter(|(_, qty)| *qty > 0)
            .map(|(price, qty)| (*price, *qty))
            .collect();
        book.state = SubscriptionState::Synced { last_seq: seq };
    }

    /// Apply a signed delta at one level, enforcing `seq` continuity.
    pub fn apply_delta(
        &mut self,
        ticker: &Ticker,
        seq: u64,
        side: &str,
        price_cents: u32,
        delta: i64,
    ) -> DeltaOutcome {
        let Some(book) = self.books.get_mut(ticker) else {
            return DeltaOutcome::NotSynced;
        };
        let SubscriptionState::Synced { last_seq } = book.state else {
            return DeltaOutcome::NotSynced;
        };

        if seq != last_seq + 1 {
            book.state = SubscriptionState::Desynced;
            return DeltaOutcome::Gap {
                expected: last_seq + 1,
                received: seq,
            };
        }

        let ladder = match side {
            "yes" => &mut book.yes,
            "no" => &mut book.no,
            _ => {
                // Unknown side still advances the sequence.
                book.state = SubscriptionState::Synced { last_seq: seq };
                return DeltaOutcome::Applied;
            }
        };

        let current = ladder.get(&price_cents).copied().unwrap_or(0) as i64;
        let updated = (current + delta).max(0) as u64;
        if updated == 0 {
            ladder.remove(&price_cents);
        } else {
            ladder.insert(price_cents, updated);
        }

        book.state = SubscriptionState::Synced { last_seq: seq };
        DeltaOutcome::Applied
    }

    #[must_use]
    pub fn state(&self, ticker: &Ticker) -> SubscriptionState {
        self.books
            .get(ticker)
            .map_or(SubscriptionState::Unsubscribed, |b| b.state.clone())
    }

    /// Unified book for a ticker, only when synced. Bids convert from cents;
    /// each side's asks derive as the complement of the other side's bids.
    #[must_use]
    pub fn unified_book(&self, ticker: &Ticker) -> Option<UnifiedOrderBook> {
        let book = self
            .books
            .get(ticker)
            .filter(|b| matches!(b.state, SubscriptionState::Synced { .. }))?;

        let yes_bids = cent_levels(&book.yes);
        let no_bids = cent_levels(&book.no);
        let yes_asks = complement(&no_bids);
        let no_asks = complement(&yes_bids);

        Some(UnifiedOrderBook::new(
            Venue::Kalshi,
            ticker.as_str(),
            yes_bids,
            yes_asks,
            no_bids,
            no_asks,
        ))
    }
}

fn cent_levels(ladder: &BTreeMap<u32, u64>) -> Vec<BookLevel> {
    ladder
        .iter()
        .map(|(cents, qty)| BookLevel::new(cents_to_dollars(*cents), Decimal::from(*qty)))
        .collect()
}

fn complement(bids: &[BookLevel]) -> Vec<BookLevel> {
    bids.iter()
        .map(|l| BookLevel::new(Decimal::ONE - l.price(), l.size()))
        .collect()
}
