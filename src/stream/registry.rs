//! Pair registry for the streaming engine.
//!
//! Bidirectional indexes between pair ids, Kalshi tickers and Polymarket
//! token ids, so a venue update can be routed back to the pair it belongs to
//! without scanning.

use dashmap::DashMap;

use crate::domain::{MarketPair, PairId, Ticker, TokenId};

/// Which side of the pair's Polymarket market a token backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSide {
    Yes,
    No,
}

#[derive(Default)]
pub struct MarketPairRegistry {
    pairs: DashMap<PairId, MarketPair>,
    by_ticker: DashMap<Ticker, PairId>,
    by_token: DashMap<TokenId, (PairId, TokenSide)>,
}

impl MarketPairRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pair under a stable id derived from its identifiers.
    pub fn register(&self, pair: MarketPair) -> PairId {
        let pair_id = PairId::new(format!(
            "{}::{}",
            pair.polymarket_slug,
            pair.kalshi_ticker.as_str()
        ));

        self.by_ticker
            .insert(pair.kalshi_ticker.clone(), pair_id.clone());
        self.by_token.insert(
            pair.polymarket_tokens.0.clone(),
            (pair_id.clone(), TokenSide::Yes),
        );
        self.by_token.insert(
            pair.polymarket_tokens.1.clone(),
            (pair_id.clone(), TokenSide::No),
        );
        self.pairs.insert(pair_id.clone(), pair);

        pair_id
    }

    #[must_use]
    pub fn get(&self, pair_id: &PairId) -> Option<MarketPair> {
        self.pairs.get(pair_id).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn pair_for_ticker(&self, ticker: &Ticker) -> Option<PairId> {
        self.by_ticker.get(ticker).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn pair_for_token(&self, token: &TokenId) -> Option<(PairId, TokenSide)> {
        self.by_token.get(token).map(|entry| entry.value().clone())
    }

    /// All subscribed Kalshi tickers.
    #[must_use]
    pub fn tickers(&self) -> Vec<Ticker> {
        self.by_ticker.iter().map(|e| e.key().clone()).collect()
    }

    /// All subscribed Polymarket token ids.
    #[must_use]
    pub fn token_ids(&self) -> Vec<TokenId> {
        self.by_token.iter().map(|e| e.key().clone()).collect()
    }

    /// All registered pair ids.
    #[must_use]
    pub fn pair_ids(&self) -> Vec<PairId> {
        self.pairs.iter().map(|e| e.key().clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
