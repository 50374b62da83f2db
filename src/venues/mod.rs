//! Venue clients.
//!
//! Each venue implements the same capability set so the scanner and resolver
//! never branch on venue specifics outside this module.

pub mod kalshi;
pub mod polymarket;

use async_trait::async_trait;

use crate::domain::{BookKey, EventRef, MarketRef, UnifiedOrderBook, Venue};
use crate::error::Result;

/// Capability set the orchestrator depends on.
///
/// `fetch_event` resolves a venue identifier (Polymarket slug or Kalshi
/// ticker) to the event and its binary markets; `fetch_order_book` retrieves
/// a normalized book for one market.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_event(&self, identifier: &str) -> Result<Option<(EventRef, Vec<MarketRef>)>>;

    /// All open events under a series/group identifier. Venues without a
    /// series concept return at most the one event the identifier names.
    async fn fetch_series(&self, identifier: &str) -> Result<Vec<(EventRef, Vec<MarketRef>)>> {
        Ok(self.fetch_event(identifier).await?.into_iter().collect())
    }

    async fn fetch_order_book(&self, market_id: &str, key: &BookKey) -> Result<UnifiedOrderBook>;

    fn venue(&self) -> Venue;
}
