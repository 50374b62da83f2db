//! Event and market references as fetched from a venue.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::ids::{Ticker, TokenId};
use super::venue::Venue;

/// A venue event (a group of related binary markets).
#[derive(Debug, Clone)]
pub struct EventRef {
    pub venue: Venue,
    pub id: String,
    /// Polymarket slug or Kalshi event ticker.
    pub identifier: String,
    pub title: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

/// How to reach a market's order book on its venue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookKey {
    /// Polymarket: one CLOB token per outcome side.
    Tokens { yes: TokenId, no: TokenId },
    /// Kalshi: one ticker, both sides on a single endpoint.
    Ticker(Ticker),
}

/// A single binary market inside an event.
///
/// Prices are normalized to [0, 1] dollars by the venue clients before a
/// `MarketRef` is built; Kalshi cent prices are divided by 100 at the DTO
/// boundary.
#[derive(Debug, Clone)]
pub struct MarketRef {
    pub venue: Venue,
    pub id: String,
    pub question: String,
    pub event_id: String,
    pub end_date: Option<DateTime<Utc>>,
    pub yes_price: Option<Decimal>,
    pub no_price: Option<Decimal>,
    pub book_key: BookKey,
}

impl MarketRef {
    /// Both quoted prices, when the venue supplied them.
    #[must_use]
    pub fn quotes(&self) -> Option<(Decimal, Decimal)> {
        Some((self.yes_price?, self.no_price?))
    }
}
