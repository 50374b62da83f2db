//! Matched cross-venue pairs.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{Ticker, TokenId};

/// How a pair mapping was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// From the static catalog in `market-mappings.json`.
    Static,
    /// Expanded from a date-templated pattern.
    Dynamic,
    /// Confirmed by the fuzzy event matcher.
    Fuzzy,
    /// Synthesized from a sports-game slug/ticker.
    Game,
}

/// A cross-venue event mapping produced by the pair resolver.
#[derive(Debug, Clone)]
pub struct MatchedPair {
    pub name: String,
    pub category: String,
    pub polymarket_slug: String,
    pub kalshi_ticker: String,
    /// Kalshi series ticker for event discovery, when it differs from the
    /// market ticker prefix.
    pub kalshi_series: Option<String>,
    pub date: Option<NaiveDate>,
    pub match_type: MatchType,
}

/// One venue's side of an aligned market.
#[derive(Debug, Clone)]
pub struct MarketQuote {
    pub question: String,
    pub yes_price: Decimal,
    pub no_price: Decimal,
}

/// Two binary markets aligned across venues by the market matcher.
#[derive(Debug, Clone)]
pub struct MarketPair {
    pub name: String,
    pub category: String,
    pub polymarket: MarketQuote,
    pub kalshi: MarketQuote,
    /// Token order is preserved from the venue response: `yes` is the token
    /// backing the YES side of the Polymarket question as matched.
    pub polymarket_tokens: (TokenId, TokenId),
    pub kalshi_ticker: Ticker,
    /// Matcher confidence in [0, 1].
    pub confidence: f64,
    pub end_date: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub polymarket_slug: String,
}

impl MarketPair {
    /// Absolute YES-price gap between the venues.
    #[must_use]
    pub fn spread(&self) -> Decimal {
        (self.polymarket.yes_price - self.kalshi.yes_price).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote(yes: Decimal) -> MarketQuote {
        MarketQuote {
            question: "Will it happen?".into(),
            yes_price: yes,
            no_price: Decimal::ONE - yes,
        }
    }

    #[test]
    fn spread_is_absolute_yes_gap() {
        let pair = MarketPair {
            name: "test".into(),
            category: "crypto".into(),
            polymarket: quote(dec!(0.45)),
            kalshi: quote(dec!(0.60)),
            polymarket_tokens: (TokenId::from("y"), TokenId::from("n")),
            kalshi_ticker: Ticker::from("KXTEST"),
            confidence: 1.0,
            end_date: None,
            image_url: None,
            polymarket_slug: "test-slug".into(),
        };

        assert_eq!(pair.spread(), dec!(0.15));
    }
}
