//! Normalized order book model.
//!
//! Both venues are reduced to the same four-ladder shape: bids and asks for
//! each of the YES and NO sides, prices in [0, 1] dollars. Venue parsers feed
//! raw levels through [`UnifiedOrderBook::new`], which drops invalid entries
//! and enforces sort order, so downstream code never revalidates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::money::{Price, Size};
use super::venue::Venue;

/// A single price level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookLevel {
    price: Price,
    size: Size,
}

impl BookLevel {
    #[must_use]
    pub const fn new(price: Price, size: Size) -> Self {
        Self { price, size }
    }

    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }
}

/// Order book for one market with both outcome sides.
#[derive(Debug, Clone)]
pub struct UnifiedOrderBook {
    venue: Venue,
    market_id: String,
    yes_bids: Vec<BookLevel>,
    yes_asks: Vec<BookLevel>,
    no_bids: Vec<BookLevel>,
    no_asks: Vec<BookLevel>,
    fetched_at: DateTime<Utc>,
}

impl UnifiedOrderBook {
    /// Build a normalized book from raw ladders.
    ///
    /// Levels with `size <= 0` or `price` outside the open interval (0, 1)
    /// are dropped. Bids are sorted descending by price, asks ascending.
    #[must_use]
    pub fn new(
        venue: Venue,
        market_id: impl Into<String>,
        yes_bids: Vec<BookLevel>,
        yes_asks: Vec<BookLevel>,
        no_bids: Vec<BookLevel>,
        no_asks: Vec<BookLevel>,
    ) -> Self {
        Self {
            venue,
            market_id: market_id.into(),
            yes_bids: normalize(yes_bids, SortSide::Bid),
            yes_asks: normalize(yes_asks, SortSide::Ask),
            no_bids: normalize(no_bids, SortSide::Bid),
            no_asks: normalize(no_asks, SortSide::Ask),
            fetched_at: Utc::now(),
        }
    }

    /// An empty book, used when an order-book endpoint degrades.
    #[must_use]
    pub fn empty(venue: Venue, market_id: impl Into<String>) -> Self {
        Self::new(venue, market_id, vec![], vec![], vec![], vec![])
    }

    #[must_use]
    pub const fn venue(&self) -> Venue {
        self.venue
    }

    #[must_use]
    pub fn market_id(&self) -> &str {
        &self.market_id
    }

    #[must_use]
    pub fn yes_bids(&self) -> &[BookLevel] {
        &self.yes_bids
    }

    #[must_use]
    pub fn yes_asks(&self) -> &[BookLevel] {
        &self.yes_asks
    }

    #[must_use]
    pub fn no_bids(&self) -> &[BookLevel] {
        &self.no_bids
    }

    #[must_use]
    pub fn no_asks(&self) -> &[BookLevel] {
        &self.no_asks
    }

    #[must_use]
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Best (lowest) YES ask.
    #[must_use]
    pub fn best_yes_ask(&self) -> Option<&BookLevel> {
        self.yes_asks.first()
    }

    /// Best (lowest) NO ask.
    #[must_use]
    pub fn best_no_ask(&self) -> Option<&BookLevel> {
        self.no_asks.first()
    }

    /// Total contracts resting on the YES ask ladder.
    #[must_use]
    pub fn yes_ask_depth(&self) -> Size {
        self.yes_asks.iter().map(BookLevel::size).sum()
    }

    /// Total contracts resting on the NO ask ladder.
    #[must_use]
    pub fn no_ask_depth(&self) -> Size {
        self.no_asks.iter().map(BookLevel::size).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.yes_bids.is_empty()
            && self.yes_asks.is_empty()
            && self.no_bids.is_empty()
            && self.no_asks.is_empty()
    }
}

enum SortSide {
    Bid,
    Ask,
}

fn normalize(mut levels: Vec<BookLevel>, side: SortSide) -> Vec<BookLevel> {
    levels.retain(|l| l.size > Decimal::ZERO && l.price > Decimal::ZERO && l.price < Decimal::ONE);
    match side {
        SortSide::Bid => levels.sort_by(|a, b| b.price.cmp(&a.price)),
        SortSide::Ask => levels.sort_by(|a, b| a.price.cmp(&b.price)),
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn level(price: Decimal, size: Decimal) -> BookLevel {
        BookLevel::new(price, size)
    }

    #[test]
    fn bids_sorted_descending_asks_ascending() {
        let book = UnifiedOrderBook::new(
            Venue::Polymarket,
            "m1",
            vec![level(dec!(0.40), dec!(10)), level(dec!(0.45), dec!(5))],
            vec![level(dec!(0.55), dec!(10)), level(dec!(0.50), dec!(5))],
            vec![],
            vec![],
        );

        assert_eq!(book.yes_bids()[0].price(), dec!(0.45));
        assert_eq!(book.yes_bids()[1].price(), dec!(0.40));
        assert_eq!(book.yes_asks()[0].price(), dec!(0.50));
        assert_eq!(book.yes_asks()[1].price(), dec!(0.55));
    }

    #[test]
    fn invalid_levels_are_dropped() {
        let book = UnifiedOrderBook::new(
            Venue::Kalshi,
            "m2",
            vec![
                level(dec!(0.45), dec!(0)),   // zero size
                level(dec!(0), dec!(100)),    // price at lower bound
                level(dec!(1), dec!(100)),    // price at upper bound
                level(dec!(0.45), dec!(-5)),  // negative size
                level(dec!(0.45), dec!(100)), // valid
            ],
            vec![],
            vec![],
            vec![],
        );

        assert_eq!(book.yes_bids().len(), 1);
        assert_eq!(book.yes_bids()[0].size(), dec!(100));
    }

    #[test]
    fn depth_sums_ask_sizes() {
        let book = UnifiedOrderBook::new(
            Venue::Polymarket,
            "m3",
            vec![],
            vec![level(dec!(0.45), dec!(100)), level(dec!(0.47), dec!(200))],
            vec![],
            vec![level(dec!(0.40), dec!(50))],
        );

        assert_eq!(book.yes_ask_depth(), dec!(300));
        assert_eq!(book.no_ask_depth(), dec!(50));
    }

    #[test]
    fn empty_book_reports_empty() {
        let book = UnifiedOrderBook::empty(Venue::Kalshi, "m4");
        assert!(book.is_empty());
        assert!(book.best_yes_ask().is_none());
        assert_eq!(book.yes_ask_depth(), Decimal::ZERO);
    }
}
