//! Pure domain types shared across the scanner.

pub mod book;
pub mod event;
pub mod ids;
pub mod money;
pub mod opportunity;
pub mod pair;
pub mod snapshot;
pub mod venue;

pub use book::{BookLevel, UnifiedOrderBook};
pub use event::{BookKey, EventRef, MarketRef};
pub use ids::{PairId, Ticker, TokenId};
pub use money::{Price, Size};
pub use opportunity::{
    ArbitrageOpportunity, LadderStep, LiquidityAnalysis, LiquidityLimit, OpportunityKind, Strategy,
};
pub use pair::{MarketPair, MarketQuote, MatchType, MatchedPair};
pub use snapshot::{
    BookPrices, Fees, LiquidityStatus, LiquidityVerdict, OpportunitiesSnapshot, OpportunityDto,
    PriceBreakdown, QuotedPrices, VenueUrls,
};
pub use venue::Venue;
