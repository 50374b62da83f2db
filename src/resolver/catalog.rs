//! Static catalog lookup.

use chrono::NaiveDate;

use crate::config::mappings::{MarketMappings, StaticMapping};
use crate::domain::{MatchType, MatchedPair};

/// Find a static mapping by Polymarket slug (case-folded to lowercase).
#[must_use]
pub fn by_polymarket_slug<'a>(
    mappings: &'a MarketMappings,
    slug: &str,
) -> Option<&'a StaticMapping> {
    let slug = slug.to_lowercase();
    mappings
        .static_mappings
        .iter()
        .find(|m| m.polymarket == slug)
}

/// Find a static mapping by Kalshi ticker (case-folded to uppercase).
#[must_use]
pub fn by_kalshi_ticker<'a>(
    mappings: &'a MarketMappings,
    ticker: &str,
) -> Option<&'a StaticMapping> {
    let ticker = ticker.to_uppercase();
    mappings.static_mappings.iter().find(|m| m.kalshi == ticker)
}

/// Build the resolver output for a static catalog hit.
#[must_use]
pub fn to_matched_pair(mapping: &StaticMapping, date: Option<NaiveDate>) -> MatchedPair {
    MatchedPair {
        name: mapping.name.clone(),
        category: mapping.category.clone(),
        polymarket_slug: mapping.polymarket.clone(),
        kalshi_ticker: mapping.kalshi.clone(),
        kalshi_series: mapping.kalshi_series.clone(),
        date,
        match_type: MatchType::Static,
    }
}
