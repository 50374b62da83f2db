//! Output DTOs served from the snapshot cache.
//!
//! Field names serialize in camelCase to match what the HTTP layer and UI
//! consume.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::opportunity::{LiquidityLimit, OpportunityKind};

/// Liquidity verdict attached to an opportunity DTO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityStatus {
    Available,
    SpreadClosed,
    NoLiquidity,
    /// Pair ranked below the per-scan liquidity analysis cutoff.
    NotAnalyzed,
}

/// Per-venue YES/NO quote pair.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuotedPrices {
    pub yes: Decimal,
    pub no: Decimal,
}

/// Best order-book asks for both construction directions.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPrices {
    pub poly_yes_ask: Option<Decimal>,
    pub kalshi_no_ask: Option<Decimal>,
    pub kalshi_yes_ask: Option<Decimal>,
    pub poly_no_ask: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Fees {
    pub polymarket: Decimal,
    pub kalshi: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub polymarket: QuotedPrices,
    pub kalshi: QuotedPrices,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_book: Option<BookPrices>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueUrls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polymarket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kalshi: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityVerdict {
    pub status: LiquidityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limited_by: Option<LiquidityLimit>,
}

/// Flattened opportunity record for display and serving.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityDto {
    pub id: String,
    pub event_name: String,
    pub market_name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: OpportunityKind,
    pub spread_pct: Decimal,
    pub action: String,
    pub potential_profit: Decimal,
    pub max_investment: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_resolution: Option<DateTime<Utc>>,
    pub fees: Fees,
    pub prices: PriceBreakdown,
    pub urls: VenueUrls,
    pub liquidity: LiquidityVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apr: Option<Decimal>,
    pub last_updated: DateTime<Utc>,
}

/// One completed scan's worth of opportunities, sorted by descending profit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunitiesSnapshot {
    pub opportunities: Vec<OpportunityDto>,
    pub scanned_at: DateTime<Utc>,
    pub total_count: usize,
}

impl OpportunitiesSnapshot {
    /// Sort by descending spread percentage and stamp counts.
    #[must_use]
    pub fn from_opportunities(mut opportunities: Vec<OpportunityDto>) -> Self {
        opportunities.sort_by(|a, b| b.spread_pct.cmp(&a.spread_pct));
        let total_count = opportunities.len();
        Self {
            opportunities,
            scanned_at: Utc::now(),
            total_count,
        }
    }
}
