//! Opportunity DTO assembly.

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    ArbitrageOpportunity, BookLevel, BookPrices, Fees, LiquidityAnalysis, LiquidityLimit,
    LiquidityStatus, LiquidityVerdict, OpportunityDto, OpportunityKind, PriceBreakdown,
    QuotedPrices, UnifiedOrderBook, VenueUrls,
};

/// Flatten a priced opportunity (plus optional liquidity analysis and books)
/// into the output record.
#[must_use]
pub fn build_dto(
    opportunity: &ArbitrageOpportunity,
    liquidity: Option<&LiquidityAnalysis>,
    books: Option<(&UnifiedOrderBook, &UnifiedOrderBook)>,
    fees: Fees,
) -> OpportunityDto {
    let pair = &opportunity.pair;

    // The display taxonomy only distinguishes locked-in from everything else.
    let kind = match opportunity.kind {
        OpportunityKind::Guaranteed => OpportunityKind::Guaranteed,
        OpportunityKind::Simple | OpportunityKind::Spread => OpportunityKind::Spread,
    };

    let order_book = books.map(|(poly, kalshi)| BookPrices {
        poly_yes_ask: poly.best_yes_ask().map(BookLevel::price),
        kalshi_no_ask: kalshi.best_no_ask().map(BookLevel::price),
        kalshi_yes_ask: kalshi.best_yes_ask().map(BookLevel::price),
        poly_no_ask: poly.best_no_ask().map(BookLevel::price),
    });

    let verdict = match liquidity {
        None => LiquidityVerdict {
            status: LiquidityStatus::NotAnalyzed,
            limited_by: None,
        },
        Some(analysis) => LiquidityVerdict {
            status: match analysis.limited_by {
                LiquidityLimit::NoLiquidity => LiquidityStatus::NoLiquidity,
                LiquidityLimit::SpreadClosed => LiquidityStatus::SpreadClosed,
                LiquidityLimit::PolymarketLiquidity
                | LiquidityLimit::KalshiLiquidity
                | LiquidityLimit::SpreadExhausted => LiquidityStatus::Available,
            },
            limited_by: Some(analysis.limited_by),
        },
    };

    let roi = liquidity
        .filter(|l| l.max_contracts > Decimal::ZERO)
        .map(|l| l.avg_profit_pct);
    let apr = roi.and_then(|roi| {
        let end = pair.end_date?;
        let days = (end - Utc::now()).num_days();
        if days <= 0 {
            return None;
        }
        Some(roi * Decimal::from(365) / Decimal::from(days))
    });

    OpportunityDto {
        id: Uuid::new_v4().to_string(),
        event_name: pair.name.clone(),
        market_name: pair.polymarket.question.clone(),
        category: pair.category.clone(),
        image_url: pair.image_url.clone(),
        kind,
        spread_pct: opportunity.profit_pct,
        action: opportunity.action.clone(),
        potential_profit: liquidity.map_or(Decimal::ZERO, |l| l.max_profit),
        max_investment: liquidity.map_or(Decimal::ZERO, |l| l.max_investment),
        time_to_resolution: pair.end_date,
        fees,
        prices: PriceBreakdown {
            polymarket: QuotedPrices {
                yes: pair.polymarket.yes_price,
                no: pair.polymarket.no_price,
            },
            kalshi: QuotedPrices {
                yes: pair.kalshi.yes_price,
                no: pair.kalshi.no_price,
            },
            order_book,
        },
        urls: VenueUrls {
            polymarket: Some(format!(
                "https://polymarket.com/event/{}",
                pair.polymarket_slug
            )),
            kalshi: Some(format!(
                "https://kalshi.com/markets/{}",
                pair.kalshi_ticker.as_str()
            )),
        },
        liquidity: verdict,
        roi,
        apr,
        last_updated: Utc::now(),
    }
}
