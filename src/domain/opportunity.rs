//! Arbitrage opportunity and liquidity analysis types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::pair::MarketPair;

/// Which leg is bought on which venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Buy YES on Polymarket, NO on Kalshi.
    YesPolymarketNoKalshi,
    /// Buy YES on Kalshi, NO on Polymarket.
    YesKalshiNoPolymarket,
}

impl Strategy {
    /// Human-readable action for the output DTO.
    #[must_use]
    pub fn action(&self) -> String {
        match self {
            Strategy::YesPolymarketNoKalshi => "Buy YES on Polymarket + NO on Kalshi".into(),
            Strategy::YesKalshiNoPolymarket => "Buy YES on Kalshi + NO on Polymarket".into(),
        }
    }
}

/// Classification of a detected opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpportunityKind {
    /// Synthetic dollar costs less than $1 after fees; profit is locked in.
    Guaranteed,
    /// Midpoint prices diverge but no risk-free construction exists.
    Simple,
    /// Display-only entry for a pair below both thresholds.
    Spread,
}

/// A priced cross-venue opportunity.
#[derive(Debug, Clone)]
pub struct ArbitrageOpportunity {
    pub pair: MarketPair,
    pub strategy: Strategy,
    pub kind: OpportunityKind,
    /// Percent of $1, e.g. 15.0 for a 0.85 synthetic dollar.
    pub profit_pct: Decimal,
    /// Locked-in profit per contract, present only for guaranteed entries.
    pub guaranteed_profit: Option<Decimal>,
    /// Cost of the cheaper synthetic-dollar construction.
    pub cost: Decimal,
    pub action: String,
}

/// What stopped the liquidity walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityLimit {
    /// Polymarket's ask ladder ran out first.
    PolymarketLiquidity,
    /// Kalshi's ask ladder ran out first.
    KalshiLiquidity,
    /// Remaining levels priced the spread away.
    SpreadExhausted,
    /// Best asks already sum past profitability.
    SpreadClosed,
    /// One or both ladders empty.
    NoLiquidity,
}

/// One consumed step of the two-ladder walk.
#[derive(Debug, Clone, Serialize)]
pub struct LadderStep {
    pub contracts: Decimal,
    pub polymarket_price: Decimal,
    pub kalshi_price: Decimal,
    pub profit_per_contract: Decimal,
    pub cumulative_contracts: Decimal,
    pub cumulative_cost: Decimal,
    pub cumulative_profit: Decimal,
}

/// Result of walking both ask ladders for an opportunity.
#[derive(Debug, Clone)]
pub struct LiquidityAnalysis {
    pub max_contracts: Decimal,
    pub max_investment: Decimal,
    pub max_profit: Decimal,
    /// `max_profit / max_investment * 100`; zero when nothing is executable.
    pub avg_profit_pct: Decimal,
    pub ladder: Vec<LadderStep>,
    pub limited_by: LiquidityLimit,
    /// Best asks on each side, populated for spread-closed diagnostics.
    pub best_asks: Option<BestAsks>,
}

/// Diagnostic best-ask quotes captured when a walk terminates immediately.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BestAsks {
    pub polymarket_yes_ask: Option<Decimal>,
    pub kalshi_no_ask: Option<Decimal>,
    pub kalshi_yes_ask: Option<Decimal>,
    pub polymarket_no_ask: Option<Decimal>,
}

impl LiquidityAnalysis {
    /// A zero-size analysis with the given limiter.
    #[must_use]
    pub fn unavailable(limited_by: LiquidityLimit, best_asks: Option<BestAsks>) -> Self {
        Self {
            max_contracts: Decimal::ZERO,
            max_investment: Decimal::ZERO,
            max_profit: Decimal::ZERO,
            avg_profit_pct: Decimal::ZERO,
            ladder: Vec::new(),
            limited_by,
            best_asks,
        }
    }
}
