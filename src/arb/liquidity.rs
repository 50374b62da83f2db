//! Order-book liquidity analysis.
//!
//! Midpoint spreads say nothing about executable size. The analyzer walks the
//! two ask ladders an opportunity buys from in lock-step, consuming the
//! smaller remaining size at each step until the combined price stops
//! clearing fees plus the minimum profit, and reports how many contracts fit
//! and what stopped the walk.

use rust_decimal::Decimal;

use crate::domain::opportunity::BestAsks;
use crate::domain::{
    ArbitrageOpportunity, BookLevel, LadderStep, LiquidityAnalysis, LiquidityLimit, Strategy,
    UnifiedOrderBook,
};

#[derive(Debug, Clone)]
pub struct LiquidityAnalyzer {
    /// Combined venue fees per contract, in dollars.
    fees: Decimal,
    /// Per-contract profit below which the walk stops.
    min_profit: Decimal,
}

impl LiquidityAnalyzer {
    #[must_use]
    pub const fn new(fees: Decimal, min_profit: Decimal) -> Self {
        Self { fees, min_profit }
    }

    /// Fee percentages straight from scanner configuration.
    #[must_use]
    pub fn from_fee_pcts(
        polymarket_fee_pct: Decimal,
        kalshi_fee_pct: Decimal,
        min_profit_pct: Decimal,
    ) -> Self {
        Self {
            fees: (polymarket_fee_pct + kalshi_fee_pct) / Decimal::ONE_HUNDRED,
            min_profit: min_profit_pct / Decimal::ONE_HUNDRED,
        }
    }

    /// Walk the ladders the opportunity's strategy buys from.
    #[must_use]
    pub fn analyze(
        &self,
        opportunity: &ArbitrageOpportunity,
        polymarket_book: &UnifiedOrderBook,
        kalshi_book: &UnifiedOrderBook,
    ) -> LiquidityAnalysis {
        let (poly_asks, kalshi_asks) = match opportunity.strategy {
            Strategy::YesPolymarketNoKalshi => {
                (polymarket_book.yes_asks(), kalshi_book.no_asks())
            }
            Strategy::YesKalshiNoPolymarket => {
                (polymarket_book.no_asks(), kalshi_book.yes_asks())
            }
        };

        let best_asks = BestAsks {
            polymarket_yes_ask: polymarket_book.best_yes_ask().map(BookLevel::price),
            kalshi_no_ask: kalshi_book.best_no_ask().map(BookLevel::price),
            kalshi_yes_ask: kalshi_book.best_yes_ask().map(BookLevel::price),
            polymarket_no_ask: polymarket_book.no_asks().first().map(BookLevel::price),
        };

        self.walk(poly_asks, kalshi_asks, best_asks)
    }

    fn walk(
        &self,
        poly_asks: &[BookLevel],
        kalshi_asks: &[BookLevel],
        best_asks: BestAsks,
    ) -> LiquidityAnalysis {
        if poly_asks.is_empty() || kalshi_asks.is_empty() {
            return LiquidityAnalysis::unavailable(LiquidityLimit::NoLiquidity, None);
        }

        // A walk that cannot even take the first step is a closed spread;
        // surface the offending best asks for diagnostics.
        let initial_cost = poly_asks[0].price() + kalshi_asks[0].price();
        if !self.profitable(initial_cost) {
            return LiquidityAnalysis::unavailable(LiquidityLimit::SpreadClosed, Some(best_asks));
        }

        let mut ladder: Vec<LadderStep> = Vec::new();
        let mut contracts = Decimal::ZERO;
        let mut investment = Decimal::ZERO;
        let mut profit = Decimal::ZERO;

        let mut i = 0;
        let mut j = 0;
        let mut remaining_poly = poly_asks[0].size();
        let mut remaining_kalshi = kalshi_asks[0].size();

        let limited_by = loop {
            if i >= poly_asks.len() {
                break LiquidityLimit::PolymarketLiquidity;
            }
            if j >= kalshi_asks.len() {
                break LiquidityLimit::KalshiLiquidity;
            }

            let poly_price = poly_asks[i].price();
            let kalshi_price = kalshi_asks[j].price();
            let cost = poly_price + kalshi_price;
            if !self.profitable(cost) {
                break LiquidityLimit::SpreadExhausted;
            }

            let avail = remaining_poly.min(remaining_kalshi);
            let step_profit = Decimal::ONE - cost - self.fees;

            contracts += avail;
            investment += avail * cost;
            profit += avail * step_profit;

            ladder.push(LadderStep {
                contracts: avail,
                polymarket_price: poly_price,
                kalshi_price,
                profit_per_contract: step_profit,
                cumulative_contracts: contracts,
                cumulative_cost: investment,
                cumulative_profit: profit,
            });

            remaining_poly -= avail;
            remaining_kalshi -= avail;

            if remaining_poly.is_zero() {
                i += 1;
                if i < poly_asks.len() {
                    remaining_poly = poly_asks[i].size();
                }
            }
            if remaining_kalshi.is_zero() {
                j += 1;
                if j < kalshi_asks.len() {
                    remaining_kalshi = kalshi_asks[j].size();
                }
            }
        };

        let avg_profit_pct = if investment.is_zero() {
            Decimal::ZERO
        } else {
            profit / investment * Decimal::ONE_HUNDRED
        };

        LiquidityAnalysis {
            max_contracts: contracts,
            max_investment: investment,
            max_profit: profit,
            avg_profit_pct,
            ladder,
            limited_by,
            best_asks: None,
        }
    }

    fn profitable(&self, cost: Decimal) -> bool {
        Decimal::ONE - cost - self.fees > self.min_profit
    }
}
