//! Cheapest-cost arbitrage pricing from midpoint quotes.
//!
//! A synthetic dollar is one YES contract on one venue plus one NO contract
//! on the other; whichever direction is cheaper defines the strategy. Costing
//! under $1 after fees locks in the difference.

use rust_decimal::Decimal;

use crate::domain::{ArbitrageOpportunity, MarketPair, OpportunityKind, Strategy};

#[derive(Debug, Clone)]
pub struct ArbConfig {
    /// Spread a guaranteed opportunity must clear; zero plus fees by default.
    pub min_guaranteed: Decimal,
    /// Minimum midpoint divergence for a simple opportunity.
    pub simple_spread_min: Decimal,
}

impl Default for ArbConfig {
    fn default() -> Self {
        Self {
            min_guaranteed: Decimal::ZERO,
            simple_spread_min: Decimal::new(2, 2), // 0.02
        }
    }
}

impl ArbConfig {
    /// Fee-adjusted thresholds: a guaranteed spread has to clear both venues'
    /// fees before it is worth anything.
    #[must_use]
    pub fn from_fees(polymarket_fee_pct: Decimal, kalshi_fee_pct: Decimal) -> Self {
        Self {
            min_guaranteed: (polymarket_fee_pct + kalshi_fee_pct) / Decimal::ONE_HUNDRED,
            ..Self::default()
        }
    }
}

/// Price both construction directions and classify the result.
///
/// Returns `None` when the pair clears neither the guaranteed nor the simple
/// threshold.
#[must_use]
pub fn calculate_arbitrage(pair: &MarketPair, config: &ArbConfig) -> Option<ArbitrageOpportunity> {
    let opportunity = price_pair(pair, config);
    match opportunity.kind {
        OpportunityKind::Guaranteed | OpportunityKind::Simple => Some(opportunity),
        OpportunityKind::Spread => None,
    }
}

/// All profitable opportunities, sorted by descending profit percent.
#[must_use]
pub fn find_arbitrage_opportunities(
    pairs: &[MarketPair],
    config: &ArbConfig,
) -> Vec<ArbitrageOpportunity> {
    let mut opportunities: Vec<ArbitrageOpportunity> = pairs
        .iter()
        .filter_map(|pair| calculate_arbitrage(pair, config))
        .collect();
    opportunities.sort_by(|a, b| b.profit_pct.cmp(&a.profit_pct));
    opportunities
}

/// One opportunity per pair, profitable or not, for display surfaces that
/// want the whole table. Non-profitable entries carry
/// [`OpportunityKind::Spread`].
#[must_use]
pub fn create_opportunities_from_all_pairs(
    pairs: &[MarketPair],
    config: &ArbConfig,
) -> Vec<ArbitrageOpportunity> {
    let mut opportunities: Vec<ArbitrageOpportunity> =
        pairs.iter().map(|pair| price_pair(pair, config)).collect();
    opportunities.sort_by(|a, b| b.profit_pct.cmp(&a.profit_pct));
    opportunities
}

fn price_pair(pair: &MarketPair, config: &ArbConfig) -> ArbitrageOpportunity {
    let yes_poly = pair.polymarket.yes_price;
    let yes_kalshi = pair.kalshi.yes_price;

    // Cost of each synthetic-dollar construction.
    let cost_poly_yes = yes_poly + (Decimal::ONE - yes_kalshi);
    let cost_kalshi_yes = yes_kalshi + (Decimal::ONE - yes_poly);

    let (strategy, cost) = if cost_poly_yes <= cost_kalshi_yes {
        (Strategy::YesPolymarketNoKalshi, cost_poly_yes)
    } else {
        (Strategy::YesKalshiNoPolymarket, cost_kalshi_yes)
    };

    let spread = Decimal::ONE - cost;
    let divergence = (yes_poly - yes_kalshi).abs();

    if spread > config.min_guaranteed {
        return ArbitrageOpportunity {
            pair: pair.clone(),
            strategy,
            kind: OpportunityKind::Guaranteed,
            profit_pct: spread * Decimal::ONE_HUNDRED,
            guaranteed_profit: Some(spread),
            cost,
            action: strategy.action(),
        };
    }

    if divergence >= config.simple_spread_min {
        return ArbitrageOpportunity {
            pair: pair.clone(),
            strategy,
            kind: OpportunityKind::Simple,
            profit_pct: divergence * Decimal::ONE_HUNDRED,
            guaranteed_profit: None,
            cost,
            action: format!(
                "{} (prices diverge, not risk-free)",
                strategy.action()
            ),
        };
    }

    ArbitrageOpportunity {
        pair: pair.clone(),
        strategy,
        kind: OpportunityKind::Spread,
        profit_pct: divergence * Decimal::ONE_HUNDRED,
        guaranteed_profit: None,
        cost,
        action: strategy.action(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketQuote, Ticker, TokenId};
    use rust_decimal_macros::dec;

    fn pair(yes_poly: Decimal, yes_kalshi: Decimal) -> MarketPair {
        MarketPair {
            name: "test".into(),
            category: "crypto".into(),
            polymarket: MarketQuote {
                question: "Will it happen?".into(),
                yes_price: yes_poly,
                no_price: Decimal::ONE - yes_poly,
            },
            kalshi: MarketQuote {
                question: "Will it happen?".into(),
                yes_price: yes_kalshi,
                no_price: Decimal::ONE - yes_kalshi,
            },
            polymarket_tokens: (TokenId::from("y"), TokenId::from("n")),
            kalshi_ticker: Ticker::from("KXTEST"),
            confidence: 1.0,
            end_date: None,
            image_url: None,
            polymarket_slug: "test".into(),
        }
    }

    #[test]
    fn guaranteed_arb_buys_cheap_yes_and_cheap_no() {
        // yes_poly = 0.45, yes_kalshi = 0.60:
        // buy YES on Polymarket (0.45) + NO on Kalshi (0.40) = 0.85
        let opp = calculate_arbitrage(&pair(dec!(0.45), dec!(0.60)), &ArbConfig::default()).unwrap();

        assert_eq!(opp.strategy, Strategy::YesPolymarketNoKalshi);
        assert_eq!(opp.kind, OpportunityKind::Guaranteed);
        assert_eq!(opp.cost, dec!(0.85));
        assert_eq!(opp.profit_pct, dec!(15.00));
        assert_eq!(opp.guaranteed_profit, Some(dec!(0.15)));
    }

    #[test]
    fn symmetric_direction_buys_yes_on_kalshi() {
        let opp = calculate_arbitrage(&pair(dec!(0.60), dec!(0.45)), &ArbConfig::default()).unwrap();

        assert_eq!(opp.strategy, Strategy::YesKalshiNoPolymarket);
        assert_eq!(opp.cost, dec!(0.85));
    }

    #[test]
    fn cost_never_exceeds_one_when_spread_positive() {
        for (a, b) in [(dec!(0.30), dec!(0.35)), (dec!(0.71), dec!(0.55))] {
            let opp = price_pair(&pair(a, b), &ArbConfig::default());
            if opp.guaranteed_profit.is_some() {
                assert!(opp.cost < Decimal::ONE);
            }
        }
    }

    #[test]
    fn divergence_without_guarantee_is_simple() {
        // Midpoints diverge by 0.05 but both constructions cost over $1 once
        // the guaranteed threshold includes fees.
        let config = ArbConfig::from_fees(dec!(2.0), dec!(1.0));
        let opp = calculate_arbitrage(&pair(dec!(0.50), dec!(0.52)), &config).unwrap();

        assert_eq!(opp.kind, OpportunityKind::Simple);
        assert_eq!(opp.profit_pct, dec!(2.00));
        assert!(opp.guaranteed_profit.is_none());
    }

    #[test]
    fn tight_pair_yields_nothing() {
        let config = ArbConfig::from_fees(dec!(2.0), dec!(1.0));
        assert!(calculate_arbitrage(&pair(dec!(0.50), dec!(0.51)), &config).is_none());
    }

    #[test]
    fn all_pairs_variant_includes_unprofitable() {
        let config = ArbConfig::from_fees(dec!(2.0), dec!(1.0));
        let pairs = vec![pair(dec!(0.45), dec!(0.60)), pair(dec!(0.50), dec!(0.505))];

        let all = create_opportunities_from_all_pairs(&pairs, &config);

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].kind, OpportunityKind::Guaranteed);
        assert_eq!(all[1].kind, OpportunityKind::Spread);
    }

    #[test]
    fn results_sorted_by_descending_profit() {
        let pairs = vec![
            pair(dec!(0.48), dec!(0.52)),
            pair(dec!(0.45), dec!(0.60)),
            pair(dec!(0.40), dec!(0.50)),
        ];

        let found = find_arbitrage_opportunities(&pairs, &ArbConfig::default());

        assert!(found.len() >= 2);
        for window in found.windows(2) {
            assert!(window[0].profit_pct >= window[1].profit_pct);
        }
        assert_eq!(found[0].profit_pct, dec!(15.00));
    }
}
