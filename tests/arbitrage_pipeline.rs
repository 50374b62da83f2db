//! Calculator and liquidity walker working together on realistic fixtures.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use spreadhawk::arb::{calculate_arbitrage, ArbConfig, LiquidityAnalyzer};
use spreadhawk::domain::{
    BookLevel, LiquidityLimit, MarketPair, MarketQuote, OpportunityKind, Strategy, Ticker,
    TokenId, UnifiedOrderBook, Venue,
};

fn pair(yes_polymarket: Decimal, yes_kalshi: Decimal) -> MarketPair {
    MarketPair {
        name: "Bitcoin above 100k".into(),
        category: "crypto".into(),
        polymarket: MarketQuote {
            question: "Will Bitcoin hit $100,000?".into(),
            yes_price: yes_polymarket,
            no_price: Decimal::ONE - yes_polymarket,
        },
        kalshi: MarketQuote {
            question: "Bitcoin above 100,000".into(),
            yes_price: yes_kalshi,
            no_price: Decimal::ONE - yes_kalshi,
        },
        polymarket_tokens: (TokenId::from("tok-yes"), TokenId::from("tok-no")),
        kalshi_ticker: Ticker::from("KXBTC-100K"),
        confidence: 1.0,
        end_date: None,
        image_url: None,
        polymarket_slug: "bitcoin-above-100k".into(),
    }
}

fn poly_book(yes_asks: &[(Decimal, Decimal)]) -> UnifiedOrderBook {
    UnifiedOrderBook::new(
        Venue::Polymarket,
        "bitcoin-above-100k",
        vec![],
        yes_asks
            .iter()
            .map(|(p, s)| BookLevel::new(*p, *s))
            .collect(),
        vec![],
        vec![],
    )
}

fn kalshi_book(no_asks: &[(Decimal, Decimal)]) -> UnifiedOrderBook {
    UnifiedOrderBook::new(
        Venue::Kalshi,
        "KXBTC-100K",
        vec![],
        vec![],
        vec![],
        no_asks
            .iter()
            .map(|(p, s)| BookLevel::new(*p, *s))
            .collect(),
    )
}

#[test]
fn guaranteed_arb_from_divergent_midpoints() {
    // yes 0.45 here, 0.60 there: buy YES cheap, buy NO cheap.
    let opportunity = calculate_arbitrage(&pair(dec!(0.45), dec!(0.60)), &ArbConfig::default())
        .expect("guaranteed opportunity");

    assert_eq!(opportunity.strategy, Strategy::YesPolymarketNoKalshi);
    assert_eq!(opportunity.kind, OpportunityKind::Guaranteed);
    assert_eq!(opportunity.cost, dec!(0.85));
    assert_eq!(opportunity.profit_pct, dec!(15.00));
}

#[test]
fn strategy_cost_stays_under_one_for_any_positive_spread() {
    let quotes = [
        (dec!(0.30), dec!(0.40)),
        (dec!(0.62), dec!(0.55)),
        (dec!(0.05), dec!(0.95)),
        (dec!(0.49), dec!(0.51)),
    ];
    for (a, b) in quotes {
        if let Some(opportunity) = calculate_arbitrage(&pair(a, b), &ArbConfig::default()) {
            if opportunity.guaranteed_profit.is_some() {
                assert!(
                    opportunity.cost < Decimal::ONE,
                    "cost {} for quotes ({a}, {b})",
                    opportunity.cost
                );
            }
        }
    }
}

#[test]
fn liquidity_walk_consumes_min_depth_per_level() {
    let opportunity =
        calculate_arbitrage(&pair(dec!(0.45), dec!(0.60)), &ArbConfig::default()).unwrap();
    let poly = poly_book(&[(dec!(0.45), dec!(100)), (dec!(0.47), dec!(200))]);
    let kalshi = kalshi_book(&[(dec!(0.40), dec!(50)), (dec!(0.42), dec!(300))]);

    let analysis =
        LiquidityAnalyzer::new(Decimal::ZERO, Decimal::ZERO).analyze(&opportunity, &poly, &kalshi);

    // Lock-step walk: 50 @ 0.85, 50 @ 0.87, 200 @ 0.89; the Polymarket
    // ladder runs out first.
    assert_eq!(analysis.max_contracts, dec!(300));
    assert_eq!(analysis.max_investment, dec!(264.00));
    assert_eq!(analysis.max_profit, dec!(36.00));
    assert_eq!(analysis.limited_by, LiquidityLimit::PolymarketLiquidity);

    // Ladder totals reconcile.
    let contracts: Decimal = analysis.ladder.iter().map(|s| s.contracts).sum();
    let profit: Decimal = analysis
        .ladder
        .iter()
        .map(|s| s.contracts * s.profit_per_contract)
        .sum();
    assert_eq!(contracts, analysis.max_contracts);
    assert_eq!(profit, analysis.max_profit);

    // Cumulative columns are consistent with the running totals.
    let last = analysis.ladder.last().unwrap();
    assert_eq!(last.cumulative_contracts, analysis.max_contracts);
    assert_eq!(last.cumulative_profit, analysis.max_profit);
    assert_eq!(last.cumulative_cost, analysis.max_investment);
}

#[test]
fn closed_spread_reports_diagnostic_asks() {
    let opportunity =
        calculate_arbitrage(&pair(dec!(0.45), dec!(0.60)), &ArbConfig::default()).unwrap();
    let poly = poly_book(&[(dec!(0.55), dec!(100))]);
    let kalshi = kalshi_book(&[(dec!(0.50), dec!(100))]);

    let analysis =
        LiquidityAnalyzer::new(Decimal::ZERO, Decimal::ZERO).analyze(&opportunity, &poly, &kalshi);

    assert_eq!(analysis.max_contracts, Decimal::ZERO);
    assert_eq!(analysis.limited_by, LiquidityLimit::SpreadClosed);
    assert!(analysis.ladder.is_empty());

    let best = analysis.best_asks.expect("diagnostics");
    assert_eq!(best.polymarket_yes_ask, Some(dec!(0.55)));
    assert_eq!(best.kalshi_no_ask, Some(dec!(0.50)));
}

#[test]
fn avg_profit_is_profit_over_investment() {
    let opportunity =
        calculate_arbitrage(&pair(dec!(0.45), dec!(0.60)), &ArbConfig::default()).unwrap();
    let poly = poly_book(&[(dec!(0.45), dec!(100))]);
    let kalshi = kalshi_book(&[(dec!(0.40), dec!(100))]);

    let analysis =
        LiquidityAnalyzer::new(Decimal::ZERO, Decimal::ZERO).analyze(&opportunity, &poly, &kalshi);

    assert_eq!(analysis.max_contracts, dec!(100));
    // 100 contracts at 0.85 cost, 0.15 profit each.
    let expected = analysis.max_profit / analysis.max_investment * Decimal::ONE_HUNDRED;
    assert_eq!(analysis.avg_profit_pct, expected);
}
