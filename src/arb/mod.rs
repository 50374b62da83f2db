//! Arbitrage pricing: cheapest-cost strategy selection and order-book
//! liquidity analysis.

pub mod calculator;
pub mod liquidity;

pub use calculator::{
    calculate_arbitrage, create_opportunities_from_all_pairs, find_arbitrage_opportunities,
    ArbConfig,
};
pub use liquidity::LiquidityAnalyzer;
