//! Monetary types for price and size representation.

use rust_decimal::Decimal;

/// Contract price in dollars, always normalized to [0, 1].
pub type Price = Decimal;

/// Number of contracts at a level.
pub type Size = Decimal;
