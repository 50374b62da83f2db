use serde::{Deserialize, Serialize};

/// The two exchanges the scanner spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    /// Decimal-price, token-id keyed order books.
    Polymarket,
    /// Cent-price, ticker-keyed order books with complement-derived asks.
    Kalshi,
}

impl Venue {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Venue::Polymarket => "Polymarket",
            Venue::Kalshi => "Kalshi",
        }
    }
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
