//! Market mapping catalog (`market-mappings.json`).
//!
//! Holds the static slug↔ticker catalog and the date-templated dynamic
//! entries. The [`MappingsStore`] is the process-scoped holder: `init` loads
//! at startup, `reload` swaps in a fresh copy, readers clone an `Arc`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};

/// How often a dynamic template produces a new market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Monthly,
    Quarterly,
    Yearly,
}

/// A fixed slug↔ticker mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct StaticMapping {
    pub name: String,
    pub category: String,
    /// Polymarket event slug (stored lowercase).
    pub polymarket: String,
    /// Kalshi market ticker (stored uppercase).
    pub kalshi: String,
    #[serde(default, rename = "kalshiSeries")]
    pub kalshi_series: Option<String>,
}

/// One side's pattern of a dynamic mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct PolymarketPattern {
    /// Slug pattern with `{year}`, `{month}`, `{day}` placeholders.
    pub pattern: String,
    #[serde(default)]
    pub example: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KalshiPattern {
    pub series: String,
    /// Ticker pattern with `{yy}`, `{MON}`, `{dd}` placeholders.
    pub pattern: String,
    #[serde(default)]
    pub example: Option<String>,
}

/// A date-templated mapping expanded per scan.
#[derive(Debug, Clone, Deserialize)]
pub struct DynamicMapping {
    pub name: String,
    pub category: String,
    pub frequency: Frequency,
    pub polymarket: PolymarketPattern,
    pub kalshi: KalshiPattern,
}

/// Parsed contents of `market-mappings.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketMappings {
    #[serde(default, rename = "static")]
    pub static_mappings: Vec<StaticMapping>,
    #[serde(default, rename = "dynamic")]
    pub dynamic_mappings: Vec<DynamicMapping>,
}

impl MarketMappings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read {}: {e}",
                path.as_ref().display()
            ))
        })?;
        let mut mappings: MarketMappings = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse market mappings: {e}")))?;

        // Catalog lookups are case-folded once at load.
        for m in &mut mappings.static_mappings {
            m.polymarket = m.polymarket.to_lowercase();
            m.kalshi = m.kalshi.to_uppercase();
        }

        Ok(mappings)
    }
}

/// Process-scoped mappings holder.
pub struct MappingsStore {
    path: PathBuf,
    current: RwLock<Arc<MarketMappings>>,
}

impl MappingsStore {
    pub fn init(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mappings = MarketMappings::load(&path)?;
        info!(
            static_count = mappings.static_mappings.len(),
            dynamic_count = mappings.dynamic_mappings.len(),
            "Loaded market mappings"
        );
        Ok(Self {
            path,
            current: RwLock::new(Arc::new(mappings)),
        })
    }

    /// A holder around already-built mappings, for tests.
    #[must_use]
    pub fn from_mappings(mappings: MarketMappings) -> Self {
        Self {
            path: PathBuf::new(),
            current: RwLock::new(Arc::new(mappings)),
        }
    }

    pub fn reload(&self) -> Result<()> {
        let mappings = MarketMappings::load(&self.path)?;
        *self.current.write() = Arc::new(mappings);
        Ok(())
    }

    #[must_use]
    pub fn get(&self) -> Arc<MarketMappings> {
        self.current.read().clone()
    }
}
