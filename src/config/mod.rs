//! Application configuration.
//!
//! A TOML file provides network endpoints, scanner tuning and file paths;
//! `dotenvy` supplies secrets (the Kalshi WS token). JSON mapping files are
//! loaded through the holder types in [`mappings`] and [`teams`].

pub mod mappings;
pub mod teams;

use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Polymarket Gamma API (event discovery).
    pub polymarket_api_url: String,
    /// Polymarket CLOB API (order books).
    pub polymarket_clob_url: String,
    pub polymarket_ws_url: String,
    pub kalshi_api_url: String,
    pub kalshi_ws_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Minimum midpoint divergence for a simple opportunity, in percent.
    pub min_spread_pct: Decimal,
    /// Minimum per-contract profit the liquidity walk keeps consuming at.
    pub min_profit_pct: Decimal,
    pub polymarket_fee_pct: Decimal,
    pub kalshi_fee_pct: Decimal,
    pub rate_limit_delay_ms: u64,
    /// How many days ahead dynamic templates are expanded.
    pub dynamic_scan_days: u32,
    /// Top-N opportunities by spread that get an order-book walk per tick.
    pub max_liquidity_analysis: usize,
    pub poll_interval_ms: u64,
    pub max_concurrent_fetches: usize,
    pub timeout_ms: u64,
    /// A tick must fetch at least this fraction of its pairs to publish.
    pub min_scan_success_ratio: f64,
    pub retry_max_attempts: u32,
    pub retry_base_backoff_ms: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            min_spread_pct: Decimal::TWO,
            min_profit_pct: Decimal::ONE,
            polymarket_fee_pct: Decimal::TWO,
            kalshi_fee_pct: Decimal::ONE,
            rate_limit_delay_ms: 150,
            dynamic_scan_days: 3,
            max_liquidity_analysis: 25,
            poll_interval_ms: 60_000,
            max_concurrent_fetches: 8,
            timeout_ms: 30_000,
            min_scan_success_ratio: 0.5,
            retry_max_attempts: 3,
            retry_base_backoff_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub debounce_ms: u64,
    pub reconnect_base_ms: u64,
    pub reconnect_cap_ms: u64,
    /// Channel capacity between venue workers and the aggregator.
    pub update_channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            reconnect_base_ms: 1_000,
            reconnect_cap_ms: 30_000,
            update_channel_capacity: 1_024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub mappings: String,
    pub teams: String,
    pub match_cache: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            mappings: "market-mappings.json".into(),
            teams: "teams.json".into(),
            match_cache: "match-cache.json".into(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("polymarket_api_url", &self.network.polymarket_api_url),
            ("polymarket_clob_url", &self.network.polymarket_clob_url),
            ("polymarket_ws_url", &self.network.polymarket_ws_url),
            ("kalshi_api_url", &self.network.kalshi_api_url),
            ("kalshi_ws_url", &self.network.kalshi_ws_url),
        ] {
            if value.is_empty() {
                return Err(Error::Config(format!("{field} cannot be empty")));
            }
            url::Url::parse(value)
                .map_err(|e| Error::Config(format!("{field} is not a valid URL: {e}")))?;
        }

        let pct_range = Decimal::ZERO..=Decimal::ONE_HUNDRED;
        for (field, value) in [
            ("min_spread_pct", self.scanner.min_spread_pct),
            ("min_profit_pct", self.scanner.min_profit_pct),
            ("polymarket_fee_pct", self.scanner.polymarket_fee_pct),
            ("kalshi_fee_pct", self.scanner.kalshi_fee_pct),
        ] {
            if !pct_range.contains(&value) {
                return Err(Error::Config(format!(
                    "{field} must be between 0 and 100, got {value}"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.scanner.min_scan_success_ratio) {
            return Err(Error::Config(format!(
                "min_scan_success_ratio must be between 0 and 1, got {}",
                self.scanner.min_scan_success_ratio
            )));
        }

        if self.scanner.max_concurrent_fetches == 0 {
            return Err(Error::Config(
                "max_concurrent_fetches must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Initialize the tracing subscriber from the logging section.
    pub fn init_logging(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.logging.level.clone()));

        if self.logging.format == "json" {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        } else {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const VALID: &str = r#"
[network]
polymarket_api_url = "https://gamma-api.polymarket.com"
polymarket_clob_url = "https://clob.polymarket.com"
polymarket_ws_url = "wss://ws-subscriptions-clob.polymarket.com/ws/market"
kalshi_api_url = "https://api.elections.kalshi.com/trade-api/v2"
kalshi_ws_url = "wss://api.elections.kalshi.com/trade-api/ws/v2"

[logging]
level = "info"
format = "pretty"
"#;

    #[test]
    fn valid_config_loads_with_defaults() {
        let file = write_config(VALID);
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.scanner.rate_limit_delay_ms, 150);
        assert_eq!(config.scanner.dynamic_scan_days, 3);
        assert_eq!(config.scanner.max_liquidity_analysis, 25);
        assert_eq!(config.stream.debounce_ms, 100);
        assert_eq!(config.paths.teams, "teams.json");
    }

    #[test]
    fn empty_url_is_rejected() {
        let toml = VALID.replace("https://clob.polymarket.com", "");
        let file = write_config(&toml);

        assert!(matches!(Config::load(file.path()), Err(Error::Config(_))));
    }

    #[test]
    fn out_of_range_fee_is_rejected() {
        let toml = format!("{VALID}\n[scanner]\npolymarket_fee_pct = 250.0\n");
        let file = write_config(&toml);

        assert!(matches!(Config::load(file.path()), Err(Error::Config(_))));
    }

    #[test]
    fn invalid_success_ratio_is_rejected() {
        let toml = format!("{VALID}\n[scanner]\nmin_scan_success_ratio = 1.5\n");
        let file = write_config(&toml);

        assert!(matches!(Config::load(file.path()), Err(Error::Config(_))));
    }
}
