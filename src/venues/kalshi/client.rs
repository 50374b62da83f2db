//! Kalshi REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use tracing::{debug, warn};

use super::dto::{EventsResponse, KalshiEvent, OrderbookResponse};
use crate::domain::{BookKey, EventRef, MarketRef, UnifiedOrderBook, Venue};
use crate::error::{Error, Result};
use crate::venues::MarketDataSource;

pub struct KalshiClient {
    http: HttpClient,
    base_url: String,
}

impl KalshiClient {
    #[must_use]
    pub fn new(base_url: String, timeout_ms: u64) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self { http, base_url }
    }

    /// GET with 429 surfaced as [`Error::RateLimited`] for the caller's
    /// retry layer; other failures map through normally.
    async fn get<T>(&self, url: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.http.get(url).send().await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited { venue: "Kalshi" });
        }

        let response = response.error_for_status()?;
        Ok(response.json::<T>().await?)
    }

    /// Fetch open events for a series ticker.
    pub async fn get_events_by_series(&self, series: &str) -> Result<Vec<KalshiEvent>> {
        let url = format!(
            "{}/events?series_ticker={}&status=open&limit=100",
            self.base_url, series
        );
        debug!(url = %url, "Fetching Kalshi events");

        let response: EventsResponse = self.get(&url).await?;
        Ok(response.events)
    }

    /// Find the event matching a market or event ticker.
    ///
    /// The series is the ticker's first dash-separated segment; the event is
    /// matched by exact event ticker or by market-ticker prefix.
    pub async fn get_event_by_ticker(&self, ticker: &str) -> Result<Option<KalshiEvent>> {
        let ticker = ticker.to_uppercase();
        let series = ticker.split('-').next().unwrap_or(&ticker);
        let events = self.get_events_by_series(series).await?;

        Ok(events.into_iter().find(|e| {
            e.event_ticker.eq_ignore_ascii_case(&ticker)
                || e.markets
                    .iter()
                    .any(|m| m.ticker.to_uppercase().starts_with(&ticker))
        }))
    }
}

#[async_trait]
impl MarketDataSource for KalshiClient {
    async fn fetch_event(&self, identifier: &str) -> Result<Option<(EventRef, Vec<MarketRef>)>> {
        Ok(self
            .get_event_by_ticker(identifier)
            .await?
            .map(|event| event.to_refs()))
    }

    async fn fetch_series(&self, identifier: &str) -> Result<Vec<(EventRef, Vec<MarketRef>)>> {
        let events = self.get_events_by_series(&identifier.to_uppercase()).await?;
        Ok(events.iter().map(KalshiEvent::to_refs).collect())
    }

    /// Fetch a ticker's book. Transport failures other than 429 degrade to an
    /// empty book; 429 propagates for retry.
    async fn fetch_order_book(&self, market_id: &str, key: &BookKey) -> Result<UnifiedOrderBook> {
        let BookKey::Ticker(ticker) = key else {
            return Ok(UnifiedOrderBook::empty(Venue::Kalshi, market_id));
        };

        let url = format!("{}/markets/{}/orderbook", self.base_url, ticker.as_str());
        match self.get::<OrderbookResponse>(&url).await {
            Ok(response) => Ok(response.orderbook.to_unified(market_id)),
            Err(Error::RateLimited { venue }) => Err(Error::RateLimited { venue }),
            Err(err) => {
                warn!(ticker = %ticker, error = %err, "Book fetch failed, using empty book");
                Ok(UnifiedOrderBook::empty(Venue::Kalshi, market_id))
            }
        }
    }

    fn venue(&self) -> Venue {
        Venue::Kalshi
    }
}
