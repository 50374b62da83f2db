//! Polymarket REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::dto::{BookResponse, GammaEvent};
use crate::domain::{BookKey, BookLevel, EventRef, MarketRef, TokenId, UnifiedOrderBook, Venue};
use crate::error::{Error, Result};
use crate::venues::MarketDataSource;

pub struct PolymarketClient {
    http: HttpClient,
    /// Gamma API base URL (event discovery).
    gamma_url: String,
    /// CLOB API base URL (order books).
    clob_url: String,
    retry_max_attempts: u32,
    retry_backoff_ms: u64,
}

impl PolymarketClient {
    #[must_use]
    pub fn new(gamma_url: String, clob_url: String, timeout_ms: u64) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self {
            http,
            gamma_url,
            clob_url,
            retry_max_attempts: 3,
            retry_backoff_ms: 100,
        }
    }

    /// GET with bounded retries. Timeouts and connect failures retry in
    /// place; 429 surfaces as [`Error::RateLimited`] so the caller's retry
    /// layer applies its own backoff.
    async fn get_with_retry<T>(&self, url: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut attempt = 0;
        let max_attempts = self.retry_max_attempts.max(1);

        loop {
            attempt += 1;
            let response = match self.http.get(url).send().await {
                Ok(response) => response,
                Err(err) => {
                    if attempt >= max_attempts || !should_retry(&err) {
                        return Err(err.into());
                    }
                    self.backoff(attempt, max_attempts, &err).await;
                    continue;
                }
            };

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                return Err(Error::RateLimited {
                    venue: "Polymarket",
                });
            }

            let response = response.error_for_status()?;

            match response.json::<T>().await {
                Ok(parsed) => return Ok(parsed),
                Err(err) => {
                    if attempt >= max_attempts || !should_retry(&err) {
                        return Err(err.into());
                    }
                    self.backoff(attempt, max_attempts, &err).await;
                }
            }
        }
    }

    async fn backoff(&self, attempt: u32, max_attempts: u32, err: &reqwest::Error) {
        warn!(attempt, max_attempts, error = %err, "HTTP request failed, retrying");
        if self.retry_backoff_ms > 0 {
            sleep(Duration::from_millis(self.retry_backoff_ms << (attempt - 1))).await;
        }
    }

    /// Fetch the event for a slug from the Gamma API.
    pub async fn get_event_by_slug(&self, slug: &str) -> Result<Option<GammaEvent>> {
        let url = format!("{}/events?slug={}", self.gamma_url, slug);
        debug!(url = %url, "Fetching Polymarket event");

        let mut events: Vec<GammaEvent> = self.get_with_retry(&url).await?;
        Ok(if events.is_empty() {
            None
        } else {
            Some(events.remove(0))
        })
    }

    /// Fetch one token's book; HTTP failures degrade to empty ladders.
    async fn get_token_book(&self, token: &TokenId) -> (Vec<BookLevel>, Vec<BookLevel>) {
        let url = format!("{}/book?token_id={}", self.clob_url, token.as_str());
        match self.get_with_retry::<BookResponse>(&url).await {
            Ok(response) => response.levels(),
            Err(err) => {
                warn!(token = %token, error = %err, "Book fetch failed, using empty book");
                (Vec::new(), Vec::new())
            }
        }
    }
}

fn should_retry(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

#[async_trait]
impl MarketDataSource for PolymarketClient {
    async fn fetch_event(&self, identifier: &str) -> Result<Option<(EventRef, Vec<MarketRef>)>> {
        Ok(self
            .get_event_by_slug(identifier)
            .await?
            .map(|event| event.to_refs()))
    }

    /// Compose the unified book from the YES and NO token endpoints.
    async fn fetch_order_book(&self, market_id: &str, key: &BookKey) -> Result<UnifiedOrderBook> {
        let BookKey::Tokens { yes, no } = key else {
            return Ok(UnifiedOrderBook::empty(Venue::Polymarket, market_id));
        };

        let (yes_bids, yes_asks) = self.get_token_book(yes).await;
        let (no_bids, no_asks) = self.get_token_book(no).await;

        Ok(UnifiedOrderBook::new(
            Venue::Polymarket,
            market_id,
            yes_bids,
            yes_asks,
            no_bids,
            no_asks,
        ))
    }

    fn venue(&self) -> Venue {
        Venue::Polymarket
    }
}
