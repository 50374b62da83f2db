//! Polymarket wire types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{BookKey, BookLevel, EventRef, MarketRef, TokenId, Venue};

/// Event from the Gamma API (`/events?slug=`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaEvent {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub markets: Vec<GammaMarket>,
}

/// Market embedded in a Gamma event.
///
/// `outcomes`, `outcome_prices` and `clob_token_ids` arrive as JSON-encoded
/// strings and are unpacked by the accessor methods, which log and skip
/// malformed content.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaMarket {
    pub id: String,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub outcomes: Option<String>,
    #[serde(default)]
    pub outcome_prices: Option<String>,
    #[serde(default)]
    pub clob_token_ids: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub closed: bool,
}

impl GammaMarket {
    /// Parse the JSON-encoded CLOB token IDs.
    pub fn token_ids(&self) -> Vec<String> {
        self.parse_json_list(self.clob_token_ids.as_deref(), "clobTokenIds")
    }

    /// Parse the JSON-encoded outcome names.
    pub fn outcome_names(&self) -> Vec<String> {
        self.parse_json_list(self.outcomes.as_deref(), "outcomes")
    }

    /// Parse the JSON-encoded outcome prices.
    pub fn prices(&self) -> Vec<Decimal> {
        self.parse_json_list(self.outcome_prices.as_deref(), "outcomePrices")
            .iter()
            .filter_map(|p| p.parse().ok())
            .collect()
    }

    fn parse_json_list(&self, raw: Option<&str>, field: &'static str) -> Vec<String> {
        raw.and_then(|s| {
            serde_json::from_str::<Vec<String>>(s)
                .map_err(|e| {
                    debug!(error = %e, raw = %s, market_id = %self.id, field, "Failed to parse JSON-encoded field");
                })
                .ok()
        })
        .unwrap_or_default()
    }

    fn end_date_parsed(&self) -> Option<DateTime<Utc>> {
        self.end_date
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl GammaEvent {
    /// Convert to domain references, dropping markets that are closed or not
    /// cleanly binary.
    pub fn to_refs(&self) -> (EventRef, Vec<MarketRef>) {
        let event = EventRef {
            venue: Venue::Polymarket,
            id: self.id.clone(),
            identifier: self.slug.clone(),
            title: self.title.clone(),
            category: self.category.clone(),
            image_url: self.image.clone(),
        };

        let markets = self
            .markets
            .iter()
            .filter(|m| m.active && !m.closed)
            .filter_map(|m| {
                let tokens = m.token_ids();
                let prices = m.prices();
                if tokens.len() != 2 {
                    debug!(market_id = %m.id, tokens = tokens.len(), "Skipping non-binary market");
                    return None;
                }
                Some(MarketRef {
                    venue: Venue::Polymarket,
                    id: m.id.clone(),
                    question: m.question.clone().unwrap_or_default(),
                    event_id: self.id.clone(),
                    end_date: m.end_date_parsed(),
                    yes_price: prices.first().copied(),
                    no_price: prices.get(1).copied(),
                    book_key: BookKey::Tokens {
                        yes: TokenId::from(tokens[0].clone()),
                        no: TokenId::from(tokens[1].clone()),
                    },
                })
            })
            .collect();

        (event, markets)
    }
}

/// One side of the CLOB book response (`/book?token_id=`).
#[derive(Debug, Clone, Deserialize)]
pub struct RawBookLevel {
    pub price: String,
    pub size: String,
}

impl RawBookLevel {
    /// Parse into a domain level; unparseable entries drop to `None`.
    pub fn to_level(&self) -> Option<BookLevel> {
        Some(BookLevel::new(
            self.price.parse().ok()?,
            self.size.parse().ok()?,
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BookResponse {
    #[serde(default)]
    pub bids: Vec<RawBookLevel>,
    #[serde(default)]
    pub asks: Vec<RawBookLevel>,
}

impl BookResponse {
    pub fn levels(&self) -> (Vec<BookLevel>, Vec<BookLevel>) {
        (
            self.bids.iter().filter_map(RawBookLevel::to_level).collect(),
            self.asks.iter().filter_map(RawBookLevel::to_level).collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// WebSocket messages
// ---------------------------------------------------------------------------

/// Subscription command for the market data channel.
#[derive(Debug, Serialize)]
pub struct SubscribeMessage {
    pub assets_ids: Vec<String>,
    #[serde(rename = "type")]
    pub channel: &'static str,
}

impl SubscribeMessage {
    #[must_use]
    pub fn market(assets_ids: Vec<String>) -> Self {
        Self {
            assets_ids,
            channel: "market",
        }
    }
}

/// A full-book event on the WS feed.
#[derive(Debug, Clone, Deserialize)]
pub struct WsBookMessage {
    pub asset_id: String,
    #[serde(default)]
    pub bids: Vec<RawBookLevel>,
    #[serde(default)]
    pub asks: Vec<RawBookLevel>,
}

/// A single price-level change.
#[derive(Debug, Clone, Deserialize)]
pub struct WsPriceChange {
    pub asset_id: String,
    pub price: String,
    pub size: String,
    /// `BUY` mutates the bid ladder, `SELL` the ask ladder.
    pub side: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum WsEvent {
    Book(WsBookMessage),
    PriceChange { changes: Vec<WsPriceChange> },
}

/// Top-level WS frame: events arrive singly or batched in an array, and
/// unknown frames (confirmations, heartbeats) must not kill the stream.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WsPayload {
    Batch(Vec<WsEvent>),
    Single(WsEvent),
    Unknown(serde_json::Value),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn gamma_event_unpacks_json_encoded_fields() {
        let json = r#"{
            "id": "ev-1",
            "slug": "what-price-will-bitcoin-hit-in-december",
            "title": "What price will Bitcoin hit in December?",
            "category": "Crypto",
            "markets": [{
                "id": "mk-1",
                "question": "Will Bitcoin hit $100,000?",
                "endDate": "2025-12-31T23:59:00Z",
                "outcomes": "[\"Yes\", \"No\"]",
                "outcomePrices": "[\"0.45\", \"0.55\"]",
                "clobTokenIds": "[\"token-yes\", \"token-no\"]",
                "active": true,
                "closed": false
            }]
        }"#;

        let event: GammaEvent = serde_json::from_str(json).unwrap();
        let (event_ref, markets) = event.to_refs();

        assert_eq!(event_ref.identifier, "what-price-will-bitcoin-hit-in-december");
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].yes_price, Some(dec!(0.45)));
        assert_eq!(markets[0].no_price, Some(dec!(0.55)));
        assert_eq!(
            markets[0].book_key,
            BookKey::Tokens {
                yes: TokenId::from("token-yes"),
                no: TokenId::from("token-no"),
            }
        );
        assert!(markets[0].end_date.is_some());
    }

    #[test]
    fn malformed_json_fields_yield_no_markets() {
        let json = r#"{
            "id": "ev-2",
            "slug": "broken",
            "title": "Broken",
            "markets": [{
                "id": "mk-2",
                "question": "Q?",
                "clobTokenIds": "not-json",
                "active": true,
                "closed": false
            }]
        }"#;

        let event: GammaEvent = serde_json::from_str(json).unwrap();
        let (_, markets) = event.to_refs();
        assert!(markets.is_empty());
    }

    #[test]
    fn closed_markets_are_dropped() {
        let json = r#"{
            "id": "ev-3",
            "slug": "closed",
            "title": "Closed",
            "markets": [{
                "id": "mk-3",
                "clobTokenIds": "[\"a\", \"b\"]",
                "active": true,
                "closed": true
            }]
        }"#;

        let event: GammaEvent = serde_json::from_str(json).unwrap();
        let (_, markets) = event.to_refs();
        assert!(markets.is_empty());
    }

    #[test]
    fn book_response_parses_string_levels() {
        let json = r#"{
            "bids": [{"price": "0.45", "size": "100"}, {"price": "bad", "size": "1"}],
            "asks": [{"price": "0.55", "size": "200"}]
        }"#;

        let response: BookResponse = serde_json::from_str(json).unwrap();
        let (bids, asks) = response.levels();

        assert_eq!(bids.len(), 1);
        assert_eq!(bids[0].price(), dec!(0.45));
        assert_eq!(asks.len(), 1);
        assert_eq!(asks[0].size(), dec!(200));
    }

    #[test]
    fn ws_payload_parses_book_array() {
        let json = r#"[{
            "event_type": "book",
            "asset_id": "token-1",
            "bids": [{"price": "0.45", "size": "100"}],
            "asks": []
        }]"#;

        match serde_json::from_str::<WsPayload>(json).unwrap() {
            WsPayload::Batch(events) => match &events[0] {
                WsEvent::Book(book) => assert_eq!(book.asset_id, "token-1"),
                other => panic!("Expected book event, got {other:?}"),
            },
            other => panic!("Expected batch, got {other:?}"),
        }
    }

    #[test]
    fn ws_payload_parses_price_change() {
        let json = r#"{
            "event_type": "price_change",
            "changes": [
                {"asset_id": "token-1", "price": "0.46", "size": "50", "side": "BUY"}
            ]
        }"#;

        match serde_json::from_str::<WsPayload>(json).unwrap() {
            WsPayload::Single(WsEvent::PriceChange { changes }) => {
                assert_eq!(changes.len(), 1);
                assert_eq!(changes[0].side, "BUY");
            }
            other => panic!("Expected price change, got {other:?}"),
        }
    }

    #[test]
    fn unknown_ws_frames_do_not_fail() {
        let json = r#"{"type": "heartbeat", "timestamp": 123}"#;
        assert!(matches!(
            serde_json::from_str::<WsPayload>(json).unwrap(),
            WsPayload::Unknown(_)
        ));
    }

    #[test]
    fn subscribe_message_shape() {
        let msg = SubscribeMessage::market(vec!["t1".into(), "t2".into()]);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""assets_ids":["t1","t2"]"#));
        assert!(json.contains(r#""type":"market""#));
    }
}
