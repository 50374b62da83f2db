//! Kalshi wire types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{BookKey, BookLevel, EventRef, MarketRef, Ticker, UnifiedOrderBook, Venue};

/// Convert integer cents [0, 100] to decimal dollars.
#[must_use]
pub fn cents_to_dollars(cents: u32) -> Decimal {
    Decimal::from(cents) / Decimal::ONE_HUNDRED
}

#[derive(Debug, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub events: Vec<KalshiEvent>,
}

#[derive(Debug, Deserialize)]
pub struct KalshiEvent {
    pub event_ticker: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub markets: Vec<KalshiMarket>,
}

#[derive(Debug, Deserialize)]
pub struct KalshiMarket {
    pub ticker: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub yes_sub_title: Option<String>,
    /// Best bids and asks in integer cents.
    #[serde(default)]
    pub yes_bid: Option<u32>,
    #[serde(default)]
    pub yes_ask: Option<u32>,
    #[serde(default)]
    pub last_price: Option<u32>,
    /// Redundant dollar string; the cent fields are authoritative.
    #[serde(default)]
    pub last_price_dollars: Option<String>,
    #[serde(default)]
    pub close_time: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl KalshiMarket {
    /// Midpoint YES price in dollars: last trade when present, otherwise the
    /// bid/ask midpoint.
    #[must_use]
    pub fn yes_price(&self) -> Option<Decimal> {
        if let Some(last) = self.last_price.filter(|c| *c > 0) {
            return Some(cents_to_dollars(last));
        }
        match (self.yes_bid, self.yes_ask) {
            (Some(bid), Some(ask)) => Some(cents_to_dollars(bid + ask) / Decimal::TWO),
            (Some(bid), None) => Some(cents_to_dollars(bid)),
            (None, Some(ask)) => Some(cents_to_dollars(ask)),
            (None, None) => None,
        }
    }

    fn question(&self) -> String {
        self.yes_sub_title
            .clone()
            .or_else(|| self.title.clone())
            .unwrap_or_else(|| self.ticker.clone())
    }

    fn close_time_parsed(&self) -> Option<DateTime<Utc>> {
        self.close_time
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl KalshiEvent {
    /// Convert to domain references, dropping markets without prices.
    pub fn to_refs(&self) -> (EventRef, Vec<MarketRef>) {
        let event = EventRef {
            venue: Venue::Kalshi,
            id: self.event_ticker.clone(),
            identifier: self.event_ticker.clone(),
            title: self.title.clone().unwrap_or_else(|| self.event_ticker.clone()),
            category: self.category.clone(),
            image_url: None,
        };

        let markets = self
            .markets
            .iter()
            .filter(|m| m.status.as_deref().map_or(true, |s| s == "active" || s == "open"))
            .filter_map(|m| {
                let yes = m.yes_price()?;
                Some(MarketRef {
                    venue: Venue::Kalshi,
                    id: m.ticker.clone(),
                    question: m.question(),
                    event_id: self.event_ticker.clone(),
                    end_date: m.close_time_parsed(),
                    yes_price: Some(yes),
                    no_price: Some(Decimal::ONE - yes),
                    book_key: BookKey::Ticker(Ticker::from(m.ticker.clone())),
                })
            })
            .collect();

        (event, markets)
    }
}

// ---------------------------------------------------------------------------
// Order book
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct OrderbookResponse {
    pub orderbook: RawOrderbook,
}

/// Resting bids for each side, as `[price_dollars_str, quantity]` pairs.
#[derive(Debug, Default, Deserialize)]
pub struct RawOrderbook {
    #[serde(default)]
    pub yes_dollars: Vec<(String, Decimal)>,
    #[serde(default)]
    pub no_dollars: Vec<(String, Decimal)>,
}

impl RawOrderbook {
    /// Build the unified book. The venue quotes bids only; asks for each side
    /// are always derived as the complement of the other side's bids, never
    /// mixed with a direct interpretation.
    #[must_use]
    pub fn to_unified(&self, ticker: &str) -> UnifiedOrderBook {
        let yes_bids = parse_levels(&self.yes_dollars);
        let no_bids = parse_levels(&self.no_dollars);

        let yes_asks = complement(&no_bids);
        let no_asks = complement(&yes_bids);

        UnifiedOrderBook::new(Venue::Kalshi, ticker, yes_bids, yes_asks, no_bids, no_asks)
    }
}

fn parse_levels(raw: &[(String, Decimal)]) -> Vec<BookLevel> {
    raw.iter()
        .filter_map(|(price, qty)| Some(BookLevel::new(price.parse().ok()?, *qty)))
        .collect()
}

fn complement(bids: &[BookLevel]) -> Vec<BookLevel> {
    bids.iter()
        .map(|l| BookLevel::new(Decimal::ONE - l.price(), l.size()))
        .collect()
}

// ---------------------------------------------------------------------------
// WebSocket messages
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct WsCommand {
    pub id: u64,
    pub cmd: &'static str,
    pub params: WsCommandParams,
}

#[derive(Debug, Serialize)]
pub struct WsCommandParams {
    pub channels: Vec<&'static str>,
    pub market_tickers: Vec<String>,
}

impl WsCommand {
    #[must_use]
    pub fn subscribe(id: u64, tickers: Vec<String>) -> Self {
        Self {
            id,
            cmd: "subscribe",
            params: WsCommandParams {
                channels: vec!["orderbook_delta"],
                market_tickers: tickers,
            },
        }
    }
}

/// Cent-price levels in a snapshot: `[price_cents, quantity]`.
pub type CentLevel = (u32, u64);

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotMsg {
    pub market_ticker: String,
    #[serde(default)]
    pub yes: Vec<CentLevel>,
    #[serde(default)]
    pub no: Vec<CentLevel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeltaMsg {
    pub market_ticker: String,
    pub price: u32,
    pub delta: i64,
    pub side: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    OrderbookSnapshot { seq: u64, msg: SnapshotMsg },
    OrderbookDelta { seq: u64, msg: DeltaMsg },
    Subscribed { id: Option<u64> },
    Error { msg: serde_json::Value },
}

/// Top-level frame wrapper tolerating unknown message types.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WsFrame {
    Known(WsMessage),
    Unknown(serde_json::Value),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn cents_divide_by_one_hundred() {
        assert_eq!(cents_to_dollars(45), dec!(0.45));
        assert_eq!(cents_to_dollars(100), dec!(1));
        assert_eq!(cents_to_dollars(0), dec!(0));
    }

    #[test]
    fn market_prices_normalize_from_cents() {
        let json = r#"{
            "events": [{
                "event_ticker": "KXBTCMAX-25DEC",
                "title": "Bitcoin December maximum",
                "category": "Crypto",
                "markets": [{
                    "ticker": "KXBTCMAX-25DEC-100K",
                    "yes_sub_title": "Above $100,000",
                    "yes_bid": 40,
                    "yes_ask": 44,
                    "last_price": 42,
                    "last_price_dollars": "0.42",
                    "close_time": "2025-12-31T23:59:00Z",
                    "status": "active"
                }]
            }]
        }"#;

        let response: EventsResponse = serde_json::from_str(json).unwrap();
        let (event, markets) = response.events[0].to_refs();

        assert_eq!(event.identifier, "KXBTCMAX-25DEC");
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].yes_price, Some(dec!(0.42)));
        assert_eq!(markets[0].no_price, Some(dec!(0.58)));
        assert_eq!(
            markets[0].book_key,
            BookKey::Ticker(Ticker::from("KXBTCMAX-25DEC-100K"))
        );
    }

    #[test]
    fn midpoint_used_when_no_last_price() {
        let market = KalshiMarket {
            ticker: "T".into(),
            title: None,
            yes_sub_title: None,
            yes_bid: Some(40),
            yes_ask: Some(44),
            last_price: None,
            last_price_dollars: None,
            close_time: None,
            status: None,
        };
        assert_eq!(market.yes_price(), Some(dec!(0.42)));
    }

    #[test]
    fn orderbook_derives_asks_by_complement() {
        let json = r#"{
            "orderbook": {
                "yes_dollars": [["0.40", 100], ["0.38", 50]],
                "no_dollars": [["0.55", 200]]
            }
        }"#;

        let response: OrderbookResponse = serde_json::from_str(json).unwrap();
        let book = response.orderbook.to_unified("KXTEST");

        // YES asks come from NO bids: 1 - 0.55 = 0.45
        assert_eq!(book.yes_asks().len(), 1);
        assert_eq!(book.yes_asks()[0].price(), dec!(0.45));
        assert_eq!(book.yes_asks()[0].size(), dec!(200));

        // NO asks come from YES bids: 1 - 0.40 and 1 - 0.38
        assert_eq!(book.no_asks().len(), 2);
        assert_eq!(book.no_asks()[0].price(), dec!(0.60));
        assert_eq!(book.no_asks()[1].price(), dec!(0.62));

        // Complement invariant: yes_asks[i] = 1 - no_bids[i]
        for (ask, bid) in book.yes_asks().iter().zip(book.no_bids()) {
            assert_eq!(ask.price(), Decimal::ONE - bid.price());
        }
    }

    #[test]
    fn ws_snapshot_frame_parses() {
        let json = r#"{
            "type": "orderbook_snapshot",
            "seq": 10,
            "msg": {
                "market_ticker": "KXTEST",
                "yes": [[40, 100], [38, 50]],
                "no": [[55, 200]]
            }
        }"#;

        match serde_json::from_str::<WsFrame>(json).unwrap() {
            WsFrame::Known(WsMessage::OrderbookSnapshot { seq, msg }) => {
                assert_eq!(seq, 10);
                assert_eq!(msg.yes.len(), 2);
                assert_eq!(msg.no[0], (55, 200));
            }
            other => panic!("Expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn ws_delta_frame_parses() {
        let json = r#"{
            "type": "orderbook_delta",
            "seq": 11,
            "msg": {"market_ticker": "KXTEST", "price": 40, "delta": -25, "side": "yes"}
        }"#;

        match serde_json::from_str::<WsFrame>(json).unwrap() {
            WsFrame::Known(WsMessage::OrderbookDelta { seq, msg }) => {
                assert_eq!(seq, 11);
                assert_eq!(msg.delta, -25);
                assert_eq!(msg.side, "yes");
            }
            other => panic!("Expected delta, got {other:?}"),
        }
    }

    #[test]
    fn unknown_ws_frame_is_tolerated() {
        let json = r#"{"type": "heartbeat"}"#;
        assert!(matches!(
            serde_json::from_str::<WsFrame>(json).unwrap(),
            WsFrame::Unknown(_)
        ));
    }

    #[test]
    fn subscribe_command_shape() {
        let cmd = WsCommand::subscribe(7, vec!["KXA".into(), "KXB".into()]);
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains(r#""cmd":"subscribe""#));
        assert!(json.contains(r#""channels":["orderbook_delta"]"#));
        assert!(json.contains(r#""market_tickers":["KXA","KXB"]"#));
    }
}
