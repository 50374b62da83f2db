//! Polymarket market-data WebSocket.
//!
//! Connection lifecycle: connect, subscribe by token ids, then pull events
//! with [`PolymarketStream::next_event`]. Ping frames are answered inline,
//! parse failures are logged and skipped, and a close or transport error
//! surfaces as [`PolymarketStreamEvent::Disconnected`] so the owning worker
//! can apply its reconnect policy.

use std::collections::VecDeque;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};

use super::dto::{SubscribeMessage, WsEvent, WsPayload};
use crate::domain::{BookLevel, Price, Size, TokenId};
use crate::error::{Error, Result};

/// Which ladder a price change mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderSide {
    Bids,
    Asks,
}

#[derive(Debug)]
pub enum PolymarketStreamEvent {
    /// Authoritative snapshot for one token's ladders.
    Book {
        token: TokenId,
        bids: Vec<BookLevel>,
        asks: Vec<BookLevel>,
    },
    /// One level changed; a size of zero removes the level.
    PriceChange {
        token: TokenId,
        side: LadderSide,
        price: Price,
        size: Size,
    },
    Disconnected {
        reason: String,
    },
}

pub struct PolymarketStream {
    url: String,
    ws: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    pending: VecDeque<PolymarketStreamEvent>,
}

impl PolymarketStream {
    #[must_use]
    pub fn new(url: String) -> Self {
        Self {
            url,
            ws: None,
            pending: VecDeque::new(),
        }
    }

    pub async fn connect(&mut self) -> Result<()> {
        info!(url = %self.url, "Connecting to Polymarket WebSocket");
        let (ws, response) = connect_async(&self.url).await?;
        info!(status = %response.status(), "Polymarket WebSocket connected");
        self.ws = Some(ws);
        self.pending.clear();
        Ok(())
    }

    pub async fn subscribe(&mut self, token_ids: &[TokenId]) -> Result<()> {
        let ws = self
            .ws
            .as_mut()
            .ok_or_else(|| Error::Connection("Not connected".into()))?;

        let assets: Vec<String> = token_ids.iter().map(|t| t.as_str().to_string()).collect();
        let total = assets.len();
        let msg = SubscribeMessage::market(assets);
        let json = serde_json::to_string(&msg)?;

        // Log a truncated view of assets to avoid spam
        if total <= 5 {
            info!(assets = ?msg.assets_ids, "Subscribing to Polymarket tokens");
        } else {
            let preview: Vec<_> = msg.assets_ids.iter().take(5).collect();
            info!(assets = ?preview, more = total - 5, "Subscribing to Polymarket tokens");
        }
        ws.send(Message::Text(json)).await?;
        Ok(())
    }

    /// Next stream event, or `None` when the stream was never connected.
    pub async fn next_event(&mut self) -> Option<PolymarketStreamEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }

        loop {
            let ws = self.ws.as_mut()?;
            match ws.next().await? {
                Ok(Message::Text(text)) => {
                    trace!(bytes = text.len(), "Polymarket WS frame");
                    match serde_json::from_str::<WsPayload>(&text) {
                        Ok(payload) => {
                            self.enqueue(payload);
                            if let Some(event) = self.pending.pop_front() {
                                return Some(event);
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, bytes = text.len(), "Failed to parse Polymarket message");
                        }
                    }
                }
                Ok(Message::Ping(data)) => {
                    let ws = self.ws.as_mut()?;
                    if ws.send(Message::Pong(data)).await.is_err() {
                        return Some(PolymarketStreamEvent::Disconnected {
                            reason: "Failed to send pong".into(),
                        });
                    }
                }
                Ok(Message::Close(frame)) => {
                    info!(frame = ?frame, "Polymarket WebSocket closed by server");
                    self.ws = None;
                    return Some(PolymarketStreamEvent::Disconnected {
                        reason: frame.map(|f| f.reason.to_string()).unwrap_or_default(),
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "Polymarket WebSocket error");
                    self.ws = None;
                    return Some(PolymarketStreamEvent::Disconnected {
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    fn enqueue(&mut self, payload: WsPayload) {
        match payload {
            WsPayload::Batch(events) => {
                for event in events {
                    self.enqueue_event(event);
                }
            }
            WsPayload::Single(event) => self.enqueue_event(event),
            WsPayload::Unknown(value) => {
                debug!(frame = %value, "Ignoring unknown Polymarket frame");
            }
        }
    }

    fn enqueue_event(&mut self, event: WsEvent) {
        match event {
            WsEvent::Book(book) => {
                let bids = book.bids.iter().filter_map(|l| l.to_level()).collect();
                let asks = book.asks.iter().filter_map(|l| l.to_level()).collect();
                self.pending.push_back(PolymarketStreamEvent::Book {
                    token: TokenId::from(book.asset_id),
                    bids,
                    asks,
                });
            }
            WsEvent::PriceChange { changes } => {
                for change in changes {
                    let side = match change.side.as_str() {
                        "BUY" => LadderSide::Bids,
                        "SELL" => LadderSide::Asks,
                        other => {
                            debug!(side = other, "Unknown price-change side");
                            continue;
                        }
                    };
                    let (Ok(price), Ok(size)) = (change.price.parse(), change.size.parse()) else {
                        debug!(token = %change.asset_id, "Unparseable price change");
                        continue;
                    };
                    self.pending.push_back(PolymarketStreamEvent::PriceChange {
                        token: TokenId::from(change.asset_id),
                        side,
                        price,
                        size,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn stream() -> PolymarketStream {
        PolymarketStream::new("wss://test.invalid/ws".into())
    }

    #[test]
    fn book_payload_enqueues_snapshot() {
        let mut s = stream();
        let payload: WsPayload = serde_json::from_str(
            r#"[{
                "event_type": "book",
                "asset_id": "token-1",
                "bids": [{"price": "0.45", "size": "100"}],
                "asks": [{"price": "0.55", "size": "200"}]
            }]"#,
        )
        .unwrap();

        s.enqueue(payload);

        match s.pending.pop_front().unwrap() {
            PolymarketStreamEvent::Book { token, bids, asks } => {
                assert_eq!(token.as_str(), "token-1");
                assert_eq!(bids[0].price(), dec!(0.45));
                assert_eq!(asks[0].size(), dec!(200));
            }
            other => panic!("Expected book event, got {other:?}"),
        }
    }

    #[test]
    fn price_change_maps_sides() {
        let mut s = stream();
        let payload: WsPayload = serde_json::from_str(
            r#"{
                "event_type": "price_change",
                "changes": [
                    {"asset_id": "t1", "price": "0.46", "size": "50", "side": "BUY"},
                    {"asset_id": "t1", "price": "0.54", "size": "0", "side": "SELL"},
                    {"asset_id": "t1", "price": "0.50", "size": "10", "side": "HOLD"}
                ]
            }"#,
        )
        .unwrap();

        s.enqueue(payload);

        // Unknown side is skipped, so two events remain.
        assert_eq!(s.pending.len(), 2);
        match s.pending.pop_front().unwrap() {
            PolymarketStreamEvent::PriceChange { side, price, .. } => {
                assert_eq!(side, LadderSide::Bids);
                assert_eq!(price, dec!(0.46));
            }
            other => panic!("Expected price change, got {other:?}"),
        }
        match s.pending.pop_front().unwrap() {
            PolymarketStreamEvent::PriceChange { side, size, .. } => {
                assert_eq!(side, LadderSide::Asks);
                assert_eq!(size, dec!(0));
            }
            other => panic!("Expected price change, got {other:?}"),
        }
    }

    #[test]
    fn unknown_payload_enqueues_nothing() {
        let mut s = stream();
        let payload: WsPayload =
            serde_json::from_str(r#"{"type": "subscribed", "ok": true}"#).unwrap();
        s.enqueue(payload);
        assert!(s.pending.is_empty());
    }
}
