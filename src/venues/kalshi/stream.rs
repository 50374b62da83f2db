//! Kalshi market-data WebSocket.
//!
//! Authenticated feed: the opaque token from configuration is attached as a
//! bearer header on the upgrade request. After subscribing, each market
//! delivers an `orderbook_snapshot` followed by `orderbook_delta` messages
//! carrying monotonically increasing `seq` numbers; gap detection is the
//! stream engine's job, this client only decodes frames.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};

use super::dto::{CentLevel, WsCommand, WsFrame, WsMessage};
use crate::domain::Ticker;
use crate::error::{Error, Result};

#[derive(Debug)]
pub enum KalshiStreamEvent {
    /// Full book for one market; replaces any prior state.
    Snapshot {
        ticker: Ticker,
        seq: u64,
        yes: Vec<CentLevel>,
        no: Vec<CentLevel>,
    },
    /// Signed size change at one cent level.
    Delta {
        ticker: Ticker,
        seq: u64,
        side: String,
        price_cents: u32,
        delta: i64,
    },
    /// Server rejected a subscription.
    SubscriptionError { detail: String },
    Disconnected { reason: String },
}

pub struct KalshiStream {
    url: String,
    token: String,
    ws: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    next_command_id: u64,
}

impl KalshiStream {
    #[must_use]
    pub fn new(url: String, token: String) -> Self {
        Self {
            url,
            token,
            ws: None,
            next_command_id: 1,
        }
    }

    pub async fn connect(&mut self) -> Result<()> {
        info!(url = %self.url, "Connecting to Kalshi WebSocket");

        let mut request = self
            .url
            .clone()
            .into_client_request()
            .map_err(Error::WebSocket)?;
        let auth = format!("Bearer {}", self.token)
            .parse()
            .map_err(|_| Error::Auth("Invalid Kalshi WS token".into()))?;
        request.headers_mut().insert("Authorization", auth);

        let (ws, response) = connect_async(request).await?;
        info!(status = %response.status(), "Kalshi WebSocket connected");
        self.ws = Some(ws);
        Ok(())
    }

    pub async fn subscribe(&mut self, tickers: &[Ticker]) -> Result<()> {
        let ws = self
            .ws
            .as_mut()
            .ok_or_else(|| Error::Connection("Not connected".into()))?;

        let names: Vec<String> = tickers.iter().map(|t| t.as_str().to_string()).collect();
        let total = names.len();
        let cmd = WsCommand::subscribe(self.next_command_id, names);
        self.next_command_id += 1;

        if total <= 5 {
            info!(tickers = ?cmd.params.market_tickers, "Subscribing to Kalshi markets");
        } else {
            let preview: Vec<_> = cmd.params.market_tickers.iter().take(5).collect();
            info!(tickers = ?preview, more = total - 5, "Subscribing to Kalshi markets");
        }

        ws.send(Message::Text(serde_json::to_string(&cmd)?)).await?;
        Ok(())
    }

    /// Next stream event, or `None` when the stream was never connected.
    pub async fn next_event(&mut self) -> Option<KalshiStreamEvent> {
        let ws = self.ws.as_mut()?;

        loop {
            match ws.next().await? {
                Ok(Message::Text(text)) => {
                    trace!(bytes = text.len(), "Kalshi WS frame");
                    match serde_json::from_str::<WsFrame>(&text) {
                        Ok(WsFrame::Known(msg)) => {
                            if let Some(event) = decode(msg) {
                                return Some(event);
                            }
                        }
                        Ok(WsFrame::Unknown(value)) => {
                            debug!(frame = %value, "Ignoring unknown Kalshi frame");
                        }
                        Err(e) => {
                            warn!(error = %e, bytes = text.len(), "Failed to parse Kalshi message");
                        }
                    }
                }
                Ok(Message::Ping(data)) => {
                    if ws.send(Message::Pong(data)).await.is_err() {
                        return Some(KalshiStreamEvent::Disconnected {
                            reason: "Failed to send pong".into(),
                        });
                    }
                }
                Ok(Message::Close(frame)) => {
                    info!(frame = ?frame, "Kalshi WebSocket closed by server");
                    self.ws = None;
                    return Some(KalshiStreamEvent::Disconnected {
                        reason: frame.map(|f| f.reason.to_string()).unwrap_or_default(),
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "Kalshi WebSocket error");
                    self.ws = None;
                    return Some(KalshiStreamEvent::Disconnected {
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}

fn decode(msg: WsMessage) -> Option<KalshiStreamEvent> {
    match msg {
        WsMessage::OrderbookSnapshot { seq, msg } => Some(KalshiStreamEvent::Snapshot {
            ticker: Ticker::from(msg.market_ticker),
            seq,
            yes: msg.yes,
            no: msg.no,
        }),
        WsMessage::OrderbookDelta { seq, msg } => Some(KalshiStreamEvent::Delta {
            ticker: Ticker::from(msg.market_ticker),
            seq,
            side: msg.side,
            price_cents: msg.price,
            delta: msg.delta,
        }),
        WsMessage::Subscribed { id } => {
            debug!(command_id = ?id, "Kalshi subscription confirmed");
            None
        }
        WsMessage::Error { msg } => Some(KalshiStreamEvent::SubscriptionError {
            detail: msg.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_decodes_to_event() {
        let msg: WsFrame = serde_json::from_str(
            r#"{
                "type": "orderbook_snapshot",
                "seq": 10,
                "msg": {"market_ticker": "KXTEST", "yes": [[40, 100]], "no": [[55, 200]]}
            }"#,
        )
        .unwrap();

        let WsFrame::Known(msg) = msg else {
            panic!("Expected known frame");
        };
        match decode(msg).unwrap() {
            KalshiStreamEvent::Snapshot { ticker, seq, yes, no } => {
                assert_eq!(ticker.as_str(), "KXTEST");
                assert_eq!(seq, 10);
                assert_eq!(yes, vec![(40, 100)]);
                assert_eq!(no, vec![(55, 200)]);
            }
            other => panic!("Expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn delta_decodes_to_event() {
        let msg: WsFrame = serde_json::from_str(
            r#"{
                "type": "orderbook_delta",
                "seq": 11,
                "msg": {"market_ticker": "KXTEST", "price": 40, "delta": -25, "side": "yes"}
            }"#,
        )
        .unwrap();

        let WsFrame::Known(msg) = msg else {
            panic!("Expected known frame");
        };
        match decode(msg).unwrap() {
            KalshiStreamEvent::Delta {
                seq,
                side,
                price_cents,
                delta,
                ..
            } => {
                assert_eq!(seq, 11);
                assert_eq!(side, "yes");
                assert_eq!(price_cents, 40);
                assert_eq!(delta, -25);
            }
            other => panic!("Expected delta, got {other:?}"),
        }
    }

    #[test]
    fn subscribed_confirmation_yields_no_event() {
        let msg = WsMessage::Subscribed { id: Some(1) };
        assert!(decode(msg).is_none());
    }
}
