//! Polymarket REST and WebSocket clients.
//!
//! Two API surfaces:
//! - **Gamma API** for event discovery by slug, with JSON-string-encoded
//!   outcome metadata.
//! - **CLOB API** for per-token order books and the market data WebSocket.

pub mod client;
pub mod dto;
pub mod stream;

pub use client::PolymarketClient;
pub use stream::{PolymarketStream, PolymarketStreamEvent};
