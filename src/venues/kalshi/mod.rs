//! Kalshi REST and WebSocket clients.
//!
//! Prices arrive as integer cents in [0, 100] and are normalized to decimal
//! dollars at this boundary. Order-book responses quote resting bids for both
//! sides; the opposite side's asks are derived by complement.

pub mod client;
pub mod dto;
pub mod stream;

pub use client::KalshiClient;
pub use stream::{KalshiStream, KalshiStreamEvent};
