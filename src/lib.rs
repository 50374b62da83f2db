//! Spreadhawk - cross-venue prediction market arbitrage scanner.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── domain/     # Pure domain types (books, pairs, opportunities)
//! ├── matching/   # Text similarity, blocking, fuzzy and market matching
//! ├── resolver/   # Static catalog, date templates, game synthesis
//! ├── venues/     # Polymarket and Kalshi REST/WS clients
//! ├── arb/        # Calculator and liquidity walker
//! ├── scanner/    # Batch orchestration and snapshot cache
//! └── stream/     # Real-time engine: book state, aggregator, reconnect
//! ```

pub mod arb;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod matching;
pub mod resolver;
pub mod scanner;
pub mod stream;
pub mod venues;
