//! # Bybit Client
//!
//! An async Rust client library for the Bybit v5 REST API and public
//! WebSocket streams.
//!
//! ## Features
//!
//! - Market data: paginated candles, funding rates, instruments, tickers
//! - Account and trading: orders, positions, wallet balance, position mode
//! - Rate limiting that follows the exchange's limit headers once seen
//! - Public streams with a latest-value cache for tickers and candles
//! - Financial precision with `rust_decimal`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bybit_api_client::rest::RestClient;
//! use bybit_api_client::types::{CandleInterval, Category};
//! use bybit_api_client::rest::market::HistoricalPricesRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RestClient::new();
//!     let now = client.get_server_time().await?;
//!     let request = HistoricalPricesRequest::new(
//!         Category::Linear,
//!         "BTCUSDT",
//!         CandleInterval::Hour1,
//!         now - 24 * 3_600_000,
//!         now,
//!     );
//!     let candles = client.get_historical_prices(&request).await?;
//!     println!("Fetched {} candles", candles.len());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod rate_limit;
pub mod rest;
pub mod types;
pub mod ws;

// Re-export commonly used types at crate root
pub use error::BybitError;
pub use types::common::{CandleInterval, Category, OrderType, Side};

/// Result type alias using BybitError
pub type Result<T> = std::result::Result<T, BybitError>;
