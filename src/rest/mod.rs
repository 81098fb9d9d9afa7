//! Bybit v5 REST API client.
//!
//! [`RestClient`] covers the public market endpoints in [`market`] and the
//! signed trading and account endpoints in [`account`]. Every request is
//! paced by a shared [`RateLimiter`](crate::rate_limit::RateLimiter).
//!
//! ```rust,no_run
//! use bybit_api_client::rest::RestClient;
//! use bybit_api_client::types::Category;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bybit_api_client::BybitError> {
//!     let client = RestClient::builder()
//!         .base_url(bybit_api_client::rest::BYBIT_TESTNET_URL)
//!         .build();
//!     let tickers = client.get_tickers(Category::Linear, Some("BTCUSDT")).await?;
//!     println!("{:?}", tickers.first().map(|t| t.last_price));
//!     Ok(())
//! }
//! ```

pub mod account;
mod client;
mod endpoints;
pub mod market;
pub mod transport;

pub use client::{RestClient, RestClientBuilder};
pub use endpoints::*;
