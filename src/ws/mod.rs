//! Bybit v5 public WebSocket streams.
//!
//! A [`WebSocketClient`] multiplexes every subscribed topic onto one
//! connection driven by its own thread. [`StreamManager`] sits on top of it
//! and keeps the latest ticker and candle per symbol for blocking readers.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use bybit_api_client::types::CandleInterval;
//! use bybit_api_client::ws::StreamManager;
//!
//! fn main() -> Result<(), bybit_api_client::BybitError> {
//!     let manager = StreamManager::new();
//!     manager.subscribe_candlestick_stream("BTCUSDT", CandleInterval::Min1)?;
//!
//!     loop {
//!         match manager.read_event_candlestick("BTCUSDT", CandleInterval::Min1, Duration::from_secs(1)) {
//!             Some(candle) => println!("close {} confirmed {}", candle.close, candle.confirm),
//!             None => println!("no data yet"),
//!         }
//!     }
//! }
//! ```

mod client;
mod config;
pub mod messages;
mod session;
mod stream_manager;

pub use client::WebSocketClient;
pub use config::{WsConfig, WsConfigBuilder, endpoints};
pub use messages::{Event, EventCandlestick, EventTicker};
pub use session::{ConnectionState, DataCallback, Session};
pub use stream_manager::StreamManager;
