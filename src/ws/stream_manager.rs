//! Latest ticker and candle state fed by the public stream.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::BybitError;
use crate::types::CandleInterval;
use crate::ws::client::WebSocketClient;
use crate::ws::config::WsConfig;
use crate::ws::messages::{Event, EventCandlestick, EventTicker, topics};
use crate::ws::session::ConnectionState;

/// Interval between checks of a blocking read.
const POLL_QUANTUM: Duration = Duration::from_millis(3);

/// Per symbol state updated from stream events.
///
/// Tickers and candles sit behind separate locks.
#[derive(Debug, Default)]
pub(crate) struct LiveSnapshot {
    tickers: Mutex<HashMap<String, EventTicker>>,
    candles: Mutex<HashMap<String, HashMap<CandleInterval, EventCandlestick>>>,
}

impl LiveSnapshot {
    pub(crate) fn on_event(&self, event: &Event) {
        if event.topic.contains(topics::TICKERS) {
            self.on_ticker(event);
        } else if event.topic.contains(topics::KLINE) {
            self.on_candle(event);
        } else {
            tracing::debug!(topic = %event.topic, "Ignoring event on unhandled topic");
        }
    }

    fn on_ticker(&self, event: &Event) {
        let symbol = topics::symbol(&event.topic).to_string();
        let mut tickers = lock(&self.tickers);

        let result = match tickers.get_mut(&symbol) {
            Some(ticker) => ticker.apply(event),
            None => {
                let mut ticker = EventTicker::default();
                ticker.apply(event).map(|()| {
                    tickers.insert(symbol, ticker);
                })
            }
        };
        if let Err(e) = result {
            tracing::warn!(topic = %event.topic, error = %e, "Failed to decode ticker");
        }
    }

    fn on_candle(&self, event: &Event) {
        let Some(items) = event.data.as_array() else {
            tracing::warn!(topic = %event.topic, "Kline data is not an array");
            return;
        };
        if items.len() != 1 {
            tracing::error!(
                topic = %event.topic,
                count = items.len(),
                "Expected exactly one candle per kline event"
            );
        }
        let Some(item) = items.first() else {
            return;
        };

        let candle: EventCandlestick = match serde_json::from_value(item.clone()) {
            Ok(candle) => candle,
            Err(e) => {
                tracing::warn!(topic = %event.topic, error = %e, "Failed to decode candle");
                return;
            }
        };

        let symbol = topics::symbol(&event.topic).to_string();
        lock(&self.candles)
            .entry(symbol)
            .or_default()
            .insert(candle.interval, candle);
    }

    pub(crate) fn ticker(&self, symbol: &str) -> Option<EventTicker> {
        lock(&self.tickers).get(symbol).cloned()
    }

    pub(crate) fn candle(
        &self,
        symbol: &str,
        interval: CandleInterval,
    ) -> Option<EventCandlestick> {
        lock(&self.candles)
            .get(symbol)
            .and_then(|by_interval| by_interval.get(&interval))
            .cloned()
    }
}

/// Keeps the latest ticker and candle per symbol and serves blocking reads.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use bybit_api_client::ws::StreamManager;
///
/// fn main() -> Result<(), bybit_api_client::BybitError> {
///     let manager = StreamManager::new();
///     manager.subscribe_ticker_stream("BTCUSDT")?;
///
///     if let Some(ticker) = manager.read_event_ticker("BTCUSDT", Duration::from_secs(5)) {
///         println!("{} bid {} ask {}", ticker.symbol, ticker.bid1_price, ticker.ask1_price);
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct StreamManager {
    client: WebSocketClient,
    snapshot: Arc<LiveSnapshot>,
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamManager {
    /// Manager on the public linear stream.
    pub fn new() -> Self {
        Self::with_config(WsConfig::default())
    }

    pub fn with_config(config: WsConfig) -> Self {
        let snapshot = Arc::new(LiveSnapshot::default());
        let sink = snapshot.clone();
        let client = WebSocketClient::with_callback(config, move |event| sink.on_event(event));
        Self { client, snapshot }
    }

    pub fn client(&self) -> &WebSocketClient {
        &self.client
    }

    pub fn connection_state(&self) -> Option<ConnectionState> {
        self.client.connection_state()
    }

    /// Subscribe to `tickers.{symbol}` and start streaming.
    pub fn subscribe_ticker_stream(&self, symbol: &str) -> Result<(), BybitError> {
        self.subscribe(&topics::ticker(symbol))
    }

    /// Subscribe to `kline.{interval}.{symbol}` and start streaming.
    pub fn subscribe_candlestick_stream(
        &self,
        symbol: &str,
        interval: CandleInterval,
    ) -> Result<(), BybitError> {
        self.subscribe(&topics::kline(symbol, interval))
    }

    fn subscribe(&self, filter: &str) -> Result<(), BybitError> {
        if !self.client.is_subscribed(filter) {
            tracing::info!(filter, "Subscribing");
            self.client.subscribe(filter)?;
        }
        self.client.run()
    }

    /// Latest ticker of `symbol`, waiting up to `timeout` for the first one.
    ///
    /// A zero timeout checks once.
    pub fn read_event_ticker(&self, symbol: &str, timeout: Duration) -> Option<EventTicker> {
        poll(timeout, || self.snapshot.ticker(symbol))
    }

    /// Latest candle of `symbol` at `interval`, waiting up to `timeout`.
    ///
    /// A zero timeout checks once.
    pub fn read_event_candlestick(
        &self,
        symbol: &str,
        interval: CandleInterval,
        timeout: Duration,
    ) -> Option<EventCandlestick> {
        poll(timeout, || self.snapshot.candle(symbol, interval))
    }
}

fn poll<T>(timeout: Duration, mut read: impl FnMut() -> Option<T>) -> Option<T> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = read() {
            return Some(value);
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        std::thread::sleep(POLL_QUANTUM.min(deadline - now));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn event(value: serde_json::Value) -> Event {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_ticker_event_updates_snapshot() {
        let snapshot = LiveSnapshot::default();
        snapshot.on_event(&event(json!({
            "topic": "tickers.BTCUSDT",
            "type": "snapshot",
            "ts": 1,
            "data": {"symbol": "BTCUSDT", "lastPrice": "100.5", "bid1Price": "100.0"}
        })));
        snapshot.on_event(&event(json!({
            "topic": "tickers.BTCUSDT",
            "type": "delta",
            "ts": 2,
            "data": {"symbol": "BTCUSDT", "bid1Price": "100.25"}
        })));

        let ticker = snapshot.ticker("BTCUSDT").unwrap();
        assert_eq!(ticker.last_price, Decimal::new(1005, 1));
        assert_eq!(ticker.bid1_price, Decimal::new(10025, 2));
        assert!(snapshot.ticker("ETHUSDT").is_none());
    }

    #[test]
    fn test_candle_event_keyed_by_interval() {
        let snapshot = LiveSnapshot::default();
        let candle = |interval: &str, close: &str| {
            json!({
                "start": 1672324800000i64,
                "end": 1672325099999i64,
                "interval": interval,
                "open": "1", "high": "2", "low": "0.5", "close": close,
                "volume": "10", "turnover": "10",
                "confirm": false,
                "timestamp": 1672324988882i64
            })
        };

        snapshot.on_event(&event(json!({
            "topic": "kline.5.BTCUSDT", "type": "snapshot", "ts": 1,
            "data": [candle("5", "1.5")]
        })));
        snapshot.on_event(&event(json!({
            "topic": "kline.1.BTCUSDT", "type": "snapshot", "ts": 1,
            "data": [candle("1", "1.7"), candle("1", "1.9")]
        })));

        let five = snapshot.candle("BTCUSDT", CandleInterval::Min5).unwrap();
        assert_eq!(five.close, Decimal::new(15, 1));
        let one = snapshot.candle("BTCUSDT", CandleInterval::Min1).unwrap();
        assert_eq!(one.close, Decimal::new(17, 1));
        assert!(snapshot.candle("BTCUSDT", CandleInterval::Hour1).is_none());
    }

    #[test]
    fn test_malformed_candle_is_skipped() {
        let snapshot = LiveSnapshot::default();
        snapshot.on_event(&event(json!({
            "topic": "kline.1.BTCUSDT", "type": "snapshot", "ts": 1,
            "data": {"not": "an array"}
        })));
        snapshot.on_event(&event(json!({
            "topic": "kline.1.BTCUSDT", "type": "snapshot", "ts": 1,
            "data": []
        })));
        assert!(snapshot.candle("BTCUSDT", CandleInterval::Min1).is_none());
    }

    #[test]
    fn test_undecodable_first_ticker_is_not_stored() {
        let snapshot = LiveSnapshot::default();
        snapshot.on_event(&event(json!({
            "topic": "tickers.BTCUSDT", "type": "snapshot", "ts": 1,
            "data": "garbage"
        })));
        assert!(snapshot.ticker("BTCUSDT").is_none());

        snapshot.on_event(&event(json!({
            "topic": "tickers.BTCUSDT", "type": "snapshot", "ts": 2,
            "data": {"symbol": "BTCUSDT", "lastPrice": "100"}
        })));
        snapshot.on_event(&event(json!({
            "topic": "tickers.BTCUSDT", "type": "delta", "ts": 3,
            "data": [1, 2, 3]
        })));
        let ticker = snapshot.ticker("BTCUSDT").unwrap();
        assert_eq!(ticker.symbol, "BTCUSDT");
        assert_eq!(ticker.last_price, Decimal::new(100, 0));
    }

    #[test]
    fn test_zero_timeout_checks_once() {
        let manager = StreamManager::new();
        let started = Instant::now();
        assert!(manager.read_event_ticker("BTCUSDT", Duration::ZERO).is_none());
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_bounded_read_waits_for_timeout() {
        let manager = StreamManager::new();
        let started = Instant::now();
        let read = manager.read_event_candlestick(
            "BTCUSDT",
            CandleInterval::Min1,
            Duration::from_millis(100),
        );
        assert!(read.is_none());
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_read_returns_value_arriving_concurrently() {
        let manager = StreamManager::new();
        let snapshot = manager.snapshot.clone();
        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            snapshot.on_event(&event(json!({
                "topic": "tickers.ETHUSDT",
                "type": "snapshot",
                "ts": 1,
                "data": {"symbol": "ETHUSDT", "lastPrice": "2000"}
            })));
        });

        let ticker = manager.read_event_ticker("ETHUSDT", Duration::from_secs(2));
        writer.join().unwrap();
        assert_eq!(ticker.unwrap().last_price, Decimal::new(2000, 0));
    }
}
