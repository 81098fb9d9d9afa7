//! Example: Reading live tickers and candles from the Bybit public stream.
//!
//! Subscribes to the ticker and one minute kline topics of a few symbols and
//! polls the latest values once per second.
//!
//! Run with: cargo run --example stream_tickers

use std::time::Duration;

use bybit_api_client::types::CandleInterval;
use bybit_api_client::ws::StreamManager;
use tracing_subscriber::EnvFilter;

const SYMBOLS: [&str; 2] = ["BTCUSDT", "ETHUSDT"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let manager = StreamManager::new();
    for symbol in SYMBOLS {
        manager.subscribe_ticker_stream(symbol)?;
        manager.subscribe_candlestick_stream(symbol, CandleInterval::Min1)?;
    }

    println!("Subscribed! Waiting for updates...\n");

    for _ in 0..30 {
        for symbol in SYMBOLS {
            match manager.read_event_ticker(symbol, Duration::from_secs(1)) {
                Some(ticker) => println!(
                    "[Ticker] {}: last={} bid={}@{} ask={}@{}",
                    ticker.symbol,
                    ticker.last_price,
                    ticker.bid1_price,
                    ticker.bid1_size,
                    ticker.ask1_price,
                    ticker.ask1_size
                ),
                None => println!("[Ticker] {symbol}: no data yet"),
            }

            if let Some(candle) =
                manager.read_event_candlestick(symbol, CandleInterval::Min1, Duration::ZERO)
            {
                println!(
                    "[Kline]  {}: start={} close={} volume={} confirmed={}",
                    symbol, candle.start, candle.close, candle.volume, candle.confirm
                );
            }
        }
        std::thread::sleep(Duration::from_secs(1));
    }

    println!("\nState: {:?}", manager.connection_state());
    Ok(())
}
