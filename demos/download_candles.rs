//! Example: Downloading market history from Bybit.
//!
//! Fetches a day of hourly candles and a week of funding rates for a linear
//! perpetual, plus the instrument's trading filters.
//!
//! Run with: cargo run --example download_candles
//!
//! Set `RUST_LOG=bybit_api_client=debug` to see each request.

use bybit_api_client::rest::RestClient;
use bybit_api_client::rest::market::HistoricalPricesRequest;
use bybit_api_client::types::{CandleInterval, Category};
use tracing_subscriber::EnvFilter;

const SYMBOL: &str = "BTCUSDT";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = RestClient::new();

    println!("=== Server Time ===");
    let now = client.get_server_time().await?;
    println!("Server time (ms): {now}");

    println!("\n=== Instrument ({SYMBOL}) ===");
    match client.get_instrument(Category::Linear, SYMBOL).await? {
        Some(instrument) => println!(
            "tick size={}, qty step={}, min qty={}",
            instrument.price_filter.tick_size,
            instrument.lot_size_filter.step(),
            instrument.lot_size_filter.min_order_qty
        ),
        None => println!("{SYMBOL} not listed"),
    }

    println!("\n=== Hourly Candles (last 24h) ===");
    let interval = CandleInterval::Hour1;
    let to = now - now % interval.duration_ms();
    let from = to - 24 * interval.duration_ms();
    let request = HistoricalPricesRequest::new(Category::Linear, SYMBOL, interval, from, to);

    let candles = client
        .get_historical_prices_with(&request, |page| {
            println!("  received page of {} candles", page.len());
        })
        .await?;
    for candle in candles.iter().rev().take(5) {
        println!(
            "{}: O={} H={} L={} C={} V={}",
            candle.open_time, candle.open, candle.high, candle.low, candle.close, candle.volume
        );
    }
    println!("Total: {} candles", candles.len());

    println!("\n=== Funding Rates (last 7d) ===");
    let rates = client
        .get_funding_rates(Category::Linear, SYMBOL, now - 7 * 86_400_000, now, 200)
        .await?;
    for rate in rates.iter().rev().take(5) {
        println!("{}: {}", rate.funding_rate_timestamp, rate.funding_rate);
    }
    println!("Total: {} rates", rates.len());

    Ok(())
}
