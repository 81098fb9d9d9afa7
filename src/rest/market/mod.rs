//! Market data endpoints (no authentication required).
//!
//! Kline and funding rate history are served newest first in bounded pages;
//! the helpers here walk those pages and return complete ascending series.

mod types;

pub use types::*;

use std::collections::HashMap;
use std::sync::MutexGuard;

use crate::error::BybitError;
use crate::rest::RestClient;
use crate::rest::endpoints::market;
use crate::types::{CandleInterval, Category};

impl RestClient {
    /// Fetch one page of klines starting at `request.start`, newest first.
    pub async fn get_candles(&self, request: &KlineRequest) -> Result<Vec<Candle>, BybitError> {
        let result: CandlesResult = self.public_get(market::KLINE, request).await?;
        Ok(result.list)
    }

    /// Download every candle with open time in `[from, to]`, oldest first.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use bybit_api_client::rest::RestClient;
    /// use bybit_api_client::rest::market::HistoricalPricesRequest;
    /// use bybit_api_client::types::{CandleInterval, Category};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let client = RestClient::new();
    ///     let request = HistoricalPricesRequest::new(
    ///         Category::Linear,
    ///         "BTCUSDT",
    ///         CandleInterval::Min1,
    ///         1_700_000_000_000,
    ///         1_700_003_600_000,
    ///     );
    ///     let candles = client.get_historical_prices(&request).await?;
    ///     println!("{} candles", candles.len());
    ///     Ok(())
    /// }
    /// ```
    pub async fn get_historical_prices(
        &self,
        request: &HistoricalPricesRequest,
    ) -> Result<Vec<Candle>, BybitError> {
        self.get_historical_prices_with(request, |_| {}).await
    }

    /// Like [`get_historical_prices`](Self::get_historical_prices), handing
    /// each page to `on_page` as soon as it has been accepted.
    ///
    /// Fails with [`BybitError::InvalidResponse`] when the exchange returns
    /// out of order candles or leaves a gap inside the window.
    pub async fn get_historical_prices_with<F>(
        &self,
        request: &HistoricalPricesRequest,
        mut on_page: F,
    ) -> Result<Vec<Candle>, BybitError>
    where
        F: FnMut(&[Candle]),
    {
        let step = request.interval.duration_ms();
        let to = request.to;
        let mut from = request.from;
        let mut result: Vec<Candle> = Vec::new();

        while from <= to {
            let mut page = self
                .get_candles(&KlineRequest {
                    category: request.category,
                    symbol: request.symbol.clone(),
                    interval: request.interval,
                    start: from,
                    limit: request.limit,
                })
                .await?;

            page.reverse();
            page.retain(|candle| candle.open_time >= from);

            // A candle opening right after `to` may still be forming.
            if page
                .first()
                .is_some_and(|oldest| oldest.open_time > to && oldest.open_time <= to + step)
            {
                page.remove(0);
            }

            let Some(newest) = page.last().map(|candle| candle.open_time) else {
                break;
            };

            let reached_end = newest > to;
            if reached_end {
                page.retain(|candle| candle.open_time <= to);
            }

            if !page.is_empty() {
                check_continuity(result.last(), &page, request.interval, &request.symbol)?;
                on_page(&page);
                result.extend(page);
            }

            if reached_end {
                break;
            }
            from = newest + step;
        }

        tracing::debug!(
            symbol = %request.symbol,
            interval = %request.interval,
            count = result.len(),
            "Downloaded candles"
        );
        Ok(result)
    }

    /// Fetch one page of funding rates inside `[start_time, end_time]`, newest first.
    pub async fn get_funding_rate_page(
        &self,
        request: &FundingHistoryRequest,
    ) -> Result<Vec<FundingRate>, BybitError> {
        let result: FundingRatesResult = self.public_get(market::FUNDING_HISTORY, request).await?;
        Ok(result.list)
    }

    /// Download every funding rate settled in `[start_time, end_time]`, oldest first.
    ///
    /// Pages are requested backwards from `end_time`.
    pub async fn get_funding_rates(
        &self,
        category: Category,
        symbol: &str,
        start_time: i64,
        end_time: i64,
        limit: u32,
    ) -> Result<Vec<FundingRate>, BybitError> {
        let mut end_time = end_time;
        let mut result: Vec<FundingRate> = Vec::new();

        while start_time < end_time {
            let page = self
                .get_funding_rate_page(&FundingHistoryRequest {
                    category,
                    symbol: symbol.to_string(),
                    start_time,
                    end_time,
                    limit,
                })
                .await?;

            let Some(oldest) = page.iter().map(|rate| rate.funding_rate_timestamp).min() else {
                break;
            };

            result.extend(page);

            if oldest > end_time {
                break;
            }
            end_time = oldest - 1;
        }

        result.sort_by_key(|rate| rate.funding_rate_timestamp);
        result.dedup_by_key(|rate| rate.funding_rate_timestamp);
        Ok(result)
    }

    /// Get instrument specifications of a category, optionally narrowed to one symbol.
    ///
    /// The full category is fetched on first use or when `force` is set and
    /// kept in a per-category cache. The cache lock is not held while fetching.
    pub async fn get_instruments_info(
        &self,
        category: Category,
        symbol: Option<&str>,
        force: bool,
    ) -> Result<Vec<Instrument>, BybitError> {
        let cached = self
            .instrument_cache()
            .get(&category)
            .filter(|list| !list.is_empty())
            .cloned();

        let instruments = match cached {
            Some(list) if !force => list,
            _ => {
                let list = self.fetch_instruments(category).await?;
                self.instrument_cache().insert(category, list.clone());
                list
            }
        };

        Ok(match symbol {
            Some(symbol) => instruments
                .into_iter()
                .filter(|instrument| instrument.symbol == symbol)
                .collect(),
            None => instruments,
        })
    }

    /// Look up a single instrument through the cache.
    pub async fn get_instrument(
        &self,
        category: Category,
        symbol: &str,
    ) -> Result<Option<Instrument>, BybitError> {
        Ok(self
            .get_instruments_info(category, Some(symbol), false)
            .await?
            .into_iter()
            .next())
    }

    /// Replace the cached instruments of a category.
    pub fn set_instruments(&self, category: Category, instruments: Vec<Instrument>) {
        self.instrument_cache().insert(category, instruments);
    }

    async fn fetch_instruments(&self, category: Category) -> Result<Vec<Instrument>, BybitError> {
        let mut instruments = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page: InstrumentsResult = self
                .public_get(
                    market::INSTRUMENTS_INFO,
                    &InstrumentsRequest {
                        category,
                        symbol: None,
                        limit: Some(1000),
                        cursor: cursor.as_deref(),
                    },
                )
                .await?;

            instruments.extend(page.list);

            match page.next_page_cursor {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => break,
            }
        }

        tracing::debug!(%category, count = instruments.len(), "Fetched instruments");
        Ok(instruments)
    }

    fn instrument_cache(&self) -> MutexGuard<'_, HashMap<Category, Vec<Instrument>>> {
        match self.instruments.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Get latest price snapshots.
    pub async fn get_tickers(
        &self,
        category: Category,
        symbol: Option<&str>,
    ) -> Result<Vec<Ticker>, BybitError> {
        let result: TickersResult = self
            .public_get(market::TICKERS, &TickersRequest { category, symbol })
            .await?;
        Ok(result.list)
    }

    /// Get the server time in milliseconds.
    pub async fn get_server_time(&self) -> Result<i64, BybitError> {
        let time: ServerTime = self.public_get(market::TIME, &()).await?;
        Ok(time.as_millis())
    }
}

/// Check that `page` continues `previous` without gaps or reordering.
fn check_continuity(
    previous: Option<&Candle>,
    page: &[Candle],
    interval: CandleInterval,
    symbol: &str,
) -> Result<(), BybitError> {
    let step = interval.duration_ms();
    let mut last = previous.map(|candle| candle.open_time);

    for candle in page {
        if let Some(last) = last {
            let spacing = candle.open_time - last;
            let valid = if interval.has_fixed_spacing() {
                spacing == step
            } else {
                spacing > 0
            };
            if !valid {
                return Err(BybitError::InvalidResponse(format!(
                    "Non-contiguous {interval} klines for {symbol}: {last} followed by {}",
                    candle.open_time
                )));
            }
        }
        last = Some(candle.open_time);
    }

    Ok(())
}
