//! Types for market data endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::types::serde_helpers::{decimal_or_zero, empty_string_as_none, int_or_string};
use crate::types::{CandleInterval, Category, ContractStatus, ContractType};

/// Query for one page of `/v5/market/kline`.
#[derive(Debug, Clone, Serialize)]
pub struct KlineRequest {
    pub category: Category,
    pub symbol: String,
    pub interval: CandleInterval,
    /// Open time of the oldest candle to return (ms)
    pub start: i64,
    /// Only sent when it differs from the server default of 200
    #[serde(skip_serializing_if = "is_default_limit")]
    pub limit: u32,
}

/// Parameters of a paginated kline download.
#[derive(Debug, Clone)]
pub struct HistoricalPricesRequest {
    pub category: Category,
    pub symbol: String,
    pub interval: CandleInterval,
    /// Inclusive lower bound on candle open time (ms)
    pub from: i64,
    /// Inclusive upper bound on candle open time (ms)
    pub to: i64,
    /// Candles per page
    pub limit: u32,
}

impl HistoricalPricesRequest {
    pub fn new(
        category: Category,
        symbol: impl Into<String>,
        interval: CandleInterval,
        from: i64,
        to: i64,
    ) -> Self {
        Self {
            category,
            symbol: symbol.into(),
            interval,
            from,
            to,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// Page size the exchange uses when `limit` is omitted.
pub const DEFAULT_PAGE_LIMIT: u32 = 200;

fn is_default_limit(limit: &u32) -> bool {
    *limit == DEFAULT_PAGE_LIMIT
}

/// One OHLCV bar.
///
/// Decoded from the exchange's array form
/// `[startTime, open, high, low, close, volume, turnover]`, all strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[String; 7]")]
pub struct Candle {
    /// Open time (ms)
    pub open_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub turnover: Decimal,
}

impl TryFrom<[String; 7]> for Candle {
    type Error = String;

    fn try_from(value: [String; 7]) -> Result<Self, Self::Error> {
        let [start, open, high, low, close, volume, turnover] = value;
        let decimal = |field: &str, raw: String| {
            raw.parse::<Decimal>()
                .map_err(|e| format!("invalid candle {field} {raw:?}: {e}"))
        };

        Ok(Candle {
            open_time: start
                .parse()
                .map_err(|e| format!("invalid candle start {start:?}: {e}"))?,
            open: decimal("open", open)?,
            high: decimal("high", high)?,
            low: decimal("low", low)?,
            close: decimal("close", close)?,
            volume: decimal("volume", volume)?,
            turnover: decimal("turnover", turnover)?,
        })
    }
}

/// Result of `/v5/market/kline`. Candles are newest first.
#[derive(Debug, Clone, Deserialize)]
pub struct CandlesResult {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub list: Vec<Candle>,
}

/// Query for one page of `/v5/market/funding/history`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingHistoryRequest {
    pub category: Category,
    pub symbol: String,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(skip_serializing_if = "is_default_limit")]
    pub limit: u32,
}

/// A settled funding rate.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRate {
    pub symbol: String,
    pub funding_rate: Decimal,
    /// Settlement time (ms)
    #[serde_as(as = "DisplayFromStr")]
    pub funding_rate_timestamp: i64,
}

/// Result of `/v5/market/funding/history`. Rates are newest first.
#[derive(Debug, Clone, Deserialize)]
pub struct FundingRatesResult {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub list: Vec<FundingRate>,
}

/// Query for `/v5/market/instruments-info`.
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentsRequest<'a> {
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<&'a str>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceFilter {
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub min_price: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub max_price: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub tick_size: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotSizeFilter {
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub max_order_qty: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub min_order_qty: Decimal,
    /// Derivatives only
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub qty_step: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub post_only_max_order_qty: Decimal,
    /// Spot only, takes the role of `qty_step`
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub base_precision: Decimal,
}

impl LotSizeFilter {
    /// Quantity increment, whichever of `qty_step` or `base_precision` is set.
    pub fn step(&self) -> Decimal {
        if self.qty_step.is_zero() {
            self.base_precision
        } else {
            self.qty_step
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageFilter {
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub min_leverage: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub max_leverage: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub leverage_step: Decimal,
}

/// Instrument specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    /// Absent for spot instruments
    #[serde(default)]
    pub contract_type: Option<ContractType>,
    #[serde(default)]
    pub status: ContractStatus,
    #[serde(default)]
    pub base_coin: String,
    #[serde(default)]
    pub quote_coin: String,
    #[serde(deserialize_with = "int_or_string::deserialize", default)]
    pub launch_time: i64,
    #[serde(deserialize_with = "int_or_string::deserialize", default)]
    pub delivery_time: i64,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub delivery_fee_rate: Decimal,
    #[serde(deserialize_with = "int_or_string::deserialize", default)]
    pub price_scale: i64,
    #[serde(default)]
    pub unified_margin_trade: bool,
    /// Funding interval in minutes
    #[serde(default)]
    pub funding_interval: i64,
    #[serde(default)]
    pub settle_coin: String,
    #[serde(default)]
    pub leverage_filter: LeverageFilter,
    #[serde(default)]
    pub price_filter: PriceFilter,
    #[serde(default)]
    pub lot_size_filter: LotSizeFilter,
}

/// Result of `/v5/market/instruments-info`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentsResult {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub list: Vec<Instrument>,
    #[serde(deserialize_with = "empty_string_as_none::deserialize", default)]
    pub next_page_cursor: Option<String>,
}

/// Query for `/v5/market/tickers`.
#[derive(Debug, Clone, Serialize)]
pub struct TickersRequest<'a> {
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<&'a str>,
}

/// Latest price snapshot of a symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub symbol: String,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub last_price: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub bid1_price: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub bid1_size: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub ask1_price: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub ask1_size: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub index_price: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub mark_price: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub prev_price24h: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub price24h_pcnt: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub high_price24h: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub low_price24h: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub volume24h: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub turnover24h: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub open_interest: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub funding_rate: Decimal,
    #[serde(deserialize_with = "int_or_string::deserialize", default)]
    pub next_funding_time: i64,
}

/// Result of `/v5/market/tickers`.
#[derive(Debug, Clone, Deserialize)]
pub struct TickersResult {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub list: Vec<Ticker>,
}

/// Result of `/v5/market/time`.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTime {
    #[serde_as(as = "DisplayFromStr")]
    pub time_second: i64,
    #[serde_as(as = "DisplayFromStr")]
    pub time_nano: i64,
}

impl ServerTime {
    pub fn as_millis(&self) -> i64 {
        self.time_nano / 1_000_000
    }
}
