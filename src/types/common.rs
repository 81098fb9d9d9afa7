//! Common domain types for Bybit v5 API.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Market segment that scopes most v5 endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Spot,
    /// USDT and USDC perpetuals and futures
    #[default]
    Linear,
    /// Coin-margined contracts
    Inverse,
    Option,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Spot => "spot",
            Category::Linear => "linear",
            Category::Inverse => "inverse",
            Category::Option => "option",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buy or sell side of an order or position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
    /// Empty positions report no side
    #[default]
    #[serde(rename = "", alias = "None")]
    None,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
            Side::None => "",
        }
    }

    /// The side that closes a position opened on `self`.
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
            Side::None => Side::None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type for trading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Rests on the book at the given price
    Limit,
    /// Executes immediately at the best available price
    #[default]
    Market,
    #[serde(other)]
    Unknown,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Limit => "Limit",
            OrderType::Market => "Market",
            OrderType::Unknown => "UNKNOWN",
        }
    }
}

/// Time in force for orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good till canceled (default)
    #[default]
    GTC,
    /// Immediate or cancel
    IOC,
    /// Fill or kill
    FOK,
    /// Cancelled if it would take liquidity
    PostOnly,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::GTC => "GTC",
            TimeInForce::IOC => "IOC",
            TimeInForce::FOK => "FOK",
            TimeInForce::PostOnly => "PostOnly",
        }
    }
}

/// Status of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Created,
    New,
    Rejected,
    PartiallyFilled,
    PartiallyFilledCanceled,
    Filled,
    PendingCancel,
    Cancelled,
    Untriggered,
    Triggered,
    Deactivated,
    Active,
    #[serde(other)]
    Unknown,
}

/// Price used to trigger take profit and stop loss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerPriceType {
    #[default]
    LastPrice,
    IndexPrice,
    MarkPrice,
    #[serde(other)]
    Unknown,
}

impl TriggerPriceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerPriceType::LastPrice => "LastPrice",
            TriggerPriceType::IndexPrice => "IndexPrice",
            TriggerPriceType::MarkPrice => "MarkPrice",
            TriggerPriceType::Unknown => "",
        }
    }
}

/// Wallet account type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    Contract,
    #[default]
    Unified,
    Fund,
    Spot,
    Option,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Contract => "CONTRACT",
            AccountType::Unified => "UNIFIED",
            AccountType::Fund => "FUND",
            AccountType::Spot => "SPOT",
            AccountType::Option => "OPTION",
        }
    }
}

/// Position mode of a derivatives account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionMode {
    /// One-way mode
    MergedSingle,
    /// Hedge mode
    BothSides,
}

impl PositionMode {
    /// Value of the `mode` field of `/v5/position/switch-mode`.
    pub fn as_i32(&self) -> i32 {
        match self {
            PositionMode::MergedSingle => 0,
            PositionMode::BothSides => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractType {
    InversePerpetual,
    LinearPerpetual,
    LinearFutures,
    InverseFutures,
    #[serde(other)]
    Unknown,
}

/// Trading status of an instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractStatus {
    PreLaunch,
    #[default]
    Trading,
    Settling,
    Delivering,
    Closed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionStatus {
    #[default]
    Normal,
    /// Liquidation in progress
    Liq,
    /// Auto-deleverage in progress
    Adl,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TpSlMode {
    #[default]
    Full,
    Partial,
    #[serde(other)]
    Unknown,
}

/// Whether a stream message carries full state or changes only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Snapshot,
    Delta,
}

/// Kline interval.
///
/// Serialized with the exchange's identifiers (`"1"`, `"60"`, `"D"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CandleInterval {
    Min1,
    Min3,
    Min5,
    Min15,
    Min30,
    Hour1,
    Hour2,
    Hour4,
    Hour6,
    Hour12,
    Day,
    Week,
    Month,
}

impl CandleInterval {
    pub const ALL: [CandleInterval; 13] = [
        CandleInterval::Min1,
        CandleInterval::Min3,
        CandleInterval::Min5,
        CandleInterval::Min15,
        CandleInterval::Min30,
        CandleInterval::Hour1,
        CandleInterval::Hour2,
        CandleInterval::Hour4,
        CandleInterval::Hour6,
        CandleInterval::Hour12,
        CandleInterval::Day,
        CandleInterval::Week,
        CandleInterval::Month,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CandleInterval::Min1 => "1",
            CandleInterval::Min3 => "3",
            CandleInterval::Min5 => "5",
            CandleInterval::Min15 => "15",
            CandleInterval::Min30 => "30",
            CandleInterval::Hour1 => "60",
            CandleInterval::Hour2 => "120",
            CandleInterval::Hour4 => "240",
            CandleInterval::Hour6 => "360",
            CandleInterval::Hour12 => "720",
            CandleInterval::Day => "D",
            CandleInterval::Week => "W",
            CandleInterval::Month => "M",
        }
    }

    /// Length of one candle in milliseconds.
    ///
    /// A month is counted as 30 days.
    pub fn duration_ms(&self) -> i64 {
        const MINUTE: i64 = 60_000;
        match self {
            CandleInterval::Min1 => MINUTE,
            CandleInterval::Min3 => 3 * MINUTE,
            CandleInterval::Min5 => 5 * MINUTE,
            CandleInterval::Min15 => 15 * MINUTE,
            CandleInterval::Min30 => 30 * MINUTE,
            CandleInterval::Hour1 => 60 * MINUTE,
            CandleInterval::Hour2 => 120 * MINUTE,
            CandleInterval::Hour4 => 240 * MINUTE,
            CandleInterval::Hour6 => 360 * MINUTE,
            CandleInterval::Hour12 => 720 * MINUTE,
            CandleInterval::Day => 86_400_000,
            CandleInterval::Week => 604_800_000,
            CandleInterval::Month => 2_592_000_000,
        }
    }

    /// Whether consecutive candles are exactly [`duration_ms`](Self::duration_ms) apart.
    pub fn has_fixed_spacing(&self) -> bool {
        !matches!(self, CandleInterval::Month)
    }
}

impl std::fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandleInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CandleInterval::ALL
            .into_iter()
            .find(|interval| interval.as_str() == s)
            .ok_or_else(|| format!("Invalid candle interval: {s}"))
    }
}

impl From<CandleInterval> for String {
    fn from(interval: CandleInterval) -> String {
        interval.as_str().to_string()
    }
}

impl TryFrom<String> for CandleInterval {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
