//! WebSocket message types for the Bybit v5 public streams.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::serde_helpers::{decimal_or_zero, default_on_error, int_or_string};
use crate::types::{CandleInterval, ResponseType};

/// Topic prefixes.
pub mod topics {
    pub const TICKERS: &str = "tickers";
    pub const KLINE: &str = "kline";

    /// `tickers.{symbol}`
    pub fn ticker(symbol: &str) -> String {
        format!("{TICKERS}.{symbol}")
    }

    /// `kline.{interval}.{symbol}`
    pub fn kline(symbol: &str, interval: crate::types::CandleInterval) -> String {
        format!("{KLINE}.{interval}.{symbol}")
    }

    /// The symbol is the last `.` separated segment of a topic.
    pub fn symbol(topic: &str) -> &str {
        topic.rsplit('.').next().unwrap_or(topic)
    }
}

/// Outbound subscribe frame.
///
/// ```json
/// {"req_id":"tickers.BTCUSDT","op":"subscribe","args":["tickers.BTCUSDT"]}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// Echoed back by the server in the control response
    pub req_id: String,
    pub op: String,
    pub args: Vec<String>,
}

impl SubscribeRequest {
    pub fn subscribe(filter: impl Into<String>) -> Self {
        let filter = filter.into();
        Self {
            req_id: filter.clone(),
            op: "subscribe".to_string(),
            args: vec![filter],
        }
    }
}

/// Operation echoed inside some control responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ControlRequest {
    #[serde(default)]
    pub op: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Server response to an operation (subscribe, ping, ...).
///
/// Recognised by the presence of a `success` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ControlMessage {
    pub success: bool,
    #[serde(default)]
    pub ret_msg: String,
    #[serde(default)]
    pub conn_id: String,
    #[serde(default)]
    pub req_id: String,
    #[serde(default)]
    pub op: String,
    #[serde(default)]
    pub request: Option<ControlRequest>,
}

impl ControlMessage {
    /// Topics a failed operation was about.
    pub fn failed_args(&self) -> Vec<String> {
        if self.success {
            return Vec::new();
        }
        match &self.request {
            Some(request) if !request.args.is_empty() => request.args.clone(),
            _ if !self.req_id.is_empty() => vec![self.req_id.clone()],
            _ => Vec::new(),
        }
    }

    /// The operation name, from the echoed request if present.
    pub fn operation(&self) -> &str {
        match &self.request {
            Some(request) if !request.op.is_empty() => &request.op,
            _ => &self.op,
        }
    }
}

/// A data message on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Event {
    pub topic: String,
    #[serde(rename = "type", default)]
    pub response_type: ResponseType,
    #[serde(deserialize_with = "int_or_string::deserialize", default)]
    pub ts: i64,
    /// Topic specific payload, an object or an array
    #[serde(default)]
    pub data: Value,
}

/// A decoded inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Control(ControlMessage),
    Event(Event),
    /// Valid JSON that is neither of the above
    Other(Value),
}

impl Inbound {
    /// Classify a parsed frame.
    ///
    /// Fails when the frame has the shape of a control message or event but
    /// its fields do not decode.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let Some(object) = value.as_object() else {
            return Ok(Inbound::Other(value));
        };

        if object.contains_key("success") {
            serde_json::from_value(value).map(Inbound::Control)
        } else if object.contains_key("topic") {
            serde_json::from_value(value).map(Inbound::Event)
        } else {
            Ok(Inbound::Other(value))
        }
    }
}

/// Latest best bid/ask and last price of a symbol from the `tickers` topic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTicker {
    pub symbol: String,
    pub ask1_price: Decimal,
    pub ask1_size: Decimal,
    pub bid1_price: Decimal,
    pub bid1_size: Decimal,
    pub last_price: Decimal,
}

/// Fields of a ticker message; deltas carry only what changed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickerFields {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(deserialize_with = "default_on_error::deserialize", default)]
    ask1_price: Option<Decimal>,
    #[serde(deserialize_with = "default_on_error::deserialize", default)]
    ask1_size: Option<Decimal>,
    #[serde(deserialize_with = "default_on_error::deserialize", default)]
    bid1_price: Option<Decimal>,
    #[serde(deserialize_with = "default_on_error::deserialize", default)]
    bid1_size: Option<Decimal>,
    #[serde(deserialize_with = "default_on_error::deserialize", default)]
    last_price: Option<Decimal>,
}

impl EventTicker {
    /// Apply a `tickers` event.
    ///
    /// A snapshot replaces the whole entry. A delta only overwrites the
    /// fields it carries.
    pub fn apply(&mut self, event: &Event) -> Result<(), serde_json::Error> {
        let fields = TickerFields::deserialize(&event.data)?;

        if event.response_type == ResponseType::Snapshot {
            *self = EventTicker::default();
        }

        if let Some(symbol) = fields.symbol {
            self.symbol = symbol;
        }
        if self.symbol.is_empty() {
            self.symbol = topics::symbol(&event.topic).to_string();
        }

        let merge = |target: &mut Decimal, value: Option<Decimal>| {
            if let Some(value) = value {
                *target = value;
            }
        };
        merge(&mut self.ask1_price, fields.ask1_price);
        merge(&mut self.ask1_size, fields.ask1_size);
        merge(&mut self.bid1_price, fields.bid1_price);
        merge(&mut self.bid1_size, fields.bid1_size);
        merge(&mut self.last_price, fields.last_price);
        Ok(())
    }
}

/// A candle from the `kline` topic.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCandlestick {
    #[serde(deserialize_with = "int_or_string::deserialize")]
    pub start: i64,
    #[serde(deserialize_with = "int_or_string::deserialize")]
    pub end: i64,
    pub interval: CandleInterval,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub open: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub high: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub low: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub close: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub volume: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub turnover: Decimal,
    /// Whether the candle is closed
    #[serde(default)]
    pub confirm: bool,
    #[serde(deserialize_with = "int_or_string::deserialize", default)]
    pub timestamp: i64,
}
