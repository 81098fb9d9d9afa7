//! Types for account, position and order endpoints.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::BybitError;
use crate::types::serde_helpers::{decimal_or_zero, empty_string_as_none, int_or_string};
use crate::types::{
    AccountType, Category, OrderStatus, OrderType, PositionStatus, Side, TimeInForce, TpSlMode,
    TriggerPriceType,
};

/// Increment used to format prices and quantities when the instrument is unknown.
pub const DEFAULT_STEP: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Query for `/v5/position/list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionListRequest<'a> {
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settle_coin: Option<&'a str>,
}

/// An open (or empty) derivatives position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// 0 in one-way mode, 1 (buy) or 2 (sell) in hedge mode
    #[serde(deserialize_with = "int_or_string::deserialize", default)]
    pub position_idx: i64,
    #[serde(deserialize_with = "int_or_string::deserialize", default)]
    pub risk_id: i64,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub risk_limit_value: Decimal,
    pub symbol: String,
    #[serde(default)]
    pub side: Side,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub size: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub avg_price: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub position_value: Decimal,
    #[serde(deserialize_with = "int_or_string::deserialize", default)]
    pub trade_mode: i64,
    #[serde(default)]
    pub position_status: PositionStatus,
    #[serde(deserialize_with = "int_or_string::deserialize", default)]
    pub auto_add_margin: i64,
    #[serde(deserialize_with = "int_or_string::deserialize", default)]
    pub adl_rank_indicator: i64,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub leverage: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub position_balance: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub mark_price: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub liq_price: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub bust_price: Decimal,
    #[serde(
        rename = "positionMM",
        deserialize_with = "decimal_or_zero::deserialize",
        default
    )]
    pub position_mm: Decimal,
    #[serde(
        rename = "positionIM",
        deserialize_with = "decimal_or_zero::deserialize",
        default
    )]
    pub position_im: Decimal,
    #[serde(rename = "tpslMode", default)]
    pub tpsl_mode: TpSlMode,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub stop_loss: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub take_profit: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub trailing_stop: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub unrealised_pnl: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub cum_realised_pnl: Decimal,
    #[serde(default)]
    pub is_reduce_only: bool,
    #[serde(deserialize_with = "int_or_string::deserialize", default)]
    pub created_time: i64,
    #[serde(deserialize_with = "int_or_string::deserialize", default)]
    pub updated_time: i64,
    #[serde(deserialize_with = "int_or_string::deserialize", default)]
    pub seq: i64,
}

impl Position {
    pub fn is_zero_size(&self) -> bool {
        self.size.is_zero()
    }
}

/// Result of `/v5/position/list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsResult {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub list: Vec<Position>,
    #[serde(deserialize_with = "empty_string_as_none::deserialize", default)]
    pub next_page_cursor: Option<String>,
}

/// An order to submit through `/v5/order/create`.
///
/// `price_step` and `qty_step` decide how `price` and `qty` are rounded and
/// how many decimals are sent. They are filled from the instrument cache when
/// the order is placed.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub category: Category,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub qty: Decimal,
    /// Only sent for limit orders
    pub price: Decimal,
    pub time_in_force: TimeInForce,
    pub position_idx: i64,
    pub order_link_id: Option<String>,
    pub reduce_only: bool,
    pub close_on_trigger: bool,
    pub take_profit: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub tp_trigger_by: Option<TriggerPriceType>,
    pub sl_trigger_by: Option<TriggerPriceType>,
    pub price_step: Decimal,
    pub qty_step: Decimal,
}

impl Order {
    /// Create a market order.
    pub fn market(category: Category, symbol: impl Into<String>, side: Side, qty: Decimal) -> Self {
        Self {
            category,
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            qty,
            price: Decimal::ZERO,
            time_in_force: TimeInForce::GTC,
            position_idx: 0,
            order_link_id: None,
            reduce_only: false,
            close_on_trigger: false,
            take_profit: None,
            stop_loss: None,
            tp_trigger_by: None,
            sl_trigger_by: None,
            price_step: DEFAULT_STEP,
            qty_step: DEFAULT_STEP,
        }
    }

    /// Create a limit order.
    pub fn limit(
        category: Category,
        symbol: impl Into<String>,
        side: Side,
        qty: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            order_type: OrderType::Limit,
            price,
            ..Self::market(category, symbol, side, qty)
        }
    }

    pub fn with_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = time_in_force;
        self
    }

    pub fn with_position_idx(mut self, position_idx: i64) -> Self {
        self.position_idx = position_idx;
        self
    }

    pub fn with_order_link_id(mut self, order_link_id: impl Into<String>) -> Self {
        self.order_link_id = Some(order_link_id.into());
        self
    }

    pub fn with_reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = reduce_only;
        self
    }

    pub fn with_close_on_trigger(mut self, close_on_trigger: bool) -> Self {
        self.close_on_trigger = close_on_trigger;
        self
    }

    /// Attach a take profit, triggered by `trigger_by` when given.
    pub fn with_take_profit(
        mut self,
        price: Decimal,
        trigger_by: Option<TriggerPriceType>,
    ) -> Self {
        self.take_profit = Some(price);
        self.tp_trigger_by = trigger_by;
        self
    }

    /// Attach a stop loss, triggered by `trigger_by` when given.
    pub fn with_stop_loss(mut self, price: Decimal, trigger_by: Option<TriggerPriceType>) -> Self {
        self.stop_loss = Some(price);
        self.sl_trigger_by = trigger_by;
        self
    }

    /// Set the increments used to format price and quantity.
    pub fn with_steps(mut self, price_step: Decimal, qty_step: Decimal) -> Self {
        self.price_step = price_step;
        self.qty_step = qty_step;
        self
    }

    /// The request body, with price and quantity formatted to their steps.
    ///
    /// Fails when a value is too large to be snapped to its step.
    pub fn body(&self) -> Result<CreateOrderBody<'_>, BybitError> {
        let price_to_step = |price: Option<Decimal>| {
            price
                .map(|price| format_to_step(price, self.price_step))
                .transpose()
        };

        Ok(CreateOrderBody {
            category: self.category,
            symbol: &self.symbol,
            side: self.side,
            order_type: self.order_type,
            qty: format_to_step(self.qty, self.qty_step)?,
            price: price_to_step((self.order_type == OrderType::Limit).then_some(self.price))?,
            time_in_force: self.time_in_force,
            reduce_only: self.reduce_only,
            close_on_trigger: self.close_on_trigger,
            position_idx: self.position_idx,
            order_link_id: self.order_link_id.as_deref(),
            take_profit: price_to_step(self.take_profit)?,
            stop_loss: price_to_step(self.stop_loss)?,
            tp_trigger_by: self.take_profit.and(self.tp_trigger_by),
            sl_trigger_by: self.stop_loss.and(self.sl_trigger_by),
        })
    }
}

/// Wire form of an [`Order`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody<'a> {
    pub category: Category,
    pub symbol: &'a str,
    pub side: Side,
    pub order_type: OrderType,
    pub qty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    pub time_in_force: TimeInForce,
    pub reduce_only: bool,
    pub close_on_trigger: bool,
    pub position_idx: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_link_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tp_trigger_by: Option<TriggerPriceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sl_trigger_by: Option<TriggerPriceType>,
}

/// Round `value` to the nearest multiple of `step` and print it with the
/// step's number of decimals.
///
/// A zero or negative step falls back to [`DEFAULT_STEP`]. Values whose
/// step count does not fit a `Decimal` are rejected.
pub fn format_to_step(value: Decimal, step: Decimal) -> Result<String, BybitError> {
    let step = if step > Decimal::ZERO {
        step.normalize()
    } else {
        DEFAULT_STEP
    };
    let places = step.scale();
    let snapped = value
        .checked_div(step)
        .map(|steps| steps.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|steps| steps.checked_mul(step))
        .ok_or_else(|| {
            BybitError::InvalidArgument(format!("{value} cannot be rounded to a step of {step}"))
        })?;
    Ok(format!("{:.*}", places as usize, snapped))
}

/// Identifiers returned for a created or cancelled order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderId {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub order_link_id: String,
}

/// Body of `/v5/order/cancel`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest<'a> {
    pub category: Category,
    pub symbol: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_link_id: Option<&'a str>,
}

/// Body of `/v5/order/cancel-all`.
#[derive(Debug, Clone, Serialize)]
pub struct CancelAllRequest<'a> {
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<&'a str>,
}

/// Result of `/v5/order/cancel-all`.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelAllResult {
    #[serde(default)]
    pub list: Vec<OrderId>,
}

/// Query for `/v5/order/realtime`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrdersRequest<'a> {
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settle_coin: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_link_id: Option<&'a str>,
}

/// An order as reported by the exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: String,
    #[serde(default)]
    pub order_link_id: String,
    pub symbol: String,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub price: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub qty: Decimal,
    #[serde(default)]
    pub side: Side,
    #[serde(deserialize_with = "int_or_string::deserialize", default)]
    pub position_idx: i64,
    #[serde(default)]
    pub order_status: OrderStatus,
    #[serde(default)]
    pub reject_reason: String,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub avg_price: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub cum_exec_qty: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub cum_exec_value: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub cum_exec_fee: Decimal,
    #[serde(default)]
    pub time_in_force: TimeInForce,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub reduce_only: bool,
    #[serde(default)]
    pub close_on_trigger: bool,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub last_price_on_created: Decimal,
    #[serde(deserialize_with = "int_or_string::deserialize", default)]
    pub created_time: i64,
    #[serde(deserialize_with = "int_or_string::deserialize", default)]
    pub updated_time: i64,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub take_profit: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub stop_loss: Decimal,
    #[serde(default)]
    pub tp_trigger_by: TriggerPriceType,
    #[serde(default)]
    pub sl_trigger_by: TriggerPriceType,
}

/// Result of `/v5/order/realtime`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersResult {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub list: Vec<OrderResponse>,
    #[serde(deserialize_with = "empty_string_as_none::deserialize", default)]
    pub next_page_cursor: Option<String>,
}

/// Body of `/v5/position/switch-mode`.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchModeRequest<'a> {
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coin: Option<&'a str>,
    pub mode: i32,
}

/// Query for `/v5/account/wallet-balance`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalanceRequest<'a> {
    pub account_type: AccountType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coin: Option<&'a str>,
}

/// Result of `/v5/account/wallet-balance`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletBalance {
    #[serde(default)]
    pub list: Vec<AccountBalance>,
}

/// Totals of one account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(
        rename = "accountIMRate",
        deserialize_with = "decimal_or_zero::deserialize",
        default
    )]
    pub account_im_rate: Decimal,
    #[serde(
        rename = "accountMMRate",
        deserialize_with = "decimal_or_zero::deserialize",
        default
    )]
    pub account_mm_rate: Decimal,
    #[serde(
        rename = "accountLTV",
        deserialize_with = "decimal_or_zero::deserialize",
        default
    )]
    pub account_ltv: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub total_equity: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub total_wallet_balance: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub total_margin_balance: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub total_available_balance: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub total_perp_upl: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub total_initial_margin: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub total_maintenance_margin: Decimal,
    #[serde(rename = "coin", default)]
    pub coins: Vec<CoinBalance>,
}

/// Balance of one coin inside an account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinBalance {
    pub coin: String,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub equity: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub usd_value: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub wallet_balance: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub available_to_withdraw: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub available_to_borrow: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub borrow_amount: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub accrued_interest: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub bonus: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub locked: Decimal,
    #[serde(rename = "totalOrderIM", deserialize_with = "decimal_or_zero::deserialize", default)]
    pub total_order_im: Decimal,
    #[serde(rename = "totalPositionIM", deserialize_with = "decimal_or_zero::deserialize", default)]
    pub total_position_im: Decimal,
    #[serde(rename = "totalPositionMM", deserialize_with = "decimal_or_zero::deserialize", default)]
    pub total_position_mm: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub unrealised_pnl: Decimal,
    #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
    pub cum_realised_pnl: Decimal,
    #[serde(default)]
    pub collateral_switch: bool,
    #[serde(default)]
    pub margin_collateral: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_default_step() {
        assert_eq!(DEFAULT_STEP, dec("0.01"));
    }

    #[test]
    fn test_format_to_step() {
        let format = |value: &str, step: Decimal| format_to_step(dec(value), step).unwrap();
        assert_eq!(format("0.123456", dec("0.001")), "0.123");
        assert_eq!(format("0.1235", dec("0.001")), "0.124");
        assert_eq!(format("27000", dec("0.10")), "27000.0");
        assert_eq!(format("3", dec("1")), "3");
        assert_eq!(format("27000.3", dec("0.5")), "27000.5");
        assert_eq!(format("1.005", Decimal::ZERO), "1.01");
    }

    #[test]
    fn test_format_to_step_rejects_overflow() {
        let result = format_to_step(Decimal::MAX, dec("0.0000000001"));
        assert!(matches!(result, Err(BybitError::InvalidArgument(_))));

        let order = Order::market(Category::Linear, "BTCUSDT", Side::Buy, Decimal::MAX)
            .with_steps(dec("0.1"), dec("0.0000000001"));
        assert!(matches!(order.body(), Err(BybitError::InvalidArgument(_))));
    }

    #[test]
    fn test_market_order_body() {
        let order = Order::market(Category::Linear, "BTCUSDT", Side::Buy, dec("0.0126"))
            .with_steps(dec("0.1"), dec("0.001"));
        let body = serde_json::to_value(order.body().unwrap()).unwrap();

        assert_eq!(
            body,
            json!({
                "category": "linear",
                "symbol": "BTCUSDT",
                "side": "Buy",
                "orderType": "Market",
                "qty": "0.013",
                "timeInForce": "GTC",
                "reduceOnly": false,
                "closeOnTrigger": false,
                "positionIdx": 0
            })
        );
    }

    #[test]
    fn test_limit_order_body_with_tp_sl() {
        let order = Order::limit(Category::Linear, "ETHUSDT", Side::Sell, dec("1"), dec("2500.127"))
            .with_take_profit(dec("2400"), Some(TriggerPriceType::MarkPrice))
            .with_stop_loss(dec("2600"), None)
            .with_order_link_id("my-order");
        let body = serde_json::to_value(order.body().unwrap()).unwrap();

        assert_eq!(body["price"], "2500.13");
        assert_eq!(body["qty"], "1.00");
        assert_eq!(body["takeProfit"], "2400.00");
        assert_eq!(body["stopLoss"], "2600.00");
        assert_eq!(body["tpTriggerBy"], "MarkPrice");
        assert!(body.get("slTriggerBy").is_none());
        assert_eq!(body["orderLinkId"], "my-order");
    }

    #[test]
    fn test_position_parses() {
        let position: Position = serde_json::from_value(json!({
            "positionIdx": 0,
            "riskId": 1,
            "riskLimitValue": "150",
            "symbol": "BTCUSD",
            "side": "Sell",
            "size": "300",
            "avgPrice": "27464.50441675",
            "positionValue": "0.01092319",
            "tradeMode": 0,
            "positionStatus": "Normal",
            "autoAddMargin": 1,
            "adlRankIndicator": 2,
            "leverage": "10",
            "markPrice": "28224.50",
            "liqPrice": "",
            "bustPrice": "",
            "positionMM": "0.0000015",
            "positionIM": "0.0001",
            "tpslMode": "Full",
            "takeProfit": "0.00",
            "stopLoss": "0.00",
            "trailingStop": "0",
            "unrealisedPnl": "-0.00029413",
            "cumRealisedPnl": "0.00000024",
            "createdTime": "1676538056258",
            "updatedTime": "1697673600012",
            "seq": 4688002127i64
        }))
        .unwrap();

        assert_eq!(position.side, Side::Sell);
        assert_eq!(position.size, dec("300"));
        assert_eq!(position.liq_price, Decimal::ZERO);
        assert_eq!(position.position_im, dec("0.0001"));
        assert_eq!(position.created_time, 1676538056258);
        assert!(!position.is_zero_size());
    }

    #[test]
    fn test_empty_position_has_no_side() {
        let position: Position =
            serde_json::from_value(json!({"symbol": "BTCUSDT", "side": "", "size": "0"})).unwrap();
        assert_eq!(position.side, Side::None);
        assert!(position.is_zero_size());
    }

    #[test]
    fn test_wallet_balance_parses() {
        let balance: WalletBalance = serde_json::from_value(json!({
            "list": [{
                "accountType": "UNIFIED",
                "accountIMRate": "0",
                "accountLTV": "0",
                "totalEquity": "3.31216591",
                "totalAvailableBalance": "3.00326056",
                "coin": [{
                    "coin": "USDT",
                    "equity": "1.5",
                    "walletBalance": "1.5",
                    "totalOrderIM": "0",
                    "availableToWithdraw": "",
                    "collateralSwitch": true,
                    "marginCollateral": true
                }]
            }]
        }))
        .unwrap();

        let account = &balance.list[0];
        assert_eq!(account.account_type, AccountType::Unified);
        assert_eq!(account.total_equity, dec("3.31216591"));
        assert_eq!(account.coins[0].coin, "USDT");
        assert_eq!(account.coins[0].available_to_withdraw, Decimal::ZERO);
    }
}
