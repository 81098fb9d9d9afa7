//! Account, position and order endpoints (authentication required).
//!
//! These endpoints require API credentials to be configured on the client.

mod types;

pub use types::*;

use rust_decimal::Decimal;

use crate::error::BybitError;
use crate::rest::RestClient;
use crate::rest::endpoints::account;
use crate::types::{AccountType, Category, PositionMode, Side, TimeInForce};

impl RestClient {
    /// Submit an order.
    ///
    /// Price and quantity are rounded to the instrument's tick size and
    /// quantity step first. The instrument list of the order's category is
    /// fetched if it is not cached yet.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use bybit_api_client::rest::RestClient;
    /// use bybit_api_client::rest::account::Order;
    /// use bybit_api_client::types::{Category, Side};
    /// use rust_decimal::Decimal;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let client = RestClient::with_credentials("key", "secret");
    ///     let order = Order::limit(
    ///         Category::Linear,
    ///         "BTCUSDT",
    ///         Side::Buy,
    ///         Decimal::new(1, 3),
    ///         Decimal::new(25_000, 0),
    ///     );
    ///     let id = client.place_order(&order).await?;
    ///     println!("Placed {}", id.order_id);
    ///     Ok(())
    /// }
    /// ```
    pub async fn place_order(&self, order: &Order) -> Result<OrderId, BybitError> {
        let (price_step, qty_step) = self.order_steps(order.category, &order.symbol).await?;
        let order = order.clone().with_steps(price_step, qty_step);
        let body = order.body()?;

        let id: OrderId = self.private_post(account::ORDER_CREATE, &body).await?;
        tracing::info!(
            symbol = %order.symbol,
            side = %order.side,
            qty = %body.qty,
            order_id = %id.order_id,
            "Order placed"
        );
        Ok(id)
    }

    async fn order_steps(
        &self,
        category: Category,
        symbol: &str,
    ) -> Result<(Decimal, Decimal), BybitError> {
        let Some(instrument) = self.get_instrument(category, symbol).await? else {
            tracing::warn!(%category, symbol, "Unknown instrument, using default precision");
            return Ok((DEFAULT_STEP, DEFAULT_STEP));
        };

        let non_zero = |step: Decimal| if step.is_zero() { DEFAULT_STEP } else { step };
        Ok((
            non_zero(instrument.price_filter.tick_size),
            non_zero(instrument.lot_size_filter.step()),
        ))
    }

    /// Flatten every open position of a category with market orders.
    ///
    /// Linear and inverse position queries need a settle coin (or a symbol);
    /// pass it as `settle_coin`. Fills are not awaited.
    pub async fn close_all_positions(
        &self,
        category: Category,
        settle_coin: Option<&str>,
    ) -> Result<Vec<OrderId>, BybitError> {
        let positions = self.get_position_info(category, None, settle_coin).await?;
        let mut closed = Vec::new();

        for position in positions {
            if position.is_zero_size() || position.side == Side::None {
                continue;
            }

            let order = Order::market(
                category,
                position.symbol.as_str(),
                position.side.opposite(),
                position.size,
            )
            .with_time_in_force(TimeInForce::GTC)
            .with_position_idx(position.position_idx);

            closed.push(self.place_order(&order).await?);
        }

        Ok(closed)
    }

    /// Cancel one order, identified by `order_id` or `order_link_id`.
    pub async fn cancel_order(
        &self,
        category: Category,
        symbol: &str,
        order_id: Option<&str>,
        order_link_id: Option<&str>,
    ) -> Result<OrderId, BybitError> {
        if order_id.is_none() && order_link_id.is_none() {
            return Err(BybitError::InvalidArgument(
                "either order_id or order_link_id is required".to_string(),
            ));
        }

        self.private_post(
            account::ORDER_CANCEL,
            &CancelOrderRequest {
                category,
                symbol,
                order_id,
                order_link_id,
            },
        )
        .await
    }

    /// Cancel all open orders of a category, optionally for one symbol only.
    pub async fn cancel_all_orders(
        &self,
        category: Category,
        symbol: Option<&str>,
    ) -> Result<Vec<OrderId>, BybitError> {
        let result: CancelAllResult = self
            .private_post(account::ORDER_CANCEL_ALL, &CancelAllRequest { category, symbol })
            .await?;
        Ok(result.list)
    }

    /// Get open orders.
    pub async fn get_open_orders(
        &self,
        category: Category,
        symbol: Option<&str>,
        settle_coin: Option<&str>,
    ) -> Result<Vec<OrderResponse>, BybitError> {
        let result: OrdersResult = self
            .private_get(
                account::ORDER_REALTIME,
                &OpenOrdersRequest {
                    category,
                    symbol,
                    settle_coin,
                    ..Default::default()
                },
            )
            .await?;
        Ok(result.list)
    }

    /// Get a single open order by id or link id.
    pub async fn get_open_order(
        &self,
        category: Category,
        symbol: &str,
        order_id: Option<&str>,
        order_link_id: Option<&str>,
    ) -> Result<Option<OrderResponse>, BybitError> {
        let result: OrdersResult = self
            .private_get(
                account::ORDER_REALTIME,
                &OpenOrdersRequest {
                    category,
                    symbol: Some(symbol),
                    settle_coin: None,
                    order_id,
                    order_link_id,
                },
            )
            .await?;
        Ok(result.list.into_iter().next())
    }

    /// Get positions.
    pub async fn get_position_info(
        &self,
        category: Category,
        symbol: Option<&str>,
        settle_coin: Option<&str>,
    ) -> Result<Vec<Position>, BybitError> {
        let result: PositionsResult = self
            .private_get(
                account::POSITION_LIST,
                &PositionListRequest {
                    category,
                    symbol,
                    settle_coin,
                },
            )
            .await?;
        Ok(result.list)
    }

    /// Get wallet balance.
    pub async fn get_wallet_balance(
        &self,
        account_type: AccountType,
        coin: Option<&str>,
    ) -> Result<WalletBalance, BybitError> {
        self.private_get(
            account::WALLET_BALANCE,
            &WalletBalanceRequest { account_type, coin },
        )
        .await
    }

    /// Switch between one-way and hedge mode for a symbol or a settle coin.
    ///
    /// Succeeds when the account is already in the requested mode.
    pub async fn set_position_mode(
        &self,
        category: Category,
        mode: PositionMode,
        symbol: Option<&str>,
        coin: Option<&str>,
    ) -> Result<(), BybitError> {
        if symbol.is_none() && coin.is_none() {
            return Err(BybitError::InvalidArgument(
                "either symbol or coin is required".to_string(),
            ));
        }

        let request = SwitchModeRequest {
            category,
            symbol,
            coin,
            mode: mode.as_i32(),
        };

        match self
            .private_post::<serde_json::Value, _>(account::SWITCH_MODE, &request)
            .await
        {
            Ok(_) => Ok(()),
            Err(BybitError::Api(err)) if err.is_position_mode_not_modified() => {
                tracing::debug!(?mode, "Position mode already set");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
