//! Bybit v5 REST API endpoint constants.

/// Base URL for the Bybit mainnet REST API.
pub const BYBIT_BASE_URL: &str = "https://api.bybit.com";

/// Base URL for the Bybit testnet REST API.
pub const BYBIT_TESTNET_URL: &str = "https://api-testnet.bybit.com";

/// Market data endpoints (no authentication required).
pub mod market {
    /// Kline history, newest first.
    pub const KLINE: &str = "/v5/market/kline";
    /// Funding rate history, newest first.
    pub const FUNDING_HISTORY: &str = "/v5/market/funding/history";
    /// Instrument specifications, cursor paginated.
    pub const INSTRUMENTS_INFO: &str = "/v5/market/instruments-info";
    /// Latest price snapshots.
    pub const TICKERS: &str = "/v5/market/tickers";
    /// Server time.
    pub const TIME: &str = "/v5/market/time";
}

/// Account, position and order endpoints (authentication required).
pub mod account {
    pub const WALLET_BALANCE: &str = "/v5/account/wallet-balance";
    pub const POSITION_LIST: &str = "/v5/position/list";
    pub const SWITCH_MODE: &str = "/v5/position/switch-mode";
    pub const ORDER_CREATE: &str = "/v5/order/create";
    pub const ORDER_REALTIME: &str = "/v5/order/realtime";
    pub const ORDER_CANCEL: &str = "/v5/order/cancel";
    pub const ORDER_CANCEL_ALL: &str = "/v5/order/cancel-all";
}
