use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bybit_api_client::BybitError;
use bybit_api_client::auth::Credentials;
use bybit_api_client::rest::RestClient;
use bybit_api_client::rest::account::Order;
use bybit_api_client::rest::market::{HistoricalPricesRequest, Instrument};
use bybit_api_client::types::{AccountType, CandleInterval, Category, PositionMode, Side};

const T: i64 = 1_700_000_040_000;
const MINUTE: i64 = 60_000;

fn build_client(server: &MockServer) -> RestClient {
    RestClient::builder()
        .base_url(server.uri())
        .credentials(Arc::new(Credentials::new("test_key", "test_secret")))
        .build()
}

fn build_public_client(server: &MockServer) -> RestClient {
    RestClient::builder().base_url(server.uri()).build()
}

fn ok(result: Value) -> Value {
    json!({
        "retCode": 0,
        "retMsg": "OK",
        "result": result,
        "retExtInfo": {},
        "time": 1_700_000_000_000i64
    })
}

fn kline_row(open_time: i64) -> Value {
    json!([open_time.to_string(), "100", "101", "99", "100.5", "12.3", "1234.5"])
}

fn kline_page(open_times: &[i64]) -> Value {
    ok(json!({
        "category": "linear",
        "symbol": "BTCUSDT",
        "list": open_times.iter().map(|t| kline_row(*t)).collect::<Vec<_>>()
    }))
}

fn btc_instrument() -> Instrument {
    serde_json::from_value(json!({
        "symbol": "BTCUSDT",
        "contractType": "LinearPerpetual",
        "status": "Trading",
        "baseCoin": "BTC",
        "quoteCoin": "USDT",
        "settleCoin": "USDT",
        "priceFilter": {"minPrice": "0.10", "maxPrice": "199999.80", "tickSize": "0.10"},
        "lotSizeFilter": {"maxOrderQty": "100.000", "minOrderQty": "0.001", "qtyStep": "0.001"}
    }))
    .unwrap()
}

#[tokio::test]
async fn test_historical_prices_single_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v5/market/kline"))
        .and(query_param("symbol", "BTCUSDT"))
        .and(query_param("interval", "1"))
        .and(query_param("start", T.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(kline_page(&[
            T + 4 * MINUTE,
            T + 3 * MINUTE,
            T + 2 * MINUTE,
            T + MINUTE,
            T,
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_public_client(&server);
    let request = HistoricalPricesRequest::new(
        Category::Linear,
        "BTCUSDT",
        CandleInterval::Min1,
        T,
        T + 4 * MINUTE,
    );
    let candles = client.get_historical_prices(&request).await.unwrap();

    let open_times: Vec<i64> = candles.iter().map(|c| c.open_time).collect();
    assert_eq!(
        open_times,
        vec![T, T + MINUTE, T + 2 * MINUTE, T + 3 * MINUTE, T + 4 * MINUTE]
    );
    assert_eq!(candles[0].close, Decimal::new(1005, 1));
}

#[tokio::test]
async fn test_historical_prices_walks_pages_and_trims_to_window() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v5/market/kline"))
        .and(query_param("start", T.to_string()))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kline_page(&[
            T + 2 * MINUTE,
            T + MINUTE,
            T,
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v5/market/kline"))
        .and(query_param("start", (T + 3 * MINUTE).to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(kline_page(&[
            T + 6 * MINUTE,
            T + 5 * MINUTE,
            T + 4 * MINUTE,
            T + 3 * MINUTE,
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_public_client(&server);
    let request = HistoricalPricesRequest::new(
        Category::Linear,
        "BTCUSDT",
        CandleInterval::Min1,
        T,
        T + 4 * MINUTE,
    )
    .limit(3);

    let mut pages = Vec::new();
    let candles = client
        .get_historical_prices_with(&request, |page| pages.push(page.len()))
        .await
        .unwrap();

    let open_times: Vec<i64> = candles.iter().map(|c| c.open_time).collect();
    assert_eq!(
        open_times,
        vec![T, T + MINUTE, T + 2 * MINUTE, T + 3 * MINUTE, T + 4 * MINUTE]
    );
    assert_eq!(pages, vec![3, 2]);
}

#[tokio::test]
async fn test_historical_prices_rejects_gap() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v5/market/kline"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kline_page(&[
            T + 4 * MINUTE,
            T + 2 * MINUTE,
            T,
        ])))
        .mount(&server)
        .await;

    let client = build_public_client(&server);
    let request = HistoricalPricesRequest::new(
        Category::Linear,
        "BTCUSDT",
        CandleInterval::Min1,
        T,
        T + 4 * MINUTE,
    );
    let result = client.get_historical_prices(&request).await;

    assert!(matches!(result, Err(BybitError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_funding_rates_ascending() {
    let server = MockServer::start().await;
    let rate = |ts: i64| {
        json!({
            "symbol": "BTCUSDT",
            "fundingRate": "0.0001",
            "fundingRateTimestamp": ts.to_string()
        })
    };

    Mock::given(method("GET"))
        .and(path("/v5/market/funding/history"))
        .and(query_param("endTime", "100000"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(ok(json!({
                "category": "linear",
                "list": [rate(30_000), rate(20_000)]
            }))),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v5/market/funding/history"))
        .and(query_param("endTime", "19999"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok(json!({"category": "linear", "list": [rate(10_000)]}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v5/market/funding/history"))
        .and(query_param("endTime", "9999"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(ok(json!({"category": "linear", "list": []}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = build_public_client(&server);
    let rates = client
        .get_funding_rates(Category::Linear, "BTCUSDT", 1_000, 100_000, 200)
        .await
        .unwrap();

    let timestamps: Vec<i64> = rates.iter().map(|r| r.funding_rate_timestamp).collect();
    assert_eq!(timestamps, vec![10_000, 20_000, 30_000]);
}

#[tokio::test]
async fn test_instruments_follow_cursor_and_are_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v5/market/instruments-info"))
        .and(query_param("cursor", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "category": "linear",
            "list": [{"symbol": "ETHUSDT", "priceFilter": {"tickSize": "0.01"}}],
            "nextPageCursor": ""
        }))))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v5/market/instruments-info"))
        .and(query_param("category", "linear"))
        .and(query_param("limit", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "category": "linear",
            "list": [{"symbol": "BTCUSDT", "priceFilter": {"tickSize": "0.10"}}],
            "nextPageCursor": "page2"
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_public_client(&server);
    let all = client
        .get_instruments_info(Category::Linear, None, false)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let eth = client
        .get_instrument(Category::Linear, "ETHUSDT")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(eth.price_filter.tick_size, Decimal::new(1, 2));
    assert!(
        client
            .get_instrument(Category::Linear, "SOLUSDT")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_server_time_in_millis() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v5/market/time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "timeSecond": "1688639403",
            "timeNano": "1688639403423213947"
        }))))
        .mount(&server)
        .await;

    let client = build_public_client(&server);
    assert_eq!(client.get_server_time().await.unwrap(), 1_688_639_403_423);
}

#[tokio::test]
async fn test_rate_limit_headers_switch_to_server_mode() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v5/market/tickers"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Bapi-Limit-Status", "42")
                .insert_header("X-Bapi-Limit-Reset-Timestamp", "1700000001000")
                .set_body_json(ok(json!({
                    "category": "linear",
                    "list": [{
                        "symbol": "BTCUSDT",
                        "lastPrice": "43000.5",
                        "bid1Price": "43000",
                        "ask1Price": "43001"
                    }]
                }))),
        )
        .mount(&server)
        .await;

    let client = build_public_client(&server);
    assert!(!client.rate_limiter().is_server_driven().await);

    let tickers = client
        .get_tickers(Category::Linear, Some("BTCUSDT"))
        .await
        .unwrap();
    assert_eq!(tickers[0].last_price, Decimal::new(430005, 1));

    assert!(client.rate_limiter().is_server_driven().await);
    assert_eq!(client.rate_limiter().remaining().await, 42);
}

#[tokio::test]
async fn test_api_error_surfaces_ret_code() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v5/market/tickers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retCode": 10001,
            "retMsg": "params error: symbol invalid",
            "result": {},
            "retExtInfo": {},
            "time": 1
        })))
        .mount(&server)
        .await;

    let client = build_public_client(&server);
    match client.get_tickers(Category::Linear, Some("NOPE")).await {
        Err(BybitError::Api(e)) => {
            assert_eq!(e.code, 10001);
            assert!(e.message.contains("symbol invalid"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_http_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v5/market/time"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let client = build_public_client(&server);
    match client.get_server_time().await {
        Err(BybitError::HttpStatus { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected HTTP status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_signed_get_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v5/account/wallet-balance"))
        .and(query_param("accountType", "UNIFIED"))
        .and(header("X-BAPI-API-KEY", "test_key"))
        .and(header("X-BAPI-SIGN-TYPE", "2"))
        .and(header("X-BAPI-RECV-WINDOW", "25000"))
        .and(header_exists("X-BAPI-SIGN"))
        .and(header_exists("X-BAPI-TIMESTAMP"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "list": [{
                "accountType": "UNIFIED",
                "totalEquity": "1000.5",
                "coin": [{"coin": "USDT", "equity": "1000.5", "walletBalance": "1000"}]
            }]
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server);
    let balance = client
        .get_wallet_balance(AccountType::Unified, None)
        .await
        .unwrap();
    assert_eq!(balance.list.len(), 1);
    assert_eq!(balance.list[0].coins[0].coin, "USDT");
}

#[tokio::test]
async fn test_private_call_without_credentials() {
    let server = MockServer::start().await;
    let client = build_public_client(&server);

    let result = client.get_wallet_balance(AccountType::Unified, None).await;
    assert!(matches!(result, Err(BybitError::MissingCredentials)));
}

#[tokio::test]
async fn test_place_order_rounds_to_instrument_steps() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v5/order/create"))
        .and(body_partial_json(json!({
            "category": "linear",
            "symbol": "BTCUSDT",
            "side": "Buy",
            "orderType": "Limit",
            "qty": "0.012",
            "price": "25000.0",
            "timeInForce": "GTC",
            "api_key": "test_key",
            "recv_window": 25000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "orderId": "1321003749386327552",
            "orderLinkId": "link-1"
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server);
    client.set_instruments(Category::Linear, vec![btc_instrument()]);

    let order = Order::limit(
        Category::Linear,
        "BTCUSDT",
        Side::Buy,
        "0.0123456".parse().unwrap(),
        "25000.04".parse().unwrap(),
    )
    .with_order_link_id("link-1");
    let id = client.place_order(&order).await.unwrap();

    assert_eq!(id.order_id, "1321003749386327552");
    assert_eq!(id.order_link_id, "link-1");

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body["sign"].as_str().is_some_and(|s| s.len() == 64));
    assert!(body.get("takeProfit").is_none());
    assert!(body.get("tpTriggerBy").is_none());
}

#[tokio::test]
async fn test_place_order_rejects_qty_too_large_for_step() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v5/order/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({}))))
        .expect(0)
        .mount(&server)
        .await;

    let client = build_client(&server);
    client.set_instruments(Category::Linear, vec![btc_instrument()]);

    let order = Order::market(Category::Linear, "BTCUSDT", Side::Buy, Decimal::MAX);
    let result = client.place_order(&order).await;

    assert!(matches!(result, Err(BybitError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_close_all_positions_sends_opposite_market_orders() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v5/position/list"))
        .and(query_param("settleCoin", "USDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "category": "linear",
            "list": [
                {"symbol": "BTCUSDT", "side": "Buy", "size": "0.5", "positionIdx": 0},
                {"symbol": "ETHUSDT", "side": "", "size": "0", "positionIdx": 0}
            ]
        }))))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v5/order/create"))
        .and(body_partial_json(json!({
            "symbol": "BTCUSDT",
            "side": "Sell",
            "orderType": "Market",
            "qty": "0.500",
            "positionIdx": 0
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok(json!({"orderId": "close-1", "orderLinkId": ""}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server);
    client.set_instruments(Category::Linear, vec![btc_instrument()]);

    let closed = client
        .close_all_positions(Category::Linear, Some("USDT"))
        .await
        .unwrap();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].order_id, "close-1");
}

#[tokio::test]
async fn test_cancel_order_by_link_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v5/order/cancel"))
        .and(body_partial_json(json!({"symbol": "BTCUSDT", "orderLinkId": "link-9"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok(json!({"orderId": "42", "orderLinkId": "link-9"}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server);
    let id = client
        .cancel_order(Category::Linear, "BTCUSDT", None, Some("link-9"))
        .await
        .unwrap();
    assert_eq!(id.order_id, "42");

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("orderId").is_none());

    let missing = client
        .cancel_order(Category::Linear, "BTCUSDT", None, None)
        .await;
    assert!(matches!(missing, Err(BybitError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_set_position_mode_not_modified_is_ok() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v5/position/switch-mode"))
        .and(body_partial_json(json!({"category": "linear", "coin": "USDT", "mode": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retCode": 110025,
            "retMsg": "Position mode is not modified",
            "result": {},
            "retExtInfo": {},
            "time": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server);
    client
        .set_position_mode(Category::Linear, PositionMode::BothSides, None, Some("USDT"))
        .await
        .unwrap();

    let invalid = client
        .set_position_mode(Category::Linear, PositionMode::MergedSingle, None, None)
        .await;
    assert!(matches!(invalid, Err(BybitError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_set_position_mode_other_error_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v5/position/switch-mode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retCode": 10001,
            "retMsg": "params error",
            "result": {},
            "retExtInfo": {},
            "time": 1
        })))
        .mount(&server)
        .await;

    let client = build_client(&server);
    let result = client
        .set_position_mode(Category::Linear, PositionMode::BothSides, Some("BTCUSDT"), None)
        .await;
    assert!(matches!(result, Err(BybitError::Api(e)) if e.code == 10001));
}
