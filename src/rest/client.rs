//! Bybit v5 REST API client implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::auth::{Credentials, CredentialsProvider};
use crate::error::{ApiError, BybitError};
use crate::rate_limit::RateLimiter;
use crate::rate_limit::limits::DEFAULT_LOCAL_CAPACITY;
use crate::rest::market::Instrument;
use crate::rest::transport::{HttpResponse, HttpTransport, TransportConfig};
use crate::types::Category;

/// The Bybit v5 REST API client.
///
/// Every call goes through the client's [`RateLimiter`] before it is sent
/// and feeds the response's limit headers back into it afterwards.
/// Clones share the limiter and the instrument cache.
///
/// # Example
///
/// ```rust,no_run
/// use bybit_api_client::rest::RestClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = RestClient::new();
///     let time = client.get_server_time().await?;
///     println!("Server time: {time}");
///     Ok(())
/// }
/// ```
///
/// For account endpoints, provide credentials:
///
/// ```rust,no_run
/// use bybit_api_client::rest::RestClient;
/// use bybit_api_client::types::{AccountType, Category};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = RestClient::with_credentials("api_key", "api_secret");
///     let balance = client.get_wallet_balance(AccountType::Unified, None).await?;
///     println!("Balance: {:?}", balance);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct RestClient {
    transport: HttpTransport,
    limiter: Arc<RateLimiter>,
    pub(crate) instruments: Arc<Mutex<HashMap<Category, Vec<Instrument>>>>,
}

impl RestClient {
    /// Create a new client with default settings and no credentials.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a client signing its requests with the given key pair.
    pub fn with_credentials(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self::builder()
            .credentials(Arc::new(Credentials::new(api_key, api_secret)))
            .build()
    }

    /// Create a new client builder.
    pub fn builder() -> RestClientBuilder {
        RestClientBuilder::new()
    }

    /// Replace the credentials.
    ///
    /// The transport is rebuilt with the new pair; the rate limiter and
    /// instrument cache are kept.
    pub fn set_credentials(&mut self, credentials: Arc<dyn CredentialsProvider>) {
        let config = self.transport.config().clone();
        self.transport = HttpTransport::new(config, Some(credentials));
    }

    /// The rate limiter shared by this client's calls.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Make an unauthenticated GET request.
    pub(crate) async fn public_get<T, Q>(&self, path: &str, params: &Q) -> Result<T, BybitError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.limiter.wait().await;
        let response = self.transport.get(path, params).await?;
        self.limiter.update(&response.headers).await;
        parse_response(response)
    }

    /// Make a signed GET request.
    pub(crate) async fn private_get<T, Q>(&self, path: &str, params: &Q) -> Result<T, BybitError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.require_credentials()?;
        self.public_get(path, params).await
    }

    /// Make a signed POST request.
    pub(crate) async fn private_post<T, B>(&self, path: &str, body: &B) -> Result<T, BybitError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.require_credentials()?;
        self.limiter.wait().await;
        let response = self.transport.post(path, body).await?;
        self.limiter.update(&response.headers).await;
        parse_response(response)
    }

    fn require_credentials(&self) -> Result<(), BybitError> {
        if self.transport.has_credentials() {
            Ok(())
        } else {
            Err(BybitError::MissingCredentials)
        }
    }
}

/// Check the HTTP status and the `retCode` of a response, then decode `result`.
fn parse_response<T>(response: HttpResponse) -> Result<T, BybitError>
where
    T: DeserializeOwned,
{
    if !response.status.is_success() {
        return Err(BybitError::HttpStatus {
            status: response.status.as_u16(),
            body: response.body,
        });
    }

    let parsed: BybitResponse = serde_json::from_str(&response.body).map_err(|e| {
        BybitError::InvalidResponse(format!(
            "Failed to parse response: {}. Body: {}",
            e, response.body
        ))
    })?;

    if parsed.ret_code != 0 {
        return Err(BybitError::Api(ApiError::new(parsed.ret_code, parsed.ret_msg)));
    }

    serde_json::from_value(parsed.result).map_err(|e| {
        BybitError::InvalidResponse(format!(
            "Failed to parse result: {}. Body: {}",
            e, response.body
        ))
    })
}

impl Default for RestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("transport", &self.transport)
            .finish()
    }
}

/// Builder for [`RestClient`].
pub struct RestClientBuilder {
    config: TransportConfig,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    local_rate_limit: u32,
}

impl RestClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: TransportConfig::default(),
            credentials: None,
            local_rate_limit: DEFAULT_LOCAL_CAPACITY,
        }
    }

    /// Set the base URL (useful for testnet or a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the credentials provider for authenticated requests.
    pub fn credentials(mut self, credentials: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the receive window sent with signed requests, in milliseconds.
    pub fn recv_window(mut self, recv_window_ms: u64) -> Self {
        self.config.recv_window = recv_window_ms;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Set the overall timeout of a single request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the requests per second allowed before the server reports limits.
    pub fn local_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.local_rate_limit = requests_per_second;
        self
    }

    /// Build the client.
    pub fn build(self) -> RestClient {
        RestClient {
            transport: HttpTransport::new(self.config, self.credentials),
            limiter: Arc::new(RateLimiter::new(self.local_rate_limit)),
            instruments: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for RestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Response envelope shared by all v5 endpoints.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitResponse {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    #[serde(default)]
    result: serde_json::Value,
    #[allow(dead_code)]
    #[serde(default)]
    ret_ext_info: serde_json::Value,
    #[allow(dead_code)]
    #[serde(default)]
    time: i64,
}
