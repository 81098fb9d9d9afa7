//! Single request/response HTTP transport with Bybit request signing.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use reqwest::header::{CONNECTION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde::Serialize;
use serde_json::Value;

use crate::auth::{CredentialsProvider, DEFAULT_RECV_WINDOW, SignedHeaders, sign_body};
use crate::error::BybitError;
use crate::rest::endpoints::BYBIT_BASE_URL;

/// Raw HTTP response. The body is not interpreted.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Settings a transport is built from.
///
/// Kept by the REST client so the transport can be rebuilt when
/// credentials change.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub user_agent: Option<String>,
    pub recv_window: u64,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: BYBIT_BASE_URL.to_string(),
            user_agent: None,
            recv_window: DEFAULT_RECV_WINDOW,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Performs one request per call over a fresh connection.
///
/// GET requests are signed with headers over the query string, POST
/// requests embed the signature in the JSON body. Requests are sent unsigned
/// when no credentials are configured. Nothing is retried.
#[derive(Clone)]
pub struct HttpTransport {
    http_client: ClientWithMiddleware,
    config: TransportConfig,
    credentials: Option<Arc<dyn CredentialsProvider>>,
}

impl HttpTransport {
    /// Build a transport.
    pub fn new(config: TransportConfig, credentials: Option<Arc<dyn CredentialsProvider>>) -> Self {
        let mut headers = HeaderMap::new();
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("bybit-api-client/{}", env!("CARGO_PKG_VERSION")));
        let header_value = HeaderValue::from_str(&user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("bybit-api-client"));
        headers.insert(USER_AGENT, header_value);
        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        let reqwest_client = reqwest::Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(0)
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let http_client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        Self {
            http_client,
            config,
            credentials,
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Send a GET request with `params` as the query string.
    pub async fn get<Q>(&self, path: &str, params: &Q) -> Result<HttpResponse, BybitError>
    where
        Q: Serialize + ?Sized,
    {
        let query_string = serde_urlencoded::to_string(params)
            .map_err(|e| BybitError::InvalidArgument(e.to_string()))?;
        let url = if query_string.is_empty() {
            format!("{}{}", self.config.base_url, path)
        } else {
            format!("{}{}?{}", self.config.base_url, path, query_string)
        };

        let mut request = self.http_client.get(&url);

        if let Some(credentials) = &self.credentials {
            let signed = SignedHeaders::new(
                credentials.get_credentials(),
                timestamp_ms(),
                self.config.recv_window,
                &query_string,
            )?;
            for (name, value) in signed.pairs() {
                request = request.header(name, value);
            }
        }

        tracing::debug!(%url, "GET");
        let response = request.send().await?;
        Self::read_response(response).await
    }

    /// Send a POST request with `body` serialized as a JSON object.
    pub async fn post<B>(&self, path: &str, body: &B) -> Result<HttpResponse, BybitError>
    where
        B: Serialize + ?Sized,
    {
        let body = match serde_json::to_value(body)? {
            Value::Object(map) => map,
            other => {
                return Err(BybitError::InvalidArgument(format!(
                    "POST body must be a JSON object, got {other}"
                )));
            }
        };

        let body = match &self.credentials {
            Some(credentials) => sign_body(
                credentials.get_credentials(),
                timestamp_ms(),
                self.config.recv_window,
                body,
            )?,
            None => body,
        };

        let url = format!("{}{}", self.config.base_url, path);
        tracing::debug!(%url, "POST");
        let response = self
            .http_client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_string(&body)?)
            .send()
            .await?;

        Self::read_response(response).await
    }

    async fn read_response(response: reqwest::Response) -> Result<HttpResponse, BybitError> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.config.base_url)
            .field("recv_window", &self.config.recv_window)
            .field("has_credentials", &self.credentials.is_some())
            .finish()
    }
}

fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
