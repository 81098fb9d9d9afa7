//! A single WebSocket connection and its lifecycle.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, lookup_host};
use tokio::sync::Notify;
use tokio::time::{Instant, MissedTickBehavior, interval_at, timeout};
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, client_async};
use url::Url;

use crate::error::BybitError;
use crate::ws::config::WsConfig;
use crate::ws::messages::{ControlMessage, Event, Inbound, SubscribeRequest};

/// Callback receiving every decoded data event.
pub type DataCallback = Arc<dyn Fn(&Event) + Send + Sync>;

trait ByteStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> ByteStream for T {}

type WsStream = WebSocketStream<Box<dyn ByteStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Lifecycle of a [`Session`]. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Idle,
    Resolving,
    Connecting,
    TlsHandshaking,
    WsHandshaking,
    Subscribing,
    Streaming,
    Closing,
    Closed,
}

#[derive(Debug, Default)]
struct Subscriptions {
    /// Topics already requested from the server
    subscribed: Vec<String>,
    /// Requests waiting to be written
    pending: VecDeque<SubscribeRequest>,
}

impl Subscriptions {
    fn contains(&self, filter: &str) -> bool {
        self.subscribed.iter().any(|s| s == filter)
            || self
                .pending
                .iter()
                .any(|request| request.args.iter().any(|arg| arg == filter))
    }
}

/// One connection to a Bybit stream endpoint.
///
/// Subscriptions are queued with [`subscribe`](Self::subscribe) from any
/// thread and written by [`run`](Self::run). A session is never reconnected:
/// once [`run`](Self::run) returns it stays [`ConnectionState::Closed`].
#[derive(Debug)]
pub struct Session {
    config: WsConfig,
    state: Mutex<ConnectionState>,
    subscriptions: Mutex<Subscriptions>,
    wake: Notify,
}

impl Session {
    pub fn new(config: WsConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ConnectionState::Idle),
            subscriptions: Mutex::new(Subscriptions::default()),
            wake: Notify::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *lock(&self.state)
    }

    /// Whether the session can still carry new subscriptions.
    pub fn is_alive(&self) -> bool {
        !matches!(self.state(), ConnectionState::Closing | ConnectionState::Closed)
    }

    /// Queue a subscription. Topics already subscribed or queued are ignored.
    ///
    /// Fails once the session is closing; the request would never be sent.
    pub fn subscribe(&self, filter: &str) -> Result<(), BybitError> {
        if filter.is_empty() {
            return Err(BybitError::InvalidArgument(
                "subscription filter cannot be empty".to_string(),
            ));
        }

        {
            let mut subscriptions = lock(&self.subscriptions);
            if !self.is_alive() {
                return Err(BybitError::WebSocketMsg("session is closing".to_string()));
            }
            if subscriptions.contains(filter) {
                return Ok(());
            }
            subscriptions
                .pending
                .push_back(SubscribeRequest::subscribe(filter));
        }

        self.wake.notify_one();
        Ok(())
    }

    /// Whether a subscribe request for `filter` has been sent and not rejected.
    pub fn is_subscribed(&self, filter: &str) -> bool {
        lock(&self.subscriptions)
            .subscribed
            .iter()
            .any(|s| s == filter)
    }

    /// Mark the session as finished without running it to completion.
    pub(crate) fn mark_closed(&self) {
        self.end(ConnectionState::Closed);
    }

    /// Leave the live states under the subscription lock, so `subscribe`
    /// cannot queue onto the session past this point.
    fn end(&self, next: ConnectionState) {
        let _subscriptions = lock(&self.subscriptions);
        self.set_state(next);
    }

    fn set_state(&self, next: ConnectionState) {
        let mut state = lock(&self.state);
        if *state != next {
            tracing::debug!(from = ?*state, to = ?next, "WebSocket state");
            *state = next;
        }
    }

    /// Connect, subscribe and stream until the connection ends.
    ///
    /// Any failure ends the session; nothing is retried.
    pub async fn run(&self, on_event: DataCallback) -> Result<(), BybitError> {
        let result = self.connect_and_stream(&on_event).await;
        self.end(ConnectionState::Closed);
        if let Err(e) = &result {
            tracing::error!(url = %self.config.url, error = %e, "WebSocket session failed");
        }
        result
    }

    async fn connect_and_stream(&self, on_event: &DataCallback) -> Result<(), BybitError> {
        let url = Url::parse(&self.config.url)?;
        let host = url
            .host_str()
            .ok_or_else(|| BybitError::InvalidArgument(format!("No host in {url}")))?
            .to_string();
        let port = url.port_or_known_default().unwrap_or(443);
        let deadline = self.config.connect_timeout;

        self.set_state(ConnectionState::Resolving);
        let addresses: Vec<_> = with_timeout(deadline, lookup_host((host.as_str(), port)))
            .await??
            .collect();
        if addresses.is_empty() {
            return Err(BybitError::WebSocketMsg(format!("{host} did not resolve")));
        }

        self.set_state(ConnectionState::Connecting);
        let tcp = with_timeout(deadline, TcpStream::connect(&addresses[..])).await??;
        tcp.set_nodelay(true)?;

        let stream: Box<dyn ByteStream> = match url.scheme() {
            "wss" => {
                self.set_state(ConnectionState::TlsHandshaking);
                Box::new(with_timeout(deadline, tls_handshake(&host, tcp)).await??)
            }
            "ws" => Box::new(tcp),
            other => {
                return Err(BybitError::InvalidArgument(format!(
                    "Unsupported WebSocket scheme: {other}"
                )));
            }
        };

        self.set_state(ConnectionState::WsHandshaking);
        let (ws, _) = with_timeout(deadline, client_async(url.as_str(), stream)).await??;
        tracing::info!(url = %url, "WebSocket connected");

        self.stream(ws, on_event).await
    }

    async fn stream(&self, ws: WsStream, on_event: &DataCallback) -> Result<(), BybitError> {
        let (mut sink, mut reader) = ws.split();

        self.set_state(ConnectionState::Subscribing);
        self.write_pending(&mut sink).await?;
        self.set_state(ConnectionState::Streaming);

        let ping_interval = self.config.ping_interval;
        let mut ping_timer = interval_at(Instant::now() + ping_interval, ping_interval);
        ping_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_ping: Option<Instant> = None;
        let mut last_pong: Option<Instant> = None;

        loop {
            tokio::select! {
                frame = reader.next() => {
                    let Some(frame) = frame else {
                        tracing::info!("WebSocket closed by server");
                        return Ok(());
                    };

                    match frame? {
                        Message::Text(text) => {
                            if let Err(e) = self.handle_text(text.as_str(), on_event) {
                                tracing::error!(error = %e, "Unreadable frame, closing");
                                return self.close(&mut sink).await;
                            }
                        }
                        Message::Pong(_) => last_pong = Some(Instant::now()),
                        Message::Close(frame) => {
                            tracing::info!(?frame, "WebSocket close received");
                            return Ok(());
                        }
                        _ => {}
                    }

                    self.write_pending(&mut sink).await?;
                    if self.close_if_idle() {
                        tracing::warn!("No subscriptions left, closing");
                        return self.close(&mut sink).await;
                    }
                }
                _ = ping_timer.tick() => {
                    if let Some(ping) = last_ping {
                        let unanswered = match last_pong {
                            Some(pong) => ping.saturating_duration_since(pong),
                            None => ping.elapsed(),
                        };
                        if unanswered > ping_interval {
                            tracing::warn!(?unanswered, "Ping expired");
                        }
                    }

                    match sink.send(Message::Ping(Vec::new().into())).await {
                        Ok(()) => last_ping = Some(Instant::now()),
                        Err(e) => tracing::error!(error = %e, "Failed to send ping"),
                    }
                }
                _ = self.wake.notified() => {
                    self.write_pending(&mut sink).await?;
                }
            }
        }
    }

    /// Decode and dispatch one text frame.
    ///
    /// Only a frame that is not JSON at all is an error; messages that fail
    /// to decode are logged and skipped.
    fn handle_text(&self, text: &str, on_event: &DataCallback) -> Result<(), serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(text)?;

        match Inbound::from_value(value) {
            Ok(Inbound::Control(control)) => self.handle_control(&control),
            Ok(Inbound::Event(event)) => on_event(&event),
            Ok(Inbound::Other(value)) => tracing::debug!(%value, "Ignoring message"),
            Err(e) => tracing::error!(error = %e, "Failed to decode message"),
        }
        Ok(())
    }

    fn handle_control(&self, control: &ControlMessage) {
        if control.success {
            tracing::debug!(
                op = control.operation(),
                req_id = %control.req_id,
                "Request acknowledged"
            );
            return;
        }

        let failed = control.failed_args();
        lock(&self.subscriptions)
            .subscribed
            .retain(|topic| !failed.contains(topic));
        tracing::error!(
            op = control.operation(),
            message = %control.ret_msg,
            topics = ?failed,
            "Bybit API error"
        );
    }

    /// Move the next queued request into the subscribed set and return it.
    fn next_request(&self) -> Option<SubscribeRequest> {
        let mut subscriptions = lock(&self.subscriptions);
        let request = subscriptions.pending.pop_front()?;
        for arg in &request.args {
            if !subscriptions.subscribed.contains(arg) {
                subscriptions.subscribed.push(arg.clone());
            }
        }
        Some(request)
    }

    async fn write_pending(&self, sink: &mut WsSink) -> Result<(), BybitError> {
        while let Some(request) = self.next_request() {
            let frame = serde_json::to_string(&request)?;
            tracing::debug!(%frame, "Subscribing");
            sink.send(Message::text(frame)).await?;
        }
        Ok(())
    }

    /// Move to `Closing` when nothing is subscribed or queued.
    ///
    /// The check and the state change happen under one lock, so a racing
    /// `subscribe` either lands first or is refused.
    fn close_if_idle(&self) -> bool {
        let subscriptions = lock(&self.subscriptions);
        let idle = subscriptions.subscribed.is_empty() && subscriptions.pending.is_empty();
        if idle {
            self.set_state(ConnectionState::Closing);
        }
        idle
    }

    async fn close(&self, sink: &mut WsSink) -> Result<(), BybitError> {
        self.end(ConnectionState::Closing);
        sink.close().await?;
        Ok(())
    }
}

async fn tls_handshake(
    host: &str,
    tcp: TcpStream,
) -> Result<tokio_rustls::client::TlsStream<TcpStream>, BybitError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder_with_provider(Arc::new(
        tokio_rustls::rustls::crypto::aws_lc_rs::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| BybitError::Tls(e.to_string()))?
    .with_root_certificates(roots)
    .with_no_client_auth();

    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| BybitError::Tls(format!("Invalid server name {host}: {e}")))?;

    TlsConnector::from(Arc::new(config))
        .connect(server_name, tcp)
        .await
        .map_err(|e| BybitError::Tls(e.to_string()))
}

async fn with_timeout<F: Future>(deadline: Duration, future: F) -> Result<F::Output, BybitError> {
    timeout(deadline, future)
        .await
        .map_err(|_| BybitError::Timeout)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
