//! WebSocket client owning the I/O thread.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::thread::JoinHandle;

use tokio::sync::{mpsc, watch};

use crate::error::BybitError;
use crate::ws::config::WsConfig;
use crate::ws::messages::Event;
use crate::ws::session::{ConnectionState, DataCallback, Session};

/// Bybit public stream client.
///
/// All subscriptions share one [`Session`], created on the first
/// [`subscribe`](Self::subscribe) and driven by a dedicated thread started
/// with [`run`](Self::run). When the session ends, the next subscribe opens
/// a new one. Dropping the client stops the thread.
///
/// # Example
///
/// ```rust,no_run
/// use bybit_api_client::ws::{WebSocketClient, WsConfig};
///
/// fn main() -> Result<(), bybit_api_client::BybitError> {
///     let client = WebSocketClient::with_callback(WsConfig::default(), |event| {
///         println!("{}: {}", event.topic, event.data);
///     });
///     client.subscribe("tickers.BTCUSDT")?;
///     client.run()?;
///     std::thread::sleep(std::time::Duration::from_secs(5));
///     Ok(())
/// }
/// ```
pub struct WebSocketClient {
    config: WsConfig,
    session: Mutex<Option<Arc<Session>>>,
    callback: Arc<RwLock<Option<DataCallback>>>,
    running: Arc<AtomicBool>,
    sessions: mpsc::UnboundedSender<Arc<Session>>,
    pending_sessions: Mutex<Option<mpsc::UnboundedReceiver<Arc<Session>>>>,
    shutdown: watch::Sender<bool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl WebSocketClient {
    pub fn new(config: WsConfig) -> Self {
        let (sessions, receiver) = mpsc::unbounded_channel();
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            session: Mutex::new(None),
            callback: Arc::new(RwLock::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            sessions,
            pending_sessions: Mutex::new(Some(receiver)),
            shutdown,
            thread: Mutex::new(None),
        }
    }

    /// Create a client delivering events to `callback`.
    pub fn with_callback<F>(config: WsConfig, callback: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let client = Self::new(config);
        client.set_data_callback(callback);
        client
    }

    /// Set the callback invoked on the I/O thread for every data event.
    pub fn set_data_callback<F>(&self, callback: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let mut slot = match self.callback.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(Arc::new(callback));
    }

    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    /// Start the I/O thread. Calling it again while running does nothing.
    ///
    /// Subscriptions made before `run` are buffered and connected once the
    /// thread starts.
    pub fn run(&self) -> Result<(), BybitError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let Some(mut sessions) = lock(&self.pending_sessions).take() else {
            return Ok(());
        };

        let callback = self.callback.clone();
        let on_event: DataCallback = Arc::new(move |event: &Event| {
            let current = match callback.read() {
                Ok(guard) => guard.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            };
            if let Some(callback) = current {
                callback(event);
            }
        });
        let mut shutdown = self.shutdown.subscribe();
        let running = self.running.clone();

        let spawned = std::thread::Builder::new()
            .name("bybit-ws".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to build WebSocket runtime");
                        running.store(false, Ordering::SeqCst);
                        return;
                    }
                };

                let mut current: Option<Arc<Session>> = None;
                loop {
                    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                        runtime.block_on(process(
                            &mut sessions,
                            &mut shutdown,
                            &on_event,
                            &mut current,
                        ))
                    }));

                    match outcome {
                        Ok(()) => break,
                        Err(_) => {
                            tracing::error!("WebSocket processing loop panicked, restarting");
                            if let Some(session) = current.take() {
                                session.mark_closed();
                            }
                        }
                    }
                }

                running.store(false, Ordering::SeqCst);
                tracing::debug!("WebSocket thread stopped");
            });

        match spawned {
            Ok(handle) => {
                *lock(&self.thread) = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    /// Whether the I/O thread is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Subscribe to a topic such as `tickers.BTCUSDT` or `kline.1.BTCUSDT`.
    pub fn subscribe(&self, filter: &str) -> Result<(), BybitError> {
        let mut slot = lock(&self.session);

        if let Some(session) = slot.as_ref().filter(|session| session.is_alive()) {
            match session.subscribe(filter) {
                Err(_) if !session.is_alive() => {
                    tracing::debug!(filter, "Session closed while subscribing, opening a new one");
                }
                result => return result,
            }
        }

        let session = Arc::new(Session::new(self.config.clone()));
        session.subscribe(filter)?;
        self.sessions
            .send(session.clone())
            .map_err(|_| BybitError::WebSocketMsg("WebSocket thread has stopped".to_string()))?;
        *slot = Some(session);
        Ok(())
    }

    /// Whether `filter` is subscribed on the current session.
    pub fn is_subscribed(&self, filter: &str) -> bool {
        lock(&self.session)
            .as_ref()
            .is_some_and(|session| session.is_subscribed(filter))
    }

    /// State of the current session, if one was created.
    pub fn connection_state(&self) -> Option<ConnectionState> {
        lock(&self.session).as_ref().map(|session| session.state())
    }
}

/// Run sessions one after another until shutdown.
async fn process(
    sessions: &mut mpsc::UnboundedReceiver<Arc<Session>>,
    shutdown: &mut watch::Receiver<bool>,
    on_event: &DataCallback,
    current: &mut Option<Arc<Session>>,
) {
    loop {
        if *shutdown.borrow() {
            return;
        }

        let session = tokio::select! {
            session = sessions.recv() => match session {
                Some(session) => session,
                None => return,
            },
            _ = shutdown.changed() => return,
        };
        *current = Some(session.clone());

        tokio::select! {
            result = session.run(on_event.clone()) => {
                if result.is_ok() {
                    tracing::info!("WebSocket session ended");
                }
            }
            _ = shutdown.changed() => {
                session.mark_closed();
                return;
            }
        }
        *current = None;
    }
}

impl Drop for WebSocketClient {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = lock(&self.thread).take() {
            if handle.join().is_err() {
                tracing::error!("WebSocket thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for WebSocketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketClient")
            .field("url", &self.config.url)
            .field("running", &self.is_running())
            .field("state", &self.connection_state())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_subscribed_without_session() {
        let client = WebSocketClient::new(WsConfig::default());
        assert!(!client.is_subscribed("tickers.BTCUSDT"));
        assert!(client.connection_state().is_none());
    }

    #[test]
    fn test_subscribe_before_run_is_buffered() {
        let client = WebSocketClient::new(WsConfig::default());
        client.subscribe("tickers.BTCUSDT").unwrap();
        client.subscribe("kline.1.BTCUSDT").unwrap();

        assert_eq!(client.connection_state(), Some(ConnectionState::Idle));
        assert!(!client.is_running());
    }

    #[test]
    fn test_empty_filter_rejected() {
        let client = WebSocketClient::new(WsConfig::default());
        assert!(client.subscribe("").is_err());
        assert!(client.connection_state().is_none());
    }

    #[test]
    fn test_subscribe_after_session_ends_opens_new_session() {
        let client = WebSocketClient::new(WsConfig::default());
        client.subscribe("tickers.BTCUSDT").unwrap();
        let first = lock(&client.session).clone().unwrap();
        first.mark_closed();

        client.subscribe("tickers.ETHUSDT").unwrap();
        let second = lock(&client.session).clone().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.state(), ConnectionState::Idle);
        assert!(first.subscribe("kline.1.BTCUSDT").is_err());
    }

    #[test]
    fn test_run_is_idempotent_and_drop_joins() {
        let client = WebSocketClient::new(WsConfig::default());
        client.run().unwrap();
        client.run().unwrap();
        assert!(client.is_running());
        drop(client);
    }
}
