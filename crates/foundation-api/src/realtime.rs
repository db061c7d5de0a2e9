//! Realtime push channel with auto-reconnect.
//!
//! Dials the service's `/v1/realtime` WebSocket endpoint and hands every
//! inbound frame to a [`MessageSink`], one at a time and in arrival order.
//! A read failure (including a remote close) drops the connection and dials
//! again immediately. What happens when the *dial* itself fails is decided
//! by [`DialPolicy`].
//!
//! # Example
//!
//! ```rust,ignore
//! use foundation_api::realtime::{realtime_url, DialPolicy, RealtimeHandle, TungsteniteDialer};
//! use tokio_util::sync::CancellationToken;
//!
//! let url = realtime_url(&base_url, &api_key)?;
//! let handle = RealtimeHandle::spawn(
//!     url,
//!     DialPolicy::default(),
//!     TungsteniteDialer,
//!     sink,
//!     CancellationToken::new(),
//! );
//!
//! // ...
//! handle.shutdown();
//! ```

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::Error;

/// Path of the realtime endpoint, relative to the base URL.
pub const REALTIME_PATH: &str = "/v1/realtime";

// ── Endpoint derivation ──────────────────────────────────────────────

/// Derive the realtime endpoint from the HTTP base URL.
///
/// `http` becomes `ws`, `https` becomes `wss`, `/v1/realtime` is appended to
/// the base path and the credential travels as the `apiKey` query parameter.
pub fn realtime_url(base_url: &Url, api_key: &SecretString) -> Result<Url, Error> {
    let scheme = match base_url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(Error::UnsupportedScheme(other.to_owned())),
    };

    let mut url = base_url.clone();
    url.set_scheme(scheme)
        .map_err(|()| Error::UnsupportedScheme(base_url.scheme().to_owned()))?;

    let path = format!("{}{REALTIME_PATH}", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_fragment(None);
    url.set_query(None);
    url.query_pairs_mut()
        .append_pair("apiKey", api_key.expose_secret());

    Ok(url)
}

/// The realtime URL with its query stripped, safe to log.
fn redacted(url: &Url) -> Url {
    let mut shown = url.clone();
    shown.set_query(None);
    shown
}

// ── Connection state ─────────────────────────────────────────────────

/// Lifecycle of the push channel, observable through [`RealtimeHandle::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// The loop stopped on its own after a dial failure.
    Failed,
}

// ── Dial policy ──────────────────────────────────────────────────────

/// Exponential backoff configuration for re-dialing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first re-dial. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum consecutive failed dials before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

/// What the loop does when dialing fails.
///
/// Read failures on an established connection always re-dial immediately;
/// this only governs the dial step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialPolicy {
    /// Stop the loop for good after the first failed dial.
    FailFast,
    /// Re-dial with exponential backoff.
    Retry(ReconnectConfig),
}

impl Default for DialPolicy {
    fn default() -> Self {
        Self::Retry(ReconnectConfig::default())
    }
}

// ── Transport seams ──────────────────────────────────────────────────

/// Inbound frames of one live connection. Ends or yields `Err` when the
/// connection is gone.
pub type MessageStream = BoxStream<'static, Result<Bytes, Error>>;

/// Opens push channel connections.
pub trait Dialer: Send + Sync + 'static {
    fn dial(&self, url: &Url) -> impl Future<Output = Result<MessageStream, Error>> + Send;
}

/// Receives every inbound frame, in order. The loop waits for `deliver`
/// to finish before reading the next frame.
pub trait MessageSink: Send + Sync + 'static {
    fn deliver(&self, message: Bytes) -> impl Future<Output = ()> + Send;
}

/// [`Dialer`] backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteDialer;

impl Dialer for TungsteniteDialer {
    async fn dial(&self, url: &Url) -> Result<MessageStream, Error> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        let frames = ws_stream.filter_map(|frame| async move {
            match frame {
                Ok(msg @ (Message::Text(_) | Message::Binary(_))) => Some(Ok(msg.into_data())),
                Ok(Message::Close(frame)) => {
                    let reason = frame.map_or_else(
                        || "no close payload".to_owned(),
                        |cf| format!("code {}: {}", cf.code, cf.reason),
                    );
                    Some(Err(Error::WebSocketRead(format!(
                        "closed by remote ({reason})"
                    ))))
                }
                Ok(_) => {
                    // tungstenite answers pings itself
                    trace!("control frame");
                    None
                }
                Err(e) => Some(Err(Error::WebSocketRead(e.to_string()))),
            }
        });

        Ok(frames.boxed())
    }
}

// ── RealtimeHandle ───────────────────────────────────────────────────

/// Handle to the running connection loop.
///
/// Call [`shutdown`](Self::shutdown) (or cancel the token passed to
/// [`spawn`](Self::spawn)) to stop it.
pub struct RealtimeHandle {
    cancel: CancellationToken,
    state: watch::Receiver<ConnectionState>,
    task: JoinHandle<()>,
}

impl RealtimeHandle {
    /// Spawn the dial-and-read loop on the current Tokio runtime.
    ///
    /// Returns immediately; the first dial happens asynchronously.
    pub fn spawn<D: Dialer, S: MessageSink>(
        url: Url,
        policy: DialPolicy,
        dialer: D,
        sink: S,
        cancel: CancellationToken,
    ) -> Self {
        let (state_tx, state) = watch::channel(ConnectionState::Disconnected);
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            realtime_loop(url, policy, dialer, sink, task_cancel, state_tx).await;
        });

        Self {
            cancel,
            state,
            task,
        }
    }

    /// Watch the connection state.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Signal the background task to stop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Wait for the loop to exit.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "realtime task ended abnormally");
        }
    }
}

// ── Background loop ──────────────────────────────────────────────────

enum ReadOutcome {
    Cancelled,
    Ended,
    Failed(Error),
}

/// Main loop: dial → read → on read failure, dial again.
async fn realtime_loop<D: Dialer, S: MessageSink>(
    url: Url,
    policy: DialPolicy,
    dialer: D,
    sink: S,
    cancel: CancellationToken,
    state: watch::Sender<ConnectionState>,
) {
    let shown = redacted(&url);
    let mut attempt: u32 = 0;

    loop {
        let _ = state.send(ConnectionState::Connecting);
        debug!(url = %shown, attempt, "dialing realtime endpoint");

        let dialed = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = dialer.dial(&url) => result,
        };

        let mut stream = match dialed {
            Ok(stream) => {
                attempt = 0;
                stream
            }
            Err(e) => {
                let DialPolicy::Retry(ref reconnect) = policy else {
                    error!(error = %e, url = %shown, "realtime dial failed, realtime sync stopped");
                    let _ = state.send(ConnectionState::Failed);
                    return;
                };

                if reconnect.max_retries.is_some_and(|max| attempt >= max) {
                    error!(
                        error = %e,
                        max_retries = reconnect.max_retries,
                        "realtime dial limit reached, giving up"
                    );
                    let _ = state.send(ConnectionState::Failed);
                    return;
                }

                let delay = calculate_backoff(attempt, reconnect);
                warn!(
                    error = %e,
                    transient = e.is_transient(),
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "realtime dial failed, waiting before retry"
                );
                let _ = state.send(ConnectionState::Disconnected);

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }

                attempt = attempt.saturating_add(1);
                continue;
            }
        };

        let _ = state.send(ConnectionState::Connected);
        info!(url = %shown, "realtime connected");

        let outcome = read_until_failure(&mut stream, &sink, &cancel).await;
        drop(stream);
        let _ = state.send(ConnectionState::Disconnected);

        match outcome {
            ReadOutcome::Cancelled => break,
            ReadOutcome::Ended => info!("realtime stream ended, reconnecting"),
            ReadOutcome::Failed(e) => warn!(error = %e, "realtime read failed, reconnecting"),
        }
    }

    let _ = state.send(ConnectionState::Disconnected);
    debug!("realtime loop exiting");
}

/// Hand frames to the sink until the connection fails or we are cancelled.
async fn read_until_failure<S: MessageSink>(
    stream: &mut MessageStream,
    sink: &S,
    cancel: &CancellationToken,
) -> ReadOutcome {
    loop {
        let frame = tokio::select! {
            biased;
            () = cancel.cancelled() => return ReadOutcome::Cancelled,
            frame = stream.next() => frame,
        };

        match frame {
            Some(Ok(message)) => {
                trace!(len = message.len(), "realtime frame");
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return ReadOutcome::Cancelled,
                    () = sink.deliver(message) => {}
                }
            }
            Some(Err(e)) => return ReadOutcome::Failed(e),
            None => return ReadOutcome::Ended,
        }
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from multiple clients.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn key() -> SecretString {
        SecretString::from("k3y".to_string())
    }

    #[test]
    fn http_base_becomes_ws() {
        let base = Url::parse("http://localhost:8080").unwrap();
        let url = realtime_url(&base, &key()).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8080/v1/realtime?apiKey=k3y");
    }

    #[test]
    fn https_base_with_path_becomes_wss() {
        let base = Url::parse("https://flags.example.com/api/").unwrap();
        let url = realtime_url(&base, &key()).unwrap();
        assert_eq!(
            url.as_str(),
            "wss://flags.example.com/api/v1/realtime?apiKey=k3y"
        );
    }

    #[test]
    fn api_key_is_query_encoded() {
        let base = Url::parse("https://flags.example.com").unwrap();
        let url = realtime_url(&base, &SecretString::from("a b&c".to_string())).unwrap();
        assert_eq!(url.query(), Some("apiKey=a+b%26c"));
    }

    #[test]
    fn unsupported_scheme_rejected() {
        let base = Url::parse("ftp://flags.example.com").unwrap();
        assert!(matches!(
            realtime_url(&base, &key()),
            Err(Error::UnsupportedScheme(s)) if s == "ftp"
        ));
    }

    #[test]
    fn redacted_url_hides_key() {
        let base = Url::parse("https://flags.example.com").unwrap();
        let url = realtime_url(&base, &key()).unwrap();
        assert!(!redacted(&url).as_str().contains("k3y"));
    }

    #[test]
    fn default_policy_retries_forever() {
        assert_eq!(
            DialPolicy::default(),
            DialPolicy::Retry(ReconnectConfig::default())
        );
        assert!(ReconnectConfig::default().max_retries.is_none());
    }

    #[test]
    fn backoff_increases_exponentially() {
        let config = ReconnectConfig::default();

        let d0 = calculate_backoff(0, &config);
        let d1 = calculate_backoff(1, &config);
        let d2 = calculate_backoff(2, &config);

        assert!(d1 > d0, "d1 ({d1:?}) should be greater than d0 ({d0:?})");
        assert!(d2 > d1, "d2 ({d2:?}) should be greater than d1 ({d1:?})");
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };

        let d10 = calculate_backoff(10, &config);
        // With jitter factor up to 1.25, max effective is 12.5s
        assert!(
            d10 <= Duration::from_secs(13),
            "delay at attempt 10 ({d10:?}) should be capped near max_delay"
        );
        assert!(calculate_backoff(u32::MAX, &config) <= Duration::from_secs(13));
    }
}
