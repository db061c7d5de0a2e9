use thiserror::Error;

/// Top-level error type for the `foundation-api` crate.
///
/// Covers the failure modes of the two transports: the HTTP client used
/// for configuration, environment, and variable lookups, and the realtime
/// push channel. Status codes are never mapped here -- the HTTP layer hands
/// back status + body and lets `foundation-core` decide what they mean.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Base URL scheme has no realtime counterpart.
    #[error("Unsupported URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    /// API key cannot be carried in an HTTP header.
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Realtime ────────────────────────────────────────────────────
    /// Dialing the realtime endpoint failed.
    #[error("Realtime connection failed: {0}")]
    WebSocketConnect(String),

    /// Reading from an established realtime connection failed.
    #[error("Realtime read failed: {0}")]
    WebSocketRead(String),
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::WebSocketConnect(_) | Self::WebSocketRead(_) => true,
            _ => false,
        }
    }
}
