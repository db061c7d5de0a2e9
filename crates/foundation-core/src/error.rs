// ── Core error types ──
//
// The three failure kinds a caller of the resolver can see: the transport
// failed, the server answered with a non-200 status, or the answer did not
// have the expected JSON shape. `Config` covers construction problems.

use foundation_api::RawResponse;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Network, dial, or read failure, propagated from `foundation-api`.
    #[error("Transport error: {0}")]
    Transport(#[source] foundation_api::Error),

    /// Non-200 response. `Display` is exactly the response body.
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// Malformed JSON or an unexpected shape, with the raw body for debugging.
    #[error("Decode error: {message}")]
    Decode { message: String, body: String },

    /// Invalid client configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Build a `Remote` error from a non-200 response.
    pub(crate) fn remote(resp: RawResponse) -> Self {
        Self::Remote {
            status: resp.status.as_u16(),
            message: resp.body,
        }
    }

    pub(crate) fn decode(err: &serde_json::Error, body: &str) -> Self {
        Self::Decode {
            message: err.to_string(),
            body: body.to_owned(),
        }
    }

    /// HTTP status of a `Remote` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<foundation_api::Error> for CoreError {
    fn from(err: foundation_api::Error) -> Self {
        match err {
            foundation_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            foundation_api::Error::UnsupportedScheme(scheme) => CoreError::Config {
                message: format!("Unsupported URL scheme '{scheme}' (expected http or https)"),
            },
            foundation_api::Error::InvalidApiKey(reason) => CoreError::Config {
                message: format!("Invalid API key: {reason}"),
            },
            other => CoreError::Transport(other),
        }
    }
}
