// ── Runtime client configuration ──
//
// Describes *where* the service lives and *how* to stay in sync with it.
// Never touches disk: `foundation-config` (or the caller) builds a
// `ClientConfig` and hands it in.

use secrecy::SecretString;
use url::Url;

use foundation_api::{DialPolicy, TransportConfig};

/// Client identity plus transport and realtime tuning.
///
/// Immutable once handed to [`Foundation`](crate::Foundation).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL, e.g. `https://flags.example.com`.
    pub url: Url,
    /// Sent as `X-Api-Key` and as the realtime `apiKey` query parameter.
    pub api_key: SecretString,
    /// Default user identifier for variable lookups.
    pub uid: Option<String>,
    pub transport: TransportConfig,
    pub realtime: RealtimeConfig,
}

impl ClientConfig {
    pub fn new(url: Url, api_key: SecretString) -> Self {
        Self {
            url,
            api_key,
            uid: None,
            transport: TransportConfig::default(),
            realtime: RealtimeConfig::default(),
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn with_realtime(mut self, realtime: RealtimeConfig) -> Self {
        self.realtime = realtime;
        self
    }
}

/// Push channel settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeConfig {
    /// Spawn the push channel at construction. Default: `true`.
    pub enabled: bool,
    /// Behavior when dialing fails. Default: retry with backoff.
    pub dial_policy: DialPolicy,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dial_policy: DialPolicy::default(),
        }
    }
}

impl RealtimeConfig {
    /// No push channel: the cache only fills and never invalidates.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}
