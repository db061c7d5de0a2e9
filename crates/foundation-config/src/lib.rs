//! Shared configuration for Foundation clients.
//!
//! TOML profiles plus `FOUNDATION_*` environment overrides, credential
//! resolution (override + env + plaintext), and translation to
//! `foundation_core::ClientConfig`. The CLI layers its flags on top through
//! [`Overrides`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use foundation_core::{
    ClientConfig, DialPolicy, RealtimeConfig, ReconnectConfig, TlsMode, TransportConfig,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named explicitly.
    pub default_profile: Option<String>,

    /// Named service profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Profile names, sorted, for error messages.
    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// A named service profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Service base URL (e.g., "https://flags.example.com").
    pub url: String,

    /// API key (plaintext; prefer `api_key_env`).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Default user id for variable lookups.
    pub uid: Option<String>,

    /// Accept invalid TLS certificates.
    pub insecure: Option<bool>,

    /// Path to an extra CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,

    /// HTTP request timeout. Unset means no client-side timeout.
    pub timeout_secs: Option<u64>,

    /// Open the realtime push channel.
    #[serde(default = "default_realtime")]
    pub realtime: bool,

    /// What to do when dialing the push channel fails.
    #[serde(default)]
    pub dial_policy: DialPolicyMode,

    /// Give up after this many consecutive failed dials (retry mode only).
    pub max_retries: Option<u32>,
}

fn default_realtime() -> bool {
    true
}

impl Profile {
    /// A profile with only a URL, everything else defaulted.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            api_key_env: None,
            uid: None,
            insecure: None,
            ca_cert: None,
            timeout_secs: None,
            realtime: default_realtime(),
            dial_policy: DialPolicyMode::default(),
            max_retries: None,
        }
    }
}

/// TOML spelling of [`DialPolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DialPolicyMode {
    #[default]
    Retry,
    FailFast,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "teleology", "foundation").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("foundation");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path` + environment. A missing file is not an error.
///
/// Environment keys nest with `__`, e.g.
/// `FOUNDATION_PROFILES__STAGING__URL`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FOUNDATION_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Profile resolution ──────────────────────────────────────────────

/// Per-invocation settings that take precedence over the profile.
#[derive(Debug, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub api_key: Option<SecretString>,
    pub uid: Option<String>,
    pub insecure: bool,
    pub timeout_secs: Option<u64>,
    pub no_realtime: bool,
}

/// Name of the profile to use: explicit > config default > "default".
pub fn active_profile_name(explicit: Option<&str>, config: &Config) -> String {
    explicit
        .map(str::to_owned)
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Translate a `Profile` + overrides into a `ClientConfig`, reading
/// `api_key_env` from the process environment.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    overrides: &Overrides,
) -> Result<ClientConfig, ConfigError> {
    resolve_profile_with(profile, profile_name, overrides, |var| {
        std::env::var(var).ok()
    })
}

/// [`resolve_profile`] with a caller-supplied environment lookup.
pub fn resolve_profile_with(
    profile: &Profile,
    profile_name: &str,
    overrides: &Overrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientConfig, ConfigError> {
    // 1. Service URL (override > profile)
    let url_str = overrides.url.as_deref().unwrap_or(&profile.url);
    let url: url::Url = url_str.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {url_str}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "url".into(),
            reason: format!("expected an http or https URL, got '{url_str}'"),
        });
    }

    // 2. API key
    let api_key = resolve_api_key(profile, profile_name, overrides, env)?;

    // 3. TLS
    let tls = if overrides.insecure || profile.insecure.unwrap_or(false) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    // 4. Timeout (override > profile > none)
    let timeout = overrides
        .timeout_secs
        .or(profile.timeout_secs)
        .map(Duration::from_secs);

    // 5. Realtime
    let dial_policy = match profile.dial_policy {
        DialPolicyMode::FailFast => DialPolicy::FailFast,
        DialPolicyMode::Retry => DialPolicy::Retry(ReconnectConfig {
            max_retries: profile.max_retries,
            ..ReconnectConfig::default()
        }),
    };
    let realtime = RealtimeConfig {
        enabled: profile.realtime && !overrides.no_realtime,
        dial_policy,
    };

    Ok(ClientConfig {
        url,
        api_key,
        uid: overrides.uid.clone().or_else(|| profile.uid.clone()),
        transport: TransportConfig { tls, timeout },
        realtime,
    })
}

/// API key chain: override > `api_key_env` variable > plaintext.
fn resolve_api_key(
    profile: &Profile,
    profile_name: &str,
    overrides: &Overrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    if let Some(ref key) = overrides.api_key {
        return Ok(key.clone());
    }

    if let Some(val) = profile.api_key_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(val));
    }

    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}
