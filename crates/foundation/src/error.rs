//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use foundation_config::ConfigError;
use foundation_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the Foundation service")]
    #[diagnostic(
        code(foundation::connection_failed),
        help(
            "Check the service URL and network access.\n\
             Use --insecure (-k) for development servers with self-signed certificates."
        )
    )]
    ConnectionFailed {
        #[source]
        source: CoreError,
    },

    #[error("Realtime channel could not be established")]
    #[diagnostic(
        code(foundation::realtime_failed),
        help("Run with -vv to see dial errors.")
    )]
    RealtimeFailed,

    // ── Service responses ────────────────────────────────────────────

    #[error("Service returned {status}: {message}")]
    #[diagnostic(code(foundation::remote))]
    Remote { status: u16, message: String },

    #[error("Unexpected response from service: {message}")]
    #[diagnostic(code(foundation::decode), help("Run with -vv to see the raw body."))]
    Decode { message: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(foundation::no_credentials),
        help(
            "Pass --api-key, set FOUNDATION_API_KEY, or add api_key_env to the profile."
        )
    )]
    NoCredentials { profile: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(foundation::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No service configured")]
    #[diagnostic(
        code(foundation::no_config),
        help(
            "Pass --url and --api-key, or create a profile in:\n\
             {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(foundation::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(foundation::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(
        code(foundation::json),
        help("--fallback takes a JSON value, e.g. '\"off\"' or 'false'.")
    )]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::RealtimeFailed => exit_code::CONNECTION,
            Self::NoCredentials { .. } | Self::Remote { status: 401 | 403, .. } => exit_code::AUTH,
            Self::Remote { status: 404, .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::Json(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Remote { status, message } => CliError::Remote { status, message },
            CoreError::Decode { message, body } => {
                tracing::debug!(body, "undecodable response body");
                CliError::Decode { message }
            }
            CoreError::Config { message } => CliError::Validation {
                field: "configuration".into(),
                reason: message,
            },
            transport @ CoreError::Transport(_) => CliError::ConnectionFailed { source: transport },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Figment(err) => CliError::Config(err),
        }
    }
}
