//! Cached, push-invalidated client for the Foundation configuration service.
//!
//! - **[`Foundation`]**: Client facade. [`get_configuration`](Foundation::get_configuration),
//!   [`get_environment`](Foundation::get_environment) and
//!   [`get_variable`](Foundation::get_variable) return cached values and
//!   fetch lazily on a miss. Construction spawns the realtime loop.
//!
//! - **[`CacheStore`]**: Three independently locked regions
//!   (configuration, environment, variables by name).
//!
//! - **[`PushEvent`]**: Typed realtime events. Each one invalidates its
//!   region, triggers a refetch, and is reported to the single observer
//!   registered with [`subscribe`](Foundation::subscribe).

pub mod client;
pub mod config;
mod dispatch;
pub mod error;
pub mod event;
mod observer;
pub mod resolver;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::Foundation;
pub use config::{ClientConfig, RealtimeConfig};
pub use error::CoreError;
pub use event::PushEvent;
pub use resolver::Resolver;
pub use store::{CacheStore, VariableEntry, VariableSlot};

pub use foundation_api::{
    ConnectionState, DialPolicy, Dialer, MessageStream, ReconnectConfig, TlsMode,
    TransportConfig,
};
pub use serde_json::Value;
