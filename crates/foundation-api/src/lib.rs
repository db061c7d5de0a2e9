// foundation-api: HTTP and realtime transport for the Foundation configuration service

pub mod client;
pub mod error;
pub mod models;
pub mod realtime;
pub mod transport;

pub use client::{API_KEY_HEADER, ApiClient, RawResponse};
pub use error::Error;
pub use models::{ConfigurationEnvelope, PushEnvelope, VariableRequest};
pub use realtime::{
    ConnectionState, DialPolicy, Dialer, MessageSink, MessageStream, RealtimeHandle,
    ReconnectConfig, TungsteniteDialer, realtime_url,
};
pub use reqwest::StatusCode;
pub use transport::{TlsMode, TransportConfig};
