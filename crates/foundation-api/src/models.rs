// Wire shapes for the Foundation HTTP and realtime surfaces.
//
// Only the envelopes are typed; the payloads the server defines
// (configuration content, environment, variable values) stay as
// `serde_json::Value`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /v1/variable`.
///
/// `uid` is omitted entirely when no user identifier applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableRequest<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<&'a str>,
}

/// Response of `GET /v1/configuration`: `{ "content": ... }`.
///
/// `content` is normally a string which may itself hold JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigurationEnvelope {
    #[serde(default)]
    pub content: Option<Value>,
}

/// Frame received on the realtime channel: `{ "type": ..., "payload": {...} }`.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}
