// ── Resolver ──
//
// Lazy fetch-or-return-cached for configuration, environment, and
// variables. Every operation takes its cache region's lock first and
// keeps it until the slot is populated (or the fetch fails), so a second
// caller on the same region waits and then hits the cache.

use foundation_api::{ApiClient, ConfigurationEnvelope, RawResponse, VariableRequest};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::CoreError;
use crate::store::{CacheStore, VariableEntry, VariableSlot};

/// Fetches through [`ApiClient`] and caches in a [`CacheStore`].
pub struct Resolver {
    api: ApiClient,
    store: CacheStore,
    default_uid: Option<String>,
}

impl Resolver {
    pub fn new(api: ApiClient, default_uid: Option<String>) -> Self {
        Self {
            api,
            store: CacheStore::new(),
            default_uid,
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Environment metadata, fetched from `GET /v1/environment` on a miss.
    pub async fn environment(&self) -> Result<Value, CoreError> {
        let mut slot = self.store.environment_slot().await;
        if let Some(cached) = slot.as_ref() {
            trace!("environment cache hit");
            return Ok(cached.clone());
        }

        debug!("environment cache miss, fetching");
        let resp = ensure_ok(self.api.environment().await?)?;
        let value: Value =
            serde_json::from_str(&resp.body).map_err(|e| CoreError::decode(&e, &resp.body))?;

        // A bare `null` carries nothing worth caching.
        if !value.is_null() {
            *slot = Some(value.clone());
        }
        Ok(value)
    }

    /// Configuration, fetched from `GET /v1/configuration` on a miss.
    ///
    /// The envelope's `content` string is parsed again as JSON; when that
    /// fails the raw string is the configuration.
    pub async fn configuration(&self) -> Result<Value, CoreError> {
        let mut slot = self.store.configuration_slot().await;
        if let Some(cached) = slot.as_ref() {
            trace!("configuration cache hit");
            return Ok(cached.clone());
        }

        debug!("configuration cache miss, fetching");
        let resp = ensure_ok(self.api.configuration().await?)?;
        let value = decode_configuration(&resp.body)?;

        // An envelope without content leaves the slot empty, like a `null` environment.
        if !value.is_null() {
            *slot = Some(value.clone());
        }
        Ok(value)
    }

    /// The `value` of variable `name`.
    ///
    /// On a miss, posts `{name, uid?}` where `uid` is `uid_override`, else
    /// the client's default uid, else omitted. A 404 yields `fallback`
    /// without caching anything.
    pub async fn variable(
        &self,
        name: &str,
        uid_override: Option<&str>,
        fallback: Option<Value>,
    ) -> Result<Option<Value>, CoreError> {
        let mut slot = self.store.variable_slot(name).await;
        if let Some(entry) = slot.fresh() {
            trace!(name, "variable cache hit");
            return Ok(entry.value().cloned());
        }

        let uid = uid_override.or(self.default_uid.as_deref());
        debug!(name, has_uid = uid.is_some(), "variable cache miss, fetching");

        match self.fetch_variable(name, uid).await {
            Ok(Some(entry)) => {
                let value = entry.value().cloned();
                *slot = VariableSlot::Cached(entry);
                Ok(value)
            }
            Ok(None) => {
                debug!(name, "variable not found, using fallback");
                self.store.release_variable_slot(name, slot);
                Ok(fallback)
            }
            Err(e) => {
                self.store.release_variable_slot(name, slot);
                Err(e)
            }
        }
    }

    /// `None` when the service answers 404.
    async fn fetch_variable(
        &self,
        name: &str,
        uid: Option<&str>,
    ) -> Result<Option<VariableEntry>, CoreError> {
        let resp = self.api.variable(&VariableRequest { name, uid }).await?;
        if resp.is_not_found() {
            return Ok(None);
        }

        let resp = ensure_ok(resp)?;
        serde_json::from_str(&resp.body)
            .map(Some)
            .map_err(|e| CoreError::decode(&e, &resp.body))
    }
}

/// Anything but 200 is a `Remote` error carrying the body verbatim.
fn ensure_ok(resp: RawResponse) -> Result<RawResponse, CoreError> {
    if resp.is_ok() {
        Ok(resp)
    } else {
        debug!(status = resp.status.as_u16(), "remote error");
        Err(CoreError::remote(resp))
    }
}

/// Unwrap `{"content": ...}`, parsing string content as JSON when possible.
///
/// Missing or `null` content yields `null`. Only a body that is not an
/// envelope at all is a decode error.
fn decode_configuration(body: &str) -> Result<Value, CoreError> {
    let envelope: ConfigurationEnvelope =
        serde_json::from_str(body).map_err(|e| CoreError::decode(&e, body))?;

    match envelope.content {
        Some(Value::String(content)) => Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
            trace!(error = %e, "configuration content is not JSON, keeping raw string");
            Value::String(content)
        })),
        Some(Value::Null) | None => {
            debug!("configuration envelope has no content");
            Ok(Value::Null)
        }
        Some(structured) => Ok(structured),
    }
}
