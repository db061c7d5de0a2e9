// ── Foundation client ──
//
// Public facade: lazy cached reads through the resolver, a single
// observer slot, and the realtime loop that keeps the cache coherent.

use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use foundation_api::{
    ApiClient, ConnectionState, Dialer, RealtimeHandle, TungsteniteDialer, realtime_url,
};

use crate::config::ClientConfig;
use crate::dispatch::Dispatcher;
use crate::error::CoreError;
use crate::observer::ObserverSlot;
use crate::resolver::Resolver;
use crate::store::CacheStore;

/// Client for the Foundation configuration service.
///
/// Cheaply cloneable via `Arc<ClientInner>`. Construction spawns the
/// realtime loop (when enabled), which invalidates and eagerly refetches
/// cached state as the service pushes events. The loop stops on
/// [`shutdown`](Self::shutdown) or when the last clone is dropped.
#[derive(Clone)]
pub struct Foundation {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    config: ClientConfig,
    pub(crate) resolver: Resolver,
    pub(crate) observer: ObserverSlot,
    cancel: CancellationToken,
    realtime: OnceLock<RealtimeHandle>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Foundation {
    /// Build a client and start the realtime loop over WebSocket.
    ///
    /// Must be called inside a Tokio runtime when realtime is enabled.
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        Self::with_dialer(config, TungsteniteDialer)
    }

    /// Build a client whose realtime loop dials through `dialer`.
    pub fn with_dialer<D: Dialer>(config: ClientConfig, dialer: D) -> Result<Self, CoreError> {
        let api = ApiClient::new(&config.url, &config.api_key, &config.transport)?;
        let ws_url = if config.realtime.enabled {
            if tokio::runtime::Handle::try_current().is_err() {
                return Err(CoreError::Config {
                    message: "realtime sync requires a Tokio runtime".into(),
                });
            }
            Some(realtime_url(&config.url, &config.api_key)?)
        } else {
            None
        };

        let inner = Arc::new(ClientInner {
            resolver: Resolver::new(api, config.uid.clone()),
            observer: ObserverSlot::default(),
            cancel: CancellationToken::new(),
            realtime: OnceLock::new(),
            config,
        });

        if let Some(ws_url) = ws_url {
            let handle = RealtimeHandle::spawn(
                ws_url,
                inner.config.realtime.dial_policy.clone(),
                dialer,
                Dispatcher::new(Arc::downgrade(&inner)),
                inner.cancel.clone(),
            );
            let _ = inner.realtime.set(handle);
            info!(url = %inner.config.url, "realtime sync started");
        } else {
            debug!("realtime sync disabled");
        }

        Ok(Self { inner })
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Read-only access to cached state.
    pub fn store(&self) -> &CacheStore {
        self.inner.resolver.store()
    }

    // ── Resolver operations ──────────────────────────────────────────

    /// Environment metadata (`GET /v1/environment`), cached until the
    /// service pushes `environment.updated`.
    pub async fn get_environment(&self) -> Result<Value, CoreError> {
        self.inner.resolver.environment().await
    }

    /// Configuration (`GET /v1/configuration`), cached until the service
    /// pushes `configuration.published`.
    pub async fn get_configuration(&self) -> Result<Value, CoreError> {
        self.inner.resolver.configuration().await
    }

    /// Value of variable `name` (`POST /v1/variable`).
    ///
    /// `uid` overrides the client's default user id for this call only.
    /// Returns `fallback` when the service answers 404.
    pub async fn get_variable(
        &self,
        name: &str,
        uid: Option<&str>,
        fallback: Option<Value>,
    ) -> Result<Option<Value>, CoreError> {
        self.inner.resolver.variable(name, uid, fallback).await
    }

    // ── Subscription ─────────────────────────────────────────────────

    /// Register the observer, replacing any previous one.
    ///
    /// Called from the realtime task after each handled event with the
    /// event name, the refreshed data, and the refetch error, if any.
    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(&str, Option<&Value>, Option<&CoreError>) + Send + Sync + 'static,
    {
        self.inner.observer.set(observer);
    }

    /// Remove the observer. Events still refresh the cache.
    pub fn unsubscribe(&self) {
        self.inner.observer.clear();
    }

    pub fn is_subscribed(&self) -> bool {
        self.inner.observer.is_set()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Watch the push channel state. `None` when realtime is disabled.
    pub fn connection_state(&self) -> Option<watch::Receiver<ConnectionState>> {
        self.inner.realtime.get().map(RealtimeHandle::state)
    }

    /// Stop the realtime loop. Cached reads keep working.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
        debug!("realtime sync shut down");
    }
}
