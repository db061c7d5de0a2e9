// ── Event dispatcher ──
//
// Turns one realtime frame into a cache invalidation, an eager refetch,
// and an observer notification. Frames arrive one at a time from the
// connection loop, which waits for each dispatch to finish.

use std::sync::Weak;

use bytes::Bytes;
use foundation_api::MessageSink;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::client::ClientInner;
use crate::error::CoreError;
use crate::event::PushEvent;
use crate::observer::ObserverSlot;
use crate::resolver::Resolver;

/// [`MessageSink`] that feeds frames into a client.
///
/// Holds the client weakly so the connection loop does not keep it alive.
pub(crate) struct Dispatcher {
    client: Weak<ClientInner>,
}

impl Dispatcher {
    pub(crate) fn new(client: Weak<ClientInner>) -> Self {
        Self { client }
    }
}

impl MessageSink for Dispatcher {
    async fn deliver(&self, message: Bytes) {
        let Some(client) = self.client.upgrade() else {
            trace!("client dropped, discarding realtime message");
            return;
        };
        dispatch(&client.resolver, &client.observer, &message).await;
    }
}

/// Apply one frame. Malformed frames and unknown events change nothing.
pub(crate) async fn dispatch(resolver: &Resolver, observer: &ObserverSlot, frame: &[u8]) {
    let event = match PushEvent::decode(frame) {
        Ok(event) => event,
        Err(e) => {
            debug!(error = %e, "dropping malformed realtime message");
            return;
        }
    };

    let result = match &event {
        PushEvent::VariableUpdated { name } => {
            info!(name, "variable updated");
            resolver.store().invalidate_variable(name).await;
            resolver.variable(name, None, None).await
        }
        PushEvent::ConfigurationPublished => {
            info!("configuration published");
            resolver.store().invalidate_configuration().await;
            resolver.configuration().await.map(Some)
        }
        PushEvent::EnvironmentUpdated => {
            info!("environment updated");
            resolver.store().invalidate_environment().await;
            resolver.environment().await.map(Some)
        }
        PushEvent::Unknown(kind) => {
            debug!(kind, "ignoring unknown realtime event");
            return;
        }
    };

    report(observer, &event, result);
}

fn report(observer: &ObserverSlot, event: &PushEvent, result: Result<Option<Value>, CoreError>) {
    let (data, error) = match result {
        Ok(data) => (data, None),
        Err(e) => {
            warn!(event = event.name(), error = %e, "refetch after invalidation failed");
            (None, Some(e))
        }
    };

    if !observer.notify(event.name(), data.as_ref(), error.as_ref()) {
        trace!(event = event.name(), "no observer registered");
    }
}
