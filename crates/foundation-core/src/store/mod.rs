// ── Cache store ──
//
// Three independent regions: configuration, environment, and variables
// by name. Each region has its own async mutex, held by the resolver for
// the whole check-fetch-store sequence so concurrent misses on a region
// collapse into one network call.

mod variables;

use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use tracing::debug;

pub use variables::{VariableEntry, VariableSlot};
use variables::VariableTable;

/// In-memory cache for everything fetched from the service.
///
/// `None` in the configuration or environment slot means "must fetch";
/// any stored value, even an empty object, is a hit.
#[derive(Default)]
pub struct CacheStore {
    configuration: Mutex<Option<Value>>,
    environment: Mutex<Option<Value>>,
    variables: VariableTable,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Region locks (resolver) ──────────────────────────────────────

    pub(crate) async fn configuration_slot(&self) -> MutexGuard<'_, Option<Value>> {
        self.configuration.lock().await
    }

    pub(crate) async fn environment_slot(&self) -> MutexGuard<'_, Option<Value>> {
        self.environment.lock().await
    }

    pub(crate) async fn variable_slot(&self, name: &str) -> OwnedMutexGuard<VariableSlot> {
        self.variables.lock(name).await
    }

    /// Give back a variable lock after a fetch that stored nothing.
    pub(crate) fn release_variable_slot(&self, name: &str, slot: OwnedMutexGuard<VariableSlot>) {
        self.variables.release(name, slot);
    }

    // ── Invalidation (dispatcher) ────────────────────────────────────

    /// Clear the configuration slot. Waits for an in-flight fetch.
    pub async fn invalidate_configuration(&self) {
        *self.configuration.lock().await = None;
        debug!("configuration invalidated");
    }

    /// Clear the environment slot. Waits for an in-flight fetch.
    pub async fn invalidate_environment(&self) {
        *self.environment.lock().await = None;
        debug!("environment invalidated");
    }

    /// Mark `name` as invalidated, distinct from never requested.
    pub async fn invalidate_variable(&self, name: &str) {
        *self.variables.lock(name).await = VariableSlot::Invalidated;
        debug!(name, "variable invalidated");
    }

    // ── Read-only peeks ──────────────────────────────────────────────

    /// Cached configuration, without fetching.
    pub async fn configuration(&self) -> Option<Value> {
        self.configuration.lock().await.clone()
    }

    /// Cached environment, without fetching.
    pub async fn environment(&self) -> Option<Value> {
        self.environment.lock().await.clone()
    }

    /// Cache state of one variable, without fetching.
    pub async fn variable(&self, name: &str) -> VariableSlot {
        self.variables.peek(name).await
    }

    /// Number of variable names cached or invalidated.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }
}
