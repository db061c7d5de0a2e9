// ── Per-name variable cache ──
//
// One async mutex per variable name, created on first use and dropped
// again if the name never resolves. Readers of different names never
// contend; the map guard is never held across an await.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A resolved variable as returned by `POST /v1/variable`.
///
/// Carries at least `value`; every other server-supplied field is kept
/// as-is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableEntry(Map<String, Value>);

impl VariableEntry {
    /// The `value` field, if present.
    pub fn value(&self) -> Option<&Value> {
        self.0.get("value")
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// An entry with no fields counts as not cached.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Cache state of a single variable name.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum VariableSlot {
    /// Never requested.
    #[default]
    Vacant,
    /// Cleared by a push event; the next read refetches.
    Invalidated,
    /// Last successful response.
    Cached(VariableEntry),
}

impl VariableSlot {
    /// The cached entry, if it can be served without a fetch.
    pub fn fresh(&self) -> Option<&VariableEntry> {
        match self {
            Self::Cached(entry) if !entry.is_empty() => Some(entry),
            _ => None,
        }
    }
}

#[derive(Default)]
pub(crate) struct VariableTable {
    slots: DashMap<String, Arc<Mutex<VariableSlot>>>,
}

impl VariableTable {
    /// Lock the slot for `name`, creating it if needed.
    pub(crate) async fn lock(&self, name: &str) -> OwnedMutexGuard<VariableSlot> {
        let slot = Arc::clone(
            self.slots
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(Mutex::new(VariableSlot::Vacant)))
                .value(),
        );
        slot.lock_owned().await
    }

    /// Snapshot of the slot for `name`, without creating it.
    pub(crate) async fn peek(&self, name: &str) -> VariableSlot {
        let Some(slot) = self.slots.get(name).map(|r| Arc::clone(r.value())) else {
            return VariableSlot::Vacant;
        };
        slot.lock().await.clone()
    }

    /// Unlock `name`, dropping its slot if it never resolved and nobody
    /// else is waiting on it.
    pub(crate) fn release(&self, name: &str, guard: OwnedMutexGuard<VariableSlot>) {
        if *guard == VariableSlot::Vacant {
            let held = OwnedMutexGuard::mutex(&guard);
            // One reference in the map, one in `guard`.
            self.slots.remove_if(name, |_, slot| {
                Arc::ptr_eq(slot, held) && Arc::strong_count(slot) == 2
            });
        }
        drop(guard);
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(v: Value) -> VariableEntry {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn empty_entry_is_not_fresh() {
        let slot = VariableSlot::Cached(VariableEntry::default());
        assert!(slot.fresh().is_none());
    }

    #[test]
    fn cached_entry_is_fresh() {
        let slot = VariableSlot::Cached(entry(json!({ "value": 3, "rollout": 0.5 })));
        let fresh = slot.fresh().unwrap();
        assert_eq!(fresh.value(), Some(&json!(3)));
        assert_eq!(fresh.get("rollout"), Some(&json!(0.5)));
    }

    #[test]
    fn invalidated_is_not_fresh() {
        assert!(VariableSlot::Invalidated.fresh().is_none());
        assert!(VariableSlot::Vacant.fresh().is_none());
    }

    #[tokio::test]
    async fn peek_does_not_create_slot() {
        let table = VariableTable::default();
        assert_eq!(table.peek("ghost").await, VariableSlot::Vacant);
        assert_eq!(table.len(), 0);
    }

    #[tokio::test]
    async fn lock_creates_and_persists_slot() {
        let table = VariableTable::default();
        *table.lock("flag").await = VariableSlot::Cached(entry(json!({ "value": "on" })));

        assert_eq!(table.len(), 1);
        assert_eq!(
            table.peek("flag").await,
            VariableSlot::Cached(entry(json!({ "value": "on" })))
        );
    }

    #[tokio::test]
    async fn release_drops_unresolved_slot() {
        let table = VariableTable::default();
        let guard = table.lock("missing").await;
        table.release("missing", guard);
        assert_eq!(table.len(), 0);
    }

    #[tokio::test]
    async fn release_keeps_known_slots() {
        let table = VariableTable::default();

        let mut guard = table.lock("flag").await;
        *guard = VariableSlot::Cached(entry(json!({ "value": 1 })));
        table.release("flag", guard);

        let mut guard = table.lock("stale").await;
        *guard = VariableSlot::Invalidated;
        table.release("stale", guard);

        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn release_keeps_slot_with_waiter() {
        let table = VariableTable::default();
        let guard = table.lock("busy").await;
        let waiter = Arc::clone(table.slots.get("busy").unwrap().value());

        table.release("busy", guard);

        assert_eq!(table.len(), 1);
        drop(waiter);
    }
}
