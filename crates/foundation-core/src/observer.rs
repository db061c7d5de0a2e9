// ── Observer slot ──
//
// At most one callback at a time. Registering replaces the previous one;
// swaps are lock-free so the dispatcher never blocks on a subscriber.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde_json::Value;

use crate::error::CoreError;

type Callback = dyn Fn(&str, Option<&Value>, Option<&CoreError>) + Send + Sync;

struct Observer(Box<Callback>);

#[derive(Default)]
pub(crate) struct ObserverSlot {
    current: ArcSwapOption<Observer>,
}

impl ObserverSlot {
    pub(crate) fn set<F>(&self, callback: F)
    where
        F: Fn(&str, Option<&Value>, Option<&CoreError>) + Send + Sync + 'static,
    {
        self.current.store(Some(Arc::new(Observer(Box::new(callback)))));
    }

    pub(crate) fn clear(&self) {
        self.current.store(None);
    }

    pub(crate) fn is_set(&self) -> bool {
        self.current.load().is_some()
    }

    /// Call the current observer, if any. Returns whether one was called.
    pub(crate) fn notify(&self, event: &str, data: Option<&Value>, error: Option<&CoreError>) -> bool {
        let Some(observer) = self.current.load_full() else {
            return false;
        };
        (observer.0)(event, data, error);
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn notify_without_observer() {
        let slot = ObserverSlot::default();
        assert!(!slot.is_set());
        assert!(!slot.notify("configuration.published", None, None));
    }

    #[test]
    fn last_registration_wins() {
        let slot = ObserverSlot::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&seen);
        slot.set(move |event, _, _| first.lock().unwrap().push(format!("first:{event}")));
        let second = Arc::clone(&seen);
        slot.set(move |event, _, _| second.lock().unwrap().push(format!("second:{event}")));

        assert!(slot.notify("environment.updated", None, None));
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["second:environment.updated".to_string()]
        );
    }

    #[test]
    fn clear_removes_observer() {
        let slot = ObserverSlot::default();
        slot.set(|_, _, _| {});
        slot.clear();
        assert!(!slot.is_set());
    }
}
