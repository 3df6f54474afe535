use kube::api::ObjectMeta;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::*;

/// Identity used to index in-flight reconcile state: `name.namespace`.
pub fn tracking_key(meta: &ObjectMeta) -> String {
    format!(
        "{}.{}",
        meta.name.as_deref().unwrap_or_default(),
        meta.namespace.as_deref().unwrap_or_default()
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TrackingEntry {
    Desired,
    WaitingOn(String),
}

/// Records which keys are currently desired, and what a retrying attempt is
/// waiting on. Unregistering a key makes in-flight attempts for it skip their
/// remaining status updates.
#[derive(Debug, Default)]
pub struct TrackingRegistry {
    tracking: Mutex<HashMap<String, TrackingEntry>>,
}

impl TrackingRegistry {
    pub fn new() -> Self {
        TrackingRegistry::default()
    }

    pub fn register(&self, key: &str, waiting_on: Option<&str>) {
        let entry = match waiting_on {
            Some(waiting_on) => TrackingEntry::WaitingOn(waiting_on.to_string()),
            None => TrackingEntry::Desired,
        };
        self.entries().insert(key.to_string(), entry);
    }

    pub fn unregister(&self, key: &str) {
        let removed = self.entries().remove(key);
        if let Some(TrackingEntry::WaitingOn(waiting_on)) = removed {
            info!("stopped retrying {} (was waiting on {})", key, waiting_on);
        }
    }

    pub fn is_tracking(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    /// What the attempt for `key` is retrying for, if it is retrying.
    #[cfg(test)]
    pub fn waiting_on(&self, key: &str) -> Option<String> {
        match self.entries().get(key) {
            Some(TrackingEntry::WaitingOn(waiting_on)) => Some(waiting_on.clone()),
            _ => None,
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, TrackingEntry>> {
        // The map holds no invariants spanning several operations, so a
        // poisoned lock is still usable.
        self.tracking
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
