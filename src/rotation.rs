use std::collections::HashMap;
use std::sync::Mutex;

/// The previously observed and the current version of one object.
#[derive(Debug, Clone, PartialEq)]
pub struct Rotation<K> {
    pub old_resource: Option<K>,
    pub new_resource: K,
}

/// Keeps the last two observed versions of every object key, so a Modified
/// event can be compared against the version seen before it.
#[derive(Debug)]
pub struct ResourceRotation<K> {
    resources: Mutex<HashMap<String, Rotation<K>>>,
}

impl<K> Default for ResourceRotation<K> {
    fn default() -> Self {
        ResourceRotation {
            resources: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Clone> ResourceRotation<K> {
    pub fn new() -> Self {
        ResourceRotation::default()
    }

    /// Records `new_resource` as the current version of `key` and returns it
    /// together with the version it replaced.
    pub fn rotate(&self, key: &str, new_resource: K) -> Rotation<K> {
        let mut resources = self
            .resources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let old_resource = resources.remove(key).map(|rotation| rotation.new_resource);
        let rotation = Rotation {
            old_resource,
            new_resource,
        };
        resources.insert(key.to_string(), rotation.clone());
        rotation
    }

    pub fn forget(&self, key: &str) {
        self.resources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
    }

    pub fn len(&self) -> usize {
        self.resources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
