use crate::tracking::tracking_key;
use futures::StreamExt;
use kube::{
    api::{Api, ListParams},
    runtime::watcher,
    Resource,
};
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::*;

const WATCH_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceEventType {
    Added,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceMeta {
    pub name: String,
    pub namespace: Option<String>,
    pub id: Option<String>,
    pub resource_version: Option<String>,
}

impl ResourceMeta {
    pub fn of<K: Resource>(object: &K) -> Self {
        let meta = object.meta();
        ResourceMeta {
            name: meta.name.clone().unwrap_or_default(),
            namespace: meta.namespace.clone(),
            id: meta.uid.clone(),
            resource_version: meta.resource_version.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceEvent<K> {
    pub event_type: ResourceEventType,
    pub object: K,
    pub meta: ResourceMeta,
}

impl<K: Resource> ResourceEvent<K> {
    pub fn new(event_type: ResourceEventType, object: K) -> Self {
        let meta = ResourceMeta::of(&object);
        ResourceEvent {
            event_type,
            object,
            meta,
        }
    }
}

/// Receives typed watch events from the watch driver. Implementations must
/// return promptly; slow work belongs on a spawned task.
pub trait Reconciler<K>: Send + Sync {
    fn dispatch(&self, event: ResourceEvent<K>);
}

/// Turns the watcher's applied/deleted/restarted stream into
/// Added/Modified/Deleted events by remembering which keys exist.
#[derive(Debug)]
pub struct EventTranslator<K> {
    known: HashMap<String, K>,
}

impl<K> Default for EventTranslator<K> {
    fn default() -> Self {
        EventTranslator {
            known: HashMap::new(),
        }
    }
}

impl<K: Resource + Clone> EventTranslator<K> {
    pub fn translate(&mut self, event: watcher::Event<K>) -> Vec<ResourceEvent<K>> {
        match event {
            watcher::Event::Applied(object) => vec![self.applied(object)],
            watcher::Event::Deleted(object) => {
                self.known.remove(&tracking_key(object.meta()));
                vec![ResourceEvent::new(ResourceEventType::Deleted, object)]
            }
            watcher::Event::Restarted(objects) => {
                let present: HashSet<String> =
                    objects.iter().map(|o| tracking_key(o.meta())).collect();
                let vanished: Vec<String> = self
                    .known
                    .keys()
                    .filter(|key| !present.contains(*key))
                    .cloned()
                    .collect();
                let mut events: Vec<ResourceEvent<K>> = vanished
                    .iter()
                    .filter_map(|key| self.known.remove(key))
                    .map(|object| ResourceEvent::new(ResourceEventType::Deleted, object))
                    .collect();
                events.extend(objects.into_iter().map(|object| self.applied(object)));
                events
            }
        }
    }

    fn applied(&mut self, object: K) -> ResourceEvent<K> {
        let key = tracking_key(object.meta());
        let event_type = if self.known.insert(key, object.clone()).is_some() {
            ResourceEventType::Modified
        } else {
            ResourceEventType::Added
        };
        ResourceEvent::new(event_type, object)
    }
}

/// Watches every object of kind `K` and feeds the translated events to the
/// reconciler. Watch errors are logged and the watch continues.
pub async fn run_watch<K, R>(api: Api<K>, reconciler: Arc<R>)
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + 'static,
    R: Reconciler<K> + ?Sized,
{
    let mut translator = EventTranslator::default();
    let mut stream = Box::pin(watcher(api, ListParams::default()));
    while let Some(event) = stream.next().await {
        match event {
            Ok(event) => {
                for event in translator.translate(event) {
                    debug!(
                        "{:?} {}/{}",
                        event.event_type,
                        event.meta.namespace.as_deref().unwrap_or_default(),
                        event.meta.name
                    );
                    reconciler.dispatch(event);
                }
            }
            Err(err) => {
                warn!("watch failed: {}, will retry", err);
                tokio::time::sleep(WATCH_RETRY_DELAY).await;
            }
        }
    }
    info!("watch terminated");
}
