use crate::documents::string_to_resources;
use crate::error::Error;
use crate::kubectl::ResourceAccessor;
use crate::kustomization_types::*;
use crate::kustomize::Transformer;
use crate::ownership::OwnershipMerger;
use crate::session::Session;
use crate::tracking::{tracking_key, TrackingRegistry};
use kube::api::DynamicObject;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::*;

/// Lower bound of the wait between two attempts, in milliseconds.
pub const MIN_RETRY_INTERVAL_MS: u64 = 5000;

/// Fixed interval between attempts for a given retry budget.
pub fn retry_interval_ms(retry_timeout_ms: u64) -> u64 {
    MIN_RETRY_INTERVAL_MS.max(retry_timeout_ms / 10)
}

/// Resolves the selectors of a Kustomization against the cluster, renders the
/// result through the transformer, and applies the rendered objects.
#[derive(Clone)]
pub struct PatchPipeline {
    accessor: Arc<dyn ResourceAccessor>,
    transformer: Arc<dyn Transformer>,
    ownership: OwnershipMerger,
    workdir_root: PathBuf,
}

impl PatchPipeline {
    pub fn new(
        accessor: Arc<dyn ResourceAccessor>,
        transformer: Arc<dyn Transformer>,
        ownership: OwnershipMerger,
        workdir_root: impl Into<PathBuf>,
    ) -> Self {
        PatchPipeline {
            accessor,
            transformer,
            ownership,
            workdir_root: workdir_root.into(),
        }
    }

    /// Manifest stubs for every selector, defaulting the namespace to the one
    /// of the Kustomization.
    pub fn selector_manifests(resource: &Kustomization) -> Vec<Value> {
        let namespace = resource.metadata.namespace.as_deref().unwrap_or_default();
        resource
            .spec
            .resources
            .iter()
            .flatten()
            .map(|selector| {
                json!({
                    "apiVersion": selector.api_version(),
                    "kind": selector.kind,
                    "metadata": {
                        "name": selector.name,
                        "namespace": selector.namespace.as_deref().unwrap_or(namespace),
                    },
                })
            })
            .collect()
    }

    /// Fetches the live objects named by the selectors. Without a namespace
    /// or selectors there is nothing to fetch.
    pub async fn get_resources(&self, resource: &Kustomization) -> Result<Vec<DynamicObject>, Error> {
        if resource.metadata.namespace.is_none() {
            return Ok(vec![]);
        }
        let manifests = Self::selector_manifests(resource);
        if manifests.is_empty() {
            return Ok(vec![]);
        }
        self.accessor.get(&manifests).await
    }

    /// Renders the Kustomization, retrying at a fixed interval until the retry
    /// budget of the Kustomization runs out. When `tracking` is given and the key stops
    /// being tracked while waiting, the attempt is abandoned.
    pub async fn patch(
        &self,
        resource: &Kustomization,
        tracking: Option<&TrackingRegistry>,
    ) -> Result<Vec<DynamicObject>, Error> {
        let retry_timeout = resource.retry_timeout_ms();
        let wait_time = retry_interval_ms(retry_timeout);
        let key = tracking_key(&resource.metadata);
        let mut time_left = i64::try_from(retry_timeout).unwrap_or(i64::MAX);
        loop {
            let err = match self.try_patch(resource).await {
                Ok(patched) => {
                    if let Some(tracking) = tracking {
                        if tracking.is_tracking(&key) {
                            tracking.register(&key, None);
                        }
                    }
                    return Ok(patched);
                }
                Err(err) => err,
            };
            if time_left <= 0 {
                return Err(err);
            }
            warn!(
                "received the following error, but will retry in {}ms and will keep retrying until {}ms expires\n{}",
                wait_time,
                time_left,
                err.stderr()
                    .filter(|stderr| !stderr.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| err.to_string())
            );
            if let Some(tracking) = tracking {
                if !tracking.is_tracking(&key) {
                    return Err(Error::Abandoned(resource.full_name()));
                }
                tracking.register(&key, Some(&format!("patches for {}", resource.full_name())));
            }
            tokio::time::sleep(Duration::from_millis(wait_time)).await;
            if let Some(tracking) = tracking {
                if !tracking.is_tracking(&key) {
                    return Err(Error::Abandoned(resource.full_name()));
                }
            }
            time_left = time_left.saturating_sub(i64::try_from(wait_time).unwrap_or(i64::MAX));
        }
    }

    async fn try_patch(&self, resource: &Kustomization) -> Result<Vec<DynamicObject>, Error> {
        let resources = self.get_resources(resource).await?;
        let expected = resource.spec.resources.as_ref().map_or(0, Vec::len);
        if resources.len() < expected {
            return Err(Error::ResolutionIncomplete(resource.full_name()));
        }
        if resources.is_empty() {
            return Ok(vec![]);
        }
        let mut session = Session::new(&self.workdir_root);
        let rendered = self.render(&mut session, resource, &resources).await;
        let cleaned = session.cleanup();
        let patched = rendered.map_err(|source| Error::TransformFailed {
            name: resource.full_name(),
            source: Box::new(source),
        })?;
        cleaned?;
        info!("applied patches for {}", resource.full_name());
        Ok(patched)
    }

    async fn render(
        &self,
        session: &mut Session,
        resource: &Kustomization,
        resources: &[DynamicObject],
    ) -> Result<Vec<DynamicObject>, Error> {
        session.set_resources(resources).await?;
        session.set_kustomization(&resource.spec).await?;
        let workdir = session.workdir(".").await?;
        let output = self.transformer.build(&workdir).await?;
        string_to_resources(&output)
    }

    /// Renders the Kustomization and applies every rendered object except
    /// Kustomizations, with the owner reference attached, in one batch.
    pub async fn apply(
        &self,
        resource: &Kustomization,
        tracking: Option<&TrackingRegistry>,
    ) -> Result<(), Error> {
        let owner_namespace = resource.metadata.namespace.as_deref().unwrap_or_default();
        let patched = self.patch(resource, tracking).await?;
        let resources = patched
            .into_iter()
            .filter(|object| {
                object.types.as_ref().map(|types| types.kind.as_str()) != Some(KUSTOMIZATION_KIND)
            })
            .map(|object| {
                if object.metadata.name.is_none() {
                    return Err(Error::MissingObjectKey(".metadata.name"));
                }
                if object.metadata.namespace.is_none() {
                    return Err(Error::MissingObjectKey(".metadata.namespace"));
                }
                Ok(self.ownership.attach(object, resource, owner_namespace))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        if resources.is_empty() {
            return Ok(());
        }
        self.accessor
            .apply(&resources)
            .await
            .map_err(|source| Error::ApplyFailed {
                name: resource.full_name(),
                source: Box::new(source),
            })
    }
}
