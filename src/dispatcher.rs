use crate::config::{ModifyPolicy, OperatorConfig};
use crate::error::Error;
use crate::kustomization_types::*;
use crate::patch_pipeline::PatchPipeline;
use crate::rotation::{ResourceRotation, Rotation};
use crate::status::StatusReporter;
use crate::tracking::{tracking_key, TrackingRegistry};
use crate::watch::{Reconciler, ResourceEvent, ResourceEventType};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::*;

/// Drives the Added/Modified/Deleted state machine of Kustomization objects.
///
/// Every event is handled on its own task, so attempts for different keys,
/// and successive attempts for the same key, may interleave. The rotation
/// table is updated before the task starts, in arrival order.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    pipeline: PatchPipeline,
    reporter: StatusReporter,
    tracking: TrackingRegistry,
    rotation: ResourceRotation<Kustomization>,
    modify_policy: ModifyPolicy,
    debug: bool,
}

impl Dispatcher {
    pub fn new(pipeline: PatchPipeline, reporter: StatusReporter, config: &OperatorConfig) -> Self {
        let reporter =
            reporter.with_previous_phase(config.modify_policy == ModifyPolicy::PreviousSuccess);
        Dispatcher {
            inner: Arc::new(DispatcherInner {
                pipeline,
                reporter,
                tracking: TrackingRegistry::new(),
                rotation: ResourceRotation::new(),
                modify_policy: config.modify_policy,
                debug: config.debug,
            }),
        }
    }

    pub fn tracking(&self) -> &TrackingRegistry {
        &self.inner.tracking
    }

    pub fn rotation(&self) -> &ResourceRotation<Kustomization> {
        &self.inner.rotation
    }

    /// Records the event in the rotation table and starts handling it without
    /// waiting for the outcome. Errors are logged on the spawned task.
    pub fn handle(&self, event: ResourceEvent<Kustomization>) -> JoinHandle<()> {
        let event_type = event.event_type;
        let key = tracking_key(&event.object.metadata);
        let rotation = self.inner.rotation.rotate(&key, event.object);
        if event_type == ResourceEventType::Deleted {
            self.inner.rotation.forget(&key);
        }
        let inner = self.inner.clone();
        tokio::spawn(async move { inner.handle_event(event_type, key, rotation).await })
    }
}

impl Reconciler<Kustomization> for Dispatcher {
    fn dispatch(&self, event: ResourceEvent<Kustomization>) {
        // The handle is dropped on purpose; the task keeps running.
        let _ = self.handle(event);
    }
}

impl DispatcherInner {
    async fn handle_event(
        &self,
        event_type: ResourceEventType,
        key: String,
        rotation: Rotation<Kustomization>,
    ) {
        let result = match event_type {
            ResourceEventType::Added => self.added(&key, &rotation.new_resource).await,
            ResourceEventType::Modified => self.modified(&key, &rotation).await,
            ResourceEventType::Deleted => {
                self.tracking.unregister(&key);
                Ok(())
            }
        };
        if let Err(err) = result {
            error!("{}", err.display_line());
            if self.debug {
                debug!("{:?}", err);
            }
        }
    }

    async fn added(&self, key: &str, resource: &Kustomization) -> Result<(), Error> {
        self.reconcile(key, resource, "creating kustomization", "created kustomization")
            .await
    }

    async fn modified(&self, key: &str, rotation: &Rotation<Kustomization>) -> Result<(), Error> {
        let resource = &rotation.new_resource;
        let old_generation = rotation
            .old_resource
            .as_ref()
            .and_then(|old| old.metadata.generation);
        if resource.metadata.generation == old_generation {
            return Ok(());
        }
        if self.modify_policy == ModifyPolicy::PreviousSuccess {
            let phase = self
                .reporter
                .get_status(resource)
                .await?
                .and_then(|status| status.phase);
            match phase {
                None | Some(KustomizationStatusPhase::Succeeded) | Some(KustomizationStatusPhase::Unknown) => {}
                Some(phase) => {
                    info!(
                        "skip modifying {}, previous reconciliation is {}",
                        resource.full_name(),
                        phase
                    );
                    return Ok(());
                }
            }
        }
        self.reconcile(key, resource, "modifying kustomization", "modified kustomization")
            .await
    }

    async fn reconcile(
        &self,
        key: &str,
        resource: &Kustomization,
        pending_message: &str,
        succeeded_message: &str,
    ) -> Result<(), Error> {
        self.tracking.register(key, None);
        let result = async {
            self.report(
                key,
                KustomizationStatus::new(KustomizationStatusPhase::Pending, pending_message, false),
                resource,
            )
            .await?;
            self.pipeline.apply(resource, Some(&self.tracking)).await?;
            self.report(
                key,
                KustomizationStatus::new(KustomizationStatusPhase::Succeeded, succeeded_message, true),
                resource,
            )
            .await
        }
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(Error::Abandoned(name)) => {
                info!("stopped reconciling {}", name);
                Ok(())
            }
            Err(err) => {
                if self.tracking.is_tracking(key) {
                    let failed =
                        KustomizationStatus::new(KustomizationStatusPhase::Failed, err.to_string(), false);
                    if let Err(status_err) = self.report(key, failed, resource).await {
                        warn!(
                            "failed to record failure of {}: {}",
                            resource.full_name(),
                            status_err.display_line()
                        );
                    }
                    self.tracking.unregister(key);
                }
                Err(err)
            }
        }
    }

    /// Status updates are skipped once the key stopped being tracked, so a
    /// deleted object does not get its status written by a stale attempt.
    async fn report(
        &self,
        key: &str,
        status: KustomizationStatus,
        resource: &Kustomization,
    ) -> Result<(), Error> {
        if !self.tracking.is_tracking(key) {
            debug!("{} is no longer tracked, skip status update", key);
            return Ok(());
        }
        self.reporter.update_status(status, resource).await
    }
}
