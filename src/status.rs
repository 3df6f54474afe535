use crate::error::Error;
use crate::kustomization_types::*;
use async_trait::async_trait;
use chrono::Utc;
use kube::{
    api::{Api, Patch, PatchParams},
    Client,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::*;

/// Access to the status sub-resource of Kustomization objects.
#[async_trait]
pub trait StatusClient: Send + Sync {
    /// Sends a JSON patch (RFC 6902 operation list) to the status sub-resource.
    async fn patch_status(&self, namespace: &str, name: &str, ops: Value) -> Result<(), Error>;

    async fn get_status(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<KustomizationStatus>, Error>;
}

pub struct KubeStatusClient {
    client: Client,
}

impl KubeStatusClient {
    pub fn new(client: Client) -> Self {
        KubeStatusClient { client }
    }
}

#[async_trait]
impl StatusClient for KubeStatusClient {
    async fn patch_status(&self, namespace: &str, name: &str, ops: Value) -> Result<(), Error> {
        let api = Api::<Kustomization>::namespaced(self.client.clone(), namespace);
        let patch: json_patch::Patch = serde_json::from_value(ops)?;
        api.patch_status(name, &PatchParams::default(), &Patch::<()>::Json(patch))
            .await
            .map_err(Error::StatusUpdateFailed)?;
        Ok(())
    }

    async fn get_status(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<KustomizationStatus>, Error> {
        let api = Api::<Kustomization>::namespaced(self.client.clone(), namespace);
        let kustomization = api.get_status(name).await.map_err(Error::StatusGetFailed)?;
        Ok(kustomization.status)
    }
}

/// Writes phase, message and readiness onto Kustomization objects.
#[derive(Clone)]
pub struct StatusReporter {
    client: Arc<dyn StatusClient>,
    track_previous_phase: bool,
}

impl StatusReporter {
    pub fn new(client: Arc<dyn StatusClient>) -> Self {
        StatusReporter {
            client,
            track_previous_phase: false,
        }
    }

    /// Reads the current status before every write and records its phase as
    /// `previousPhase` of the new status.
    pub fn with_previous_phase(mut self, track_previous_phase: bool) -> Self {
        self.track_previous_phase = track_previous_phase;
        self
    }

    /// Replaces the status of `resource`. Objects without a name or namespace
    /// cannot be addressed and are skipped silently.
    pub async fn update_status(
        &self,
        mut status: KustomizationStatus,
        resource: &Kustomization,
    ) -> Result<(), Error> {
        let (name, namespace) = match (
            resource.metadata.name.as_deref(),
            resource.metadata.namespace.as_deref(),
        ) {
            (Some(name), Some(namespace)) => (name, namespace),
            _ => return Ok(()),
        };
        if self.track_previous_phase {
            let previous = self.client.get_status(namespace, name).await?;
            status.previous_phase = previous
                .and_then(|previous| previous.phase)
                .map(|phase| phase.to_string());
        }
        status.last_update_time = Some(Utc::now().to_rfc3339());
        // "replace" needs an existing member; a fresh object has no status yet.
        let op = if resource.status.is_some() {
            "replace"
        } else {
            "add"
        };
        let ops = json!([{ "op": op, "path": "/status", "value": status }]);
        debug!(
            "Update status of {} to {}",
            resource.full_name(),
            status.phase.unwrap_or_default()
        );
        self.client.patch_status(namespace, name, ops).await
    }

    pub async fn get_status(
        &self,
        resource: &Kustomization,
    ) -> Result<Option<KustomizationStatus>, Error> {
        match (
            resource.metadata.name.as_deref(),
            resource.metadata.namespace.as_deref(),
        ) {
            (Some(name), Some(namespace)) => self.client.get_status(namespace, name).await,
            _ => Ok(None),
        }
    }
}
