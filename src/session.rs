use crate::documents::resources_to_string;
use crate::error::Error;
use crate::kustomization_types::KustomizationSpec;
use crate::kustomize::OverlayDescriptor;
use kube::api::DynamicObject;
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::*;

pub const QUERIED_RESOURCES_PATH: &str = "resources/_queried.yaml";
pub const KUSTOMIZATION_PATH: &str = "kustomization.yaml";
pub const KUSTOMIZE_CONFIG_PATH: &str = "kustomizeconfig.yaml";

const WORKDIR_PREFIX: &str = "kustomize-operator-";

/// Ephemeral workspace of one reconcile attempt. The directory is created on
/// the first write and removed by `cleanup` or, at the latest, on drop.
#[derive(Debug)]
pub struct Session {
    root: PathBuf,
    workdir: Option<TempDir>,
}

impl Session {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Session {
            root: root.into(),
            workdir: None,
        }
    }

    /// Path of the workspace directory, if it has been created.
    #[cfg(test)]
    pub fn path(&self) -> Option<&std::path::Path> {
        self.workdir.as_ref().map(TempDir::path)
    }

    /// Resolves `relative` inside the workspace, creating the workspace and
    /// the parent directories of the resolved path as needed.
    pub async fn workdir(&mut self, relative: &str) -> Result<PathBuf, Error> {
        let workdir = match self.workdir.take() {
            Some(dir) => dir,
            None => {
                let dir = tempfile::Builder::new()
                    .prefix(WORKDIR_PREFIX)
                    .tempdir_in(&self.root)
                    .map_err(Error::SessionFailed)?;
                debug!("Created session workspace {}", dir.path().display());
                dir
            }
        };
        let resolved = workdir.path().join(relative);
        self.workdir = Some(workdir);
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(Error::SessionFailed)?;
        }
        Ok(resolved)
    }

    pub async fn set_resources(&mut self, resources: &[DynamicObject]) -> Result<(), Error> {
        let path = self.workdir(QUERIED_RESOURCES_PATH).await?;
        let manifest = resources_to_string(resources)?;
        tokio::fs::write(&path, manifest)
            .await
            .map_err(Error::SessionFailed)
    }

    /// Writes the overlay descriptor, plus the transformer configuration file
    /// when the Kustomization sets `configuration`.
    pub async fn set_kustomization(&mut self, spec: &KustomizationSpec) -> Result<(), Error> {
        let mut descriptor = OverlayDescriptor::from_spec(spec, QUERIED_RESOURCES_PATH);
        if let Some(configuration) = &spec.configuration {
            let config_path = self.workdir(KUSTOMIZE_CONFIG_PATH).await?;
            tokio::fs::write(&config_path, serde_yaml::to_string(configuration)?)
                .await
                .map_err(Error::SessionFailed)?;
            descriptor.configurations = Some(vec![KUSTOMIZE_CONFIG_PATH.to_string()]);
        }
        let path = self.workdir(KUSTOMIZATION_PATH).await?;
        tokio::fs::write(&path, serde_yaml::to_string(&descriptor)?)
            .await
            .map_err(Error::SessionFailed)
    }

    /// Removes the workspace. Calling it again is a no-op.
    pub fn cleanup(&mut self) -> Result<(), Error> {
        match self.workdir.take() {
            Some(dir) => {
                debug!("Removing session workspace {}", dir.path().display());
                dir.close().map_err(Error::SessionFailed)
            }
            None => Ok(()),
        }
    }
}
