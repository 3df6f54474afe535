use crate::command::Command;
use crate::error::Error;
use crate::kustomization_types::*;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Renders the overlay found in a session workspace into a multi-document
/// manifest.
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn build(&self, workdir: &Path) -> Result<String, Error>;
}

/// Transformer backed by the `kustomize` binary, run as `kustomize build .`
/// inside the workspace.
#[derive(Debug, Clone)]
pub struct Kustomize {
    command: Command,
}

impl Kustomize {
    pub fn new(program: impl Into<String>) -> Self {
        Kustomize {
            command: Command::new(program),
        }
    }
}

impl Default for Kustomize {
    fn default() -> Self {
        Kustomize::new("kustomize")
    }
}

#[async_trait]
impl Transformer for Kustomize {
    async fn build(&self, workdir: &Path) -> Result<String, Error> {
        let output = self
            .command
            .run(&["build", "."], None, Some(workdir))
            .await?;
        Ok(output.stdout)
    }
}

/// The `kustomization.yaml` written into a session workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayDescriptor {
    pub resources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configurations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_labels: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_annotations: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crds: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<Image>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patches: Option<Vec<Patch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patches_json6902: Option<Vec<PatchJson6902>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patches_strategic_merge: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<Vec<Replica>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vars: Option<Vec<Var>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_map_generator: Option<Vec<ConfigMapArgs>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_generator: Option<Vec<SecretArgs>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_options: Option<GeneratorOptions>,
}

impl OverlayDescriptor {
    /// Builds the descriptor over the queried resources file, copying every
    /// overlay field set on the Kustomization. Empty strings and maps are omitted.
    pub fn from_spec(spec: &KustomizationSpec, resources_path: &str) -> Self {
        OverlayDescriptor {
            resources: vec![resources_path.to_string()],
            configurations: None,
            common_labels: spec.common_labels.clone().filter(|m| !m.is_empty()),
            common_annotations: spec.common_annotations.clone().filter(|m| !m.is_empty()),
            crds: spec.crds.clone(),
            images: spec.images.clone(),
            name_prefix: spec.name_prefix.clone().filter(|s| !s.is_empty()),
            name_suffix: spec.name_suffix.clone().filter(|s| !s.is_empty()),
            namespace: spec.namespace.clone().filter(|s| !s.is_empty()),
            patches: spec.patches.clone(),
            patches_json6902: spec.patches_json6902.clone(),
            patches_strategic_merge: spec.patches_strategic_merge.clone(),
            replicas: spec.replicas.clone(),
            vars: spec.vars.clone(),
            config_map_generator: spec.config_map_generator.clone(),
            secret_generator: spec.secret_generator.clone(),
            generator_options: spec.generator_options.clone(),
        }
    }
}
