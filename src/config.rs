use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// When a Modified event re-runs the patch pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ModifyPolicy {
    /// Whenever `metadata.generation` changed.
    #[default]
    GenerationChange,
    /// Only when the generation changed and the last reconciliation had
    /// succeeded (or never ran). Status writes record `previousPhase`.
    PreviousSuccess,
}

#[derive(Debug, Clone, Args)]
pub struct OperatorConfig {
    /// kubectl binary used to fetch and apply objects
    #[arg(long = "kubectl", env = "KUBECTL_BIN", default_value = "kubectl")]
    pub kubectl_bin: String,

    /// kustomize binary, invoked as `<bin> build .`
    #[arg(long = "kustomize", env = "KUSTOMIZE_BIN", default_value = "kustomize")]
    pub kustomize_bin: String,

    /// Parent directory of session workspaces [default: system temp dir]
    #[arg(long, env = "KUSTOMIZE_OPERATOR_WORKDIR")]
    pub workdir_root: Option<PathBuf>,

    #[arg(
        long,
        env = "KUSTOMIZE_OPERATOR_MODIFY_POLICY",
        value_enum,
        default_value_t = ModifyPolicy::GenerationChange
    )]
    pub modify_policy: ModifyPolicy,

    /// Mark the attached owner reference as the controller reference
    #[arg(long, env = "KUSTOMIZE_OPERATOR_CONTROLLER_OWNER")]
    pub controller_owner: bool,

    #[arg(long, env = "DEBUG")]
    pub debug: bool,
}

impl OperatorConfig {
    pub fn workdir_root(&self) -> PathBuf {
        self.workdir_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for OperatorConfig {
    fn default() -> Self {
        OperatorConfig {
            kubectl_bin: "kubectl".to_string(),
            kustomize_bin: "kustomize".to_string(),
            workdir_root: None,
            modify_policy: ModifyPolicy::default(),
            controller_owner: false,
            debug: false,
        }
    }
}
