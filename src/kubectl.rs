use crate::command::Command;
use crate::documents::*;
use crate::error::Error;
use async_trait::async_trait;
use kube::api::DynamicObject;
use serde_json::Value;
use tracing::*;

/// Fetches, applies and deletes cluster objects by manifest.
#[async_trait]
pub trait ResourceAccessor: Send + Sync {
    /// Fetches every object named by the manifest stubs in one call.
    /// Objects that do not exist are left out of the result.
    async fn get(&self, manifests: &[Value]) -> Result<Vec<DynamicObject>, Error>;

    async fn apply(&self, resources: &[DynamicObject]) -> Result<(), Error>;

    async fn delete(&self, resources: &[DynamicObject]) -> Result<(), Error>;
}

/// Resource accessor backed by the `kubectl` binary.
#[derive(Debug, Clone)]
pub struct Kubectl {
    command: Command,
}

impl Kubectl {
    pub fn new(program: impl Into<String>) -> Self {
        Kubectl {
            command: Command::new(program),
        }
    }
}

impl Default for Kubectl {
    fn default() -> Self {
        Kubectl::new("kubectl")
    }
}

#[async_trait]
impl ResourceAccessor for Kubectl {
    async fn get(&self, manifests: &[Value]) -> Result<Vec<DynamicObject>, Error> {
        let stdin = resources_to_string(manifests)?;
        let output = self
            .command
            .run(
                &["get", "-f", "-", "-o", "json", "--ignore-not-found"],
                Some(&stdin),
                None,
            )
            .await?;
        parse_get_output(&output.stdout)
    }

    async fn apply(&self, resources: &[DynamicObject]) -> Result<(), Error> {
        let stdin = resources_to_string(resources)?;
        let output = self
            .command
            .run(&["apply", "-f", "-"], Some(&stdin), None)
            .await?;
        for line in output.stdout.lines() {
            info!("{}", line);
        }
        Ok(())
    }

    async fn delete(&self, resources: &[DynamicObject]) -> Result<(), Error> {
        let stdin = resources_to_string(resources)?;
        let output = self
            .command
            .run(
                &["delete", "-f", "-", "--ignore-not-found"],
                Some(&stdin),
                None,
            )
            .await?;
        for line in output.stdout.lines() {
            info!("{}", line);
        }
        Ok(())
    }
}

/// `kubectl get -o json` prints a `List` for several objects, the bare object
/// for exactly one, and nothing when every object is missing.
pub fn parse_get_output(stdout: &str) -> Result<Vec<DynamicObject>, Error> {
    if stdout.trim().is_empty() {
        return Ok(vec![]);
    }
    let value: Value = serde_json::from_str(stdout)?;
    match value.get("items") {
        Some(Value::Array(items)) => items
            .iter()
            .cloned()
            .map(|item| serde_json::from_value(item).map_err(Error::from))
            .collect(),
        Some(_) => Ok(vec![]),
        None => Ok(vec![serde_json::from_value(value)?]),
    }
}
