use crate::kustomization_types::Kustomization;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::DynamicObject;
use kube::Resource;
use std::collections::HashSet;
use tracing::*;

/// Attaches the owning Kustomization to rendered objects as an owner
/// reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnershipMerger {
    /// Whether the attached reference claims the controller role.
    pub controller: bool,
}

impl OwnershipMerger {
    pub fn new(controller: bool) -> Self {
        OwnershipMerger { controller }
    }

    pub fn owner_reference(&self, owner: &Kustomization) -> Option<OwnerReference> {
        let meta = owner.meta();
        Some(OwnerReference {
            api_version: Kustomization::api_version(&()).to_string(),
            kind: Kustomization::kind(&()).to_string(),
            name: meta.name.clone()?,
            uid: meta.uid.clone()?,
            controller: Some(self.controller),
            block_owner_deletion: Some(true),
        })
    }

    /// Adds the owner reference to `object` unless the object lives outside
    /// `owner_namespace` or already carries a reference with the owner's UID.
    pub fn attach(
        &self,
        mut object: DynamicObject,
        owner: &Kustomization,
        owner_namespace: &str,
    ) -> DynamicObject {
        if object.metadata.namespace.as_deref() != Some(owner_namespace) {
            return object;
        }
        let oref = match self.owner_reference(owner) {
            Some(oref) => oref,
            None => {
                debug!("{} has no uid yet, skip owner reference", owner.full_name());
                return object;
            }
        };
        let mut owner_references = object.metadata.owner_references.take().unwrap_or_default();
        let already_owned = {
            let uids: HashSet<&str> = owner_references.iter().map(|r| r.uid.as_str()).collect();
            uids.contains(oref.uid.as_str())
        };
        if !already_owned {
            owner_references.push(oref);
        }
        object.metadata.owner_references = if owner_references.is_empty() {
            None
        } else {
            Some(owner_references)
        };
        object
    }
}
