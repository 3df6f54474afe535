use super::*;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

fn foreign_owner() -> OwnerReference {
    OwnerReference {
        api_version: "apps/v1".to_string(),
        kind: "Deployment".to_string(),
        name: "web".to_string(),
        uid: "uid-web".to_string(),
        controller: Some(true),
        block_owner_deletion: None,
    }
}

#[test]
pub fn test_attach_owner_reference() {
    let owner = kustomization("overlay", 1, vec![]);
    let attached = OwnershipMerger::default().attach(config_map("a"), &owner, NAMESPACE);

    let refs = attached.metadata.owner_references.unwrap();
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].api_version, "kustomize.siliconhills.dev/v1alpha1");
    assert_eq!(refs[0].kind, "Kustomization");
    assert_eq!(refs[0].name, "overlay");
    assert_eq!(refs[0].uid, "uid-overlay");
    assert_eq!(refs[0].controller, Some(false));
}

#[test]
pub fn test_attach_is_idempotent() {
    let owner = kustomization("overlay", 1, vec![]);
    let merger = OwnershipMerger::default();
    let once = merger.attach(config_map("a"), &owner, NAMESPACE);
    let twice = merger.attach(once.clone(), &owner, NAMESPACE);
    assert_eq!(
        once.metadata.owner_references,
        twice.metadata.owner_references
    );
    assert_eq!(twice.metadata.owner_references.unwrap().len(), 1);
}

#[test]
pub fn test_attach_keeps_existing_owner_references() {
    let owner = kustomization("overlay", 1, vec![]);
    let mut cm = config_map("a");
    cm.metadata.owner_references = Some(vec![foreign_owner()]);

    let attached = OwnershipMerger::default().attach(cm, &owner, NAMESPACE);
    let uids: Vec<_> = attached
        .metadata
        .owner_references
        .unwrap()
        .into_iter()
        .map(|r| r.uid)
        .collect();
    assert_eq!(uids, vec!["uid-web", "uid-overlay"]);
}

#[test]
pub fn test_attach_skips_other_namespace() {
    let owner = kustomization("overlay", 1, vec![]);
    let attached =
        OwnershipMerger::default().attach(object("ConfigMap", "a", "other"), &owner, NAMESPACE);
    assert!(attached.metadata.owner_references.is_none());

    let mut cluster_scoped = object("ClusterRole", "reader", NAMESPACE);
    cluster_scoped.metadata.namespace = None;
    let attached = OwnershipMerger::default().attach(cluster_scoped, &owner, NAMESPACE);
    assert!(attached.metadata.owner_references.is_none());
}

#[test]
pub fn test_attach_skips_owner_without_uid() {
    let mut owner = kustomization("overlay", 1, vec![]);
    owner.metadata.uid = None;
    let attached = OwnershipMerger::default().attach(config_map("a"), &owner, NAMESPACE);
    assert!(attached.metadata.owner_references.is_none());
}

#[test]
pub fn test_attach_controller_reference() {
    let owner = kustomization("overlay", 1, vec![]);
    let attached = OwnershipMerger::new(true).attach(config_map("a"), &owner, NAMESPACE);
    let refs = attached.metadata.owner_references.unwrap();
    assert_eq!(refs[0].controller, Some(true));
    assert_eq!(refs[0].block_owner_deletion, Some(true));
}
