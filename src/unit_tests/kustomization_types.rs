use super::*;
use kube::CustomResourceExt;

#[test]
pub fn test_selector_api_version() {
    let mut deployment = selector("Deployment", "web");
    assert_eq!(deployment.api_version(), "v1");
    deployment.group = Some("apps".to_string());
    assert_eq!(deployment.api_version(), "apps/v1");
    deployment.group = Some(String::new());
    assert_eq!(deployment.api_version(), "v1");
}

#[test]
pub fn test_retry_timeout_default() {
    let mut overlay = kustomization("a", 1, vec![]);
    assert_eq!(overlay.retry_timeout_ms(), DEFAULT_RETRY_TIMEOUT_MS);
    overlay.spec.retry_timeout = Some(0);
    assert_eq!(overlay.retry_timeout_ms(), DEFAULT_RETRY_TIMEOUT_MS);
    overlay.spec.retry_timeout = Some(u64::MAX);
    assert_eq!(overlay.retry_timeout_ms(), u64::MAX);
    assert_eq!(overlay.full_name(), "Kustomization default/a");
}

#[test]
pub fn test_deserialize_kustomization() {
    let overlay: Kustomization = serde_yaml::from_str(
        "
apiVersion: kustomize.siliconhills.dev/v1alpha1
kind: Kustomization
metadata:
  name: overlay
  namespace: default
spec:
  retryTimeout: 10000
  namePrefix: prod-
  resources:
    - group: apps
      version: v1
      kind: Deployment
      name: web
  patchesJson6902:
    - target:
        group: apps
        version: v1
        kind: Deployment
        name: web
      patch: |-
        - op: replace
          path: /spec/replicas
          value: 2
",
    )
    .unwrap();
    assert_eq!(overlay.retry_timeout_ms(), 10000);
    assert!(overlay.status.is_none());
    let resources = overlay.spec.resources.unwrap();
    assert_eq!(resources[0].api_version(), "apps/v1");
    assert_eq!(resources[0].namespace, None);
    let patches = overlay.spec.patches_json6902.unwrap();
    assert_eq!(patches[0].target.name, "web");
    assert!(patches[0].patch.as_deref().unwrap().contains("/spec/replicas"));
}

#[test]
pub fn test_status_serialization() {
    let status = KustomizationStatus::new(KustomizationStatusPhase::Pending, "creating kustomization", false);
    assert_eq!(
        serde_json::to_value(&status).unwrap(),
        json!({ "message": "creating kustomization", "phase": "Pending", "ready": false })
    );

    let status = KustomizationStatus {
        previous_phase: Some("Failed".to_string()),
        last_update_time: Some("2024-01-01T00:00:00+00:00".to_string()),
        ..status
    };
    let value = serde_json::to_value(&status).unwrap();
    assert_eq!(value["previousPhase"], "Failed");
    assert_eq!(value["lastUpdateTime"], "2024-01-01T00:00:00+00:00");
    assert_eq!(KustomizationStatusPhase::Succeeded.to_string(), "Succeeded");
    assert_eq!(KustomizationStatusPhase::default(), KustomizationStatusPhase::Unknown);
}

#[test]
pub fn test_crd_definition() {
    let crd = Kustomization::crd();
    assert_eq!(crd.spec.group, "kustomize.siliconhills.dev");
    assert_eq!(crd.spec.names.kind, KUSTOMIZATION_KIND);
    assert_eq!(crd.spec.names.plural, "kustomizations");
    assert_eq!(crd.spec.scope, "Namespaced");
    assert_eq!(crd.spec.versions[0].name, "v1alpha1");
    assert!(crd.spec.versions[0]
        .subresources
        .as_ref()
        .and_then(|s| s.status.as_ref())
        .is_some());
}
