use crate::tracking::*;
use kube::api::ObjectMeta;

#[test]
pub fn test_tracking_key() {
    let meta = ObjectMeta {
        name: Some("overlay".to_string()),
        namespace: Some("apps".to_string()),
        ..ObjectMeta::default()
    };
    assert_eq!(tracking_key(&meta), "overlay.apps");
    assert_eq!(tracking_key(&ObjectMeta::default()), ".");
}

#[test]
pub fn test_register_then_unregister() {
    let tracking = TrackingRegistry::new();
    assert!(!tracking.is_tracking("a.default"));

    tracking.register("a.default", None);
    assert!(tracking.is_tracking("a.default"));
    assert!(!tracking.is_tracking("b.default"));

    tracking.unregister("a.default");
    assert!(!tracking.is_tracking("a.default"));
}

#[test]
pub fn test_register_waiting_on() {
    let tracking = TrackingRegistry::new();
    tracking.register("a.default", Some("patches for a"));
    assert!(tracking.is_tracking("a.default"));
    assert_eq!(tracking.waiting_on("a.default").as_deref(), Some("patches for a"));

    // Registering again without a condition marks the key as simply desired.
    tracking.register("a.default", None);
    assert!(tracking.is_tracking("a.default"));
    assert_eq!(tracking.waiting_on("a.default"), None);

    tracking.register("a.default", Some("patches for a"));
    tracking.unregister("a.default");
    assert!(!tracking.is_tracking("a.default"));
    assert_eq!(tracking.waiting_on("a.default"), None);
}

#[test]
pub fn test_unregister_unknown_key() {
    let tracking = TrackingRegistry::new();
    tracking.unregister("missing.default");
    assert!(!tracking.is_tracking("missing.default"));
}
