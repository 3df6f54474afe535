use super::*;
use crate::rotation::*;

#[test]
pub fn test_rotate_returns_previous_version() {
    let rotation = ResourceRotation::new();

    let first = rotation.rotate("a.default", kustomization("a", 1, vec![]));
    assert!(first.old_resource.is_none());
    assert_eq!(first.new_resource.metadata.generation, Some(1));

    let second = rotation.rotate("a.default", kustomization("a", 2, vec![]));
    assert_eq!(
        second.old_resource.and_then(|old| old.metadata.generation),
        Some(1)
    );
    assert_eq!(second.new_resource.metadata.generation, Some(2));

    let third = rotation.rotate("a.default", kustomization("a", 3, vec![]));
    assert_eq!(
        third.old_resource.and_then(|old| old.metadata.generation),
        Some(2)
    );
}

#[test]
pub fn test_rotate_keys_are_independent() {
    let rotation = ResourceRotation::new();
    rotation.rotate("a.default", kustomization("a", 1, vec![]));
    let b = rotation.rotate("b.default", kustomization("b", 7, vec![]));
    assert!(b.old_resource.is_none());
    assert_eq!(rotation.len(), 2);
}

#[test]
pub fn test_forget() {
    let rotation = ResourceRotation::new();
    rotation.rotate("a.default", kustomization("a", 1, vec![]));
    rotation.forget("a.default");
    assert!(rotation.is_empty());

    let again = rotation.rotate("a.default", kustomization("a", 1, vec![]));
    assert!(again.old_resource.is_none());
}
