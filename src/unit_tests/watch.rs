use super::*;
use crate::watch::*;
use kube::runtime::watcher;

fn event_types(events: &[ResourceEvent<Kustomization>]) -> Vec<(ResourceEventType, String)> {
    events
        .iter()
        .map(|event| (event.event_type, event.meta.name.clone()))
        .collect()
}

#[test]
pub fn test_translate_applied_and_deleted() {
    let mut translator: EventTranslator<Kustomization> = EventTranslator::default();

    let added = translator.translate(watcher::Event::Applied(kustomization("a", 1, vec![])));
    assert_eq!(event_types(&added), vec![(ResourceEventType::Added, "a".to_string())]);
    assert_eq!(added[0].meta.namespace.as_deref(), Some(NAMESPACE));
    assert_eq!(added[0].meta.id.as_deref(), Some("uid-a"));

    let modified = translator.translate(watcher::Event::Applied(kustomization("a", 2, vec![])));
    assert_eq!(
        event_types(&modified),
        vec![(ResourceEventType::Modified, "a".to_string())]
    );
    assert_eq!(modified[0].object.metadata.generation, Some(2));

    let deleted = translator.translate(watcher::Event::Deleted(kustomization("a", 2, vec![])));
    assert_eq!(
        event_types(&deleted),
        vec![(ResourceEventType::Deleted, "a".to_string())]
    );

    let again = translator.translate(watcher::Event::Applied(kustomization("a", 1, vec![])));
    assert_eq!(event_types(&again), vec![(ResourceEventType::Added, "a".to_string())]);
}

#[test]
pub fn test_translate_restarted() {
    let mut translator: EventTranslator<Kustomization> = EventTranslator::default();
    translator.translate(watcher::Event::Applied(kustomization("a", 1, vec![])));
    translator.translate(watcher::Event::Applied(kustomization("b", 1, vec![])));

    let events = translator.translate(watcher::Event::Restarted(vec![
        kustomization("b", 2, vec![]),
        kustomization("c", 1, vec![]),
    ]));
    assert_eq!(
        event_types(&events),
        vec![
            (ResourceEventType::Deleted, "a".to_string()),
            (ResourceEventType::Modified, "b".to_string()),
            (ResourceEventType::Added, "c".to_string()),
        ]
    );

    let events = translator.translate(watcher::Event::Restarted(vec![]));
    let mut names: Vec<_> = event_types(&events);
    names.sort_by(|l, r| l.1.cmp(&r.1));
    assert_eq!(
        names,
        vec![
            (ResourceEventType::Deleted, "b".to_string()),
            (ResourceEventType::Deleted, "c".to_string()),
        ]
    );
}
