use super::*;
use crate::status::StatusReporter;

#[tokio::test]
async fn test_update_status_of_unaddressable_object() {
    let client = FakeStatusClient::new();
    let reporter = StatusReporter::new(client.clone());

    let mut overlay = kustomization("overlay", 1, vec![]);
    overlay.metadata.namespace = None;
    let status = KustomizationStatus::new(KustomizationStatusPhase::Pending, "creating kustomization", false);
    reporter.update_status(status, &overlay).await.unwrap();
    assert!(client.patches().is_empty());
    assert_eq!(reporter.get_status(&overlay).await.unwrap(), None);
}

#[tokio::test]
async fn test_update_status_adds_then_replaces() {
    let client = FakeStatusClient::new();
    let reporter = StatusReporter::new(client.clone());
    let mut overlay = kustomization("overlay", 1, vec![]);

    let status = KustomizationStatus::new(KustomizationStatusPhase::Pending, "creating kustomization", false);
    reporter.update_status(status, &overlay).await.unwrap();

    overlay.status = client.status.lock().unwrap().clone();
    let status = KustomizationStatus::new(KustomizationStatusPhase::Succeeded, "created kustomization", true);
    reporter.update_status(status, &overlay).await.unwrap();

    let patches = client.patches();
    assert_eq!(patches.len(), 2);
    assert_eq!(patches[0][0]["op"], "add");
    assert_eq!(patches[1][0]["op"], "replace");
    assert_eq!(patches[1][0]["path"], "/status");
    assert_eq!(patches[1][0]["value"]["phase"], "Succeeded");
    assert_eq!(patches[1][0]["value"]["ready"], true);
    // Without previous phase tracking the field is never written.
    assert!(patches[1][0]["value"].get("previousPhase").is_none());

    let current = reporter.get_status(&overlay).await.unwrap().unwrap();
    assert_eq!(current.phase, Some(KustomizationStatusPhase::Succeeded));
    assert_eq!(current.message.as_deref(), Some("created kustomization"));
}

#[tokio::test]
async fn test_update_status_stamps_update_time() {
    let client = FakeStatusClient::new();
    let reporter = StatusReporter::new(client.clone());
    let overlay = kustomization("overlay", 1, vec![]);

    let status = KustomizationStatus::new(KustomizationStatusPhase::Failed, "boom", false);
    reporter.update_status(status, &overlay).await.unwrap();

    let written = client.status.lock().unwrap().clone().unwrap();
    let stamp = written.last_update_time.unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
}

#[tokio::test]
async fn test_update_status_records_previous_phase() {
    let client = FakeStatusClient::with_status(KustomizationStatus::new(
        KustomizationStatusPhase::Failed,
        "boom",
        false,
    ));
    let reporter = StatusReporter::new(client.clone()).with_previous_phase(true);
    let overlay = kustomization("overlay", 2, vec![]);

    let status = KustomizationStatus::new(KustomizationStatusPhase::Pending, "modifying kustomization", false);
    reporter.update_status(status, &overlay).await.unwrap();
    assert_eq!(client.patches()[0][0]["value"]["previousPhase"], "Failed");

    let empty = FakeStatusClient::new();
    let reporter = StatusReporter::new(empty.clone()).with_previous_phase(true);
    let status = KustomizationStatus::new(KustomizationStatusPhase::Pending, "creating kustomization", false);
    reporter.update_status(status, &overlay).await.unwrap();
    assert!(empty.patches()[0][0]["value"].get("previousPhase").is_none());
}
