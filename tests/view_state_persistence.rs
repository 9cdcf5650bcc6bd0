//! View state written through the worker survives a restart and tolerates a
//! damaged store.

use reportlens::engine::{normalize, Selection, SortField, SortOrder, SortSpec};
use reportlens::storage::{JsonStorage, StateScope, Storage, ViewState};
use reportlens::worker::{ReportWorker, WorkerMessage, WorkerResponse};
use std::fs;
use tempfile::TempDir;

fn load(worker: &mut ReportWorker, scope: StateScope) -> reportlens::storage::PersistedView {
    match worker.handle_message(WorkerMessage::load_state(scope)) {
        WorkerResponse::StateLoaded { view } => view,
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn saved_view_is_restored_by_a_new_worker() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state").join("view_state.json");

    let filters = normalize(&Selection {
        search: " Login ".to_string(),
        statuses: vec!["failed".to_string(), "broken".to_string()],
        modules: vec!["tests/test_auth.py".to_string()],
        buttons: vec!["skipped".to_string()],
    });
    let sort = SortSpec::new(SortField::Name, SortOrder::Desc);

    {
        let mut worker = ReportWorker::new(path.clone());
        load(&mut worker, StateScope::Persistent);
        worker.handle_message(WorkerMessage::save_filters(filters.clone()));
        worker.handle_message(WorkerMessage::save_sort(Some(sort)));
        worker.handle_message(WorkerMessage::set_expanded("m1".to_string(), false));
        worker.handle_message(WorkerMessage::set_expanded("g1".to_string(), true));
    }

    let mut worker = ReportWorker::new(path);
    let view = load(&mut worker, StateScope::Persistent);
    assert_eq!(view.filters, filters);
    assert_eq!(view.sort, Some(sort));
    assert_eq!(view.expanded.get("m1"), Some(&false));
    assert_eq!(view.expanded.get("g1"), Some(&true));
}

#[test]
fn removed_sort_and_cleared_expansion_stay_gone() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("view_state.json");

    let mut worker = ReportWorker::new(path.clone());
    worker.handle_message(WorkerMessage::save_sort(Some(SortSpec::default())));
    worker.handle_message(WorkerMessage::set_expanded("m1".to_string(), false));
    worker.handle_message(WorkerMessage::save_sort(None));
    worker.handle_message(WorkerMessage::clear_expanded());

    let view = load(&mut ReportWorker::new(path), StateScope::Persistent);
    assert_eq!(view.sort, None);
    assert!(view.expanded.is_empty());
}

#[test]
fn malformed_values_are_treated_as_absent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("view_state.json");

    {
        let mut storage = JsonStorage::new(path.clone()).unwrap();
        storage.set("filters", "{not json").unwrap();
        storage.set("sort", "\"fastest_first\"").unwrap();
        storage.set("expandedTests", "[1, 2]").unwrap();
    }

    let view = ViewState::new(JsonStorage::new(path).unwrap()).snapshot();
    assert!(view.filters.is_empty());
    assert_eq!(view.sort, None);
    assert!(view.expanded.is_empty());
}

#[test]
fn corrupt_store_file_starts_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("view_state.json");
    fs::write(&path, "garbage").unwrap();

    let mut worker = ReportWorker::new(path.clone());
    let view = load(&mut worker, StateScope::Persistent);
    assert!(view.filters.is_empty());

    worker.handle_message(WorkerMessage::set_expanded("m1".to_string(), true));
    let view = load(&mut ReportWorker::new(path), StateScope::Persistent);
    assert_eq!(view.expanded.get("m1"), Some(&true));
}

#[test]
fn session_scope_writes_nothing_to_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("view_state.json");

    let mut worker = ReportWorker::new(path.clone());
    load(&mut worker, StateScope::Session);
    worker.handle_message(WorkerMessage::save_sort(Some(SortSpec::default())));
    worker.handle_message(WorkerMessage::set_expanded("m1".to_string(), true));

    assert!(!path.exists());
}

#[test]
fn report_load_errors_are_reported_not_raised() {
    let dir = TempDir::new().unwrap();
    let report = dir.path().join("report.json");
    fs::write(&report, "[1, 2").unwrap();

    let mut worker = ReportWorker::new(dir.path().join("view_state.json"));
    let response = worker.handle_message(WorkerMessage::load_report(report.display().to_string()));
    assert!(matches!(response, WorkerResponse::ReportFailed { .. }));

    let missing = dir.path().join("missing.json").display().to_string();
    let response = worker.handle_message(WorkerMessage::load_report(missing));
    assert!(matches!(response, WorkerResponse::ReportFailed { .. }));
}
