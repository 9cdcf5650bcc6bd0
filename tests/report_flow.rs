//! End-to-end behaviour of the filter/sort pass over a parsed report, and of
//! the application state driven by events.

use reportlens::domain::{Report, TestNode};
use reportlens::engine::{apply, matches, normalize, Selection, SortField, SortOrder, SortSpec};
use reportlens::worker::{WorkerMessage, WorkerResponse};
use reportlens::{handle_event, initialize, Action, Config, Event};

const REPORT: &str = r#"{
    "proj_name": "shop",
    "env": "stage",
    "start_time": "2025-05-01T10:00:00",
    "end_time": "2025-05-01T10:05:00",
    "run_results": {"passed": 3, "failed": 1, "broken": 1, "skipped": 1},
    "modules": {
        "tests/test_auth.py": {
            "module_results": {"PASSED": 1, "BROKEN": 1},
            "module_tests": {
                "test_login": {"status": "PASSED", "duration": 1.0, "start_time": 200},
                "test_logout": {"status": "BROKEN", "duration": "2.0", "start_time": 201, "error": "timeout"}
            }
        },
        "tests/test_cart.py": {
            "module_tests": {
                "test_add[1]": {"name": "test_add[1]", "originalname": "test_add", "status": "PASSED",
                                "duration": 0.4, "start_time": 100, "id": "t-1"},
                "test_add[2]": {"name": "test_add[2]", "originalname": "test_add", "status": "FAILED",
                                "duration": 1.2, "start_time": 101, "id": "t-2", "error": null},
                "test_remove": {"status": "PASSED", "duration": 3.0, "start_time": 102},
                "test_checkout": {"status": "SKIPPED", "duration": 0.5, "start_time": 103}
            }
        }
    }
}"#;

fn report() -> Report {
    Report::from_json_str(REPORT).unwrap()
}

fn node_names(report: &Report, module: &str) -> Vec<String> {
    report
        .modules
        .iter()
        .find(|m| m.name == module)
        .unwrap()
        .nodes
        .iter()
        .map(|n| n.name().to_string())
        .collect()
}

#[test]
fn parametrized_runs_are_grouped_and_ids_derived() {
    let report = report();
    assert_eq!(report.project.as_deref(), Some("shop"));
    assert_eq!(report.run_duration(), Some(300.0));

    let cart = report.modules.iter().find(|m| m.name == "tests/test_cart.py").unwrap();
    assert_eq!(cart.nodes.len(), 3);
    assert_eq!(cart.entries().count(), 4);
    assert!(report.locate("t-2").is_some());
    assert!(report.locate("tests/test_cart.py::test_remove").is_some());
    assert!(report.locate("tests/test_cart.py::test_add").is_some());
    assert!(report.locate("nope").is_none());
}

#[test]
fn default_sort_keeps_the_order_the_report_was_written_in() {
    let mut report = Report::from_json_str(
        r#"{"modules": {
            "test_z.py": {"module_tests": {"test_zeta": {"status": "PASSED"}, "test_alpha": {"status": "FAILED"}}},
            "test_a.py": {"module_tests": {"test_zeta": {"status": "PASSED"}, "test_alpha": {"status": "PASSED"}}}
        }}"#,
    )
    .unwrap();

    let spec = normalize(&Selection::default());
    apply(&mut report.modules, &spec, &SortSpec::default());

    let modules: Vec<&str> = report.modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(modules, ["test_z.py", "test_a.py"]);
    assert_eq!(node_names(&report, "test_z.py"), ["test_zeta", "test_alpha"]);
    assert_eq!(node_names(&report, "test_a.py"), ["test_zeta", "test_alpha"]);
}

#[test]
fn empty_filter_keeps_everything_visible() {
    let mut report = report();
    let spec = normalize(&Selection::default());
    for entry in report.modules.iter().flat_map(|m| m.entries()) {
        assert!(matches(entry, &spec));
    }

    let outcome = apply(&mut report.modules, &spec, &SortSpec::default());
    assert_eq!(outcome.visible_modules, 2);
    assert_eq!(outcome.visible_entries, 6);
}

#[test]
fn failed_status_filter_leaves_only_the_failing_run() {
    let mut report = report();
    let spec = normalize(&Selection {
        statuses: vec!["failed".to_string()],
        ..Selection::default()
    });

    let outcome = apply(&mut report.modules, &spec, &SortSpec::default());
    assert_eq!(outcome.visible_entries, 1);
    assert_eq!(outcome.visible_modules, 1);

    let auth = report.modules.iter().find(|m| m.name == "tests/test_auth.py").unwrap();
    assert!(!auth.visible);

    let cart = report.modules.iter().find(|m| m.name == "tests/test_cart.py").unwrap();
    assert!(cart.visible);
    for node in &cart.nodes {
        match node {
            TestNode::Group(group) => {
                assert!(group.visible);
                let visible: Vec<&str> = group
                    .entries
                    .iter()
                    .filter(|e| e.visible)
                    .map(|e| e.id.as_str())
                    .collect();
                assert_eq!(visible, vec!["t-2"]);
            }
            TestNode::Single(entry) => assert!(!entry.visible),
        }
    }
}

#[test]
fn search_without_hits_engages_empty_state() {
    let mut report = report();
    let spec = normalize(&Selection {
        search: "zzz".to_string(),
        ..Selection::default()
    });
    let outcome = apply(&mut report.modules, &spec, &SortSpec::default());
    assert_eq!(outcome.visible_entries, 0);
    assert!(outcome.is_empty());
}

#[test]
fn duration_descending_orders_children_and_runs() {
    let mut report = report();
    let sort = SortSpec::new(SortField::Duration, SortOrder::Desc);
    apply(&mut report.modules, &normalize(&Selection::default()), &sort);

    assert_eq!(
        node_names(&report, "tests/test_cart.py"),
        vec!["test_remove", "test_add", "test_checkout"]
    );

    let cart = report.modules.iter().find(|m| m.name == "tests/test_cart.py").unwrap();
    let runs: Vec<Option<f64>> = cart
        .nodes
        .iter()
        .find_map(|n| match n {
            TestNode::Group(group) => Some(group.entries.iter().map(|e| e.duration).collect()),
            TestNode::Single(_) => None,
        })
        .unwrap();
    assert_eq!(runs, vec![Some(1.2), Some(0.4)]);
}

#[test]
fn status_ascending_puts_failures_first() {
    let mut report = report();
    let sort = SortSpec::new(SortField::Status, SortOrder::Asc);
    apply(&mut report.modules, &normalize(&Selection::default()), &sort);

    // the group reports its worst run, FAILED
    assert_eq!(
        node_names(&report, "tests/test_cart.py"),
        vec!["test_add", "test_remove", "test_checkout"]
    );
}

#[test]
fn events_drive_filters_sort_and_persistence() {
    let mut state = initialize(&Config::default());
    handle_event(
        &mut state,
        &Event::WorkerResponse(WorkerResponse::ReportLoaded {
            path: "/host/logs/blog_report.json".to_string(),
            report: report(),
        }),
    )
    .unwrap();
    assert_eq!(state.outcome.visible_entries, 6);

    let (_, actions) = handle_event(&mut state, &Event::ToggleButton("failed".to_string())).unwrap();
    assert_eq!(state.outcome.visible_entries, 1);
    match actions.as_slice() {
        [Action::PostToWorker(WorkerMessage::SaveFilters { filters, .. })] => {
            assert!(filters.buttons.contains("failed"));
        }
        other => panic!("unexpected actions: {other:?}"),
    }

    handle_event(&mut state, &Event::Sort(SortField::Duration)).unwrap();
    let (_, actions) = handle_event(&mut state, &Event::Sort(SortField::Duration)).unwrap();
    let expected = SortSpec::new(SortField::Duration, SortOrder::Desc);
    assert_eq!(state.active_sort(), expected);
    assert!(matches!(
        actions.as_slice(),
        [Action::PostToWorker(WorkerMessage::SaveSort { sort: Some(s), .. })] if *s == expected
    ));

    handle_event(&mut state, &Event::Navigate("tests/test_auth.py::test_login".to_string())).unwrap();
    assert!(state.filters.is_empty());
    assert_eq!(state.selected_id().as_deref(), Some("tests/test_auth.py::test_login"));
}
