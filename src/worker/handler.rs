//! Worker thread implementation for report loading and view state storage.
//!
//! [`ReportWorker`] is plain Rust with no Zellij calls: the plugin binary wraps
//! it in a `ZellijWorker` that decodes the payload, calls
//! [`ReportWorker::handle_message`], and posts the response back.

use crate::domain::Report;
use crate::infrastructure::paths;
use crate::storage::{open_storage, Storage, StateScope, ViewState, EXPANDED_KEY, FILTERS_KEY, SORT_KEY};
use crate::worker::{WorkerMessage, WorkerResponse};
use std::path::{Path, PathBuf};

/// Worker thread state.
///
/// The view state store is opened lazily, either by `LoadState` with the
/// configured scope or by the first write with the default scope.
pub struct ReportWorker {
    view: Option<ViewState<Box<dyn Storage>>>,
    state_path: PathBuf,
}

impl Default for ReportWorker {
    fn default() -> Self {
        Self::new(paths::view_state_path())
    }
}

impl ReportWorker {
    /// Creates a worker whose persistent view state lives at `state_path`.
    #[must_use]
    pub const fn new(state_path: PathBuf) -> Self {
        Self { view: None, state_path }
    }

    fn view_mut(&mut self) -> &mut ViewState<Box<dyn Storage>> {
        let state_path = &self.state_path;
        self.view.get_or_insert_with(|| {
            tracing::debug!("opening view state with default scope");
            ViewState::new(open_storage(StateScope::default(), state_path.clone()))
        })
    }

    /// Handles the `LoadReport` message.
    fn handle_load_report(path: String) -> WorkerResponse {
        match Report::from_file(Path::new(&path)) {
            Ok(report) => {
                tracing::debug!(
                    path = %path,
                    module_count = report.modules.len(),
                    "report loaded"
                );
                WorkerResponse::ReportLoaded { path, report }
            }
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "report load failed");
                WorkerResponse::ReportFailed { path, message: e.to_string() }
            }
        }
    }

    /// Handles the `LoadState` message.
    ///
    /// Re-opening replaces any store opened earlier with the default scope.
    fn handle_load_state(&mut self, scope: StateScope) -> WorkerResponse {
        let view = ViewState::new(open_storage(scope, self.state_path.clone()));
        let snapshot = view.snapshot();
        tracing::debug!(
            scope = ?scope,
            has_sort = snapshot.sort.is_some(),
            expanded_count = snapshot.expanded.len(),
            "view state loaded"
        );
        self.view = Some(view);
        WorkerResponse::StateLoaded { view: snapshot }
    }

    /// Attaches the parent trace context from a message to the current thread.
    ///
    /// Returns a context guard that must be held for the duration of the operation.
    fn attach_parent_trace_context(message: &WorkerMessage) -> Option<opentelemetry::ContextGuard> {
        use opentelemetry::trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState};

        let trace_context = message.trace_context()?;

        let trace_id = TraceId::from_hex(&trace_context.trace_id).ok()?;
        let span_id = SpanId::from_hex(&trace_context.parent_span_id).ok()?;

        let span_context = SpanContext::new(
            trace_id,
            span_id,
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        );

        let otel_context = opentelemetry::Context::current().with_remote_span_context(span_context);

        Some(otel_context.attach())
    }

    /// Processes a worker message and returns the response to post back.
    pub fn handle_message(&mut self, message: WorkerMessage) -> WorkerResponse {
        let _context_guard = Self::attach_parent_trace_context(&message);

        let span = tracing::debug_span!("worker_handle_message", message_type = message.kind());
        let _guard = span.entered();

        match message {
            WorkerMessage::LoadReport { path, .. } => Self::handle_load_report(path),

            WorkerMessage::LoadState { scope, .. } => self.handle_load_state(scope),

            WorkerMessage::SaveFilters { filters, .. } => {
                self.view_mut().save_filters(&filters);
                WorkerResponse::Saved { key: FILTERS_KEY.to_string() }
            }

            WorkerMessage::SaveSort { sort, .. } => {
                let view = self.view_mut();
                match sort {
                    Some(sort) => view.save_sort(&sort),
                    None => view.clear_sort(),
                }
                WorkerResponse::Saved { key: SORT_KEY.to_string() }
            }

            WorkerMessage::SetExpanded { id, open, .. } => {
                self.view_mut().set_expanded(&id, open);
                WorkerResponse::Saved { key: EXPANDED_KEY.to_string() }
            }

            WorkerMessage::ClearExpanded { .. } => {
                self.view_mut().clear_expanded();
                WorkerResponse::Saved { key: EXPANDED_KEY.to_string() }
            }
        }
    }

    /// Decodes a JSON payload, handles it, and encodes the response.
    ///
    /// Returns `None` only if the response itself cannot be encoded.
    pub fn handle_payload(&mut self, payload: &str) -> Option<String> {
        let response = match serde_json::from_str::<WorkerMessage>(payload) {
            Ok(message) => self.handle_message(message),
            Err(e) => {
                tracing::debug!(error = %e, "failed to deserialize worker message");
                WorkerResponse::Error { message: format!("invalid worker message: {e}") }
            }
        };

        match serde_json::to_string(&response) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::debug!(error = %e, "failed to serialize worker response");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{normalize, Selection, SortSpec};
    use crate::storage::PersistedView;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    const REPORT: &str = r#"{"modules": {"m": {"module_tests": {"t": {"status": "PASSED"}}}}}"#;

    #[test]
    fn state_persists_across_workers() {
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("state.json");
        let filters = normalize(&Selection {
            statuses: vec!["failed".to_string()],
            ..Selection::default()
        });

        {
            let mut worker = ReportWorker::new(state_path.clone());
            worker.handle_message(WorkerMessage::save_filters(filters.clone()));
            worker.handle_message(WorkerMessage::save_sort(Some(SortSpec::default())));
            worker.handle_message(WorkerMessage::set_expanded("m".to_string(), false));
        }

        let mut worker = ReportWorker::new(state_path);
        let response = worker.handle_message(WorkerMessage::load_state(StateScope::Persistent));
        assert_eq!(
            response,
            WorkerResponse::StateLoaded {
                view: PersistedView {
                    filters,
                    sort: Some(SortSpec::default()),
                    expanded: BTreeMap::from([("m".to_string(), false)]),
                }
            }
        );
    }

    #[test]
    fn clearing_sort_and_expansion() {
        let dir = TempDir::new().unwrap();
        let mut worker = ReportWorker::new(dir.path().join("state.json"));
        worker.handle_message(WorkerMessage::load_state(StateScope::Session));
        worker.handle_message(WorkerMessage::save_sort(Some(SortSpec::default())));
        worker.handle_message(WorkerMessage::set_expanded("g".to_string(), true));
        worker.handle_message(WorkerMessage::save_sort(None));
        worker.handle_message(WorkerMessage::clear_expanded());

        let view = worker.view.as_ref().map(ViewState::snapshot);
        assert_eq!(view, Some(PersistedView::default()));
        assert!(!dir.path().join("state.json").exists());
    }

    #[test]
    fn loads_and_reports_failures() {
        let dir = TempDir::new().unwrap();
        let report_path = dir.path().join("report.json");
        std::fs::write(&report_path, REPORT).unwrap();
        let path = report_path.to_string_lossy().to_string();

        let mut worker = ReportWorker::new(dir.path().join("state.json"));
        match worker.handle_message(WorkerMessage::load_report(path.clone())) {
            WorkerResponse::ReportLoaded { path: loaded, report } => {
                assert_eq!(loaded, path);
                assert_eq!(report.modules.len(), 1);
            }
            other => panic!("unexpected response: {other:?}"),
        }

        let missing = dir.path().join("missing.json").to_string_lossy().to_string();
        assert!(matches!(
            worker.handle_message(WorkerMessage::load_report(missing)),
            WorkerResponse::ReportFailed { .. }
        ));
    }

    #[test]
    fn payload_round_trip_and_garbage() {
        let dir = TempDir::new().unwrap();
        let mut worker = ReportWorker::new(dir.path().join("state.json"));

        let payload = serde_json::to_string(&WorkerMessage::load_state(StateScope::Session)).unwrap();
        let response: WorkerResponse =
            serde_json::from_str(&worker.handle_payload(&payload).unwrap()).unwrap();
        assert!(matches!(response, WorkerResponse::StateLoaded { .. }));

        let response: WorkerResponse =
            serde_json::from_str(&worker.handle_payload("not json").unwrap()).unwrap();
        assert!(matches!(response, WorkerResponse::Error { .. }));
    }
}
