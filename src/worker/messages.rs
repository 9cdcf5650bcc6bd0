//! Worker thread message types for cross-thread communication.
//!
//! This module defines the request and response protocol between the main plugin
//! thread and the background worker thread that owns report file I/O and view
//! state storage. It also implements distributed tracing context propagation
//! across thread boundaries.

use crate::domain::Report;
use crate::engine::{FilterSpec, SortSpec};
use crate::storage::{PersistedView, StateScope};
use serde::{Deserialize, Serialize};

/// Distributed tracing context for cross-thread span propagation.
///
/// Captures the current trace and span IDs from OpenTelemetry to maintain
/// trace continuity when passing messages to the worker thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// OpenTelemetry trace ID as a hex string.
    pub trace_id: String,

    /// Parent span ID for linking spans across threads.
    pub parent_span_id: String,
}

impl TraceContext {
    /// Creates a trace context from the current tracing span.
    ///
    /// Returns `None` if the current span context is invalid or not sampled.
    #[must_use]
    pub fn from_current() -> Option<Self> {
        use opentelemetry::trace::TraceContextExt;
        use tracing_opentelemetry::OpenTelemetrySpanExt;

        let span = tracing::Span::current();

        let otel_context = span.context();
        let span_ref = otel_context.span();
        let span_context = span_ref.span_context();

        if span_context.is_valid() {
            let trace_id = format!("{:032x}", span_context.trace_id());
            let parent_span_id = format!("{:016x}", span_context.span_id());

            tracing::trace!(
                trace_id = %trace_id,
                parent_span_id = %parent_span_id,
                "capturing trace context"
            );

            Some(Self { trace_id, parent_span_id })
        } else {
            None
        }
    }
}

/// Macro to generate builder methods for `WorkerMessage` variants.
///
/// Generates convenience constructors that automatically attach the current
/// trace context to each message variant.
macro_rules! worker_message_builders {
    (
        $(
            $builder_name:ident($variant:ident { $($field:ident: $ty:ty),* $(,)? })
        ),* $(,)?
    ) => {
        impl WorkerMessage {
            $(
                #[doc = concat!("Create a ", stringify!($variant), " message with current trace context")]
                #[must_use]
                pub fn $builder_name($($field: $ty),*) -> Self {
                    Self::$variant {
                        $($field,)*
                        trace_context: TraceContext::from_current(),
                    }
                }
            )*
        }
    };
}

worker_message_builders! {
    load_report(LoadReport { path: String }),
    load_state(LoadState { scope: StateScope }),
    save_filters(SaveFilters { filters: FilterSpec }),
    save_sort(SaveSort { sort: Option<SortSpec> }),
    set_expanded(SetExpanded { id: String, open: bool }),
    clear_expanded(ClearExpanded {}),
}

/// Messages sent from the main thread to the worker thread.
///
/// All variants include an optional trace context for distributed tracing
/// support.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerMessage {
    /// Read and parse the report file.
    LoadReport {
        /// Sandbox path of the report JSON.
        path: String,

        /// Trace context for linking spans across threads.
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    /// Open the view state store and return everything recorded in it.
    LoadState {
        /// Which backend holds the view state.
        scope: StateScope,

        /// Trace context for linking spans across threads.
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    /// Persist the active filters under `filters`.
    SaveFilters {
        filters: FilterSpec,

        /// Trace context for linking spans across threads.
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    /// Persist the active sort under `sort`; `None` removes it.
    SaveSort {
        sort: Option<SortSpec>,

        /// Trace context for linking spans across threads.
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    /// Record one expansion flag under `expandedTests`.
    SetExpanded {
        id: String,
        open: bool,

        /// Trace context for linking spans across threads.
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    /// Forget every recorded expansion flag.
    ClearExpanded {
        /// Trace context for linking spans across threads.
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },
}

impl WorkerMessage {
    #[must_use]
    pub const fn trace_context(&self) -> Option<&TraceContext> {
        match self {
            Self::LoadReport { trace_context, .. }
            | Self::LoadState { trace_context, .. }
            | Self::SaveFilters { trace_context, .. }
            | Self::SaveSort { trace_context, .. }
            | Self::SetExpanded { trace_context, .. }
            | Self::ClearExpanded { trace_context } => trace_context.as_ref(),
        }
    }

    /// Short variant name for span fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::LoadReport { .. } => "load_report",
            Self::LoadState { .. } => "load_state",
            Self::SaveFilters { .. } => "save_filters",
            Self::SaveSort { .. } => "save_sort",
            Self::SetExpanded { .. } => "set_expanded",
            Self::ClearExpanded { .. } => "clear_expanded",
        }
    }
}

/// Responses sent from the worker thread back to the main thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkerResponse {
    /// The report file was read and parsed.
    ReportLoaded {
        /// Path the report was read from.
        path: String,

        report: Report,
    },

    /// The report file could not be read or parsed.
    ReportFailed {
        path: String,

        /// Human-readable error message.
        message: String,
    },

    /// View state restored from storage.
    StateLoaded { view: PersistedView },

    /// A write to view state storage finished. Failures are logged in the
    /// worker and still acknowledged.
    Saved {
        /// Storage key that was written or removed.
        key: String,
    },

    /// An error occurred during the worker operation.
    Error {
        /// Human-readable error message.
        message: String,
    },
}
