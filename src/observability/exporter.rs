//! OpenTelemetry span exporter writing OTLP-shaped JSON lines.
//!
//! Each exported batch becomes one line in the trace file:
//!
//! ```json
//! {"resourceSpans":[{"resource":{"attributes":[...]},
//!   "scopeSpans":[{"scope":{"name":"reportlens"},"spans":[...]}]}]}
//! ```

use super::rotation::{RotatingFile, RotationPolicy};
use futures_util::future::BoxFuture;
use opentelemetry::trace::{SpanId, SpanKind, Status, TraceError};
use opentelemetry::{KeyValue, Value};
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use opentelemetry_sdk::resource::Resource;
use opentelemetry_sdk::trace::TracerProvider;
use serde::Serialize;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

pub const SCOPE_NAME: &str = "reportlens";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportLine {
    resource_spans: [ResourceSpans; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResourceSpans {
    resource: ResourceJson,
    scope_spans: [ScopeSpans; 1],
}

#[derive(Debug, Serialize)]
struct ResourceJson {
    attributes: Vec<Attribute>,
}

#[derive(Debug, Serialize)]
struct ScopeSpans {
    scope: Scope,
    spans: Vec<SpanJson>,
}

#[derive(Debug, Serialize)]
struct Scope {
    name: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpanJson {
    trace_id: String,
    span_id: String,
    parent_span_id: String,
    name: String,
    kind: u8,
    start_time_unix_nano: String,
    end_time_unix_nano: String,
    attributes: Vec<Attribute>,
    events: Vec<EventJson>,
    status: StatusJson,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventJson {
    time_unix_nano: String,
    name: String,
    attributes: Vec<Attribute>,
}

#[derive(Debug, Serialize)]
struct StatusJson {
    code: u8,
    message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Attribute {
    key: String,
    value: AttributeValue,
}

/// OTLP `AnyValue`; 64-bit integers travel as strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
enum AttributeValue {
    #[serde(rename = "boolValue")]
    Bool(bool),
    #[serde(rename = "intValue")]
    Int(String),
    #[serde(rename = "doubleValue")]
    Double(f64),
    #[serde(rename = "stringValue")]
    Str(String),
}

impl From<&Value> for AttributeValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Bool(b) => Self::Bool(*b),
            Value::I64(i) => Self::Int(i.to_string()),
            Value::F64(f) => Self::Double(*f),
            Value::String(s) => Self::Str(s.to_string()),
            Value::Array(_) => Self::Str(value.to_string()),
        }
    }
}

fn attributes(pairs: &[KeyValue]) -> Vec<Attribute> {
    pairs
        .iter()
        .map(|kv| Attribute {
            key: kv.key.to_string(),
            value: AttributeValue::from(&kv.value),
        })
        .collect()
}

fn unix_nanos(time: SystemTime) -> String {
    time.duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos())
        .to_string()
}

const fn kind_code(kind: &SpanKind) -> u8 {
    match kind {
        SpanKind::Internal => 1,
        SpanKind::Server => 2,
        SpanKind::Client => 3,
        SpanKind::Producer => 4,
        SpanKind::Consumer => 5,
    }
}

impl From<&SpanData> for SpanJson {
    fn from(span: &SpanData) -> Self {
        let (code, message) = match &span.status {
            Status::Unset => (0, String::new()),
            Status::Ok => (1, String::new()),
            Status::Error { description } => (2, description.to_string()),
        };

        Self {
            trace_id: format!("{:032x}", span.span_context.trace_id()),
            span_id: format!("{:016x}", span.span_context.span_id()),
            parent_span_id: if span.parent_span_id == SpanId::INVALID {
                String::new()
            } else {
                format!("{:016x}", span.parent_span_id)
            },
            name: span.name.to_string(),
            kind: kind_code(&span.span_kind),
            start_time_unix_nano: unix_nanos(span.start_time),
            end_time_unix_nano: unix_nanos(span.end_time),
            attributes: attributes(&span.attributes),
            events: span
                .events
                .iter()
                .map(|event| EventJson {
                    time_unix_nano: unix_nanos(event.timestamp),
                    name: event.name.to_string(),
                    attributes: attributes(&event.attributes),
                })
                .collect(),
            status: StatusJson { code, message },
        }
    }
}

/// Span exporter appending one OTLP JSON line per batch to a rotating file.
pub struct JsonLineExporter {
    file: RotatingFile,
    resource: Vec<Attribute>,
    is_shutdown: bool,
}

impl JsonLineExporter {
    pub fn new(path: PathBuf, policy: RotationPolicy, resource: &Resource) -> Self {
        Self {
            file: RotatingFile::new(path, policy),
            resource: resource
                .iter()
                .map(|(key, value)| Attribute {
                    key: key.to_string(),
                    value: AttributeValue::from(value),
                })
                .collect(),
            is_shutdown: false,
        }
    }

    fn encode(&self, batch: &[SpanData]) -> serde_json::Result<String> {
        let line = ExportLine {
            resource_spans: [ResourceSpans {
                resource: ResourceJson {
                    attributes: self.resource.clone(),
                },
                scope_spans: [ScopeSpans {
                    scope: Scope { name: SCOPE_NAME },
                    spans: batch.iter().map(SpanJson::from).collect(),
                }],
            }],
        };
        serde_json::to_string(&line)
    }
}

impl SpanExporter for JsonLineExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        let result = if self.is_shutdown {
            Err(TraceError::from("exporter is shut down"))
        } else {
            self.encode(&batch)
                .map_err(|e| TraceError::from(e.to_string()))
                .and_then(|line| {
                    self.file
                        .write_line(&line)
                        .map_err(|e| TraceError::from(e.to_string()))
                })
        };
        Box::pin(std::future::ready(result))
    }

    fn shutdown(&mut self) {
        self.is_shutdown = true;
    }
}

impl std::fmt::Debug for JsonLineExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLineExporter")
            .field("file", &self.file)
            .field("is_shutdown", &self.is_shutdown)
            .finish_non_exhaustive()
    }
}

/// Builds a tracer provider that exports every finished span immediately.
pub fn tracer_provider(path: PathBuf, policy: RotationPolicy, resource: Resource) -> TracerProvider {
    let exporter = JsonLineExporter::new(path, policy, &resource);

    TracerProvider::builder()
        .with_config(opentelemetry_sdk::trace::Config::default().with_resource(resource))
        .with_simple_exporter(exporter)
        .build()
}
