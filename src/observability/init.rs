//! Tracing initialization and subscriber setup.
//!
//! Wires `tracing` macros through `tracing-opentelemetry` into the JSON line
//! exporter.

use super::exporter::{self, SCOPE_NAME};
use super::rotation::RotationPolicy;
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::resource::Resource;
use std::path::Path;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name of the trace export inside the data directory.
pub const TRACE_FILE: &str = "reportlens-otlp.json";

/// Initializes the global subscriber, exporting to the data directory.
///
/// Traces go to `~/.local/share/zellij/reportlens/reportlens-otlp.json`,
/// rotated at 10 MB with three backups. The level comes from `trace_level`
/// and defaults to `info`.
///
/// Tracing is optional: if the directory cannot be created, or a subscriber
/// is already installed, this does nothing. Returns whether this call
/// installed the subscriber.
pub fn init_tracing(config: &Config) -> bool {
    init_tracing_in(config, &crate::infrastructure::paths::get_data_dir())
}

/// Same as [`init_tracing`] with an explicit output directory.
pub fn init_tracing_in(config: &Config, dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }

    let filter = EnvFilter::try_new(&config.trace_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let resource = Resource::new(vec![
        opentelemetry::KeyValue::new("service.name", SCOPE_NAME),
        opentelemetry::KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ]);
    let provider = exporter::tracer_provider(dir.join(TRACE_FILE), RotationPolicy::default(), resource);
    let otel_layer = OpenTelemetryLayer::new(provider.tracer(SCOPE_NAME));

    tracing_subscriber::registry()
        .with(filter)
        .with(otel_layer)
        .try_init()
        .is_ok()
}
