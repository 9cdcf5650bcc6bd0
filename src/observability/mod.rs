//! OpenTelemetry-based observability with file-based trace export.
//!
//! ```text
//! tracing → tracing-opentelemetry → opentelemetry_sdk → JsonLineExporter → RotatingFile
//! ```
//!
//! Spans are written as OTLP-shaped JSON, one batch per line, to
//! `~/.local/share/zellij/reportlens/reportlens-otlp.json`. The file rotates at
//! 10 MB and keeps three numbered backups. The filter directive comes from the
//! `trace_level` plugin option.
//!
//! # Usage
//!
//! ```no_run
//! use reportlens::observability::init_tracing;
//! use reportlens::Config;
//!
//! init_tracing(&Config::default());
//! tracing::debug!("plugin initialized");
//! ```

mod exporter;
mod init;
mod rotation;

pub use init::{init_tracing, init_tracing_in, TRACE_FILE};
pub use rotation::{RotatingFile, RotationPolicy};
