//! Background worker thread for report loading and view state storage.
//!
//! This module implements the worker side of the plugin, which handles all
//! file I/O to avoid blocking the main plugin UI thread. Messages carry trace
//! context so worker spans join the plugin's trace.
//!
//! # Architecture
//!
//! - `messages`: Request/response protocol types with trace context propagation
//! - `handler`: Worker implementation and message processing logic

pub mod handler;
pub mod messages;

pub use handler::ReportWorker;
pub use messages::{TraceContext, WorkerMessage, WorkerResponse};

/// Name used for the worker registration and its message routing.
pub const WORKER_NAME: &str = "reportlens";
