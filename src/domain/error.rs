//! Error types for the report viewer.
//!
//! This module defines the centralized error type [`ReportLensError`] and a type
//! alias [`Result`] used by the fallible internals of the plugin: file-backed
//! storage, report parsing, and theme loading. The view-state layer catches
//! these errors at its boundary, so filter and sort handling never sees them.

use thiserror::Error;

/// The main error type for report viewer operations.
///
/// # Examples
///
/// ```
/// use reportlens::domain::ReportLensError;
///
/// fn read_report() -> Result<(), ReportLensError> {
///     Err(ReportLensError::Report("missing `modules` object".to_string()))
/// }
/// ```
#[derive(Debug, Error)]
pub enum ReportLensError {
    /// Key/value storage operation failed.
    ///
    /// Occurs when reading from or writing to the storage backend fails.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Theme parsing or application failed.
    #[error("Theme error: {0}")]
    Theme(String),

    /// The report file could not be interpreted.
    ///
    /// Raised for malformed JSON or a document whose top-level shape does not
    /// look like a test-run report.
    #[error("Report error: {0}")]
    Report(String),
}

/// A specialized `Result` type for report viewer operations.
pub type Result<T> = std::result::Result<T, ReportLensError>;
