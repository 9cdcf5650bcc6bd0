//! Domain layer for the report viewer.
//!
//! Core types for a test-run report, independent of Zellij APIs and of the
//! storage or rendering layers.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`node`]: Modules, groups, entries, and statuses
//! - [`report`]: Report document and its JSON loader
//!
//! # Examples
//!
//! ```
//! use reportlens::domain::{Entry, Module, Status, TestNode};
//!
//! let module = Module::new(
//!     "tests/test_auth.py",
//!     vec![TestNode::Single(Entry::new("t1", "test_login", Status::Passed, "tests/test_auth.py"))],
//! );
//! assert_eq!(module.counts().passed, 1);
//! ```

pub mod error;
pub mod node;
pub mod report;

pub use error::{ReportLensError, Result};
pub use node::{
    Entry, EntryDetails, Group, KnownBug, Link, Module, Parameter, Status, StatusCounts, TestNode,
};
pub use report::{NodeLocation, Report};
