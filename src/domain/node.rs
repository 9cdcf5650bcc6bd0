//! Report tree model: modules, groups, and entries.
//!
//! A report is a two-level hierarchy. Each [`Module`] (usually one test file)
//! holds an ordered list of [`TestNode`]s, and each node is either a single
//! [`Entry`] or a [`Group`] of parametrized runs sharing one original test
//! name. Nodes are built once when the report is loaded; afterwards only their
//! `visible` flags, `expanded` flags, and sibling order change.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const fn visible_default() -> bool {
    true
}

/// Outcome of a single test run.
///
/// Parsing is case-insensitive. Values outside the four known outcomes are
/// kept verbatim (uppercased) in [`Status::Other`] so they still display and
/// filter, and they sort after every known status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    Passed,
    Failed,
    Broken,
    Skipped,
    Other(String),
}

impl Status {
    /// Parses a raw status string, ignoring case and surrounding whitespace.
    ///
    /// ```
    /// use reportlens::domain::Status;
    ///
    /// assert_eq!(Status::parse("passed"), Status::Passed);
    /// assert_eq!(Status::parse(" Broken "), Status::Broken);
    /// assert_eq!(Status::parse("xfail"), Status::Other("XFAIL".to_string()));
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        match upper.as_str() {
            "PASSED" => Self::Passed,
            "FAILED" => Self::Failed,
            "BROKEN" => Self::Broken,
            "SKIPPED" => Self::Skipped,
            _ => Self::Other(upper),
        }
    }

    /// Uppercase form used by the status multi-select.
    #[must_use]
    pub fn as_upper(&self) -> &str {
        match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Broken => "BROKEN",
            Self::Skipped => "SKIPPED",
            Self::Other(raw) => raw,
        }
    }

    /// Lowercase form used by the filter toggle buttons.
    #[must_use]
    pub fn as_lower(&self) -> String {
        self.as_upper().to_lowercase()
    }

    /// Fixed sort priority: failures first, unrecognized statuses last.
    #[must_use]
    pub const fn priority(&self) -> u8 {
        match self {
            Self::Failed => 0,
            Self::Broken => 1,
            Self::Passed => 2,
            Self::Skipped => 3,
            Self::Other(_) => 4,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_upper())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_upper())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Per-status tallies for a module or a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub passed: usize,
    pub failed: usize,
    pub broken: usize,
    pub skipped: usize,
    pub other: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: &Status) {
        match status {
            Status::Passed => self.passed += 1,
            Status::Failed => self.failed += 1,
            Status::Broken => self.broken += 1,
            Status::Skipped => self.skipped += 1,
            Status::Other(_) => self.other += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.failed + self.broken + self.skipped + self.other
    }

    pub fn merge(&mut self, other: &Self) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.broken += other.broken;
        self.skipped += other.skipped;
        self.other += other.other;
    }
}

/// A single test result.
///
/// `duration` is in seconds and `start_time` is a Unix timestamp in seconds.
/// Either may be missing in the source report; sorting treats a missing or
/// non-finite value as `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub name: String,
    pub status: Status,
    /// Name of the owning module. Sub-entries of a group carry the group's module.
    pub module: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: EntryDetails,
    #[serde(default = "visible_default")]
    pub visible: bool,
}

impl Entry {
    /// Creates a visible entry with no timing information.
    ///
    /// ```
    /// use reportlens::domain::{Entry, Status};
    ///
    /// let entry = Entry::new("t1", "test_login", Status::Passed, "tests/test_auth.py")
    ///     .with_duration(0.25);
    /// assert_eq!(entry.duration, Some(0.25));
    /// assert!(entry.visible);
    /// ```
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        status: Status,
        module: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status,
            module: module.into(),
            duration: None,
            start_time: None,
            error: None,
            details: EntryDetails::default(),
            visible: true,
        }
    }

    #[must_use]
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    #[must_use]
    pub fn with_start_time(mut self, timestamp: f64) -> Self {
        self.start_time = Some(timestamp);
        self
    }
}

/// One argument of a parametrized run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub url: String,
}

/// A tracker issue the test is known to trip over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownBug {
    pub url: Option<String>,
    pub description: Option<String>,
}

/// Everything a report records about a test besides its outcome and timing.
///
/// `info` keeps the order the logger wrote the keys in; a key that was
/// reported several times has its values joined with `", "`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDetails {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub info: Vec<(String, String)>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub known_bugs: Vec<KnownBug>,
    /// Full traceback of the failure; [`Entry::error`] holds only its summary.
    #[serde(default)]
    pub traceback: Option<String>,
}

impl EntryDetails {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.parameters.is_empty()
            && self.info.is_empty()
            && self.links.is_empty()
            && self.known_bugs.is_empty()
            && self.traceback.is_none()
    }
}

/// Parametrized runs of one test function, shown as a collapsible row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub module: String,
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub expanded: bool,
    #[serde(default = "visible_default")]
    pub visible: bool,
}

impl Group {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        module: impl Into<String>,
        entries: Vec<Entry>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            module: module.into(),
            entries,
            expanded: false,
            visible: true,
        }
    }

    /// Most severe status among the runs (lowest sort priority wins).
    ///
    /// An empty group reports `SKIPPED`.
    #[must_use]
    pub fn aggregate_status(&self) -> Status {
        self.entries
            .iter()
            .map(|entry| &entry.status)
            .min_by_key(|status| status.priority())
            .cloned()
            .unwrap_or(Status::Skipped)
    }

    /// Sum of the runs' finite durations, `None` when no run has one.
    #[must_use]
    pub fn total_duration(&self) -> Option<f64> {
        self.entries
            .iter()
            .filter_map(|entry| entry.duration.filter(|d| d.is_finite()))
            .fold(None, |acc, d| Some(acc.unwrap_or(0.0) + d))
    }

    /// Earliest finite start time among the runs.
    #[must_use]
    pub fn earliest_start(&self) -> Option<f64> {
        self.entries
            .iter()
            .filter_map(|entry| entry.start_time.filter(|t| t.is_finite()))
            .reduce(f64::min)
    }
}

/// A direct child of a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestNode {
    Single(Entry),
    Group(Group),
}

impl TestNode {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Single(entry) => &entry.id,
            Self::Group(group) => &group.id,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Single(entry) => &entry.name,
            Self::Group(group) => &group.name,
        }
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        match self {
            Self::Single(entry) => entry.visible,
            Self::Group(group) => group.visible,
        }
    }

    /// Iterates the leaf entries under this node.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        let slice = match self {
            Self::Single(entry) => std::slice::from_ref(entry),
            Self::Group(group) => group.entries.as_slice(),
        };
        slice.iter()
    }
}

/// Top-level container, typically one test file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub name: String,
    pub nodes: Vec<TestNode>,
    #[serde(default = "visible_default")]
    pub expanded: bool,
    #[serde(default = "visible_default")]
    pub visible: bool,
}

impl Module {
    /// Creates an expanded, visible module. The module name doubles as its id.
    #[must_use]
    pub fn new(name: impl Into<String>, nodes: Vec<TestNode>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            nodes,
            expanded: true,
            visible: true,
        }
    }

    /// Tallies statuses over every leaf entry in the module.
    #[must_use]
    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for entry in self.nodes.iter().flat_map(TestNode::entries) {
            counts.record(&entry.status);
        }
        counts
    }

    /// Iterates every leaf entry in the module.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.nodes.iter().flat_map(TestNode::entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(Status::parse("FAILED"), Status::Failed);
        assert_eq!(Status::parse("failed"), Status::Failed);
        assert_eq!(Status::parse("Skipped"), Status::Skipped);
        assert_eq!(Status::parse("none"), Status::Other("NONE".to_string()));
    }

    #[test]
    fn status_serializes_uppercase() {
        let json = serde_json::to_string(&Status::Broken).unwrap();
        assert_eq!(json, "\"BROKEN\"");
        let parsed: Status = serde_json::from_str("\"passed\"").unwrap();
        assert_eq!(parsed, Status::Passed);
    }

    #[test]
    fn group_aggregates_worst_status_and_timing() {
        let group = Group::new(
            "g",
            "test_add",
            "m",
            vec![
                Entry::new("a", "test_add[1]", Status::Passed, "m")
                    .with_duration(0.5)
                    .with_start_time(20.0),
                Entry::new("b", "test_add[2]", Status::Broken, "m").with_start_time(10.0),
                Entry::new("c", "test_add[3]", Status::Skipped, "m").with_duration(1.0),
            ],
        );

        assert_eq!(group.aggregate_status(), Status::Broken);
        assert_eq!(group.total_duration(), Some(1.5));
        assert_eq!(group.earliest_start(), Some(10.0));
    }

    #[test]
    fn group_without_timing_reports_none() {
        let group = Group::new("g", "g", "m", vec![Entry::new("a", "a", Status::Passed, "m")]);
        assert_eq!(group.total_duration(), None);
        assert_eq!(group.earliest_start(), None);
    }

    #[test]
    fn module_counts_include_group_runs() {
        let module = Module::new(
            "m",
            vec![
                TestNode::Single(Entry::new("a", "a", Status::Failed, "m")),
                TestNode::Group(Group::new(
                    "g",
                    "g",
                    "m",
                    vec![
                        Entry::new("b", "b", Status::Passed, "m"),
                        Entry::new("c", "c", Status::Passed, "m"),
                    ],
                )),
            ],
        );

        let counts = module.counts();
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.passed, 2);
        assert_eq!(counts.total(), 3);
    }
}
