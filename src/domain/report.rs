//! Test-run report document and its loader.
//!
//! The report is the JSON file written by the test logger at the end of a run.
//! Its `modules` object maps a module (test file) name to the tests recorded for
//! it. Tests that share an `originalname` are parametrized runs of one function
//! and are folded into a [`Group`]; every other test becomes a single
//! [`Entry`].
//!
//! Loading is lenient about value shapes because the logger serializes
//! through Python's `json` module: empty containers may be `null`, durations
//! may be numbers or `timedelta` strings, and timestamps may be epoch numbers
//! or ISO datetimes.

use crate::domain::error::{ReportLensError, Result};
use crate::domain::node::{
    Entry, EntryDetails, Group, KnownBug, Link, Module, Parameter, Status, StatusCounts, TestNode,
};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(default)]
    proj_name: Option<String>,
    #[serde(default)]
    env: Option<String>,
    #[serde(default)]
    start_time: Option<Value>,
    #[serde(default)]
    end_time: Option<Value>,
    #[serde(default)]
    base_url: Option<Value>,
    #[serde(default)]
    modules: Option<IndexMap<String, RawModule>>,
}

#[derive(Debug, Deserialize)]
struct RawModule {
    #[serde(default)]
    module_tests: Option<IndexMap<String, RawTest>>,
}

#[derive(Debug, Deserialize)]
struct RawTest {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    originalname: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    duration: Option<Value>,
    #[serde(default)]
    start_time: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    parameters: Option<Value>,
    #[serde(default)]
    info: Option<Value>,
    #[serde(default)]
    links: Option<Value>,
    #[serde(default)]
    known_bugs: Option<Value>,
}

/// Position of a node inside [`Report::modules`] at the time of lookup.
///
/// Indices are only valid until the next sort pass reorders siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLocation {
    pub module: usize,
    pub node: Option<usize>,
    pub entry: Option<usize>,
}

/// A loaded test-run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub project: Option<String>,
    pub env: Option<String>,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    /// Address of the system under test, when the run recorded one.
    #[serde(default)]
    pub base_url: Option<String>,
    pub modules: Vec<Module>,
}

impl Report {
    /// Reads and parses a report file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a report document.
    pub fn from_file(path: &Path) -> Result<Self> {
        let _span = tracing::debug_span!("report_from_file", path = ?path).entered();
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parses a report from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ReportLensError::Report`] for malformed JSON or a top-level
    /// value that is not an object.
    ///
    /// # Example
    ///
    /// ```
    /// use reportlens::domain::Report;
    ///
    /// let report = Report::from_json_str(r#"{
    ///     "modules": {
    ///         "tests/test_cart.py": {
    ///             "module_tests": {
    ///                 "test_add[1]": {"originalname": "test_add", "status": "PASSED"},
    ///                 "test_add[2]": {"originalname": "test_add", "status": "FAILED"},
    ///                 "test_remove": {"status": "passed", "duration": 0.3}
    ///             }
    ///         }
    ///     }
    /// }"#)?;
    /// assert_eq!(report.modules[0].nodes.len(), 2);
    /// # Ok::<(), reportlens::ReportLensError>(())
    /// ```
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let raw: RawReport = serde_json::from_str(contents)
            .map_err(|e| ReportLensError::Report(format!("failed to parse report JSON: {e}")))?;

        let modules: Vec<Module> = raw
            .modules
            .unwrap_or_default()
            .into_iter()
            .map(|(name, module)| build_module(name, module))
            .collect();

        tracing::debug!(
            module_count = modules.len(),
            entry_count = modules.iter().map(|m| m.entries().count()).sum::<usize>(),
            "report parsed"
        );

        Ok(Self {
            project: raw.proj_name,
            env: raw.env,
            start_time: raw.start_time.as_ref().and_then(parse_timestamp),
            end_time: raw.end_time.as_ref().and_then(parse_timestamp),
            base_url: raw.base_url.as_ref().and_then(plain_text),
            modules,
        })
    }

    /// Status tallies across the whole run.
    #[must_use]
    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for module in &self.modules {
            counts.merge(&module.counts());
        }
        counts
    }

    /// Finds a module, group, or entry by id.
    #[must_use]
    pub fn locate(&self, id: &str) -> Option<NodeLocation> {
        for (module_idx, module) in self.modules.iter().enumerate() {
            if module.id == id {
                return Some(NodeLocation { module: module_idx, node: None, entry: None });
            }
            for (node_idx, node) in module.nodes.iter().enumerate() {
                match node {
                    TestNode::Single(entry) if entry.id == id => {
                        return Some(NodeLocation {
                            module: module_idx,
                            node: Some(node_idx),
                            entry: None,
                        });
                    }
                    TestNode::Group(group) => {
                        if group.id == id {
                            return Some(NodeLocation {
                                module: module_idx,
                                node: Some(node_idx),
                                entry: None,
                            });
                        }
                        if let Some(entry_idx) = group.entries.iter().position(|e| e.id == id) {
                            return Some(NodeLocation {
                                module: module_idx,
                                node: Some(node_idx),
                                entry: Some(entry_idx),
                            });
                        }
                    }
                    TestNode::Single(_) => {}
                }
            }
        }
        None
    }

    /// Run wall-clock length in seconds, when both ends are known.
    #[must_use]
    pub fn run_duration(&self) -> Option<f64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if end >= start => Some(end - start),
            _ => None,
        }
    }
}

fn build_module(name: String, raw: RawModule) -> Module {
    enum Pending {
        Single(Entry),
        Group { original: String, entries: Vec<Entry> },
    }

    let mut pending: Vec<Pending> = Vec::new();
    let mut group_slots: HashMap<String, usize> = HashMap::new();

    for (key, test) in raw.module_tests.unwrap_or_default() {
        let original = test.originalname.clone();
        let entry = build_entry(&name, key, test);

        match original.filter(|orig| *orig != entry.name) {
            Some(original) => {
                if let Some(&slot) = group_slots.get(&original) {
                    if let Some(Pending::Group { entries, .. }) = pending.get_mut(slot) {
                        entries.push(entry);
                    }
                } else {
                    group_slots.insert(original.clone(), pending.len());
                    pending.push(Pending::Group { original, entries: vec![entry] });
                }
            }
            None => pending.push(Pending::Single(entry)),
        }
    }

    let nodes = pending
        .into_iter()
        .map(|p| match p {
            Pending::Single(entry) => TestNode::Single(entry),
            Pending::Group { mut entries, .. } if entries.len() == 1 => {
                TestNode::Single(entries.remove(0))
            }
            Pending::Group { original, entries } => TestNode::Group(Group::new(
                format!("{name}::{original}"),
                original,
                name.clone(),
                entries,
            )),
        })
        .collect();

    Module::new(name, nodes)
}

fn build_entry(module: &str, key: String, raw: RawTest) -> Entry {
    let details = build_details(&raw);
    let name = raw.name.filter(|n| !n.is_empty()).unwrap_or(key);
    let id = raw
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("{module}::{name}"));
    let status = raw.status.as_deref().map_or_else(|| Status::parse("NONE"), Status::parse);

    Entry {
        id,
        name,
        status,
        module: module.to_string(),
        duration: raw.duration.as_ref().and_then(parse_duration),
        start_time: raw.start_time.as_ref().and_then(parse_timestamp),
        error: raw.error.as_ref().and_then(error_text),
        details,
        visible: true,
    }
}

fn build_details(raw: &RawTest) -> EntryDetails {
    EntryDetails {
        description: raw.description.as_ref().and_then(plain_text),
        parameters: raw.parameters.as_ref().map(parse_parameters).unwrap_or_default(),
        info: raw.info.as_ref().map(parse_info).unwrap_or_default(),
        links: raw.links.as_ref().map(parse_links).unwrap_or_default(),
        known_bugs: raw.known_bugs.as_ref().map(parse_known_bugs).unwrap_or_default(),
        traceback: raw
            .error
            .as_ref()
            .and_then(|error| error.get("tb"))
            .and_then(plain_text),
    }
}

/// Display text for a scalar; blank strings and nulls count as absent.
fn plain_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        other => Some(other.to_string()),
    }
}

fn parse_parameters(value: &Value) -> Vec<Parameter> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let name = item.get("name").and_then(plain_text)?;
                let value = item.get("value").and_then(plain_text).unwrap_or_default();
                Some(Parameter { name, value })
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(name, value)| Parameter {
                name: name.clone(),
                value: plain_text(value).unwrap_or_default(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_info(value: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = value else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Array(items) => {
                    let parts: Vec<String> = items.iter().filter_map(plain_text).collect();
                    (!parts.is_empty()).then(|| parts.join(", "))
                }
                other => plain_text(other),
            }?;
            Some((key.clone(), text))
        })
        .collect()
}

fn parse_links(value: &Value) -> Vec<Link> {
    let Value::Object(map) = value else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(label, value)| {
            let raw = plain_text(value)?;
            Some(Link { label: label.clone(), url: anchor_url(&raw) })
        })
        .collect()
}

/// Links are stored as `<a href=URL>URL</a>`; keep only the target.
fn anchor_url(raw: &str) -> String {
    raw.split_once("href=")
        .and_then(|(_, rest)| {
            rest.trim_start_matches(|c: char| c == '"' || c == '\'')
                .split(|c: char| c == '>' || c == '"' || c == '\'' || c.is_whitespace())
                .next()
                .filter(|url| !url.is_empty())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| raw.to_string())
}

fn parse_known_bugs(value: &Value) -> Vec<KnownBug> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let bug = KnownBug {
                url: item.get("url").and_then(plain_text),
                description: item.get("description").and_then(plain_text),
            };
            (bug.url.is_some() || bug.description.is_some()).then_some(bug)
        })
        .collect()
}

fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("exc")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .or_else(|| Some(value.to_string())),
        other => Some(other.to_string()),
    }
}

/// Seconds from a number, a numeric string, or a `[N day(s), ]H:MM:SS[.ffffff]`
/// string.
fn parse_duration(value: &Value) -> Option<f64> {
    let seconds = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<f64>().ok().or_else(|| parse_clock(s))
        }
        _ => None,
    }?;
    (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
}

fn parse_clock(s: &str) -> Option<f64> {
    let (days, clock) = match s.split_once(',') {
        Some((days, clock)) => {
            let count = days
                .trim()
                .trim_end_matches("days")
                .trim_end_matches("day")
                .trim()
                .parse::<f64>()
                .ok()?;
            (count, clock)
        }
        None => (0.0, s),
    };
    let mut total = 0.0;
    for part in clock.split(':') {
        total = total * 60.0 + part.trim().parse::<f64>().ok()?;
    }
    Some(days * 86_400.0 + total)
}

/// Unix seconds from an epoch number, numeric string, RFC 3339 string, or
/// naive ISO datetime (interpreted as UTC).
fn parse_timestamp(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<f64>().ok().or_else(|| parse_datetime(s))
        }
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

#[allow(clippy::cast_precision_loss)]
fn parse_datetime(s: &str) -> Option<f64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_micros() as f64 / 1_000_000.0);
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc().timestamp_micros() as f64 / 1_000_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "proj_name": "shop",
        "env": "stage",
        "start_time": "2025-05-01 10:00:00",
        "end_time": "2025-05-01 10:00:30.5",
        "modules": {
            "tests/test_cart.py": {
                "module_results": {"PASSED": 2, "FAILED": 1},
                "module_tests": {
                    "test_add[1]": {"name": "test_add[1]", "originalname": "test_add",
                                    "status": "PASSED", "duration": 0.4, "id": "t-1"},
                    "test_add[2]": {"name": "test_add[2]", "originalname": "test_add",
                                    "status": "failed", "duration": "0:00:01.5",
                                    "error": {"exc": "AssertionError", "tb": "..."}},
                    "test_remove": {"name": "test_remove", "originalname": "test_remove",
                                    "status": "PASSED", "start_time": 1714557600.5}
                }
            },
            "tests/test_empty.py": {"module_results": null, "module_tests": null}
        }
    }"#;

    #[test]
    fn parses_modules_groups_and_entries() {
        let report = Report::from_json_str(SAMPLE).unwrap();
        assert_eq!(report.project.as_deref(), Some("shop"));
        assert_eq!(report.modules.len(), 2);

        let cart = &report.modules[0];
        assert_eq!(cart.name, "tests/test_cart.py");
        assert_eq!(cart.nodes.len(), 2);

        let TestNode::Group(group) = &cart.nodes[0] else {
            panic!("expected a group for parametrized runs");
        };
        assert_eq!(group.name, "test_add");
        assert_eq!(group.id, "tests/test_cart.py::test_add");
        assert_eq!(group.entries.len(), 2);
        assert_eq!(group.entries[0].id, "t-1");
        assert_eq!(group.entries[1].status, Status::Failed);
        assert_eq!(group.entries[1].duration, Some(1.5));
        assert_eq!(group.entries[1].error.as_deref(), Some("AssertionError"));
        assert!(group.entries.iter().all(|e| e.module == "tests/test_cart.py"));

        let TestNode::Single(single) = &cart.nodes[1] else {
            panic!("expected a single entry");
        };
        assert_eq!(single.id, "tests/test_cart.py::test_remove");
        assert_eq!(single.start_time, Some(1_714_557_600.5));

        assert!(report.modules[1].nodes.is_empty());
    }

    #[test]
    fn parses_run_window() {
        let report = Report::from_json_str(SAMPLE).unwrap();
        assert_eq!(report.run_duration(), Some(30.5));
    }

    #[test]
    fn counts_cover_all_entries() {
        let report = Report::from_json_str(SAMPLE).unwrap();
        let counts = report.counts();
        assert_eq!(counts.passed, 2);
        assert_eq!(counts.failed, 1);
    }

    #[test]
    fn missing_status_is_kept_as_unrecognized() {
        let report =
            Report::from_json_str(r#"{"modules": {"m": {"module_tests": {"t": {}}}}}"#).unwrap();
        let entry = report.modules[0].entries().next().unwrap();
        assert_eq!(entry.status, Status::Other("NONE".to_string()));
        assert_eq!(entry.name, "t");
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Report::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ReportLensError::Report(_)));
    }

    #[test]
    fn locate_finds_every_level() {
        let report = Report::from_json_str(SAMPLE).unwrap();

        assert_eq!(
            report.locate("tests/test_cart.py"),
            Some(NodeLocation { module: 0, node: None, entry: None })
        );
        assert_eq!(
            report.locate("tests/test_cart.py::test_add"),
            Some(NodeLocation { module: 0, node: Some(0), entry: None })
        );
        assert_eq!(
            report.locate("t-1"),
            Some(NodeLocation { module: 0, node: Some(0), entry: Some(0) })
        );
        assert_eq!(report.locate("nope"), None);
    }

    #[test]
    fn invalid_timing_values_are_dropped() {
        assert_eq!(parse_duration(&Value::from(-1.0)), None);
        assert_eq!(parse_duration(&Value::from("abc")), None);
        assert_eq!(parse_timestamp(&Value::from("yesterday")), None);
        assert_eq!(parse_timestamp(&Value::from("2025-05-01T10:00:00Z")), Some(1_746_093_600.0));
    }

    #[test]
    fn durations_with_a_day_count_fold_into_seconds() {
        assert_eq!(parse_duration(&Value::from("1 day, 2:03:04")), Some(93_784.0));
        assert_eq!(parse_duration(&Value::from("2 days, 0:00:01.5")), Some(172_801.5));
        assert_eq!(parse_duration(&Value::from("-1 day, 23:59:59")), None);
        assert_eq!(parse_duration(&Value::from("many days, 0:00:01")), None);
    }

    #[test]
    fn modules_and_tests_keep_report_order() {
        let report = Report::from_json_str(
            r#"{"modules": {
                "test_z.py": {"module_tests": {
                    "test_zeta": {"status": "PASSED"},
                    "test_alpha": {"status": "PASSED"}
                }},
                "test_a.py": {"module_tests": {
                    "test_zeta": {"status": "PASSED"},
                    "test_alpha": {"status": "PASSED"}
                }}
            }}"#,
        )
        .unwrap();

        let modules: Vec<&str> = report.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(modules, ["test_z.py", "test_a.py"]);
        for module in &report.modules {
            let names: Vec<&str> = module.entries().map(|e| e.name.as_str()).collect();
            assert_eq!(names, ["test_zeta", "test_alpha"]);
        }
    }

    #[test]
    fn parses_test_details_and_base_url() {
        let report = Report::from_json_str(
            r#"{"base_url": "https://stage.shop.test", "modules": {"tests/test_pay.py": {
                "module_tests": {"test_refund": {
                    "status": "FAILED",
                    "description": "Refunds go back to the original card.",
                    "parameters": [{"name": "amount", "value": 10}, {"name": "currency", "value": "EUR"}],
                    "info": {"BUILD": "1.4.2", "TAGS": ["slow", "payments"], "EMPTY": []},
                    "links": {"Ticket": "<a href=https://jira.test/PAY-7>https://jira.test/PAY-7</a>",
                              "Docs": "https://docs.test/refunds"},
                    "known_bugs": [{"url": "https://jira.test/PAY-1", "description": "flaky gateway"}, {}],
                    "error": {"exc": "AssertionError: 9 != 10", "tb": "Traceback (most recent call last):\n  ...\nAssertionError: 9 != 10"}
                }}
            }}}"#,
        )
        .unwrap();
        assert_eq!(report.base_url.as_deref(), Some("https://stage.shop.test"));

        let entry = report.modules[0].entries().next().unwrap();
        assert_eq!(entry.error.as_deref(), Some("AssertionError: 9 != 10"));

        let details = &entry.details;
        assert_eq!(details.description.as_deref(), Some("Refunds go back to the original card."));
        assert_eq!(
            details.parameters,
            vec![
                Parameter { name: "amount".into(), value: "10".into() },
                Parameter { name: "currency".into(), value: "EUR".into() },
            ]
        );
        assert_eq!(
            details.info,
            vec![
                ("BUILD".to_string(), "1.4.2".to_string()),
                ("TAGS".to_string(), "slow, payments".to_string()),
            ]
        );
        assert_eq!(
            details.links,
            vec![
                Link { label: "Ticket".into(), url: "https://jira.test/PAY-7".into() },
                Link { label: "Docs".into(), url: "https://docs.test/refunds".into() },
            ]
        );
        assert_eq!(
            details.known_bugs,
            vec![KnownBug {
                url: Some("https://jira.test/PAY-1".into()),
                description: Some("flaky gateway".into()),
            }]
        );
        assert!(details.traceback.as_deref().unwrap().starts_with("Traceback"));
        assert!(details.traceback.as_deref().unwrap().ends_with("9 != 10"));
    }

    #[test]
    fn tests_without_extras_have_empty_details() {
        let report = Report::from_json_str(SAMPLE).unwrap();
        assert_eq!(report.base_url, None);
        let remove = report.modules[0].entries().last().unwrap();
        assert!(remove.details.is_empty());
    }
}
