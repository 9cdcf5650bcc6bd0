//! Sibling ordering.
//!
//! A [`SortSpec`] names one of four keys and a direction. [`compare`] is a
//! total order over anything implementing [`SortKey`], so a stable sort with
//! it is deterministic, and `desc` is exactly the reverse of `asc`.

use crate::domain::{Entry, Group, TestNode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Name,
    Status,
    Duration,
    StartTime,
}

impl SortField {
    pub const ALL: [Self; 4] = [Self::Name, Self::Status, Self::Duration, Self::StartTime];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Status => "status",
            Self::Duration => "duration",
            Self::StartTime => "starttime",
        }
    }

    /// Column header shown in the pane.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Status => "Status",
            Self::Duration => "Duration",
            Self::StartTime => "Start",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Active sort key and direction.
///
/// Persisted as the string `field_order`, e.g. `duration_desc`.
///
/// ```
/// use reportlens::engine::{SortField, SortOrder, SortSpec};
///
/// let spec: SortSpec = "duration_desc".parse().unwrap();
/// assert_eq!(spec.field, SortField::Duration);
/// assert_eq!(spec.order, SortOrder::Desc);
/// assert_eq!(spec.to_string(), "duration_desc");
/// assert_eq!(SortSpec::default().to_string(), "starttime_asc");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl SortSpec {
    #[must_use]
    pub const fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Next state of a sort button press.
    ///
    /// Pressing a new field sorts ascending by it, pressing the active field
    /// flips to descending, and a third press toggles the button off, which
    /// returns to `default`.
    #[must_use]
    pub fn cycle(self, field: SortField, default: Self) -> Self {
        if self.field != field {
            return Self::new(field, SortOrder::Asc);
        }
        if self == default {
            return Self::new(field, self.order.flipped());
        }
        match self.order {
            SortOrder::Asc => Self::new(field, SortOrder::Desc),
            SortOrder::Desc => default,
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::new(SortField::StartTime, SortOrder::Asc)
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.field.as_str(), self.order.as_str())
    }
}

/// A sort string that is not `field_order` with a known field and order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized sort key: {0:?}")]
pub struct ParseSortError(pub String);

impl Serialize for SortSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SortSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for SortSpec {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSortError(s.to_string());
        let (field, order) = s.trim().rsplit_once('_').ok_or_else(err)?;

        let field = match field.to_ascii_lowercase().as_str() {
            "name" => SortField::Name,
            "status" => SortField::Status,
            "duration" => SortField::Duration,
            "starttime" | "start_time" => SortField::StartTime,
            _ => return Err(err()),
        };
        let order = match order.to_ascii_lowercase().as_str() {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            _ => return Err(err()),
        };
        Ok(Self { field, order })
    }
}

/// Values a node exposes to [`compare`].
///
/// Missing or non-finite numbers must be reported as `0.0`.
pub trait SortKey {
    fn sort_name(&self) -> String;
    fn sort_priority(&self) -> u8;
    fn sort_duration(&self) -> f64;
    fn sort_start(&self) -> f64;
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    match value {
        // Folds -0.0 into 0.0 so `total_cmp` treats them as equal.
        Some(v) if v.is_finite() && v != 0.0 => v,
        _ => 0.0,
    }
}

impl SortKey for Entry {
    fn sort_name(&self) -> String {
        self.name.to_lowercase()
    }

    fn sort_priority(&self) -> u8 {
        self.status.priority()
    }

    fn sort_duration(&self) -> f64 {
        finite_or_zero(self.duration.filter(|d| *d >= 0.0))
    }

    fn sort_start(&self) -> f64 {
        finite_or_zero(self.start_time)
    }
}

impl SortKey for Group {
    fn sort_name(&self) -> String {
        self.name.to_lowercase()
    }

    fn sort_priority(&self) -> u8 {
        self.aggregate_status().priority()
    }

    fn sort_duration(&self) -> f64 {
        finite_or_zero(self.total_duration())
    }

    fn sort_start(&self) -> f64 {
        finite_or_zero(self.earliest_start())
    }
}

impl SortKey for TestNode {
    fn sort_name(&self) -> String {
        match self {
            Self::Single(entry) => entry.sort_name(),
            Self::Group(group) => group.sort_name(),
        }
    }

    fn sort_priority(&self) -> u8 {
        match self {
            Self::Single(entry) => entry.sort_priority(),
            Self::Group(group) => group.sort_priority(),
        }
    }

    fn sort_duration(&self) -> f64 {
        match self {
            Self::Single(entry) => entry.sort_duration(),
            Self::Group(group) => group.sort_duration(),
        }
    }

    fn sort_start(&self) -> f64 {
        match self {
            Self::Single(entry) => entry.sort_start(),
            Self::Group(group) => group.sort_start(),
        }
    }
}

/// Compares two nodes under `spec`.
///
/// ```
/// use reportlens::domain::{Entry, Status};
/// use reportlens::engine::{compare, SortField, SortOrder, SortSpec};
/// use std::cmp::Ordering;
///
/// let failed = Entry::new("a", "a", Status::Failed, "m");
/// let passed = Entry::new("b", "b", Status::Passed, "m");
/// let by_status = SortSpec::new(SortField::Status, SortOrder::Asc);
/// assert_eq!(compare(&failed, &passed, &by_status), Ordering::Less);
/// ```
#[must_use]
pub fn compare<T: SortKey + ?Sized>(a: &T, b: &T, spec: &SortSpec) -> Ordering {
    let ordering = match spec.field {
        SortField::Name => a.sort_name().cmp(&b.sort_name()),
        SortField::Status => a.sort_priority().cmp(&b.sort_priority()),
        SortField::Duration => a.sort_duration().total_cmp(&b.sort_duration()),
        SortField::StartTime => a.sort_start().total_cmp(&b.sort_start()),
    };
    match spec.order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Status;

    fn timed(name: &str, duration: f64) -> Entry {
        Entry::new(name, name, Status::Passed, "m").with_duration(duration)
    }

    fn sorted(mut entries: Vec<Entry>, spec: SortSpec) -> Vec<Entry> {
        entries.sort_by(|a, b| compare(a, b, &spec));
        entries
    }

    #[test]
    fn duration_desc_orders_largest_first() {
        let out = sorted(
            vec![timed("a", 1.2), timed("b", 0.5), timed("c", 3.0)],
            SortSpec::new(SortField::Duration, SortOrder::Desc),
        );
        let durations: Vec<_> = out.iter().map(|e| e.duration).collect();
        assert_eq!(durations, vec![Some(3.0), Some(1.2), Some(0.5)]);
    }

    #[test]
    fn status_asc_puts_failures_first_and_unknown_last() {
        let out = sorted(
            vec![
                Entry::new("1", "s", Status::Skipped, "m"),
                Entry::new("2", "x", Status::parse("xfail"), "m"),
                Entry::new("3", "p", Status::Passed, "m"),
                Entry::new("4", "b", Status::Broken, "m"),
                Entry::new("5", "f", Status::Failed, "m"),
            ],
            SortSpec::new(SortField::Status, SortOrder::Asc),
        );
        let ids: Vec<_> = out.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["5", "4", "3", "1", "2"]);
    }

    #[test]
    fn name_ignores_case() {
        let out = sorted(
            vec![timed("beta", 0.0), timed("Alpha", 0.0), timed("gamma", 0.0)],
            SortSpec::new(SortField::Name, SortOrder::Asc),
        );
        let names: Vec<_> = out.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn missing_and_invalid_numbers_sort_as_zero() {
        let missing = Entry::new("m", "m", Status::Passed, "m");
        let nan = Entry::new("n", "n", Status::Passed, "m").with_start_time(f64::NAN);
        let early = Entry::new("e", "e", Status::Passed, "m").with_start_time(-5.0);
        let spec = SortSpec::new(SortField::StartTime, SortOrder::Asc);

        assert_eq!(compare(&missing, &nan, &spec), Ordering::Equal);
        assert_eq!(compare(&early, &missing, &spec), Ordering::Less);

        let negative = timed("neg", -1.0);
        let zero = timed("zero", 0.0);
        let by_duration = SortSpec::new(SortField::Duration, SortOrder::Asc);
        assert_eq!(compare(&negative, &zero, &by_duration), Ordering::Equal);
    }

    #[test]
    fn stable_sort_keeps_ties_in_input_order() {
        let out = sorted(
            vec![timed("c", 1.0), timed("a", 1.0), timed("b", 1.0)],
            SortSpec::new(SortField::Duration, SortOrder::Desc),
        );
        let names: Vec<_> = out.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn group_keys_derive_from_runs() {
        let group = TestNode::Group(Group::new(
            "g",
            "test_add",
            "m",
            vec![
                Entry::new("a", "a", Status::Passed, "m").with_duration(1.0).with_start_time(50.0),
                Entry::new("b", "b", Status::Failed, "m").with_duration(2.0).with_start_time(40.0),
            ],
        ));
        let single = TestNode::Single(
            Entry::new("s", "s", Status::Broken, "m").with_duration(2.5).with_start_time(45.0),
        );

        let status = SortSpec::new(SortField::Status, SortOrder::Asc);
        let duration = SortSpec::new(SortField::Duration, SortOrder::Asc);
        let start = SortSpec::new(SortField::StartTime, SortOrder::Asc);

        assert_eq!(compare(&group, &single, &status), Ordering::Less);
        assert_eq!(compare(&single, &group, &duration), Ordering::Less);
        assert_eq!(compare(&group, &single, &start), Ordering::Less);
    }

    #[test]
    fn parse_accepts_known_keys_only() {
        assert_eq!(
            "name_asc".parse::<SortSpec>(),
            Ok(SortSpec::new(SortField::Name, SortOrder::Asc))
        );
        assert_eq!(
            "start_time_desc".parse::<SortSpec>(),
            Ok(SortSpec::new(SortField::StartTime, SortOrder::Desc))
        );
        assert!("size_asc".parse::<SortSpec>().is_err());
        assert!("name".parse::<SortSpec>().is_err());
        assert!("name_sideways".parse::<SortSpec>().is_err());
    }

    #[test]
    fn parse_error_names_the_rejected_key() {
        let err = "size_asc".parse::<SortSpec>().unwrap_err();
        assert_eq!(err, ParseSortError("size_asc".to_string()));
        assert_eq!(err.to_string(), "unrecognized sort key: \"size_asc\"");

        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn cycle_walks_asc_desc_default() {
        let default = SortSpec::default();
        let first = default.cycle(SortField::Duration, default);
        assert_eq!(first, SortSpec::new(SortField::Duration, SortOrder::Asc));
        let second = first.cycle(SortField::Duration, default);
        assert_eq!(second, SortSpec::new(SortField::Duration, SortOrder::Desc));
        assert_eq!(second.cycle(SortField::Duration, default), default);

        // Pressing the default field's button flips it before resetting.
        let flipped = default.cycle(SortField::StartTime, default);
        assert_eq!(flipped, SortSpec::new(SortField::StartTime, SortOrder::Desc));
        assert_eq!(flipped.cycle(SortField::StartTime, default), default);
    }

    mod properties {
        use super::*;
        use proptest::{collection::vec, prelude::*};

        fn arb_entry() -> impl Strategy<Value = Entry> {
            (
                "[a-zA-Z]{0,6}",
                prop_oneof![
                    Just(Status::Passed),
                    Just(Status::Failed),
                    Just(Status::Broken),
                    Just(Status::Skipped),
                    Just(Status::parse("unknown")),
                ],
                proptest::option::of(prop_oneof![any::<f64>(), 0.0..100.0f64]),
                proptest::option::of(prop_oneof![any::<f64>(), 0.0..100.0f64]),
            )
                .prop_map(|(name, status, duration, start)| {
                    let mut entry = Entry::new(name.clone(), name, status, "m");
                    entry.duration = duration;
                    entry.start_time = start;
                    entry
                })
        }

        fn arb_spec() -> impl Strategy<Value = SortSpec> {
            (
                prop::sample::select(SortField::ALL.to_vec()),
                prop_oneof![Just(SortOrder::Asc), Just(SortOrder::Desc)],
            )
                .prop_map(|(field, order)| SortSpec::new(field, order))
        }

        proptest! {
            #[test]
            fn proptest_irreflexive(a in arb_entry(), spec in arb_spec()) {
                prop_assert_eq!(compare(&a, &a, &spec), Ordering::Equal);
            }

            #[test]
            fn proptest_desc_reverses_asc(a in arb_entry(), b in arb_entry(), field in prop::sample::select(SortField::ALL.to_vec())) {
                let asc = compare(&a, &b, &SortSpec::new(field, SortOrder::Asc));
                let desc = compare(&a, &b, &SortSpec::new(field, SortOrder::Desc));
                prop_assert_eq!(asc, desc.reverse());
                prop_assert_eq!(asc, compare(&b, &a, &SortSpec::new(field, SortOrder::Asc)).reverse());
            }

            #[test]
            fn proptest_transitive(a in arb_entry(), b in arb_entry(), c in arb_entry(), spec in arb_spec()) {
                let ab = compare(&a, &b, &spec);
                let bc = compare(&b, &c, &spec);
                if ab != Ordering::Greater && bc != Ordering::Greater {
                    prop_assert_ne!(compare(&a, &c, &spec), Ordering::Greater);
                }
                if ab == Ordering::Equal && bc == Ordering::Equal {
                    prop_assert_eq!(compare(&a, &c, &spec), Ordering::Equal);
                }
            }

            #[test]
            fn proptest_status_asc_failed_passed_skipped(entries in vec(arb_entry(), 0..24)) {
                let out = sorted(entries, SortSpec::new(SortField::Status, SortOrder::Asc));
                let priorities: Vec<u8> = out.iter().map(|e| e.status.priority()).collect();
                prop_assert!(priorities.windows(2).all(|w| w[0] <= w[1]));

                let position = |status: &Status| out.iter().position(|e| &e.status == status);
                if let (Some(f), Some(p)) = (position(&Status::Failed), position(&Status::Passed)) {
                    prop_assert!(f < p);
                }
                if let (Some(p), Some(s)) = (position(&Status::Passed), position(&Status::Skipped)) {
                    prop_assert!(p < s);
                }
            }
        }
    }
}
