//! Filter predicate derived from the pane's controls.
//!
//! [`Selection`] is the raw control state as the user left it: whatever was
//! typed into the search box and whichever options are ticked in the status
//! multi-select, module multi-select, and filter toggle buttons.
//! [`normalize`] turns it into a [`FilterSpec`], which [`matches`] evaluates
//! against a single entry.

use crate::domain::Entry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Label of the toggle button that clears the button dimension.
pub const ALL_BUTTON: &str = "all";

/// Raw control state, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub search: String,
    pub statuses: Vec<String>,
    pub modules: Vec<String>,
    pub buttons: Vec<String>,
}

/// Normalized filter constraints. An empty dimension imposes no constraint.
///
/// The serialized form is the persisted `filters` record:
/// `{"search": "", "status": [], "module": [], "buttons": []}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Lowercase substring matched against entry names.
    #[serde(default)]
    pub search: String,
    /// Uppercase status names.
    #[serde(default, rename = "status")]
    pub statuses: BTreeSet<String>,
    /// Module names, compared verbatim.
    #[serde(default, rename = "module")]
    pub modules: BTreeSet<String>,
    /// Lowercase status names from the filter toggle buttons.
    #[serde(default)]
    pub buttons: BTreeSet<String>,
}

impl FilterSpec {
    /// Returns `true` when no dimension constrains anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
            && self.statuses.is_empty()
            && self.modules.is_empty()
            && self.buttons.is_empty()
    }

    /// Re-applies normalization to a spec that came from outside, such as
    /// persisted storage. A spec produced by [`normalize`] is unchanged.
    #[must_use]
    pub fn normalized(self) -> Self {
        normalize(&Selection::from(self))
    }
}

impl From<FilterSpec> for Selection {
    fn from(spec: FilterSpec) -> Self {
        Self {
            search: spec.search,
            statuses: spec.statuses.into_iter().collect(),
            modules: spec.modules.into_iter().collect(),
            buttons: spec.buttons.into_iter().collect(),
        }
    }
}

/// Builds a [`FilterSpec`] from raw control state.
///
/// Search text is trimmed and lowercased, statuses are uppercased, module
/// names are kept verbatim, and active toggle labels other than `all` are
/// lowercased. Blank selections are dropped.
///
/// # Example
///
/// ```
/// use reportlens::engine::{normalize, Selection};
///
/// let spec = normalize(&Selection {
///     search: "  Login ".to_string(),
///     statuses: vec!["failed".to_string()],
///     modules: vec![],
///     buttons: vec!["All".to_string()],
/// });
/// assert_eq!(spec.search, "login");
/// assert!(spec.statuses.contains("FAILED"));
/// assert!(spec.buttons.is_empty());
/// ```
#[must_use]
pub fn normalize(selection: &Selection) -> FilterSpec {
    let statuses = selection
        .statuses
        .iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

    let modules = selection
        .modules
        .iter()
        .filter(|m| !m.is_empty())
        .cloned()
        .collect();

    let buttons = selection
        .buttons
        .iter()
        .map(|b| b.trim().to_lowercase())
        .filter(|b| !b.is_empty() && b != ALL_BUTTON)
        .collect();

    FilterSpec {
        search: selection.search.trim().to_lowercase(),
        statuses,
        modules,
        buttons,
    }
}

/// Evaluates every non-empty constraint of `spec` against one entry.
///
/// The module dimension is checked against the entry's own `module`, which
/// for a group's runs is the group's module.
#[must_use]
pub fn matches(entry: &Entry, spec: &FilterSpec) -> bool {
    if !spec.search.is_empty() && !entry.name.to_lowercase().contains(&spec.search) {
        return false;
    }
    if !spec.statuses.is_empty() && !spec.statuses.contains(entry.status.as_upper()) {
        return false;
    }
    if !spec.modules.is_empty() && !spec.modules.contains(&entry.module) {
        return false;
    }
    if !spec.buttons.is_empty() && !spec.buttons.contains(&entry.status.as_lower()) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Status;

    fn entry(name: &str, status: Status, module: &str) -> Entry {
        Entry::new(format!("{module}::{name}"), name, status, module)
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn normalize_drops_blank_and_all_selections() {
        let spec = normalize(&Selection {
            search: "   ".to_string(),
            statuses: vec![String::new(), "Passed".to_string()],
            modules: vec![String::new(), "tests/Test_A.py".to_string()],
            buttons: vec!["ALL".to_string(), " Broken ".to_string()],
        });

        assert_eq!(spec.search, "");
        assert_eq!(spec.statuses, set(&["PASSED"]));
        assert_eq!(spec.modules, set(&["tests/Test_A.py"]));
        assert_eq!(spec.buttons, set(&["broken"]));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let spec = FilterSpec { search: "login".to_string(), ..FilterSpec::default() };
        assert!(matches(&entry("test_Login_ok", Status::Passed, "m"), &spec));
        assert!(!matches(&entry("test_logout", Status::Passed, "m"), &spec));
    }

    #[test]
    fn dimensions_combine_with_and() {
        let spec = FilterSpec {
            search: String::new(),
            statuses: set(&["FAILED", "BROKEN"]),
            modules: set(&["a"]),
            buttons: set(&["failed"]),
        };

        assert!(matches(&entry("t", Status::Failed, "a"), &spec));
        assert!(!matches(&entry("t", Status::Broken, "a"), &spec));
        assert!(!matches(&entry("t", Status::Failed, "b"), &spec));
    }

    #[test]
    fn unrecognized_status_matches_its_own_label() {
        let spec = FilterSpec { statuses: set(&["XFAIL"]), ..FilterSpec::default() };
        assert!(matches(&entry("t", Status::parse("xfail"), "m"), &spec));
        assert!(!matches(&entry("t", Status::Skipped, "m"), &spec));
    }

    #[test]
    fn persisted_layout_uses_singular_keys() {
        let spec = FilterSpec {
            search: "cart".to_string(),
            statuses: set(&["FAILED"]),
            modules: set(&["m"]),
            buttons: BTreeSet::new(),
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"search": "cart", "status": ["FAILED"], "module": ["m"], "buttons": []})
        );
    }

    #[test]
    fn normalized_is_a_fixpoint_for_normalized_specs() {
        let spec = normalize(&Selection {
            search: " Cart ".to_string(),
            statuses: vec!["failed".to_string()],
            modules: vec!["m".to_string()],
            buttons: vec!["passed".to_string()],
        });
        assert_eq!(spec.clone().normalized(), spec);
    }

    mod properties {
        use super::*;
        use proptest::{collection::vec, prelude::*};

        fn arb_status() -> impl Strategy<Value = Status> {
            prop_oneof![
                Just(Status::Passed),
                Just(Status::Failed),
                Just(Status::Broken),
                Just(Status::Skipped),
                "[A-Z]{1,8}".prop_map(|s| Status::parse(&s)),
            ]
        }

        proptest! {
            // No constraints means everything is visible.
            #[test]
            fn proptest_empty_spec_matches_everything(
                names in vec(any::<String>(), 0..16),
                modules in vec(any::<String>(), 0..16),
                status in arb_status(),
            ) {
                let spec = FilterSpec::default();
                for (name, module) in names.iter().zip(modules.iter()) {
                    prop_assert!(matches(&entry(name, status.clone(), module), &spec));
                }
            }

            // A search for any slice of the name matches, regardless of case.
            #[test]
            fn proptest_substring(
                prefix in "[a-zA-Z0-9_]{0,8}",
                substring in "[a-zA-Z0-9_]{1,8}",
                suffix in "[a-zA-Z0-9_]{0,8}",
            ) {
                let name = format!("{prefix}{substring}{suffix}");
                let spec = normalize(&Selection {
                    search: substring.to_uppercase(),
                    ..Selection::default()
                });
                prop_assert!(matches(&entry(&name, Status::Passed, "m"), &spec));
            }
        }
    }
}
