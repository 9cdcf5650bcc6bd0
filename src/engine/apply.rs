//! One filter/sort pass over the report tree.

use crate::domain::{Module, TestNode};
use crate::engine::filter::{matches, FilterSpec};
use crate::engine::sort::{compare, SortSpec};

/// What a pass left visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub visible_modules: usize,
    /// Visible leaf entries, counting each visible run of a group.
    pub visible_entries: usize,
}

impl ApplyOutcome {
    /// `true` when nothing is visible and the empty-state message applies.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.visible_modules == 0
    }
}

/// Reorders and filters `modules` in place.
///
/// Each module's direct children are stable-sorted with [`compare`], each
/// group's runs are stable-sorted the same way, and every entry's `visible`
/// flag is set from [`matches`]. A group is visible iff any of its runs is;
/// a module is visible iff any of its children is. Module order is left as
/// loaded.
///
/// # Example
///
/// ```
/// use reportlens::domain::{Entry, Module, Status, TestNode};
/// use reportlens::engine::{apply, normalize, Selection, SortSpec};
///
/// let mut modules = vec![Module::new("A", vec![
///     TestNode::Single(Entry::new("t1", "t1", Status::Passed, "A")),
///     TestNode::Single(Entry::new("t2", "t2", Status::Failed, "A")),
/// ])];
/// let spec = normalize(&Selection { statuses: vec!["FAILED".into()], ..Selection::default() });
///
/// let outcome = apply(&mut modules, &spec, &SortSpec::default());
/// assert_eq!(outcome.visible_modules, 1);
/// assert_eq!(outcome.visible_entries, 1);
/// ```
pub fn apply(modules: &mut [Module], spec: &FilterSpec, sort: &SortSpec) -> ApplyOutcome {
    let _span = tracing::debug_span!("engine_apply",
        module_count = modules.len(),
        sort = %sort
    )
    .entered();

    let mut outcome = ApplyOutcome::default();

    for module in modules.iter_mut() {
        module.nodes.sort_by(|a, b| compare(a, b, sort));

        let mut module_visible = false;
        for node in &mut module.nodes {
            match node {
                TestNode::Single(entry) => {
                    entry.visible = matches(entry, spec);
                    if entry.visible {
                        outcome.visible_entries += 1;
                        module_visible = true;
                    }
                }
                TestNode::Group(group) => {
                    group.entries.sort_by(|a, b| compare(a, b, sort));
                    let mut any = false;
                    for entry in &mut group.entries {
                        entry.visible = matches(entry, spec);
                        if entry.visible {
                            outcome.visible_entries += 1;
                            any = true;
                        }
                    }
                    group.visible = any;
                    module_visible |= any;
                }
            }
        }

        module.visible = module_visible;
        if module_visible {
            outcome.visible_modules += 1;
        }
    }

    tracing::debug!(
        visible_modules = outcome.visible_modules,
        visible_entries = outcome.visible_entries,
        filtered = !spec.is_empty(),
        "filter pass complete"
    );

    outcome
}
