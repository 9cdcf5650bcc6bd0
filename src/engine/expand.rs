//! Per-id expansion flags for modules and groups.

use crate::domain::{Module, TestNode};
use std::collections::BTreeMap;

/// Sets the expansion flag of the module or group with `id`.
///
/// Returns `false` when no such node exists; nothing changes in that case.
pub fn set_expanded(modules: &mut [Module], id: &str, open: bool) -> bool {
    for module in modules.iter_mut() {
        if module.id == id {
            module.expanded = open;
            return true;
        }
        for node in &mut module.nodes {
            if let TestNode::Group(group) = node {
                if group.id == id {
                    group.expanded = open;
                    return true;
                }
            }
        }
    }
    false
}

/// Returns the expansion flag of the module or group with `id`.
#[must_use]
pub fn is_expanded(modules: &[Module], id: &str) -> Option<bool> {
    modules.iter().find_map(|module| {
        if module.id == id {
            return Some(module.expanded);
        }
        module.nodes.iter().find_map(|node| match node {
            TestNode::Group(group) if group.id == id => Some(group.expanded),
            _ => None,
        })
    })
}

/// Re-applies recorded flags, skipping ids that are no longer present.
///
/// Returns how many flags found a node.
pub fn restore_expanded(modules: &mut [Module], flags: &BTreeMap<String, bool>) -> usize {
    let applied = flags
        .iter()
        .filter(|(id, open)| set_expanded(modules, id, **open))
        .count();

    tracing::debug!(recorded = flags.len(), applied, "expansion flags restored");
    applied
}

/// Returns every module and group to its load-time expansion.
pub fn collapse_to_defaults(modules: &mut [Module]) {
    for module in modules.iter_mut() {
        module.expanded = true;
        for node in &mut module.nodes {
            if let TestNode::Group(group) = node {
                group.expanded = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entry, Group, Status};

    fn tree() -> Vec<Module> {
        vec![Module::new(
            "A",
            vec![
                TestNode::Single(Entry::new("t", "t", Status::Passed, "A")),
                TestNode::Group(Group::new(
                    "A::grp",
                    "grp",
                    "A",
                    vec![Entry::new("r", "r", Status::Passed, "A")],
                )),
            ],
        )]
    }

    #[test]
    fn set_and_read_flags() {
        let mut modules = tree();
        assert_eq!(is_expanded(&modules, "A::grp"), Some(false));
        assert!(set_expanded(&mut modules, "A::grp", true));
        assert_eq!(is_expanded(&modules, "A::grp"), Some(true));
        assert!(set_expanded(&mut modules, "A", false));
        assert_eq!(is_expanded(&modules, "A"), Some(false));
    }

    #[test]
    fn unknown_ids_are_skipped() {
        let mut modules = tree();
        let before = modules.clone();
        assert!(!set_expanded(&mut modules, "gone", true));
        assert_eq!(modules, before);

        let flags = BTreeMap::from([
            ("gone".to_string(), true),
            ("A::grp".to_string(), true),
            ("t".to_string(), true),
        ]);
        assert_eq!(restore_expanded(&mut modules, &flags), 1);
        assert_eq!(is_expanded(&modules, "A::grp"), Some(true));
    }

    #[test]
    fn collapse_restores_load_state() {
        let mut modules = tree();
        set_expanded(&mut modules, "A", false);
        set_expanded(&mut modules, "A::grp", true);
        collapse_to_defaults(&mut modules);
        assert_eq!(modules, tree());
    }
}
