use std::collections::BTreeSet;
use std::fmt;

use crate::observer::{MacroId, Observer};
use crate::recognizer::{CompoundId, CompoundState};

/// Diagnosis label: `N` if every member is normal, `F` if every member is
/// faulty, `U` (uncertain) otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Normal,
    Faulty,
    Uncertain,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Label::Normal => 'N',
            Label::Faulty => 'F',
            Label::Uncertain => 'U',
        };
        write!(f, "{c}")
    }
}

/// Labels a set of compound-state ids. Depends only on the monitor component
/// of each member, never on which plant state it is paired with.
pub fn label_set(members: &BTreeSet<CompoundId>) -> Label {
    let mut any_normal = false;
    let mut any_faulty = false;
    for &id in members {
        match CompoundState::from_id(id).monitor {
            crate::monitor::MonitorState::Normal => any_normal = true,
            crate::monitor::MonitorState::Faulty => any_faulty = true,
        }
        if any_normal && any_faulty {
            return Label::Uncertain;
        }
    }
    match (any_normal, any_faulty) {
        (true, false) => Label::Normal,
        (false, true) => Label::Faulty,
        // Both empty can't happen: macro-states and refinement sets are
        // always non-empty by construction. Mixed is handled by the early
        // return above.
        _ => Label::Uncertain,
    }
}

/// Labels every macro-state of `observer`, indexed by [`MacroId`].
pub fn label_all(observer: &Observer) -> Vec<Label> {
    observer
        .macro_ids()
        .map(|id| label_set(&observer.members_set(id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::MonitorState;

    #[test]
    fn pure_normal_set_labels_n() {
        let members = BTreeSet::from([CompoundState::new(1, MonitorState::Normal).id()]);
        assert_eq!(label_set(&members), Label::Normal);
    }

    #[test]
    fn pure_faulty_set_labels_f() {
        let members = BTreeSet::from([CompoundState::new(3, MonitorState::Faulty).id()]);
        assert_eq!(label_set(&members), Label::Faulty);
    }

    #[test]
    fn mixed_set_labels_u() {
        let members = BTreeSet::from([
            CompoundState::new(1, MonitorState::Normal).id(),
            CompoundState::new(2, MonitorState::Faulty).id(),
        ]);
        assert_eq!(label_set(&members), Label::Uncertain);
    }

    #[test]
    fn label_is_invariant_under_member_order() {
        let a = BTreeSet::from([
            CompoundState::new(1, MonitorState::Normal).id(),
            CompoundState::new(2, MonitorState::Faulty).id(),
        ]);
        let b: BTreeSet<CompoundId> = a.iter().rev().copied().collect();
        assert_eq!(label_set(&a), label_set(&b));
    }
}
