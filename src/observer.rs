use std::collections::{BTreeSet, VecDeque};

use indexmap::IndexMap;

use crate::model::EventId;
use crate::recognizer::{CompoundId, Recognizer};

/// Identifier of an observer macro-state: an index into [`Observer::macro_states`].
pub type MacroId = u32;

/// Deterministic subset-construction observer of `Rec(G)`.
///
/// Macro-states are interned by their canonical sorted member list (mirroring
/// the NFA-to-DFA subset construction's `Vec<StateId>` interning table), so
/// equal subsets always collapse to the same id and iteration order is fixed
/// by discovery order from the deterministic worklist.
#[derive(Debug)]
pub struct Observer {
    /// Sorted member lists, index = [`MacroId`].
    macro_states: Vec<Vec<CompoundId>>,
    /// Observer transitions, in discovery order: `(source, event, target)`.
    trans: Vec<(MacroId, EventId, MacroId)>,
    initial: MacroId,
}

impl Observer {
    /// Runs the subset construction over `rec`. Infallible: an empty plant
    /// yields a singleton observer with no transitions.
    pub fn build(rec: &Recognizer<'_>) -> Self {
        let alphabet = rec.plant().alphabet();
        let mut map: IndexMap<Vec<CompoundId>, MacroId> = IndexMap::new();
        let mut queue: VecDeque<Vec<CompoundId>> = VecDeque::new();
        let mut trans = Vec::new();

        let seed: BTreeSet<CompoundId> = rec
            .plant()
            .initial_states()
            .iter()
            .map(|&q0| crate::recognizer::CompoundState::new(q0, crate::monitor::MonitorState::Normal).id())
            .collect();
        let initial_key = set_to_key(rec.beta(&seed));
        map.insert(initial_key.clone(), 0);
        queue.push_back(initial_key);

        while let Some(key) = queue.pop_front() {
            let src_id = map[&key];
            let members: BTreeSet<CompoundId> = key.into_iter().collect();
            for event in alphabet.observable_events() {
                let image = rec.alpha(&members, event);
                if image.is_empty() {
                    continue;
                }
                let closed = rec.beta(&image);
                let dst_key = set_to_key(closed);
                let dst_id = match map.get(&dst_key) {
                    Some(&id) => id,
                    None => {
                        let id = map.len() as MacroId;
                        map.insert(dst_key.clone(), id);
                        queue.push_back(dst_key);
                        id
                    }
                };
                trans.push((src_id, event, dst_id));
            }
        }

        for (idx, (_, &assigned_id)) in map.iter().enumerate() {
            crate::errors::assert_invariant(
                assigned_id as usize == idx,
                crate::errors::InvariantViolation::DuplicateMacroState(assigned_id),
            );
        }
        let macro_states: Vec<Vec<CompoundId>> = map.into_iter().map(|(key, _)| key).collect();

        Self {
            macro_states,
            trans,
            initial: 0,
        }
    }

    pub fn initial(&self) -> MacroId {
        self.initial
    }

    pub fn len(&self) -> usize {
        self.macro_states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macro_states.is_empty()
    }

    pub fn members(&self, id: MacroId) -> &[CompoundId] {
        &self.macro_states[id as usize]
    }

    pub fn members_set(&self, id: MacroId) -> BTreeSet<CompoundId> {
        self.members(id).iter().copied().collect()
    }

    /// Observer transitions in discovery order.
    pub fn transitions(&self) -> &[(MacroId, EventId, MacroId)] {
        &self.trans
    }

    /// Transitions outgoing from `id`, in ascending event order.
    pub fn transitions_from(&self, id: MacroId) -> impl Iterator<Item = (EventId, MacroId)> + '_ {
        self.trans
            .iter()
            .filter(move |(src, _, _)| *src == id)
            .map(|&(_, e, dst)| (e, dst))
    }

    pub fn macro_ids(&self) -> impl Iterator<Item = MacroId> {
        0..self.macro_states.len() as MacroId
    }
}

fn set_to_key(set: BTreeSet<CompoundId>) -> Vec<CompoundId> {
    set.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AutomatonBuilder;

    fn scenario_b() -> crate::model::Automaton {
        let mut b = AutomatonBuilder::new();
        b.set_state_count(2)
            .set_alphabet(vec!["a".into(), "f".into()])
            .set_observable(2, vec!["a".into()])
            .set_unobservable(3, vec!["f".into()])
            .set_fault(4, vec!["f".into()])
            .add_transition(5, 1, "f".into(), 2)
            .add_transition(6, 1, "a".into(), 1)
            .add_transition(7, 2, "a".into(), 2)
            .set_initial_states(vec![1]);
        b.build().unwrap()
    }

    #[test]
    fn initial_macro_state_is_beta_closure_of_seed() {
        let plant = scenario_b();
        let rec = Recognizer::build(&plant);
        let obs = Observer::build(&rec);
        let initial_members = obs.members_set(obs.initial());
        // β({(1,N)}) = {(1,N), (2,F)} since f is unobservable.
        let expected: BTreeSet<CompoundId> = BTreeSet::from([
            crate::recognizer::CompoundState::new(1, crate::monitor::MonitorState::Normal).id(),
            crate::recognizer::CompoundState::new(2, crate::monitor::MonitorState::Faulty).id(),
        ]);
        assert_eq!(initial_members, expected);
    }

    #[test]
    fn self_loop_on_observable_event() {
        let plant = scenario_b();
        let rec = Recognizer::build(&plant);
        let obs = Observer::build(&rec);
        let initial = obs.initial();
        let targets: Vec<MacroId> = obs.transitions_from(initial).map(|(_, dst)| dst).collect();
        assert_eq!(targets, vec![initial]);
    }

    #[test]
    fn beta_is_idempotent_on_every_macro_state() {
        let plant = scenario_b();
        let rec = Recognizer::build(&plant);
        let obs = Observer::build(&rec);
        for id in obs.macro_ids() {
            let members = obs.members_set(id);
            assert_eq!(rec.beta(&members), members);
        }
    }
}
