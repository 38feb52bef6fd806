use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::model::{Automaton, EventId, StateId};
use crate::monitor::MonitorState;

/// Canonical integer identity for a compound `(q, m)` state:
/// `2·(q−1) + (m−1) + 1`. Bijective with `(StateId, MonitorState)`, so no
/// interning table is needed to keep compound-state identity stable.
pub type CompoundId = u32;

/// A single `(plant state, monitor state)` pair, a state of `Rec(G)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompoundState {
    pub plant: StateId,
    pub monitor: MonitorState,
}

impl CompoundState {
    pub fn new(plant: StateId, monitor: MonitorState) -> Self {
        Self { plant, monitor }
    }

    pub fn id(self) -> CompoundId {
        2 * (self.plant - 1) + (self.monitor as u32 - 1) + 1
    }

    pub fn from_id(id: CompoundId) -> Self {
        let plant = (id - 1) / 2 + 1;
        let monitor = if (id - 1) % 2 == 0 {
            MonitorState::Normal
        } else {
            MonitorState::Faulty
        };
        Self { plant, monitor }
    }

    pub fn is_fault(self) -> bool {
        self.monitor == MonitorState::Faulty
    }
}

/// A transition of `Rec(G)`, stored as `(event, destination)` in the
/// recognizer's adjacency map (the source is the map key).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecTransition {
    pub event: EventId,
    pub to: CompoundId,
}

/// `Rec(G) = G ∥ M`, the synchronous product of the plant and the fault
/// monitor. Built once by frontier exploration from `{(q0, N) | q0 ∈ Q0}`;
/// read-only afterwards.
///
/// Every reachable compound state gets an adjacency entry (possibly empty),
/// keyed by its canonical id, so membership and iteration order are both
/// determined purely by id: a `BTreeMap` rather than a hash map, to keep
/// that order reproducible.
#[derive(Debug)]
pub struct Recognizer<'g> {
    plant: &'g Automaton,
    adjacency: BTreeMap<CompoundId, Vec<RecTransition>>,
}

impl<'g> Recognizer<'g> {
    /// Builds `Rec(G)` from the plant by frontier exploration.
    pub fn build(plant: &'g Automaton) -> Self {
        let alphabet = plant.alphabet();
        let mut adjacency: BTreeMap<CompoundId, Vec<RecTransition>> = BTreeMap::new();
        let mut queue: VecDeque<CompoundState> = VecDeque::new();

        for &q0 in plant.initial_states() {
            let start = CompoundState::new(q0, MonitorState::Normal);
            if adjacency.insert(start.id(), Vec::new()).is_none() {
                queue.push_back(start);
            }
        }

        while let Some(state) = queue.pop_front() {
            let mut outgoing = Vec::new();
            for event in plant.alphabet().events() {
                for dst in plant.transitions_on(state.plant, event) {
                    let next_monitor = state.monitor.step(event, alphabet);
                    let next = CompoundState::new(dst, next_monitor);
                    outgoing.push(RecTransition { event, to: next.id() });
                    if !adjacency.contains_key(&next.id()) {
                        adjacency.insert(next.id(), Vec::new());
                        queue.push_back(next);
                    }
                }
            }
            outgoing.sort_by_key(|t| (t.event, t.to));
            outgoing.dedup();
            adjacency.insert(state.id(), outgoing);
        }

        for outgoing in adjacency.values() {
            for t in outgoing {
                crate::errors::assert_invariant(
                    adjacency.contains_key(&t.to),
                    crate::errors::InvariantViolation::UnknownTransitionSource(t.to),
                );
            }
        }

        Self { plant, adjacency }
    }

    pub fn plant(&self) -> &'g Automaton {
        self.plant
    }

    /// Reachable compound-state ids, in ascending order.
    pub fn members(&self) -> impl Iterator<Item = CompoundId> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn contains(&self, id: CompoundId) -> bool {
        self.adjacency.contains_key(&id)
    }

    pub fn transitions_from(&self, id: CompoundId) -> &[RecTransition] {
        self.adjacency
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Unobservable reach `UR(y)`: the smallest set containing
    /// `y` and closed under unobservable transitions. Always includes `y`
    /// itself (zero-length closure).
    pub fn unobservable_reach(&self, y: CompoundId) -> BTreeSet<CompoundId> {
        let alphabet = self.plant.alphabet();
        let mut closure = BTreeSet::from([y]);
        let mut frontier = vec![y];
        while let Some(state) = frontier.pop() {
            for t in self.transitions_from(state) {
                if alphabet.is_unobservable(t.event) && closure.insert(t.to) {
                    frontier.push(t.to);
                }
            }
        }
        closure
    }

    /// `β(Z)`, the unobservable closure of a set of compound states.
    pub fn beta(&self, z: &BTreeSet<CompoundId>) -> BTreeSet<CompoundId> {
        let mut out = BTreeSet::new();
        for &y in z {
            out.extend(self.unobservable_reach(y));
        }
        out
    }

    /// `α(Y, e)`, the one-step observable image of `Y` under `e`.
    pub fn alpha(&self, y: &BTreeSet<CompoundId>, event: EventId) -> BTreeSet<CompoundId> {
        let mut out = BTreeSet::new();
        for &state in y {
            for t in self.transitions_from(state) {
                if t.event == event {
                    out.insert(t.to);
                }
            }
        }
        out
    }
}
