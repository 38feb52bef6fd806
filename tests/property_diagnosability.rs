//! Cross-checks the cycle analyser's verdict against an independently
//! computed reference: rather than Johnson's algorithm plus per-cycle
//! refinement, the reference walks the same α/β step function directly and
//! looks for a reachable cycle whose every step, both the raw observable
//! image and its unobservable closure, stayed `U`-labelled.

use std::collections::{BTreeSet, VecDeque};

use proptest::collection::vec as pvec;
use proptest::prelude::*;

use diagnoser::cycles;
use diagnoser::label::{label_all, label_set, Label};
use diagnoser::model::{Automaton, AutomatonBuilder};
use diagnoser::monitor::MonitorState;
use diagnoser::observer::Observer;
use diagnoser::recognizer::{CompoundId, CompoundState, Recognizer};

const MAX_STATES: usize = 5;
const MAX_PLAIN_EVENTS: usize = 2;

fn build_automaton(state_count: usize, observable_flags: Vec<bool>, transitions: Vec<Vec<(usize, u32)>>) -> Automaton {
    let total_events = observable_flags.len();
    let symbols: Vec<String> = (0..total_events)
        .map(|i| if i + 1 == total_events { "fault".to_string() } else { format!("e{i}") })
        .collect();

    let mut observable = Vec::new();
    let mut unobservable = Vec::new();
    for (i, &is_obs) in observable_flags.iter().enumerate() {
        if is_obs {
            observable.push(symbols[i].clone());
        } else {
            unobservable.push(symbols[i].clone());
        }
    }
    // The last event is always the one designated fault event; whether it is
    // also observable is left to `observable_flags`.
    let fault = vec![symbols[total_events - 1].clone()];

    let mut builder = AutomatonBuilder::new();
    builder
        .set_state_count(state_count)
        .set_alphabet(symbols.clone())
        .set_observable(0, observable)
        .set_unobservable(0, unobservable)
        .set_fault(0, fault)
        .set_initial_states(vec![1]);

    for (state_idx, outgoing) in transitions.iter().enumerate() {
        let src = (state_idx + 1) as u32;
        for &(event_idx, dst) in outgoing {
            builder.add_transition(0, src, symbols[event_idx].clone(), dst);
        }
    }

    builder.build().expect("generated automaton is structurally valid by construction")
}

fn arb_automaton() -> impl Strategy<Value = Automaton> {
    (2..=MAX_STATES, 1..=MAX_PLAIN_EVENTS).prop_flat_map(|(state_count, plain_events)| {
        let total_events = plain_events + 1;
        let observable_flags = pvec(any::<bool>(), total_events);
        let transitions = pvec(pvec((0..total_events, 1..=state_count as u32), 0..=3), state_count);
        (observable_flags, transitions)
            .prop_map(move |(flags, trans)| build_automaton(state_count, flags, trans))
    })
}

/// Independent reference check: walks `α`/`β` directly over the recogniser
/// rather than enumerating structural cycles first, and declares the system
/// ambiguous iff some reachable macro-state has a path back to itself on
/// which every raw `α` image and every `β`-closure stayed `U`-labelled.
fn reference_diagnosable(rec: &Recognizer<'_>) -> bool {
    let alphabet = rec.plant().alphabet();
    let seed: BTreeSet<CompoundId> = rec
        .plant()
        .initial_states()
        .iter()
        .map(|&q0| CompoundState::new(q0, MonitorState::Normal).id())
        .collect();
    let start = rec.beta(&seed);

    let mut sets: Vec<BTreeSet<CompoundId>> = vec![start];
    // Edge list per discovered macro-state, restricted up front to events
    // whose raw (pre-closure) image is itself `U`-labelled.
    let mut edges: Vec<Vec<usize>> = vec![Vec::new()];
    let mut queue = VecDeque::from([0usize]);
    // Safety cap mirroring the `2 * |Rec(G)|` bound; the search always
    // terminates earlier on its own since macro-states are deduplicated.
    let cap = 2 * rec.len() + 2;

    while let Some(idx) = queue.pop_front() {
        if sets.len() > cap {
            break;
        }
        let current = sets[idx].clone();
        for event in alphabet.observable_events() {
            let alpha = rec.alpha(&current, event);
            if alpha.is_empty() {
                continue;
            }
            let alpha_label = label_set(&alpha);
            let beta = rec.beta(&alpha);
            let target_idx = match sets.iter().position(|s| *s == beta) {
                Some(i) => i,
                None => {
                    sets.push(beta);
                    edges.push(Vec::new());
                    let i = sets.len() - 1;
                    queue.push_back(i);
                    i
                }
            };
            if matches!(alpha_label, Label::Uncertain) {
                edges[idx].push(target_idx);
            }
        }
    }

    let labels: Vec<Label> = sets.iter().map(label_set).collect();

    fn has_ambiguous_cycle(u: usize, edges: &[Vec<usize>], labels: &[Label], color: &mut [u8]) -> bool {
        color[u] = 1; // on the current path
        for &v in &edges[u] {
            if !matches!(labels[v], Label::Uncertain) {
                continue;
            }
            if color[v] == 1 {
                return true;
            }
            if color[v] == 0 && has_ambiguous_cycle(v, edges, labels, color) {
                return true;
            }
        }
        color[u] = 2; // fully explored
        false
    }

    let mut color = vec![0u8; sets.len()];
    for u in 0..sets.len() {
        if matches!(labels[u], Label::Uncertain) && color[u] == 0 && has_ambiguous_cycle(u, &edges, &labels, &mut color) {
            return false;
        }
    }
    true
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn cycle_analyser_agrees_with_direct_alpha_beta_search(plant in arb_automaton()) {
        let rec = Recognizer::build(&plant);
        let observer = Observer::build(&rec);
        let labels = label_all(&observer);
        let result = cycles::analyze(&observer, &rec, &labels, true);

        prop_assert_eq!(result.diagnosable, reference_diagnosable(&rec));
    }
}

#[test]
fn every_reachable_macro_state_is_its_own_beta_closure() {
    let automaton = build_automaton(
        3,
        vec![true, false, false],
        vec![vec![(0, 1), (1, 2)], vec![(0, 2)], vec![(2, 3), (0, 3)]],
    );
    let rec = Recognizer::build(&automaton);
    let observer = Observer::build(&rec);
    for id in observer.macro_ids() {
        let members = observer.members_set(id);
        assert_eq!(rec.beta(&members), members);
    }
}

#[test]
fn no_fault_events_implies_diagnosable() {
    let automaton = build_automaton(2, vec![true, true], vec![vec![(0, 1), (1, 2)], vec![(0, 2)]]);
    // Both events are observable, so no compound state ever mixes N and F
    // behind an unobservable edge.
    let rec = Recognizer::build(&automaton);
    let observer = Observer::build(&rec);
    let labels = label_all(&observer);
    assert!(labels.iter().all(|l| !matches!(l, Label::Uncertain)));
    let result = cycles::analyze(&observer, &rec, &labels, true);
    assert!(result.diagnosable);
}
