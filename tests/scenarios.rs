//! End-to-end scenarios exercising the full read → recognize → observe →
//! label → analyze pipeline against small, hand-checked plants.

use std::io::Write as _;

use diagnoser::diagnosability::diagnosability;

fn fixture(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn fault_free_self_loop_is_diagnosable() {
    let text = "\
1
a
a
-
-
1 a 1

1
-
";
    let report = diagnosability(fixture(text), true).unwrap();
    assert!(report.diagnosable);
    assert!(report.cycles.is_empty());
}

#[test]
fn single_unobservable_fault_self_loop_is_never_distinguished() {
    // The fault is unobservable and both the normal and faulty branches
    // loop forever on the same observable event, so no finite observation
    // can ever rule either branch out.
    let text = "\
2
a f
a
f
f
1 f 2
1 a 1
2 a 2

1
-
";
    let report = diagnosability(fixture(text), true).unwrap();
    assert!(!report.diagnosable);
    assert_eq!(report.cycles.len(), 1);
    assert!(report.cycles[0].indeterminate);
}

#[test]
fn divergent_branch_after_the_fault_resolves_the_ambiguity() {
    // The fault is unobservable, but state 2 (only reachable once faulted)
    // exposes event `b`, which the normal branch can never produce, and
    // the normal branch exposes event `a`, which the faulty branch can
    // never produce once past state 1. The one ambiguous macro-state has
    // no outgoing edge back into itself or into another uncertain state.
    let text = "\
3
a b f
a b
f
f
1 f 2
1 a 3
2 b 2
3 a 3

1
-
";
    let report = diagnosability(fixture(text), true).unwrap();
    assert!(report.diagnosable);
    assert!(report.cycles.is_empty());
}

#[test]
fn two_state_cycle_alternating_events_is_permanently_ambiguous() {
    // A period-2 cycle mirrored identically in the normal and faulty
    // branches: the observer never leaves its two uncertain macro-states
    // no matter which of the two observable events fires next.
    let text = "\
4
a b f
a b
f
f
1 a 2
2 b 1
1 f 3
3 a 4
4 b 3

1
-
";
    let report = diagnosability(fixture(text), false).unwrap();
    assert!(!report.diagnosable);
    assert_eq!(report.cycles.len(), 1);
    let cycle = &report.cycles[0];
    assert!(cycle.indeterminate);
    assert_eq!(cycle.macro_path.len(), 3); // closed 2-edge cycle: Y_i, Y_j, Y_i
}

#[test]
fn plant_with_no_fault_events_has_no_uncertain_states() {
    let text = "\
2
a b
a b
-
-
1 a 1
1 b 2
2 a 2

1
-
";
    let report = diagnosability(fixture(text), true).unwrap();
    assert!(report.diagnosable);
    assert!(report.cycles.is_empty());
}
