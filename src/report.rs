use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::cycles::{CycleReport, RefinementKind, RefinementStep};
use crate::label::{label_set, Label};
use crate::model::AlphabetTable;
use crate::monitor::MonitorState;
use crate::observer::{MacroId, Observer};
use crate::recognizer::{CompoundId, CompoundState};

/// Renders a compound state as `(q,N)` or `(q,F)`. This is the one place
/// that formats a compound state; every report routes through it so the
/// surface strings stay a single, stable contract.
pub fn render_compound_state(id: CompoundId) -> String {
    let state = CompoundState::from_id(id);
    let m = match state.monitor {
        MonitorState::Normal => 'N',
        MonitorState::Faulty => 'F',
    };
    format!("({},{})", state.plant, m)
}

/// Renders a macro-state as its comma-separated member list followed by its
/// diagnosis label.
pub fn render_member_set(members: &BTreeSet<CompoundId>) -> String {
    let label = label_set(members);
    let joined = members
        .iter()
        .map(|&id| render_compound_state(id))
        .collect::<Vec<_>>()
        .join(",");
    format!("{joined} {label}")
}

pub fn render_macro_state(observer: &Observer, id: MacroId, label: Label) -> String {
    let joined = observer
        .members(id)
        .iter()
        .map(|&cid| render_compound_state(cid))
        .collect::<Vec<_>>()
        .join(",");
    format!("{joined} {label}")
}

/// Renders one recognizer/observer transition as `State1 Event State2`
/// columns.
pub fn render_transition_row(from: &str, event_symbol: &str, to: &str) -> String {
    format!("{from} {event_symbol} {to}")
}

fn render_refinement_step(alphabet: &AlphabetTable, step: &RefinementStep) -> String {
    let tag = match step.kind {
        RefinementKind::Entry => "S0".to_string(),
        RefinementKind::Alpha(e) => format!("alpha[{}]", alphabet.symbol(e)),
        RefinementKind::Beta(e) => format!("beta[{}]", alphabet.symbol(e)),
    };
    format!("{tag}: {}", render_member_set(&step.members))
}

/// Prints a single cycle's refinement report to stdout: macro-state path,
/// event word, then the full α/β trace.
pub fn print_cycle_report(alphabet: &AlphabetTable, report: &CycleReport) {
    let path: Vec<String> = report
        .macro_path
        .iter()
        .map(|&id| format!("Y{id}"))
        .collect();
    let word: Vec<&str> = report.word.iter().map(|&e| alphabet.symbol(e)).collect();
    println!("Cycle {} on word [{}]:", path.join(" -> "), word.join(" "));
    for step in &report.refinement {
        println!("  {}", render_refinement_step(alphabet, step));
    }
    let verdict = if report.indeterminate { "INDETERMINATE" } else { "determinate" };
    println!("  -> {verdict}");
}

/// Prints the top-level verdict line(s).
pub fn print_verdict(diagnosable: bool, any_cycle_found: bool) {
    if !any_cycle_found {
        println!("No uncertain cycle found, G is DIAGNOSABLE");
    } else if diagnosable {
        println!("The system G is DIAGNOSABLE.");
    } else {
        println!("The system G is NOT DIAGNOSABLE.");
    }
}

/// Builds the full stdout report as a string (used by tests that want to
/// assert on output without capturing process stdout).
pub fn format_verdict(diagnosable: bool, any_cycle_found: bool) -> String {
    let mut out = String::new();
    if !any_cycle_found {
        let _ = writeln!(out, "No uncertain cycle found, G is DIAGNOSABLE");
    } else if diagnosable {
        let _ = writeln!(out, "The system G is DIAGNOSABLE.");
    } else {
        let _ = writeln!(out, "The system G is NOT DIAGNOSABLE.");
    }
    out
}
