use std::path::Path;

use tracing::{debug, info};

use crate::cycles::{self, AnalysisResult, CycleReport};
use crate::io;
use crate::label::{self, Label};
use crate::model::{Automaton, ReadError};
use crate::observer::Observer;
use crate::recognizer::Recognizer;
use crate::report;

/// Full result of a diagnosability run: the decision, every cycle that was
/// inspected to reach it, and the intermediate artifacts needed to print a
/// readable report without re-reading or rebuilding anything.
pub struct DiagnosabilityReport {
    plant: Automaton,
    observer: Observer,
    labels: Vec<Label>,
    pub diagnosable: bool,
    pub cycles: Vec<CycleReport>,
}

/// Runs the full pipeline end to end: read the plant, build the fault
/// monitor and recognizer, run the observer's subset construction, label
/// every macro-state, and search the U-subgraph for indeterminate cycles.
///
/// `collect_all` controls a short-circuit: when `false`, cycle refinement
/// stops at the first indeterminate cycle found, since only the boolean
/// verdict is needed; when `true`, every cycle is refined so the full report
/// can be shown.
pub fn diagnosability(path: impl AsRef<Path>, collect_all: bool) -> Result<DiagnosabilityReport, ReadError> {
    let path = path.as_ref();
    info!(file = %path.display(), "reading plant automaton");
    let plant = io::read_automaton(path)?;
    debug!(states = plant.state_count(), events = plant.alphabet().len(), "plant automaton loaded");

    let rec = Recognizer::build(&plant);
    debug!(compound_states = rec.len(), "synchronous recognizer built");

    let observer = Observer::build(&rec);
    debug!(macro_states = observer.len(), "observer subset construction complete");

    let labels: Vec<Label> = label::label_all(&observer);
    let uncertain = labels.iter().filter(|l| matches!(l, Label::Uncertain)).count();
    debug!(uncertain_macro_states = uncertain, "macro-states labeled");

    let AnalysisResult { diagnosable, cycles } = cycles::analyze(&observer, &rec, &labels, collect_all);
    info!(diagnosable, cycles_examined = cycles.len(), "diagnosability decided");

    Ok(DiagnosabilityReport { plant, observer, labels, diagnosable, cycles })
}

/// Prints the full human-readable report: the macro-state table (when
/// `show_cycle_graphs` is set), every cycle's refinement trace, and the
/// final verdict line.
pub fn print_report(report: &DiagnosabilityReport, show_cycle_graphs: bool) {
    let alphabet = report.plant.alphabet();

    if show_cycle_graphs {
        println!("Observer macro-states:");
        for id in report.observer.macro_ids() {
            let row = report::render_macro_state(&report.observer, id, report.labels[id as usize]);
            println!("  Y{id}: {row}");
        }
        println!("Observer transitions:");
        for &(src, event, dst) in report.observer.transitions() {
            let row = report::render_transition_row(&format!("Y{src}"), alphabet.symbol(event), &format!("Y{dst}"));
            println!("  {row}");
        }
    }

    for cycle in &report.cycles {
        report::print_cycle_report(alphabet, cycle);
    }

    report::print_verdict(report.diagnosable, !report.cycles.is_empty());
}
