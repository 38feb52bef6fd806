use std::collections::{BTreeMap, BTreeSet};

use crate::label::{label_set, Label};
use crate::model::EventId;
use crate::observer::{MacroId, Observer};
use crate::recognizer::{CompoundId, Recognizer};

/// Adjacency of the U-subgraph: macro-states labeled `U`, restricted to
/// transitions whose source and target are both `U`.
struct USubgraph {
    /// Every U-labeled edge, possibly several per `(source, target)` pair
    /// when distinct events reach the same target.
    edges: BTreeMap<MacroId, Vec<(EventId, MacroId)>>,
}

impl USubgraph {
    fn build(observer: &Observer, labels: &[Label]) -> Self {
        let mut edges: BTreeMap<MacroId, Vec<(EventId, MacroId)>> = BTreeMap::new();
        for id in observer.macro_ids() {
            if matches!(labels[id as usize], Label::Uncertain) {
                edges.entry(id).or_default();
            }
        }
        for &(src, event, dst) in observer.transitions() {
            if matches!(labels[src as usize], Label::Uncertain)
                && matches!(labels[dst as usize], Label::Uncertain)
            {
                edges.entry(src).or_default().push((event, dst));
            }
        }
        for list in edges.values_mut() {
            list.sort_unstable();
        }
        Self { edges }
    }

    fn vertex_adjacency(&self) -> BTreeMap<MacroId, BTreeSet<MacroId>> {
        self.edges
            .iter()
            .map(|(&v, es)| (v, es.iter().map(|&(_, dst)| dst).collect()))
            .collect()
    }

    fn events_between(&self, src: MacroId, dst: MacroId) -> Vec<EventId> {
        self.edges
            .get(&src)
            .map(|es| es.iter().filter(|&&(_, d)| d == dst).map(|&(e, _)| e).collect())
            .unwrap_or_default()
    }
}

/// Enumerates every simple directed cycle of `adj` using Johnson's algorithm,
/// each reported once, starting at its minimum-id vertex. The returned vertex
/// sequence does *not* repeat its start vertex at the end; callers close the
/// loop themselves.
fn simple_cycles(adj: &BTreeMap<MacroId, BTreeSet<MacroId>>) -> Vec<Vec<MacroId>> {
    let mut results = Vec::new();
    let vertices: Vec<MacroId> = adj.keys().copied().collect();
    for &s in &vertices {
        let induced = induced_subgraph(adj, s);
        for scc in tarjan_sccs(&induced) {
            if !scc.contains(&s) {
                continue;
            }
            let has_self_loop = induced.get(&s).is_some_and(|tos| tos.contains(&s));
            if scc.len() <= 1 && !has_self_loop {
                continue;
            }
            let scc_set: BTreeSet<MacroId> = scc.into_iter().collect();
            let restricted = restrict_to(&induced, &scc_set);
            let mut blocked = BTreeSet::new();
            let mut block_map: BTreeMap<MacroId, BTreeSet<MacroId>> = BTreeMap::new();
            let mut stack = Vec::new();
            circuit(s, s, &restricted, &mut blocked, &mut block_map, &mut stack, &mut results);
        }
    }
    results
}

fn induced_subgraph(
    adj: &BTreeMap<MacroId, BTreeSet<MacroId>>,
    min_vertex: MacroId,
) -> BTreeMap<MacroId, BTreeSet<MacroId>> {
    adj.iter()
        .filter(|(&v, _)| v >= min_vertex)
        .map(|(&v, tos)| (v, tos.iter().copied().filter(|&t| t >= min_vertex).collect()))
        .collect()
}

fn restrict_to(
    adj: &BTreeMap<MacroId, BTreeSet<MacroId>>,
    keep: &BTreeSet<MacroId>,
) -> BTreeMap<MacroId, BTreeSet<MacroId>> {
    adj.iter()
        .filter(|(v, _)| keep.contains(v))
        .map(|(&v, tos)| (v, tos.iter().copied().filter(|t| keep.contains(t)).collect()))
        .collect()
}

/// Tarjan's strongly-connected-components algorithm over `adj`.
fn tarjan_sccs(adj: &BTreeMap<MacroId, BTreeSet<MacroId>>) -> Vec<Vec<MacroId>> {
    struct Ctx {
        index_counter: u32,
        indices: BTreeMap<MacroId, u32>,
        lowlink: BTreeMap<MacroId, u32>,
        on_stack: BTreeSet<MacroId>,
        stack: Vec<MacroId>,
        sccs: Vec<Vec<MacroId>>,
    }

    fn strongconnect(v: MacroId, adj: &BTreeMap<MacroId, BTreeSet<MacroId>>, ctx: &mut Ctx) {
        ctx.indices.insert(v, ctx.index_counter);
        ctx.lowlink.insert(v, ctx.index_counter);
        ctx.index_counter += 1;
        ctx.stack.push(v);
        ctx.on_stack.insert(v);

        if let Some(neighbors) = adj.get(&v) {
            for &w in neighbors {
                if !ctx.indices.contains_key(&w) {
                    strongconnect(w, adj, ctx);
                    let lv = ctx.lowlink[&v].min(ctx.lowlink[&w]);
                    ctx.lowlink.insert(v, lv);
                } else if ctx.on_stack.contains(&w) {
                    let lv = ctx.lowlink[&v].min(ctx.indices[&w]);
                    ctx.lowlink.insert(v, lv);
                }
            }
        }

        if ctx.lowlink[&v] == ctx.indices[&v] {
            let mut component = Vec::new();
            loop {
                let w = ctx.stack.pop().expect("scc stack unexpectedly empty");
                ctx.on_stack.remove(&w);
                component.push(w);
                if w == v {
                    break;
                }
            }
            ctx.sccs.push(component);
        }
    }

    let mut ctx = Ctx {
        index_counter: 0,
        indices: BTreeMap::new(),
        lowlink: BTreeMap::new(),
        on_stack: BTreeSet::new(),
        stack: Vec::new(),
        sccs: Vec::new(),
    };
    for &v in adj.keys() {
        if !ctx.indices.contains_key(&v) {
            strongconnect(v, adj, &mut ctx);
        }
    }
    ctx.sccs
}

#[allow(clippy::too_many_arguments)]
fn circuit(
    v: MacroId,
    s: MacroId,
    adj: &BTreeMap<MacroId, BTreeSet<MacroId>>,
    blocked: &mut BTreeSet<MacroId>,
    block_map: &mut BTreeMap<MacroId, BTreeSet<MacroId>>,
    stack: &mut Vec<MacroId>,
    results: &mut Vec<Vec<MacroId>>,
) -> bool {
    let mut found = false;
    stack.push(v);
    blocked.insert(v);

    if let Some(neighbors) = adj.get(&v) {
        for &w in neighbors {
            if w == s {
                results.push(stack.clone());
                found = true;
            } else if !blocked.contains(&w) && circuit(w, s, adj, blocked, block_map, stack, results) {
                found = true;
            }
        }
    }

    if found {
        unblock(v, blocked, block_map);
    } else if let Some(neighbors) = adj.get(&v) {
        for &w in neighbors {
            block_map.entry(w).or_default().insert(v);
        }
    }
    stack.pop();
    found
}

fn unblock(v: MacroId, blocked: &mut BTreeSet<MacroId>, block_map: &mut BTreeMap<MacroId, BTreeSet<MacroId>>) {
    blocked.remove(&v);
    if let Some(set) = block_map.get_mut(&v) {
        let to_unblock: Vec<MacroId> = set.iter().copied().collect();
        set.clear();
        for w in to_unblock {
            if blocked.contains(&w) {
                unblock(w, blocked, block_map);
            }
        }
    }
}

/// Produces every distinct event-word realization of a vertex cycle: the
/// Cartesian product of the available events on each edge of the cycle, since
/// each event choice between the same two macro-states is its own distinct
/// cycle. Deterministic order.
fn event_word_variants(sub: &USubgraph, vertex_cycle: &[MacroId]) -> Vec<Vec<EventId>> {
    let k = vertex_cycle.len();
    let mut choices: Vec<Vec<EventId>> = Vec::with_capacity(k);
    for i in 0..k {
        let src = vertex_cycle[i];
        let dst = vertex_cycle[(i + 1) % k];
        choices.push(sub.events_between(src, dst));
    }
    let mut words = vec![Vec::new()];
    for options in &choices {
        let mut next = Vec::with_capacity(words.len() * options.len());
        for word in &words {
            for &opt in options {
                let mut w = word.clone();
                w.push(opt);
                next.push(w);
            }
        }
        words = next;
    }
    words
}

/// One step of the refined α/β expansion: either the cycle's entry
/// macro-state (`S_0`) or an `α_j`/`β_j` set reached while unrolling the
/// event word over the underlying recognizer.
#[derive(Debug, Clone)]
pub enum RefinementKind {
    Entry,
    Alpha(EventId),
    Beta(EventId),
}

#[derive(Debug, Clone)]
pub struct RefinementStep {
    pub kind: RefinementKind,
    pub members: BTreeSet<CompoundId>,
    pub label: Label,
}

/// Refines one cycle starting from `entry`, unrolling `word` over `rec`
/// until either the set closes back on `entry`, or a full lap of `word`
/// introduces no β-set not already seen. This is a periodicity test, not the
/// weaker "first hit on S_0" test, which misses cycles whose refinement
/// visits several distinct recognizer subsets before repeating.
pub fn refine_cycle(
    rec: &Recognizer<'_>,
    entry: &BTreeSet<CompoundId>,
    word: &[EventId],
) -> Vec<RefinementStep> {
    let mut steps = vec![RefinementStep {
        kind: RefinementKind::Entry,
        members: entry.clone(),
        label: label_set(entry),
    }];
    let mut seen: BTreeSet<BTreeSet<CompoundId>> = BTreeSet::from([entry.clone()]);
    let mut current = entry.clone();

    // Finitely many subsets of Q_R exist, so the β-sequence is eventually
    // periodic; this bound is only a safety net against an implementation
    // bug, never expected to trigger.
    let max_laps = rec.len() + 2;

    for _lap in 0..max_laps {
        let mut lap_introduced_new = false;
        for &event in word {
            let alpha = rec.alpha(&current, event);
            let alpha_label = label_set(&alpha);
            steps.push(RefinementStep {
                kind: RefinementKind::Alpha(event),
                members: alpha.clone(),
                label: alpha_label,
            });

            let beta = rec.beta(&alpha);
            let beta_label = label_set(&beta);
            steps.push(RefinementStep {
                kind: RefinementKind::Beta(event),
                members: beta.clone(),
                label: beta_label,
            });

            if seen.insert(beta.clone()) {
                lap_introduced_new = true;
            }
            current = beta;

            if current == *entry {
                return steps;
            }
        }
        if !lap_introduced_new {
            return steps;
        }
    }
    steps
}

/// A fully refined, reported cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Macro-state ids, closed: `[Y_i1, ..., Y_ik, Y_i1]`.
    pub macro_path: Vec<MacroId>,
    pub word: Vec<EventId>,
    pub refinement: Vec<RefinementStep>,
    pub indeterminate: bool,
}

fn is_indeterminate(refinement: &[RefinementStep]) -> bool {
    refinement.iter().all(|step| matches!(step.label, Label::Uncertain))
}

/// Result of the cycle analyser.
pub struct AnalysisResult {
    pub diagnosable: bool,
    pub cycles: Vec<CycleReport>,
}

/// Runs the full decision procedure. When `collect_all` is `false`, only the
/// boolean verdict is needed, so refinement of further cycles (and further
/// event-word variants of the current cycle) stops as soon as one
/// indeterminate cycle is found.
pub fn analyze(
    observer: &Observer,
    rec: &Recognizer<'_>,
    labels: &[Label],
    collect_all: bool,
) -> AnalysisResult {
    let sub = USubgraph::build(observer, labels);
    if sub.edges.is_empty() {
        return AnalysisResult { diagnosable: true, cycles: Vec::new() };
    }

    let vertex_adj = sub.vertex_adjacency();
    let vertex_cycles = simple_cycles(&vertex_adj);

    let mut reports = Vec::new();
    let mut indeterminate_found = false;

    'outer: for vertex_cycle in &vertex_cycles {
        for word in event_word_variants(&sub, vertex_cycle) {
            let entry = observer.members_set(vertex_cycle[0]);
            let refinement = refine_cycle(rec, &entry, &word);
            let indeterminate = is_indeterminate(&refinement);
            if indeterminate {
                indeterminate_found = true;
            }
            let mut macro_path = vertex_cycle.clone();
            macro_path.push(vertex_cycle[0]);
            crate::errors::assert_invariant(
                word.len() == macro_path.len() - 1,
                crate::errors::InvariantViolation::CycleWordLengthMismatch {
                    word_len: word.len(),
                    edge_len: macro_path.len() - 1,
                },
            );
            reports.push(CycleReport { macro_path, word, refinement, indeterminate });

            if !collect_all && indeterminate_found {
                break 'outer;
            }
        }
    }

    reports.sort_by(|a, b| a.macro_path.cmp(&b.macro_path).then_with(|| a.word.cmp(&b.word)));

    AnalysisResult { diagnosable: !indeterminate_found, cycles: reports }
}
