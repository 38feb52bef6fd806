use std::collections::{BTreeMap, BTreeSet};

use super::event::{AlphabetTable, EventId};

/// Identifier type for plant states. Dense in `1..=n`.
pub type StateId = u32;

/// A single outgoing transition, stored in the plant's adjacency lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// The event labeling this transition.
    pub event: EventId,
    /// Destination state.
    pub to: StateId,
}

/// The plant automaton `G`: a non-deterministic automaton over a
/// partitioned alphabet, with dense state ids and non-empty initial states.
///
/// Read-only once built. Transitions are indexed by source state so both the
/// synchronous composer (C3) and the observer builder (C4) get dense lookup
/// without re-deriving adjacency.
#[derive(Debug, Clone)]
pub struct Automaton {
    state_count: usize,
    alphabet: AlphabetTable,
    initial_states: Vec<StateId>,
    marked_states: Vec<StateId>,
    adjacency: Vec<Vec<Transition>>,
}

impl Automaton {
    /// Total number of states, `|Q|`.
    pub fn state_count(&self) -> usize {
        self.state_count
    }

    pub fn alphabet(&self) -> &AlphabetTable {
        &self.alphabet
    }

    pub fn initial_states(&self) -> &[StateId] {
        &self.initial_states
    }

    pub fn marked_states(&self) -> &[StateId] {
        &self.marked_states
    }

    /// All outgoing transitions from `state`.
    pub fn transitions(&self, state: StateId) -> &[Transition] {
        &self.adjacency[state as usize - 1]
    }

    /// Outgoing transitions from `state` on `event` only.
    pub fn transitions_on(&self, state: StateId, event: EventId) -> impl Iterator<Item = StateId> + '_ {
        self.transitions(state)
            .iter()
            .filter(move |t| t.event == event)
            .map(|t| t.to)
    }
}

/// Errors reported while validating a textual description into an [`Automaton`].
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("cannot open file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid transition line at line {line}: {text:?}")]
    InvalidTransitionLine { line: usize, text: String },
    #[error("state out of range at line {line}: {state} (valid range is 1..={max})")]
    StateOutOfRange { line: usize, state: u32, max: u32 },
    #[error("event not in alphabet at line {line}: {symbol:?}")]
    UnknownEvent { line: usize, symbol: String },
    #[error("missing section: {0}")]
    MissingSection(&'static str),
    #[error("empty initial-state set")]
    EmptyInitialStates,
    #[error("duplicate event classification for {symbol:?} at line {line}")]
    DuplicateEventClassification { line: usize, symbol: String },
}

/// A line-tagged symbol, carried through the builder purely so validation
/// errors can cite the offending line of the input file.
#[derive(Debug, Clone)]
struct Sited<T> {
    line: usize,
    value: T,
}

/// Incremental builder for [`Automaton`]. The reader (`io::reader`) drives this
/// builder section by section; all cross-field validation (dense ids, event
/// membership, non-empty initial set) happens in [`AutomatonBuilder::build`] so
/// the core never observes a malformed plant.
#[derive(Debug, Default)]
pub struct AutomatonBuilder {
    state_count: usize,
    alphabet: Vec<String>,
    observable: Vec<Sited<String>>,
    unobservable: Vec<Sited<String>>,
    fault: Vec<Sited<String>>,
    transitions: Vec<(usize, StateId, String, StateId)>,
    initial_states: Vec<StateId>,
    marked_states: Vec<StateId>,
}

impl AutomatonBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_state_count(&mut self, n: usize) -> &mut Self {
        self.state_count = n;
        self
    }

    pub fn set_alphabet(&mut self, symbols: Vec<String>) -> &mut Self {
        self.alphabet = symbols;
        self
    }

    pub fn set_observable(&mut self, line: usize, symbols: Vec<String>) -> &mut Self {
        self.observable = symbols.into_iter().map(|value| Sited { line, value }).collect();
        self
    }

    pub fn set_unobservable(&mut self, line: usize, symbols: Vec<String>) -> &mut Self {
        self.unobservable = symbols.into_iter().map(|value| Sited { line, value }).collect();
        self
    }

    pub fn set_fault(&mut self, line: usize, symbols: Vec<String>) -> &mut Self {
        self.fault = symbols.into_iter().map(|value| Sited { line, value }).collect();
        self
    }

    pub fn add_transition(&mut self, line: usize, src: StateId, symbol: String, dst: StateId) -> &mut Self {
        self.transitions.push((line, src, symbol, dst));
        self
    }

    pub fn set_initial_states(&mut self, states: Vec<StateId>) -> &mut Self {
        self.initial_states = states;
        self
    }

    pub fn set_marked_states(&mut self, states: Vec<StateId>) -> &mut Self {
        self.marked_states = states;
        self
    }

    /// Resolves a symbol against the declared alphabet, producing the exact
    /// `UnknownEvent` error if it was never declared on line 2.
    fn resolve<'a>(
        symbol_ids: &'a BTreeMap<String, EventId>,
        line: usize,
        symbol: &str,
    ) -> Result<EventId, ReadError> {
        symbol_ids.get(symbol).copied().ok_or_else(|| ReadError::UnknownEvent {
            line,
            symbol: symbol.to_string(),
        })
    }

    /// Validates and finalizes the plant. Every error variant except
    /// `cannot open file` (produced earlier, at file-open time) can surface
    /// from here.
    pub fn build(self) -> Result<Automaton, ReadError> {
        if self.state_count == 0 {
            return Err(ReadError::MissingSection("state count"));
        }
        if self.initial_states.is_empty() {
            return Err(ReadError::EmptyInitialStates);
        }

        let mut symbol_ids: BTreeMap<String, EventId> = BTreeMap::new();
        for (idx, sym) in self.alphabet.iter().enumerate() {
            symbol_ids.insert(sym.clone(), idx as EventId + 1);
        }

        let mut classified: BTreeMap<EventId, &'static str> = BTreeMap::new();
        let mut observable = BTreeSet::new();
        let mut unobservable = BTreeSet::new();
        let mut fault = BTreeSet::new();

        for sited in &self.observable {
            let id = Self::resolve(&symbol_ids, sited.line, &sited.value)?;
            classified.insert(id, "observable");
            observable.insert(id);
        }
        for sited in &self.unobservable {
            let id = Self::resolve(&symbol_ids, sited.line, &sited.value)?;
            if classified.insert(id, "unobservable") == Some("observable") {
                return Err(ReadError::DuplicateEventClassification {
                    line: sited.line,
                    symbol: sited.value.clone(),
                });
            }
            unobservable.insert(id);
        }
        for sited in &self.fault {
            // Faults may legally overlap either side of the observable /
            // unobservable split, so no rejection here.
            let id = Self::resolve(&symbol_ids, sited.line, &sited.value)?;
            fault.insert(id);
        }

        let alphabet = AlphabetTable::new(self.alphabet.clone(), observable, unobservable, fault);

        let max_state = self.state_count as u32;
        let check_range = |line: usize, s: StateId| -> Result<(), ReadError> {
            if s == 0 || s > max_state {
                Err(ReadError::StateOutOfRange { line, state: s, max: max_state })
            } else {
                Ok(())
            }
        };
        for &s in &self.initial_states {
            check_range(0, s)?;
        }
        for &s in &self.marked_states {
            check_range(0, s)?;
        }

        let mut adjacency: Vec<Vec<Transition>> = vec![Vec::new(); self.state_count];
        for (line, src, symbol, dst) in self.transitions {
            check_range(line, src)?;
            check_range(line, dst)?;
            let event = Self::resolve(&symbol_ids, line, &symbol)?;
            adjacency[src as usize - 1].push(Transition { event, to: dst });
        }
        for row in &mut adjacency {
            row.sort_by_key(|t| (t.event, t.to));
            row.dedup();
        }

        Ok(Automaton {
            state_count: self.state_count,
            alphabet,
            initial_states: self.initial_states,
            marked_states: self.marked_states,
            adjacency,
        })
    }
}
