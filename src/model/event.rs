use std::collections::BTreeSet;
use std::fmt;

/// Identifier type for alphabet events. Dense in `1..=|alphabet|`.
pub type EventId = u32;

/// An immutable view of the event alphabet and its observable/unobservable/fault
/// partition, plus the symbol table needed to render events at the I/O boundary.
///
/// Built once by [`crate::io::reader`] and then passed by reference to every
/// downstream stage; nothing under `src/` ever copies or mutates it.
#[derive(Debug, Clone)]
pub struct AlphabetTable {
    symbols: Vec<String>,
    observable: BTreeSet<EventId>,
    unobservable: BTreeSet<EventId>,
    fault: BTreeSet<EventId>,
}

impl AlphabetTable {
    /// Builds a table from a dense symbol list (index `i` has id `i as EventId + 1`)
    /// and the three partition sets. Callers (the reader) are responsible for
    /// validating density and classification consistency before construction;
    /// this constructor trusts its input.
    pub fn new(
        symbols: Vec<String>,
        observable: BTreeSet<EventId>,
        unobservable: BTreeSet<EventId>,
        fault: BTreeSet<EventId>,
    ) -> Self {
        Self {
            symbols,
            observable,
            unobservable,
            fault,
        }
    }

    /// Number of events in the alphabet.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// All event ids, in ascending order.
    pub fn events(&self) -> impl Iterator<Item = EventId> + '_ {
        1..=self.symbols.len() as EventId
    }

    /// All observable event ids, in ascending order.
    pub fn observable_events(&self) -> impl Iterator<Item = EventId> + '_ {
        self.observable.iter().copied()
    }

    pub fn is_observable(&self, e: EventId) -> bool {
        self.observable.contains(&e)
    }

    pub fn is_unobservable(&self, e: EventId) -> bool {
        self.unobservable.contains(&e)
    }

    pub fn is_fault(&self, e: EventId) -> bool {
        self.fault.contains(&e)
    }

    /// Renders the symbol for an event id. Panics on an out-of-range id: every
    /// `EventId` flowing through the core was validated at the read boundary.
    pub fn symbol(&self, e: EventId) -> &str {
        &self.symbols[e as usize - 1]
    }

    /// Looks up the id for a symbol, if present.
    pub fn id_of(&self, symbol: &str) -> Option<EventId> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|idx| idx as EventId + 1)
    }
}

impl fmt::Display for AlphabetTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbols.join(" "))
    }
}
