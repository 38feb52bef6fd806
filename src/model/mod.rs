pub mod automaton;
pub mod event;

pub use automaton::{Automaton, AutomatonBuilder, ReadError, StateId, Transition};
pub use event::{AlphabetTable, EventId};
