/// Internal invariant violations: these indicate implementation bugs, not
/// user errors, and are never caught or converted into a `Result` the caller
/// could swallow. [`assert_invariant`] panics with the violated invariant's
/// name rather than returning an error a caller might mask.
#[derive(Debug, thiserror::Error)]
pub enum InvariantViolation {
    #[error("duplicate macro-state id {0}")]
    DuplicateMacroState(u32),
    #[error("transition references unknown source state {0}")]
    UnknownTransitionSource(u32),
    #[error("cycle event count {word_len} does not match cycle edge count {edge_len}")]
    CycleWordLengthMismatch { word_len: usize, edge_len: usize },
}

pub fn assert_invariant(condition: bool, violation: InvariantViolation) {
    if !condition {
        panic!("internal invariant violated: {violation}");
    }
}

pub use crate::model::ReadError;
