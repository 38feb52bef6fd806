use crate::model::{AlphabetTable, EventId};

/// The two-state fault monitor `M`: deterministic, total over the whole
/// alphabet, and sticky once it enters [`MonitorState::Faulty`].
///
/// `Normal` is encoded as `1` and `Faulty` as `2`, since that encoding is
/// part of the display contract (`(q,1)` renders as `(q,N)`), so it is
/// fixed with explicit discriminants rather than left to enum declaration
/// order.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MonitorState {
    Normal = 1,
    Faulty = 2,
}

impl MonitorState {
    /// Advances the monitor on `event`. Total: every event has a defined
    /// successor, and `Faulty` has no transition back to `Normal`.
    pub fn step(self, event: EventId, alphabet: &AlphabetTable) -> MonitorState {
        match self {
            MonitorState::Faulty => MonitorState::Faulty,
            MonitorState::Normal => {
                if alphabet.is_fault(event) {
                    MonitorState::Faulty
                } else {
                    MonitorState::Normal
                }
            }
        }
    }
}
