use std::fs;
use std::path::Path;

use crate::model::{Automaton, AutomatonBuilder, ReadError, StateId};

/// Reads and validates the plant automaton text format. This is the
/// file-reading boundary kept out of the algorithmic core: it only ever
/// produces the `Automaton` the rest of the crate consumes, never a
/// partially valid one.
pub fn read_automaton(path: impl AsRef<Path>) -> Result<Automaton, ReadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ReadError::Open {
        path: path.display().to_string(),
        source,
    })?;
    parse_automaton(&text)
}

fn is_comment_or_blank(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('%')
}

fn is_section_marker(line: &str) -> bool {
    line.trim().to_ascii_lowercase().starts_with("initial")
}

/// A cursor over `(1-indexed line number, raw text)` pairs that skips
/// `%`-comments and blank lines when looking for the next *content* line.
struct Lines<'a> {
    raw: Vec<(usize, &'a str)>,
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        let raw = text.lines().enumerate().map(|(i, l)| (i + 1, l)).collect();
        Self { raw, pos: 0 }
    }

    fn next_content_line(&mut self) -> Option<(usize, &'a str)> {
        while self.pos < self.raw.len() {
            let (no, line) = self.raw[self.pos];
            self.pos += 1;
            if !is_comment_or_blank(line) {
                return Some((no, line));
            }
        }
        None
    }

    /// Peeks the next raw line without skipping blanks (needed by the
    /// transitions block, which treats a blank line as its own terminator).
    fn peek_raw(&self) -> Option<(usize, &'a str)> {
        self.raw.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }
}

fn parse_automaton(text: &str) -> Result<Automaton, ReadError> {
    let mut lines = Lines::new(text);
    let mut builder = AutomatonBuilder::new();

    let (n_line, n_text) = lines
        .next_content_line()
        .ok_or(ReadError::MissingSection("state count"))?;
    let n: usize = n_text
        .trim()
        .parse()
        .map_err(|_| ReadError::InvalidTransitionLine { line: n_line, text: n_text.to_string() })?;
    builder.set_state_count(n);

    let (_, alphabet_text) = lines
        .next_content_line()
        .ok_or(ReadError::MissingSection("alphabet"))?;
    let alphabet: Vec<String> = split_symbols(alphabet_text);
    builder.set_alphabet(alphabet);

    let (obs_line, obs_text) = lines
        .next_content_line()
        .ok_or(ReadError::MissingSection("observable events"))?;
    builder.set_observable(obs_line, split_symbols_or_empty(obs_text));

    let (uo_line, uo_text) = lines
        .next_content_line()
        .ok_or(ReadError::MissingSection("unobservable events"))?;
    builder.set_unobservable(uo_line, split_symbols_or_empty(uo_text));

    let (f_line, f_text) = lines
        .next_content_line()
        .ok_or(ReadError::MissingSection("fault events"))?;
    builder.set_fault(f_line, split_symbols_or_empty(f_text));

    // Transitions block: consume raw lines (skipping only `%`-comments)
    // until a blank line or an "Initial state" marker line.
    loop {
        let Some((line_no, raw)) = lines.peek_raw() else { break };
        if is_comment_or_blank(raw) {
            lines.advance();
            if raw.trim().is_empty() {
                break;
            }
            continue;
        }
        if is_section_marker(raw) {
            lines.advance();
            break;
        }
        lines.advance();
        let (src, sym, dst) = parse_transition_line(line_no, raw)?;
        builder.add_transition(line_no, src, sym, dst);
    }

    let (_, init_text) = lines
        .next_content_line()
        .ok_or(ReadError::MissingSection("initial states"))?;
    let initial_states = parse_state_list(init_text)?;
    builder.set_initial_states(initial_states);

    let marked_states = match lines.next_content_line() {
        Some((_, marked_text)) => parse_state_list_or_empty(marked_text)?,
        None => Vec::new(),
    };
    builder.set_marked_states(marked_states);

    builder.build()
}

fn split_symbols(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

fn split_symbols_or_empty(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed == "-" {
        Vec::new()
    } else {
        split_symbols(trimmed)
    }
}

fn parse_state_list(text: &str) -> Result<Vec<StateId>, ReadError> {
    text.split_whitespace()
        .map(|tok| {
            tok.parse::<StateId>()
                .map_err(|_| ReadError::InvalidTransitionLine { line: 0, text: tok.to_string() })
        })
        .collect()
}

fn parse_state_list_or_empty(text: &str) -> Result<Vec<StateId>, ReadError> {
    if text.trim() == "-" {
        Ok(Vec::new())
    } else {
        parse_state_list(text)
    }
}

fn parse_transition_line(line: usize, raw: &str) -> Result<(StateId, String, StateId), ReadError> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let [src, sym, dst] = tokens.as_slice() else {
        return Err(ReadError::InvalidTransitionLine { line, text: raw.to_string() });
    };
    let src = src
        .parse::<StateId>()
        .map_err(|_| ReadError::InvalidTransitionLine { line, text: raw.to_string() })?;
    let dst = dst
        .parse::<StateId>()
        .map_err(|_| ReadError::InvalidTransitionLine { line, text: raw.to_string() })?;
    Ok((src, sym.to_string(), dst))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scenario_a_minimal_fault_free() {
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
        let automaton = parse_automaton(text).unwrap();
        assert_eq!(automaton.state_count(), 1);
        assert_eq!(automaton.initial_states(), &[1]);
        assert_eq!(automaton.alphabet().len(), 1);
    }

    #[test]
    fn parses_scenario_b_detectable_fault() {
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
        let automaton = parse_automaton(text).unwrap();
        assert_eq!(automaton.state_count(), 2);
        assert!(automaton.alphabet().is_fault(automaton.alphabet().id_of("f").unwrap()));
    }

    #[test]
    fn transitions_block_terminates_on_marker_line() {
        let text = "\
2
a
a
-
-
1 a 2
Initial state
1
-
";
        let automaton = parse_automaton(text).unwrap();
        assert_eq!(automaton.initial_states(), &[1]);
        assert_eq!(automaton.transitions(1).len(), 1);
    }

    #[test]
    fn skips_percent_comments_and_blank_lines() {
        let text = "\
% a comment
1
% alphabet
a

a
-
-
1 a 1

1
-
";
        let automaton = parse_automaton(text).unwrap();
        assert_eq!(automaton.state_count(), 1);
    }

    #[test]
    fn rejects_out_of_range_transition() {
        let text = "\
1
a
a
-
-
1 a 2

1
-
";
        let err = parse_automaton(text).unwrap_err();
        assert!(matches!(err, ReadError::StateOutOfRange { .. }));
    }

    #[test]
    fn rejects_unknown_event() {
        let text = "\
1
a
a
-
-
1 b 1

1
-
";
        let err = parse_automaton(text).unwrap_err();
        assert!(matches!(err, ReadError::UnknownEvent { .. }));
    }

    #[test]
    fn rejects_empty_initial_states() {
        let text = "\
1
a
a
-
-
1 a 1

-
-
";
        let err = parse_automaton(text).unwrap_err();
        assert!(matches!(err, ReadError::EmptyInitialStates));
    }
}
