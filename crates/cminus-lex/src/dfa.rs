//! Character DFA (§4.1): numbered states, first-match-wins transitions over
//! the legal alphabet `[A-Za-z0-9;:,\[\](){}+\-<=*/\s]`.
//!
//! Grounded on `original_source/compiler.py::create_cminus_dfa` (the exact
//! state numbering below reproduces its table) and on the representation
//! decision already used for the parser's grammar automata (`cminus-par`):
//! data (the transition table) stays data, `step` is the single place that
//! interprets it, rather than building `State`/`Transition` objects in the
//! Python original's OO style.
//!
//! State 1 is the start state. States are grouped below exactly as the
//! reference table groups them; `Resolution` records what a state means
//! once nothing further matches.

/// One DFA state, numbered to match the reference table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Start,
    /// Digit run (NUM).
    S2,
    /// Letter run (ID or KEYWORD, resolved against the keyword list).
    S3,
    /// Single-character punctuation (SYMBOL).
    S4,
    /// Seen `=`, awaiting a second `=`.
    S5,
    /// Seen the first `/` of a comment opener.
    S6,
    /// Inside a `//` line comment body.
    S7,
    /// Line or block comment accepted (COMMENT).
    S8,
    /// Inside a `/* */` block comment body.
    S9,
    /// Block comment body, just saw a `*`.
    S10,
    /// Seen a lone `*`.
    S13,
    /// Whitespace run (WHITESPACE).
    S11,
}

/// Terminal outcome of a completed DFA run: either a token kind resolver or
/// a lexical error kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Num,
    IdOrKeyword,
    Symbol,
    Comment,
    Whitespace,
    UnmatchedComment,
    InvalidInput,
}

impl State {
    /// Whether this state accepts — i.e. a run ending here yields a token
    /// rather than needing to continue.
    pub fn resolution(self) -> Option<Resolution> {
        match self {
            State::S2 => Some(Resolution::Num),
            State::S3 => Some(Resolution::IdOrKeyword),
            State::S4 => Some(Resolution::Symbol),
            State::S13 => Some(Resolution::Symbol),
            State::S8 => Some(Resolution::Comment),
            State::S11 => Some(Resolution::Whitespace),
            // A lone `=` or `/` (not followed by a second `=`, `*`, or `/`)
            // is itself a complete single-character SYMBOL token. The
            // reference table leaves this edge implicit (and its Python
            // companion scanner crashes on it); resolving here is the
            // sensible completion, not a silent behavior change, since
            // every other single-character punctuation state resolves.
            State::S5 | State::S6 => Some(Resolution::Symbol),
            State::Start | State::S7 | State::S9 | State::S10 => None,
        }
    }

    /// Whether reaching EOF while in this state is itself an error (§4.1:
    /// "designated states whose reaching at EOF signals Unclosed comment"),
    /// matching the reference's `Scanner(dfa, code, [9, 10])`.
    pub fn unclosed_at_eof(self) -> bool {
        matches!(self, State::S9 | State::S10)
    }
}

fn is_illegal(c: char) -> bool {
    c != '\0'
        && !(c.is_ascii_alphanumeric()
            || matches!(c, ';' | ':' | ',' | '[' | ']' | '(' | ')' | '{' | '}' | '+' | '-' | '<' | '=' | '*' | '/')
            || c.is_whitespace())
}

/// A single transition step. Returns `None` when the run must stop and
/// `state`'s resolution (if any) finalizes the token; `Some(error)` short-
/// circuits into a state-level lexical error (`Unmatched comment` /
/// `Invalid input`) that consumes the triggering character.
pub enum Step {
    Continue(State),
    /// The char triggers an immediate, state-level error; it is consumed.
    Error(Resolution),
    /// No transition matches; stop without consuming `c`.
    Stop,
}

/// Advances one character from `state`. Declared-order first match, per
/// §4.1. The NUM→letter "Invalid number" edge present in the reference
/// table is deliberately not wired here: `Scanner` detects that condition
/// by a two-token lookahead instead (see `scanner.rs`), matching
/// `original_source/cminus/scanner/scanner.py::get_next_token`.
pub fn step(state: State, c: char) -> Step {
    match state {
        State::Start => {
            if c.is_ascii_digit() {
                Step::Continue(State::S2)
            } else if c.is_ascii_alphabetic() {
                Step::Continue(State::S3)
            } else if matches!(c, ';' | ':' | ',' | '[' | ']' | '(' | ')' | '{' | '}' | '+' | '-' | '<') {
                Step::Continue(State::S4)
            } else if c == '=' {
                Step::Continue(State::S5)
            } else if c == '*' {
                Step::Continue(State::S13)
            } else if c == '/' {
                Step::Continue(State::S6)
            } else if c.is_whitespace() {
                Step::Continue(State::S11)
            } else {
                debug_assert!(is_illegal(c) || c == '\0');
                Step::Error(Resolution::InvalidInput)
            }
        }
        State::S2 => {
            if c.is_ascii_digit() {
                Step::Continue(State::S2)
            } else {
                Step::Stop
            }
        }
        State::S3 => {
            if c.is_ascii_alphanumeric() {
                Step::Continue(State::S3)
            } else {
                Step::Stop
            }
        }
        State::S4 => Step::Stop,
        State::S5 => {
            if c == '=' {
                Step::Continue(State::S4)
            } else {
                Step::Stop
            }
        }
        State::S13 => {
            if c == '/' {
                Step::Error(Resolution::UnmatchedComment)
            } else {
                Step::Stop
            }
        }
        State::S6 => {
            if c == '/' {
                Step::Continue(State::S7)
            } else if c == '*' {
                Step::Continue(State::S9)
            } else {
                Step::Stop
            }
        }
        State::S7 => {
            if c == '\n' {
                Step::Continue(State::S8)
            } else if c == '\0' {
                Step::Stop
            } else {
                Step::Continue(State::S7)
            }
        }
        State::S9 => {
            if c == '*' {
                Step::Continue(State::S10)
            } else if c == '\0' {
                Step::Stop
            } else {
                Step::Continue(State::S9)
            }
        }
        State::S10 => {
            if c == '/' {
                Step::Continue(State::S8)
            } else if c == '*' {
                Step::Continue(State::S10)
            } else if c == '\0' {
                Step::Stop
            } else {
                Step::Continue(State::S9)
            }
        }
        State::S8 | State::S11 => Step::Stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_run_stays_in_num_state() {
        assert!(matches!(step(State::Start, '1'), Step::Continue(State::S2)));
        assert!(matches!(step(State::S2, '2'), Step::Continue(State::S2)));
        assert!(matches!(step(State::S2, 'a'), Step::Stop));
    }

    #[test]
    fn lone_equals_then_non_equals_stops() {
        assert!(matches!(step(State::Start, '='), Step::Continue(State::S5)));
        assert!(matches!(step(State::S5, 'x'), Step::Stop));
        assert!(matches!(step(State::S5, '='), Step::Continue(State::S4)));
    }

    #[test]
    fn star_slash_is_unmatched_comment() {
        assert!(matches!(step(State::Start, '*'), Step::Continue(State::S13)));
        assert!(matches!(step(State::S13, '/'), Step::Error(Resolution::UnmatchedComment)));
    }

    #[test]
    fn illegal_character_is_invalid_input() {
        assert!(matches!(step(State::Start, '#'), Step::Error(Resolution::InvalidInput)));
    }

    #[test]
    fn block_comment_closes_through_star_slash() {
        let s = step(State::Start, '/');
        assert!(matches!(s, Step::Continue(State::S6)));
        assert!(matches!(step(State::S6, '*'), Step::Continue(State::S9)));
        assert!(matches!(step(State::S9, 'x'), Step::Continue(State::S9)));
        assert!(matches!(step(State::S9, '*'), Step::Continue(State::S10)));
        assert!(matches!(step(State::S10, '/'), Step::Continue(State::S8)));
        assert_eq!(State::S8.resolution(), Some(Resolution::Comment));
    }

    #[test]
    fn unterminated_block_comment_states_flag_unclosed_at_eof() {
        assert!(State::S9.unclosed_at_eof());
        assert!(State::S10.unclosed_at_eof());
        assert!(!State::S8.unclosed_at_eof());
    }

    #[test]
    fn is_illegal_rejects_out_of_alphabet_chars() {
        assert!(is_illegal('#'));
        assert!(is_illegal('@'));
        assert!(is_illegal('_'));
        assert!(!is_illegal('a'));
        assert!(!is_illegal(';'));
    }
}
