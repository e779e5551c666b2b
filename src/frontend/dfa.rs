//! The lexer's deterministic finite automaton.
//!
//! The transition table is built once per process and shared read-only
//! between all tokenize calls. Keyword recognition is longest-match with
//! identifier fallback: every keyword-prefix state carries transitions to
//! the identifier state for each letter that does not continue the keyword,
//! so `letter` lexes as a single identifier rather than `let` + `ter`.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::errors::LexError;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Index of a DFA state in the transition table.
type StateId = usize;

/// Sentinel for "no transition".
const NO_STATE: StateId = usize::MAX;

/// Transitions are indexed by ASCII byte; the alphabet is
/// `a-z A-Z 0-9 ; = < > + - * / ( ) .`.
const ALPHABET_SIZE: usize = 128;

static TABLE: Lazy<Dfa> = Lazy::new(Dfa::build);

/// The lexer DFA: a dense transition table plus accepting-state kinds.
pub struct Dfa {
    transitions: Vec<[StateId; ALPHABET_SIZE]>,
    accepting: Vec<Option<TokenKind>>,
    start: StateId,
}

/// Interns named states while the table is being wired up.
///
/// State names only exist during construction; the finished [`Dfa`] is
/// purely index-based.
struct DfaBuilder {
    ids: HashMap<String, StateId>,
    transitions: Vec<[StateId; ALPHABET_SIZE]>,
    accepting: Vec<Option<TokenKind>>,
}

impl DfaBuilder {
    fn new() -> Self {
        Self {
            ids: HashMap::new(),
            transitions: Vec::new(),
            accepting: Vec::new(),
        }
    }

    /// Get or create the state with the given name.
    fn state(&mut self, name: &str) -> StateId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.transitions.len();
        self.ids.insert(name.to_string(), id);
        self.transitions.push([NO_STATE; ALPHABET_SIZE]);
        self.accepting.push(None);
        id
    }

    /// Create (or fetch) the accepting state for a token kind.
    fn accepting_state(&mut self, kind: TokenKind) -> StateId {
        let id = self.state(kind.name());
        self.accepting[id] = Some(kind);
        id
    }

    fn set(&mut self, from: StateId, ch: char, to: StateId) {
        self.transitions[from][ch as usize] = to;
    }

    /// Add a transition only if none exists yet.
    fn set_if_absent(&mut self, from: StateId, ch: char, to: StateId) {
        if self.transitions[from][ch as usize] == NO_STATE {
            self.set(from, ch, to);
        }
    }

    /// Add fallback transitions from a keyword-prefix state to the
    /// identifier state, for every letter except the one continuing
    /// the keyword.
    fn fallback_to_identifier(&mut self, from: StateId, exclude: Option<char>) {
        let id_state = self.accepting_state(TokenKind::Identifier);
        for letter in ('a'..='z').chain('A'..='Z') {
            if Some(letter) == exclude {
                continue;
            }
            self.set_if_absent(from, letter, id_state);
        }
    }

    /// Wire a keyword chain from the start state, with identifier
    /// fallbacks on every state along the way (including the accepting
    /// one, so `maxx` still lexes as one identifier).
    fn add_keyword(&mut self, start: StateId, keyword: &str, kind: TokenKind) {
        let chars: Vec<char> = keyword.chars().collect();
        let mut curr = start;
        for (i, &ch) in chars.iter().enumerate() {
            let is_last = i + 1 == chars.len();
            let next = if is_last {
                self.accepting_state(kind)
            } else {
                self.state(&keyword[..i + 1])
            };
            self.set(curr, ch, next);
            self.fallback_to_identifier(next, chars.get(i + 1).copied());
            curr = next;
        }
    }

    fn finish(self, start: StateId) -> Dfa {
        Dfa {
            transitions: self.transitions,
            accepting: self.accepting,
            start,
        }
    }
}

impl Dfa {
    /// The process-wide transition table.
    pub fn global() -> &'static Dfa {
        &TABLE
    }

    fn build() -> Dfa {
        let mut b = DfaBuilder::new();
        let start = b.state("start");

        // Identifier transitions: letters enter and continue, digits only
        // continue. Keyword chains below overwrite the entry transitions
        // for `l`, `s`, `m`.
        let identifier = b.accepting_state(TokenKind::Identifier);
        for letter in ('a'..='z').chain('A'..='Z') {
            b.set(start, letter, identifier);
            b.set(identifier, letter, identifier);
        }
        for digit in '0'..='9' {
            b.set(identifier, digit, identifier);
        }

        // Number and decimal transitions. The decimal point may only
        // follow at least one digit.
        let number = b.accepting_state(TokenKind::Number);
        let decimal = b.accepting_state(TokenKind::Decimal);
        for digit in '0'..='9' {
            b.set(start, digit, number);
            b.set(number, digit, number);
            b.set(decimal, digit, decimal);
        }
        b.set(number, '.', decimal);

        b.add_keyword(start, "let", TokenKind::Let);
        b.add_keyword(start, "s.t.", TokenKind::SubjectTo);
        b.add_keyword(start, "min", TokenKind::Min);
        b.add_keyword(start, "max", TokenKind::Max);

        // Relations. `<` and `>` are not tokens on their own; they only
        // accept once followed by `=`.
        let equal = b.accepting_state(TokenKind::Equal);
        let less = b.state("<");
        let greater = b.state(">");
        let less_equal = b.accepting_state(TokenKind::LessEqual);
        let greater_equal = b.accepting_state(TokenKind::GreaterEqual);
        b.set(start, '=', equal);
        b.set(start, '<', less);
        b.set(start, '>', greater);
        b.set(less, '=', less_equal);
        b.set(greater, '=', greater_equal);

        // Single-character operators and delimiters.
        for (ch, kind) in [
            ('+', TokenKind::Plus),
            ('-', TokenKind::Minus),
            ('*', TokenKind::Star),
            ('/', TokenKind::Slash),
            ('(', TokenKind::LeftParen),
            (')', TokenKind::RightParen),
            (';', TokenKind::Semicolon),
        ] {
            let state = b.accepting_state(kind);
            b.set(start, ch, state);
        }

        b.finish(start)
    }

    fn next_state(&self, state: StateId, ch: char) -> Option<StateId> {
        let index = ch as usize;
        if index >= ALPHABET_SIZE {
            return None;
        }
        match self.transitions[state][index] {
            NO_STATE => None,
            next => Some(next),
        }
    }

    /// Run the DFA against `input`, greedily consuming the longest prefix
    /// that ends in an accepting state.
    ///
    /// Returns the recognized token and the number of characters consumed.
    /// Fails if no accepting state is ever reached.
    pub fn run(&self, input: &[char], line: usize) -> Result<(Token, usize), LexError> {
        let mut state = self.start;
        let mut last_accept: Option<(usize, TokenKind)> = None;

        for (i, &ch) in input.iter().enumerate() {
            match self.next_state(state, ch) {
                Some(next) => {
                    state = next;
                    if let Some(kind) = self.accepting[state] {
                        last_accept = Some((i, kind));
                    }
                }
                None => break,
            }
        }

        match last_accept {
            Some((pos, kind)) => {
                let lexeme: String = input[..=pos].iter().collect();
                Ok((Token::new(kind, lexeme, line), pos + 1))
            }
            None => Err(LexError {
                message: format!(
                    "no valid token recognized from input {:?}",
                    input.iter().collect::<String>()
                ),
                line,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> Result<(Token, usize), LexError> {
        let chars: Vec<char> = input.chars().collect();
        Dfa::global().run(&chars, 1)
    }

    #[test]
    fn test_keyword() {
        let (token, consumed) = run("let").unwrap();
        assert_eq!(token.kind, TokenKind::Let);
        assert_eq!(consumed, 3);
    }

    #[test]
    fn test_keyword_prefix_falls_back_to_identifier() {
        // `letter` must lex as one identifier, not `let` + `ter`.
        let (token, consumed) = run("letter").unwrap();
        assert_eq!(token.kind, TokenKind::Identifier);
        assert_eq!(token.lexeme, "letter");
        assert_eq!(consumed, 6);

        let (token, _) = run("maxx").unwrap();
        assert_eq!(token.kind, TokenKind::Identifier);

        let (token, _) = run("so").unwrap();
        assert_eq!(token.kind, TokenKind::Identifier);
    }

    #[test]
    fn test_subject_to() {
        let (token, consumed) = run("s.t.").unwrap();
        assert_eq!(token.kind, TokenKind::SubjectTo);
        assert_eq!(consumed, 4);
    }

    #[test]
    fn test_longest_match_stops_at_boundary() {
        let (token, consumed) = run("x1+x2").unwrap();
        assert_eq!(token.kind, TokenKind::Identifier);
        assert_eq!(token.lexeme, "x1");
        assert_eq!(consumed, 2);
    }

    #[test]
    fn test_numbers() {
        let (token, _) = run("42").unwrap();
        assert_eq!(token.kind, TokenKind::Number);

        let (token, consumed) = run("1.25").unwrap();
        assert_eq!(token.kind, TokenKind::Decimal);
        assert_eq!(consumed, 4);
    }

    #[test]
    fn test_relations() {
        let (token, consumed) = run("<=").unwrap();
        assert_eq!(token.kind, TokenKind::LessEqual);
        assert_eq!(consumed, 2);

        let (token, _) = run(">=5").unwrap();
        assert_eq!(token.kind, TokenKind::GreaterEqual);

        let (token, consumed) = run("=").unwrap();
        assert_eq!(token.kind, TokenKind::Equal);
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_bare_less_than_rejected() {
        // `<` on its own never reaches an accepting state.
        assert!(run("<x").is_err());
    }

    #[test]
    fn test_no_token_recognized() {
        let err = run("#").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("no valid token"));
    }
}
