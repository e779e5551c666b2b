//! Lexer for the LP language.
//!
//! The lexer splits the source into whitespace-delimited words and feeds
//! each word through the shared DFA until it is fully consumed, so token
//! boundaries inside a word (`x1+x2`) are found by longest match. Line
//! numbers are attached to every emitted token.

use crate::frontend::dfa::Dfa;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::errors::LexError;

/// Tokenize LP source text.
///
/// The returned stream always ends with a single [`TokenKind::Eof`] token
/// carrying the last line number.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let dfa = Dfa::global();
    let mut tokens = Vec::new();
    let mut line = 0;

    for (line_index, text) in source.lines().enumerate() {
        line = line_index + 1;
        for word in text.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            let mut rest: &[char] = &chars;
            while !rest.is_empty() {
                let (token, consumed) = dfa.run(rest, line)?;
                tokens.push(token);
                rest = &rest[consumed..];
            }
        }
    }

    tokens.push(Token::new(TokenKind::Eof, "", line.max(1)));
    Ok(tokens)
}
