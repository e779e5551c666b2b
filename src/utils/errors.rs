//! Error types for the LP front-end.
//!
//! This module defines all error types used throughout the pipeline,
//! organized by the stage that produces them. Every stage fails fast:
//! the first error stops the pipeline and is surfaced to the caller.

use thiserror::Error;
use std::fmt;

/// Top-level error type for the front-end pipeline.
#[derive(Error, Debug)]
pub enum LpError {
    /// Error during lexing/tokenization
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),

    /// Error during parsing
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error during normalization
    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    /// Error during semantic analysis
    #[error("Semantic error: {0}")]
    Semantic(#[from] SemanticError),

    /// Error during standard-form conversion or result reconstruction
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Error at the solver boundary
    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error during lexical analysis.
///
/// Raised when the DFA dead-ends without ever passing through an
/// accepting state for the remaining input.
#[derive(Error, Debug, Clone)]
pub struct LexError {
    /// The error message
    pub message: String,
    /// Line number (1-indexed)
    pub line: usize,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}", self.message, self.line)
    }
}

/// Error during parsing.
#[derive(Error, Debug, Clone)]
pub struct ParseError {
    /// The error message
    pub message: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Expected token kinds (if applicable)
    pub expected: Vec<String>,
    /// What was found
    pub found: Option<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}", self.message, self.line)?;
        if !self.expected.is_empty() {
            write!(f, " (expected: {})", self.expected.join(", "))?;
        }
        if let Some(ref found) = self.found {
            write!(f, " (found: {})", found)?;
        }
        Ok(())
    }
}

/// Error during normalization.
#[derive(Error, Debug, Clone)]
pub struct NormalizeError {
    /// The error message
    pub message: String,
    /// Line number of the offending expression
    pub line: usize,
    /// The kind of normalization error
    pub kind: NormalizeErrorKind,
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}", self.message, self.line)
    }
}

/// The kind of a normalization error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeErrorKind {
    /// Product or quotient of two non-constant subexpressions
    Nonlinear,
}

/// Error during semantic analysis.
#[derive(Error, Debug, Clone)]
pub struct SemanticError {
    /// The error message
    pub message: String,
    /// Line number of the offending term
    pub line: usize,
    /// The kind of semantic error
    pub kind: SemanticErrorKind,
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}", self.message, self.line)
    }
}

/// The kind of a semantic error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticErrorKind {
    /// Same variable declared twice
    DuplicateVariable,
    /// Variable referenced without declaration
    UndeclaredVariable,
    /// Constraint right-hand side is not a literal
    ConstantExpected,
    /// Term shape not allowed in a canonical chain
    InvalidTerm,
}

/// Error during standard-form conversion or solution reconstruction.
#[derive(Error, Debug, Clone)]
pub struct ConversionError {
    /// The error message
    pub message: String,
    /// The kind of conversion error
    pub kind: ConversionErrorKind,
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// The kind of a conversion error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionErrorKind {
    /// More slack columns produced than were reserved
    SlackOverflow,
    /// Solution vector shorter than the split/slack bookkeeping expects
    SolutionTooShort,
    /// Variable with no index in the symbol table
    UnknownVariable,
    /// Term shape that should not have survived the semantic pass
    MalformedTerm,
}

/// Error at the solver subprocess boundary.
#[derive(Error, Debug)]
pub struct SolverError {
    /// The error message
    pub message: String,
    /// The kind of solver error
    pub kind: SolverErrorKind,
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// The kind of a solver error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverErrorKind {
    /// Solver binary could not be spawned
    Spawn,
    /// Read/write on the solver's pipes failed
    Io,
    /// Solver did not finish within the caller-supplied timeout
    Timeout,
    /// No result-type tag in the solver output
    MissingResultType,
}

/// Result type using LpError.
pub type LpResult<T> = Result<T, LpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError {
            message: "token kind does not match".to_string(),
            line: 3,
            expected: vec!["identifier".to_string()],
            found: Some("number".to_string()),
        };
        let s = format!("{}", err);
        assert!(s.contains("line 3"));
        assert!(s.contains("identifier"));
        assert!(s.contains("number"));
    }

    #[test]
    fn test_top_level_conversion() {
        let err: LpError = LexError {
            message: "no valid token".to_string(),
            line: 1,
        }
        .into();
        assert!(format!("{}", err).starts_with("Lex error"));
    }
}
