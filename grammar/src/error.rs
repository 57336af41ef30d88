use std::fmt::{self, Display};

use thiserror::Error;

use crate::lexical;

/// What was wrong with a piece of grammar text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyntaxErrorKind {
    UnterminatedString,
    UnterminatedChar,
    InvalidEscape,
    InvalidRange,
    UnmatchedBracket,
    InvalidNumber,
    NameExpected,
    /// Input that no rule could make sense of.
    Unexpected,
}

impl SyntaxErrorKind {
    pub const ALL: [SyntaxErrorKind; 8] = [
        SyntaxErrorKind::UnterminatedString,
        SyntaxErrorKind::UnterminatedChar,
        SyntaxErrorKind::InvalidEscape,
        SyntaxErrorKind::InvalidRange,
        SyntaxErrorKind::UnmatchedBracket,
        SyntaxErrorKind::InvalidNumber,
        SyntaxErrorKind::NameExpected,
        SyntaxErrorKind::Unexpected,
    ];

    /// The identifier grammars use to raise this kind, e.g.
    /// `syntax_error("unterminated_string")`.
    pub fn name(self) -> &'static str {
        match self {
            SyntaxErrorKind::UnterminatedString => "unterminated_string",
            SyntaxErrorKind::UnterminatedChar => "unterminated_char",
            SyntaxErrorKind::InvalidEscape => "invalid_escape",
            SyntaxErrorKind::InvalidRange => "invalid_range",
            SyntaxErrorKind::UnmatchedBracket => "unmatched_bracket",
            SyntaxErrorKind::InvalidNumber => "invalid_number",
            SyntaxErrorKind::NameExpected => "name_expected",
            SyntaxErrorKind::Unexpected => "unexpected",
        }
    }

    pub fn from_name(name: &str) -> Option<SyntaxErrorKind> {
        SyntaxErrorKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == name)
    }
}

impl Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            SyntaxErrorKind::UnterminatedString => "unterminated string literal",
            SyntaxErrorKind::UnterminatedChar => "unterminated character literal",
            SyntaxErrorKind::InvalidEscape => "invalid escape sequence",
            SyntaxErrorKind::InvalidRange => "invalid character range",
            SyntaxErrorKind::UnmatchedBracket => "unmatched bracket",
            SyntaxErrorKind::InvalidNumber => "invalid numeric literal",
            SyntaxErrorKind::NameExpected => "name expected",
            SyntaxErrorKind::Unexpected => "unexpected input",
        };
        write!(f, "{}", msg)
    }
}

/// Malformed grammar text. Lines and columns are 1-based and count chars.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub line: usize,
    pub column: usize,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, line: usize, column: usize) -> Self {
        SyntaxError { kind, line, column }
    }

    /// Locate an error `offset` chars into `text`.
    pub fn at(kind: SyntaxErrorKind, text: &str, offset: usize) -> Self {
        let (line, column) = lexical::line_col(text.chars(), offset);
        SyntaxError { kind, line, column }
    }
}

/// A builder refused to construct a node.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("'{0}' is bound more than once in the same sequence")]
    DuplicateBinding(String),
    #[error("invalid range {low:?}..{high:?}, low must be less than high")]
    InvalidRange { low: char, high: char },
    #[error("interleave needs at least one part")]
    EmptyInterleave,
    #[error("rule '{0}' is defined more than once")]
    DuplicateRule(String),
    #[error("grammars may only contain rules, found {0}")]
    NotARule(&'static str),
}

/// Everything that can go wrong turning text into a tree.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Build(#[from] BuildError),
}
