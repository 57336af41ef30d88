use std::fmt::{self, Display};

use ometa_grammar::{BuildError, SyntaxErrorKind};
use thiserror::Error;

/// Where in the input something happened. For text input lines and columns
/// are 1-based; for value input the column is the 1-based item index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A grammar could not be turned into something runnable.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LoadError {
    #[error("expected a grammar, found {0}")]
    NotAGrammar(&'static str),
    #[error("rule '{rule}' applies unknown rule '{name}'")]
    UnknownRule { rule: String, name: String },
    #[error("rule '{rule}' has malformed host expression {code:?}")]
    HostSyntax { rule: String, code: String },
    #[error("rule '{rule}' passes a {kind} node as an argument")]
    UnsupportedArgument { rule: String, kind: &'static str },
    #[error("rule '{rule}' applies '{name}' with {found} arguments, it takes {expected}")]
    BuiltinArity {
        rule: String,
        name: String,
        expected: usize,
        found: usize,
    },
}

/// A host function or expression failed.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum HostError {
    #[error("unknown name '{0}'")]
    UnknownName(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("expected {expected}, found {found}")]
    Type {
        expected: &'static str,
        found: &'static str,
    },
    #[error("'{function}' takes {expected} arguments, got {found}")]
    Arity {
        function: String,
        expected: usize,
        found: usize,
    },
    #[error("index {index} out of range for length {len}")]
    Index { index: i64, len: usize },
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("{0}")]
    Syntax(SyntaxErrorKind),
    #[error("no rewrite for {0} nodes")]
    UnknownNode(String),
    #[error("{0}")]
    Custom(String),
}

/// Running a grammar failed.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RuntimeError {
    #[error("no match, furthest failure at {position}")]
    Match { position: Position },
    #[error("{kind} at {position}")]
    Syntax {
        kind: SyntaxErrorKind,
        position: Position,
    },
    #[error("host error at {position}: {source}")]
    Host {
        position: Position,
        source: HostError,
    },
    #[error("unknown rule '{0}'")]
    UnknownRule(String),
}

impl RuntimeError {
    pub fn position(&self) -> Option<Position> {
        match self {
            RuntimeError::Match { position }
            | RuntimeError::Syntax { position, .. }
            | RuntimeError::Host { position, .. } => Some(*position),
            RuntimeError::UnknownRule(_) => None,
        }
    }
}
