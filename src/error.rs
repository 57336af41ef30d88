use ometa_grammar::{BuildError, SyntaxError, SyntaxErrorKind};
use ometa_runtime::{HostError, LoadError, RuntimeError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Build(#[from] BuildError),
    /// Compiling the metagrammar with itself gave a different tree.
    #[error("metagrammar is not a fixed point, rule '{rule}' differs")]
    FixedPoint { rule: String },
    /// A rewrite grammar has no clause for a node it was given.
    #[error("rewrite has no clause for {tag} nodes")]
    Exhaustiveness { tag: String },
    #[error("grammar produced a {0} instead of a tree")]
    UnexpectedResult(&'static str),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Error {
    /// Translate a failure of the metagrammar over grammar text into the error
    /// the text deserves.
    pub(crate) fn from_parse(err: RuntimeError) -> Error {
        match err {
            RuntimeError::Match { position } => Error::Syntax(SyntaxError::new(
                SyntaxErrorKind::Unexpected,
                position.line,
                position.column,
            )),
            RuntimeError::Syntax { kind, position } => {
                Error::Syntax(SyntaxError::new(kind, position.line, position.column))
            }
            RuntimeError::Host {
                position,
                source: HostError::Build(BuildError::InvalidRange { .. }),
            } => Error::Syntax(SyntaxError::new(
                SyntaxErrorKind::InvalidRange,
                position.line,
                position.column,
            )),
            RuntimeError::Host {
                source: HostError::Build(err),
                ..
            } => Error::Build(err),
            other => Error::Runtime(other),
        }
    }

    /// Translate a failure of a rewrite grammar.
    pub(crate) fn from_rewrite(err: RuntimeError) -> Error {
        match err {
            RuntimeError::Host {
                source: HostError::UnknownNode(tag),
                ..
            } => Error::Exhaustiveness { tag },
            RuntimeError::Host {
                source: HostError::Build(err),
                ..
            } => Error::Build(err),
            other => Error::Runtime(other),
        }
    }
}
