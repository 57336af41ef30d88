use thiserror::Error;

pub type Result<T> = std::result::Result<T, DeriveError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeriveError {
    #[error("No grammar source provided, use #[grammar_inline = \"...\"] or #[grammar_file = \"...\"]")]
    MissingGrammarSource,
    #[error("At most one grammar source can be provided")]
    MultipleGrammarSources,
    #[error("Grammar source must be a string literal")]
    NotAString,
    #[error("read grammar file {path}: {message}")]
    Io { path: String, message: String },
    #[error("compile grammar: {0}")]
    Compile(#[from] ometa::Error),
    #[error("emit grammar: {0}")]
    Emit(#[from] ometa_grammar::BuildError),
    #[error("syn error: {0}")]
    Syn(String),
}

impl From<syn::Error> for DeriveError {
    fn from(e: syn::Error) -> DeriveError {
        DeriveError::Syn(e.to_string())
    }
}
