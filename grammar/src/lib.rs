//! Grammar trees for OMeta style parsing expression grammars, the builders
//! that construct them, and a parser for grammar text that needs nothing but
//! this crate.

mod builder;
mod display;
mod error;
pub mod lexical;
mod node;
pub mod seed;

pub use builder::{Builder, TreeBuilder};
pub use error::{BuildError, Error, SyntaxError, SyntaxErrorKind};
pub use node::{InterleavePart, Literal, Mode, Node, NodeKind};
