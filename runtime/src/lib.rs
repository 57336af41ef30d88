//! A backtracking, memoizing interpreter for grammar trees.
//!
//! A `Grammar` node is loaded together with `Bindings`, the host values and
//! functions its actions and predicates may use, and can then be run over
//! text or over a sequence of values.

mod bindings;
mod builtins;
mod error;
pub mod host;
mod input;
mod interp;
mod program;
mod value;

pub use bindings::{Bindings, HostFn};
pub use error::{HostError, LoadError, Position, RuntimeError};
pub use input::Input;
pub use interp::Interpreter;
pub use value::{term, HostNode, HostValue, Value};
