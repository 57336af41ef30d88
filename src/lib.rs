//! A self-hosting compiler for OMeta style parsing expression grammars.
//!
//! Grammar text is parsed by the metagrammar, itself written in the notation
//! it parses, into a `Node` tree (or whatever a `Builder` makes of it). The
//! tree can be rewritten by grammars over trees, emitted as Rust with
//! `ometa_codegen`, or loaded straight into an `ometa_runtime::Interpreter`.
//!
//! ```no_run
//! let tree = ometa::compile("digits = <digit+>:ds -> int(ds, 10)", "Digits").unwrap();
//! println!("{}", tree);
//! ```

pub mod bootstrap;
mod error;

pub use error::{Error, Result};

use log::debug;
use ometa_grammar::{Builder, Node, NodeKind, TreeBuilder};
use ometa_runtime::{Bindings, HostNode, Input, Interpreter, Value};

/// How `compile_options` treats its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Name given to the resulting grammar.
    pub name: String,
    /// Run the tree through the null optimizer after parsing.
    pub optimize: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            name: "Grammar".to_owned(),
            optimize: false,
        }
    }
}

/// Compile grammar text into a tree named `name`.
pub fn compile(text: &str, name: &str) -> Result<Node> {
    compile_with(text, name, TreeBuilder::new())
}

/// Compile grammar text, constructing the result with `builder`.
///
/// Nothing built on a branch the parser abandons ends up in the result, and
/// no partial result is returned on error.
pub fn compile_with<B>(text: &str, name: &str, builder: B) -> Result<B::Output>
where
    B: Builder + 'static,
    B::Output: HostNode,
{
    debug!("compiling grammar {} ({} bytes)", name, text.len());
    let interp = Interpreter::new(
        bootstrap::metagrammar()?,
        Bindings::prelude().builder(builder),
    )?;
    let value = interp
        .parse("grammar", Input::Text(text), vec![Value::str(name)])
        .map_err(Error::from_parse)?;
    B::Output::from_value(&value).ok_or_else(|| Error::UnexpectedResult(value.type_name()))
}

pub fn compile_options(text: &str, options: &CompileOptions) -> Result<Node> {
    let grammar = compile(text, &options.name)?;
    if options.optimize {
        optimize(&grammar)
    } else {
        Ok(grammar)
    }
}

/// Run `node` through the null optimizer.
pub fn optimize(node: &Node) -> Result<Node> {
    rewrite(bootstrap::null_optimizer()?, node)
}

/// Run `node` through a rewrite grammar over trees.
///
/// Grammars are matched with the rewriter's `grammar` rule, rules with
/// `rulePair` and expressions with `opt`. A rewriter with no clause for some
/// node fails with `Error::Exhaustiveness`.
pub fn rewrite(rewriter: &Node, node: &Node) -> Result<Node> {
    let rule = match node.kind() {
        NodeKind::Grammar => "grammar",
        NodeKind::Rule => "rulePair",
        _ => "opt",
    };
    debug!(
        "rewriting {} with {}.{}",
        node.kind(),
        rewriter.name().unwrap_or_default(),
        rule
    );

    let interp = Interpreter::new(rewriter, Bindings::prelude().builder(TreeBuilder::new()))?;
    let value = interp
        .parse(rule, Input::Values(vec![Value::node(node.clone())]), vec![])
        .map_err(Error::from_rewrite)?;
    Node::from_value(&value).ok_or_else(|| Error::UnexpectedResult(value.type_name()))
}
