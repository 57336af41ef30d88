//! The grammars the compiler is made of.
//!
//! The metagrammar is compiled by the seed parser when this crate is built and
//! included below as the first generation. Everything at runtime goes through
//! that generation; `verify_fixed_point` checks that it reproduces itself.

use log::debug;
use once_cell::sync::Lazy;
use ometa_grammar::{BuildError, Node};

use crate::error::{Error, Result};

mod generation_1 {
    include!(concat!(env!("OUT_DIR"), "/metagrammar.rs"));
}

/// Source of the metagrammar.
pub const METAGRAMMAR: &str = include_str!("../grammars/metagrammar.ometa");

/// Source of the rewrite grammar that rebuilds every node unchanged.
pub const NULL_OPTIMIZER: &str = include_str!("../grammars/null_optimizer.ometa");

static GENERATION_1: Lazy<std::result::Result<Node, BuildError>> = Lazy::new(|| {
    debug!("loading first generation metagrammar");
    generation_1::grammar()
});

static NULL_OPTIMIZER_TREE: Lazy<Result<Node>> = Lazy::new(|| {
    debug!("compiling null optimizer");
    crate::compile(NULL_OPTIMIZER, "NullOptimizer")
});

/// The first generation metagrammar tree.
pub fn metagrammar() -> Result<&'static Node> {
    match &*GENERATION_1 {
        Ok(grammar) => Ok(grammar),
        Err(err) => Err(Error::Build(err.clone())),
    }
}

/// The compiled null optimizer.
pub fn null_optimizer() -> Result<&'static Node> {
    match &*NULL_OPTIMIZER_TREE {
        Ok(grammar) => Ok(grammar),
        Err(err) => Err(err.clone()),
    }
}

/// Compile the metagrammar with the first generation and check that the
/// result is the first generation again.
pub fn verify_fixed_point() -> Result<()> {
    let current = metagrammar()?;
    let name = current.name().unwrap_or_default();
    let next = crate::compile(METAGRAMMAR, name)?;
    match first_difference(current, &next) {
        Some(rule) => Err(Error::FixedPoint { rule }),
        None => {
            debug!("metagrammar reached a fixed point");
            Ok(())
        }
    }
}

/// Name of the first rule where two grammars disagree, or the grammar name if
/// only that differs.
fn first_difference(a: &Node, b: &Node) -> Option<String> {
    let (left, right) = (a.rules(), b.rules());
    for i in 0..left.len().max(right.len()) {
        match (left.get(i), right.get(i)) {
            (Some(l), Some(r)) if l == r => continue,
            (Some(rule), _) | (None, Some(rule)) => {
                return rule.name().map(str::to_owned);
            }
            (None, None) => break,
        }
    }
    if a != b {
        return Some(a.name().unwrap_or_default().to_owned());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use ometa_grammar::{Literal, Node};

    fn grammar(rules: Vec<Node>) -> Node {
        Node::Grammar {
            name: "G".to_owned(),
            rules,
        }
    }

    fn rule(name: &str, lit: i64) -> Node {
        Node::Rule {
            name: name.to_owned(),
            body: Box::new(Node::Exactly(Literal::Int(lit))),
        }
    }

    struct TestCase {
        a: Node,
        b: Node,
        out: Option<&'static str>,
    }

    #[test]
    fn differences() {
        let tests = vec![
            TestCase {
                a: grammar(vec![rule("a", 1), rule("b", 2)]),
                b: grammar(vec![rule("a", 1), rule("b", 2)]),
                out: None,
            },
            TestCase {
                a: grammar(vec![rule("a", 1), rule("b", 2)]),
                b: grammar(vec![rule("a", 1), rule("b", 3)]),
                out: Some("b"),
            },
            TestCase {
                a: grammar(vec![rule("a", 1)]),
                b: grammar(vec![rule("a", 1), rule("c", 2)]),
                out: Some("c"),
            },
            TestCase {
                a: grammar(vec![rule("a", 1)]),
                b: Node::Grammar {
                    name: "H".to_owned(),
                    rules: vec![rule("a", 1)],
                },
                out: Some("G"),
            },
        ];

        for test in tests {
            assert_eq!(
                first_difference(&test.a, &test.b).as_deref(),
                test.out,
                "a: {}",
                test.a
            );
        }
    }

    #[test]
    fn generation_1_loads() {
        let g = metagrammar().unwrap();
        assert_eq!(g.name(), Some("OMeta"));
        for rule in &["grammar", "rule", "expr", "application", "number"] {
            assert!(g.rule(rule).is_some(), "missing rule {}", rule);
        }
    }
}
