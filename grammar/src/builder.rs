use std::collections::HashSet;

use crate::error::BuildError;
use crate::node::{InterleavePart, Literal, Node};

/// Constructs grammar expressions of some output type.
///
/// There is one method per node kind. Methods never mutate the builder, so a
/// fragment built on a branch that is later abandoned simply gets dropped.
pub trait Builder {
    type Output;

    fn apply(
        &self,
        rule: &str,
        context: &str,
        args: Vec<Self::Output>,
    ) -> Result<Self::Output, BuildError>;
    fn exactly(&self, literal: Literal) -> Result<Self::Output, BuildError>;
    fn match_string(&self, s: &str) -> Result<Self::Output, BuildError>;
    fn many(&self, expr: Self::Output) -> Result<Self::Output, BuildError>;
    fn many1(&self, expr: Self::Output) -> Result<Self::Output, BuildError>;
    fn optional(&self, expr: Self::Output) -> Result<Self::Output, BuildError>;
    fn or_(&self, exprs: Vec<Self::Output>) -> Result<Self::Output, BuildError>;
    fn xor(&self, exprs: Vec<Self::Output>) -> Result<Self::Output, BuildError>;
    fn sequence(&self, exprs: Vec<Self::Output>) -> Result<Self::Output, BuildError>;
    fn not_(&self, expr: Self::Output) -> Result<Self::Output, BuildError>;
    fn lookahead(&self, expr: Self::Output) -> Result<Self::Output, BuildError>;
    fn bind(&self, name: &str, expr: Self::Output) -> Result<Self::Output, BuildError>;
    fn predicate(&self, code: &str) -> Result<Self::Output, BuildError>;
    fn action(&self, code: &str) -> Result<Self::Output, BuildError>;
    fn list_pattern(&self, expr: Self::Output) -> Result<Self::Output, BuildError>;
    fn consumed_by(&self, expr: Self::Output) -> Result<Self::Output, BuildError>;
    fn index_consumed_by(&self, expr: Self::Output) -> Result<Self::Output, BuildError>;
    fn range(&self, low: char, high: char) -> Result<Self::Output, BuildError>;
    fn interleave(
        &self,
        parts: Vec<InterleavePart<Self::Output>>,
    ) -> Result<Self::Output, BuildError>;
    fn rule(&self, name: &str, body: Self::Output) -> Result<Self::Output, BuildError>;
    fn make_grammar(
        &self,
        name: &str,
        rules: Vec<Self::Output>,
    ) -> Result<Self::Output, BuildError>;
}

/// Builds `Node` trees, checking structural invariants as it goes.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeBuilder;

impl TreeBuilder {
    pub fn new() -> Self {
        TreeBuilder
    }
}

fn single_or<F>(mut exprs: Vec<Node>, f: F) -> Node
where
    F: FnOnce(Vec<Node>) -> Node,
{
    if exprs.len() == 1 {
        exprs.remove(0)
    } else {
        f(exprs)
    }
}

impl Builder for TreeBuilder {
    type Output = Node;

    fn apply(&self, rule: &str, context: &str, args: Vec<Node>) -> Result<Node, BuildError> {
        Ok(Node::Apply {
            rule: rule.to_owned(),
            context: context.to_owned(),
            args,
        })
    }

    fn exactly(&self, literal: Literal) -> Result<Node, BuildError> {
        Ok(Node::Exactly(literal))
    }

    fn match_string(&self, s: &str) -> Result<Node, BuildError> {
        Ok(Node::MatchString(s.to_owned()))
    }

    fn many(&self, expr: Node) -> Result<Node, BuildError> {
        Ok(Node::Many(Box::new(expr)))
    }

    fn many1(&self, expr: Node) -> Result<Node, BuildError> {
        Ok(Node::Many1(Box::new(expr)))
    }

    fn optional(&self, expr: Node) -> Result<Node, BuildError> {
        Ok(Node::Optional(Box::new(expr)))
    }

    fn or_(&self, exprs: Vec<Node>) -> Result<Node, BuildError> {
        Ok(single_or(exprs, Node::Or))
    }

    fn xor(&self, exprs: Vec<Node>) -> Result<Node, BuildError> {
        Ok(single_or(exprs, Node::Xor))
    }

    fn sequence(&self, exprs: Vec<Node>) -> Result<Node, BuildError> {
        let mut seen = HashSet::new();
        for e in exprs.iter() {
            if let Node::Bind { name, .. } = e {
                if !seen.insert(name.as_str()) {
                    return Err(BuildError::DuplicateBinding(name.clone()));
                }
            }
        }
        Ok(single_or(exprs, Node::And))
    }

    fn not_(&self, expr: Node) -> Result<Node, BuildError> {
        Ok(Node::Not(Box::new(expr)))
    }

    fn lookahead(&self, expr: Node) -> Result<Node, BuildError> {
        Ok(Node::Lookahead(Box::new(expr)))
    }

    fn bind(&self, name: &str, expr: Node) -> Result<Node, BuildError> {
        Ok(Node::Bind {
            name: name.to_owned(),
            expr: Box::new(expr),
        })
    }

    fn predicate(&self, code: &str) -> Result<Node, BuildError> {
        Ok(Node::Predicate(code.to_owned()))
    }

    fn action(&self, code: &str) -> Result<Node, BuildError> {
        Ok(Node::Action(code.to_owned()))
    }

    fn list_pattern(&self, expr: Node) -> Result<Node, BuildError> {
        Ok(Node::List(Box::new(expr)))
    }

    fn consumed_by(&self, expr: Node) -> Result<Node, BuildError> {
        Ok(Node::ConsumedBy(Box::new(expr)))
    }

    fn index_consumed_by(&self, expr: Node) -> Result<Node, BuildError> {
        Ok(Node::IndexConsumedBy(Box::new(expr)))
    }

    fn range(&self, low: char, high: char) -> Result<Node, BuildError> {
        if low >= high {
            return Err(BuildError::InvalidRange { low, high });
        }
        Ok(Node::Range(low, high))
    }

    fn interleave(&self, parts: Vec<InterleavePart<Node>>) -> Result<Node, BuildError> {
        if parts.is_empty() {
            return Err(BuildError::EmptyInterleave);
        }
        Ok(Node::Interleave(parts))
    }

    fn rule(&self, name: &str, body: Node) -> Result<Node, BuildError> {
        Ok(Node::Rule {
            name: name.to_owned(),
            body: Box::new(body),
        })
    }

    fn make_grammar(&self, name: &str, rules: Vec<Node>) -> Result<Node, BuildError> {
        let mut seen = HashSet::new();
        for r in rules.iter() {
            match r {
                Node::Rule { name, .. } => {
                    if !seen.insert(name.as_str()) {
                        return Err(BuildError::DuplicateRule(name.clone()));
                    }
                }
                other => return Err(BuildError::NotARule(other.kind().tag())),
            }
        }
        log::debug!("built grammar {} with {} rules", name, rules.len());
        Ok(Node::Grammar {
            name: name.to_owned(),
            rules,
        })
    }
}
