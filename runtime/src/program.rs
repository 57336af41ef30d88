use std::collections::HashMap;

use log::debug;
use ometa_grammar::{Mode, Node};

use crate::builtins::Builtin;
use crate::error::LoadError;
use crate::host::{self, Expr};
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Target {
    Rule(usize),
    Builtin(Builtin),
}

#[derive(Debug)]
pub(crate) enum Arg {
    Const(Value),
    Expr(Expr),
}

#[derive(Debug)]
pub(crate) struct Part {
    pub mode: Mode,
    pub pattern: Pattern,
    pub name: Option<String>,
}

/// A grammar expression with names resolved and host code parsed.
#[derive(Debug)]
pub(crate) enum Pattern {
    Apply { target: Target, args: Vec<Arg> },
    Exactly(Value),
    MatchString(String),
    Many(Box<Pattern>),
    Many1(Box<Pattern>),
    Optional(Box<Pattern>),
    Or(Vec<Pattern>),
    Xor(Vec<Pattern>),
    And(Vec<Pattern>),
    Not(Box<Pattern>),
    Lookahead(Box<Pattern>),
    Bind(String, Box<Pattern>),
    Predicate(Expr),
    Action(Expr),
    List(Box<Pattern>),
    ConsumedBy(Box<Pattern>),
    IndexConsumedBy(Box<Pattern>),
    Range(char, char),
    Interleave(Vec<Part>),
}

#[derive(Debug)]
pub(crate) struct Rule {
    pub name: String,
    pub body: Pattern,
}

#[derive(Debug)]
pub(crate) struct Program {
    pub name: String,
    pub rules: Vec<Rule>,
    pub index: HashMap<String, usize>,
}

struct Loader<'a> {
    index: &'a HashMap<String, usize>,
    rule: &'a str,
}

impl<'a> Loader<'a> {
    fn host(&self, code: &str) -> Result<Expr, LoadError> {
        host::parse(code).ok_or_else(|| LoadError::HostSyntax {
            rule: self.rule.to_owned(),
            code: code.to_owned(),
        })
    }

    fn boxed(&self, node: &Node) -> Result<Box<Pattern>, LoadError> {
        Ok(Box::new(self.pattern(node)?))
    }

    fn all(&self, nodes: &[Node]) -> Result<Vec<Pattern>, LoadError> {
        nodes.iter().map(|n| self.pattern(n)).collect()
    }

    fn target(&self, name: &str, argc: usize) -> Result<Target, LoadError> {
        if let Some(idx) = self.index.get(name) {
            return Ok(Target::Rule(*idx));
        }
        let builtin = Builtin::from_name(name).ok_or_else(|| LoadError::UnknownRule {
            rule: self.rule.to_owned(),
            name: name.to_owned(),
        })?;
        if builtin.arity() != argc {
            return Err(LoadError::BuiltinArity {
                rule: self.rule.to_owned(),
                name: name.to_owned(),
                expected: builtin.arity(),
                found: argc,
            });
        }
        Ok(Target::Builtin(builtin))
    }

    fn arg(&self, node: &Node) -> Result<Arg, LoadError> {
        match node {
            Node::Action(code) => Ok(Arg::Expr(self.host(code)?)),
            Node::Exactly(lit) => Ok(Arg::Const(Value::from(lit))),
            other => Err(LoadError::UnsupportedArgument {
                rule: self.rule.to_owned(),
                kind: other.kind().tag(),
            }),
        }
    }

    fn pattern(&self, node: &Node) -> Result<Pattern, LoadError> {
        Ok(match node {
            Node::Apply { rule, args, .. } => Pattern::Apply {
                target: self.target(rule, args.len())?,
                args: args.iter().map(|a| self.arg(a)).collect::<Result<_, _>>()?,
            },
            Node::Exactly(lit) => Pattern::Exactly(Value::from(lit)),
            Node::MatchString(s) => Pattern::MatchString(s.clone()),
            Node::Many(e) => Pattern::Many(self.boxed(e)?),
            Node::Many1(e) => Pattern::Many1(self.boxed(e)?),
            Node::Optional(e) => Pattern::Optional(self.boxed(e)?),
            Node::Or(es) => Pattern::Or(self.all(es)?),
            Node::Xor(es) => Pattern::Xor(self.all(es)?),
            Node::And(es) => Pattern::And(self.all(es)?),
            Node::Not(e) => Pattern::Not(self.boxed(e)?),
            Node::Lookahead(e) => Pattern::Lookahead(self.boxed(e)?),
            Node::Bind { name, expr } => Pattern::Bind(name.clone(), self.boxed(expr)?),
            Node::Predicate(code) => Pattern::Predicate(self.host(code)?),
            Node::Action(code) => Pattern::Action(self.host(code)?),
            Node::List(e) => Pattern::List(self.boxed(e)?),
            Node::ConsumedBy(e) => Pattern::ConsumedBy(self.boxed(e)?),
            Node::IndexConsumedBy(e) => Pattern::IndexConsumedBy(self.boxed(e)?),
            Node::Range(low, high) => Pattern::Range(*low, *high),
            Node::Interleave(parts) => Pattern::Interleave(
                parts
                    .iter()
                    .map(|p| {
                        Ok(Part {
                            mode: p.mode,
                            pattern: self.pattern(&p.expr)?,
                            name: p.name.clone(),
                        })
                    })
                    .collect::<Result<_, LoadError>>()?,
            ),
            Node::Rule { .. } | Node::Grammar { .. } => {
                return Err(LoadError::NotAGrammar(node.kind().tag()))
            }
        })
    }
}

impl Program {
    pub fn load(grammar: &Node) -> Result<Program, LoadError> {
        let (name, rules) = match grammar {
            Node::Grammar { name, rules } => (name, rules),
            other => return Err(LoadError::NotAGrammar(other.kind().tag())),
        };

        let mut bodies = Vec::with_capacity(rules.len());
        for rule in rules {
            match rule {
                Node::Rule { name, body } => bodies.push((name.as_str(), body.as_ref())),
                other => return Err(LoadError::NotAGrammar(other.kind().tag())),
            }
        }
        let index: HashMap<String, usize> = bodies
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.to_string(), i))
            .collect();

        let rules = bodies
            .iter()
            .map(|(name, body)| {
                let loader = Loader {
                    index: &index,
                    rule: name,
                };
                Ok(Rule {
                    name: name.to_string(),
                    body: loader.pattern(body)?,
                })
            })
            .collect::<Result<Vec<_>, LoadError>>()?;

        debug!("loaded grammar '{}' with {} rules", name, rules.len());
        Ok(Program {
            name: name.clone(),
            rules,
            index,
        })
    }
}
