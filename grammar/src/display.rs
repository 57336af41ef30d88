use std::fmt::{self, Display};

use crate::lexical::quote;
use crate::node::{Literal, Mode, Node};

/// Binding strength of the notation a node prints as. Higher binds tighter.
fn level(node: &Node) -> u8 {
    match node {
        Node::Or(_) | Node::Xor(_) => 0,
        Node::Interleave(_) => 1,
        Node::And(es) if !es.is_empty() => 2,
        Node::Many(_) | Node::Many1(_) | Node::Optional(_) | Node::Bind { .. } => 3,
        Node::Not(_) | Node::Lookahead(_) => 4,
        _ => 5,
    }
}

fn write_at(f: &mut fmt::Formatter, node: &Node, min: u8) -> fmt::Result {
    if level(node) < min {
        write!(f, "({})", node)
    } else {
        write!(f, "{}", node)
    }
}

fn write_joined(f: &mut fmt::Formatter, nodes: &[Node], sep: &str, min: u8) -> fmt::Result {
    for (i, n) in nodes.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write_at(f, n, min)?;
    }
    Ok(())
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::Str(s) => write!(f, "{}", quote(s, '\'')),
            Literal::Int(n) => write!(f, "{}", n),
        }
    }
}

/// Prints grammar notation that reads back as an equal tree.
///
/// Actions are always printed in their `!(...)` form since the `->` form
/// swallows the rest of the line.
impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Node::Apply { rule, args, .. } => {
                write!(f, "{}", rule)?;
                if !args.is_empty() {
                    write!(f, "(")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        match arg {
                            Node::Action(code) => write!(f, "{}", code)?,
                            other => write!(f, "{}", other)?,
                        }
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            Node::Exactly(lit) => write!(f, "{}", lit),
            Node::MatchString(s) => write!(f, "{}", quote(s, '"')),
            Node::Many(e) => {
                write_at(f, e, 4)?;
                write!(f, "*")
            }
            Node::Many1(e) => {
                write_at(f, e, 4)?;
                write!(f, "+")
            }
            Node::Optional(e) => {
                write_at(f, e, 4)?;
                write!(f, "?")
            }
            Node::Or(es) => write_joined(f, es, " | ", 1),
            Node::Xor(es) => write_joined(f, es, " || ", 1),
            Node::And(es) if es.is_empty() => write!(f, "()"),
            Node::And(es) => write_joined(f, es, " ", 3),
            Node::Not(e) => {
                write!(f, "~")?;
                match **e {
                    Node::Not(_) | Node::Lookahead(_) => write!(f, "({})", e),
                    _ => write_at(f, e, 4),
                }
            }
            Node::Lookahead(e) => {
                write!(f, "~~")?;
                write_at(f, e, 4)
            }
            Node::Bind { name, expr } => {
                match **expr {
                    Node::Bind { .. } => write!(f, "({})", expr)?,
                    _ => write_at(f, expr, 3)?,
                }
                write!(f, ":{}", name)
            }
            Node::Predicate(code) => write!(f, "?({})", code),
            Node::Action(code) => write!(f, "!({})", code),
            Node::List(e) => write!(f, "[{}]", e),
            Node::ConsumedBy(e) => write!(f, "<{}>", e),
            Node::IndexConsumedBy(e) => write!(f, "@<{}>", e),
            Node::Range(low, high) => write!(
                f,
                "{}..{}",
                quote(&low.to_string(), '\''),
                quote(&high.to_string(), '\'')
            ),
            Node::Interleave(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " && ")?;
                    }
                    match (part.mode, &part.name) {
                        (Mode::One, None) => {
                            write!(f, "(")?;
                            write_at(f, &part.expr, 2)?;
                            write!(f, ")")?;
                        }
                        (mode, name) => {
                            write_at(f, &part.expr, 4)?;
                            if mode != Mode::One {
                                write!(f, "{}", mode)?;
                            }
                            if let Some(name) = name {
                                write!(f, ":{}", name)?;
                            }
                        }
                    }
                }
                Ok(())
            }
            Node::Rule { name, body } => write!(f, "{} = {}", name, body),
            Node::Grammar { rules, .. } => {
                for rule in rules.iter() {
                    writeln!(f, "{}", rule)?;
                }
                Ok(())
            }
        }
    }
}
