use std::fmt::{self, Display};

use crate::builder::Builder;
use crate::error::BuildError;

/// The value matched by an `Exactly` node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
    Str(String),
    Int(i64),
}

/// How many times an interleave part has to match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    One,
    ZeroOrMore,
    OneOrMore,
    Optional,
}

impl Mode {
    pub fn symbol(self) -> &'static str {
        match self {
            Mode::One => "1",
            Mode::ZeroOrMore => "*",
            Mode::OneOrMore => "+",
            Mode::Optional => "?",
        }
    }

    pub fn from_symbol(s: &str) -> Option<Mode> {
        match s {
            "1" => Some(Mode::One),
            "*" => Some(Mode::ZeroOrMore),
            "+" => Some(Mode::OneOrMore),
            "?" => Some(Mode::Optional),
            _ => None,
        }
    }

    /// Whether the part may be left unmatched.
    pub fn is_optional(self) -> bool {
        matches!(self, Mode::ZeroOrMore | Mode::Optional)
    }

    /// Whether the part may match more than once.
    pub fn repeats(self) -> bool {
        matches!(self, Mode::ZeroOrMore | Mode::OneOrMore)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::One
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// One operand of an `&&` interleave.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterleavePart<T> {
    pub mode: Mode,
    pub expr: T,
    pub name: Option<String>,
}

impl<T> InterleavePart<T> {
    pub fn new(mode: Mode, expr: T, name: Option<String>) -> Self {
        InterleavePart { mode, expr, name }
    }

    pub fn map<U, E, F>(&self, f: F) -> Result<InterleavePart<U>, E>
    where
        F: FnOnce(&T) -> Result<U, E>,
    {
        Ok(InterleavePart {
            mode: self.mode,
            expr: f(&self.expr)?,
            name: self.name.clone(),
        })
    }
}

/// A grammar expression. Trees are built bottom-up and never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Invoke `rule`. `context` is the rule the application appears in.
    Apply {
        rule: String,
        context: String,
        args: Vec<Node>,
    },
    Exactly(Literal),
    MatchString(String),
    Many(Box<Node>),
    Many1(Box<Node>),
    Optional(Box<Node>),
    /// Ordered choice, first match wins.
    Or(Vec<Node>),
    /// Exclusive choice, exactly one branch may match.
    Xor(Vec<Node>),
    /// Sequence, yields the value of the last element.
    And(Vec<Node>),
    Not(Box<Node>),
    Lookahead(Box<Node>),
    Bind {
        name: String,
        expr: Box<Node>,
    },
    /// Host expression that must evaluate truthy.
    Predicate(String),
    /// Host expression whose value is the result.
    Action(String),
    List(Box<Node>),
    ConsumedBy(Box<Node>),
    IndexConsumedBy(Box<Node>),
    Range(char, char),
    Interleave(Vec<InterleavePart<Node>>),
    Rule {
        name: String,
        body: Box<Node>,
    },
    Grammar {
        name: String,
        rules: Vec<Node>,
    },
}

/// The fieldless discriminant of a `Node`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Apply,
    Exactly,
    MatchString,
    Many,
    Many1,
    Optional,
    Or,
    Xor,
    And,
    Not,
    Lookahead,
    Bind,
    Predicate,
    Action,
    List,
    ConsumedBy,
    IndexConsumedBy,
    Range,
    Interleave,
    Rule,
    Grammar,
}

impl NodeKind {
    pub const ALL: [NodeKind; 21] = [
        NodeKind::Apply,
        NodeKind::Exactly,
        NodeKind::MatchString,
        NodeKind::Many,
        NodeKind::Many1,
        NodeKind::Optional,
        NodeKind::Or,
        NodeKind::Xor,
        NodeKind::And,
        NodeKind::Not,
        NodeKind::Lookahead,
        NodeKind::Bind,
        NodeKind::Predicate,
        NodeKind::Action,
        NodeKind::List,
        NodeKind::ConsumedBy,
        NodeKind::IndexConsumedBy,
        NodeKind::Range,
        NodeKind::Interleave,
        NodeKind::Rule,
        NodeKind::Grammar,
    ];

    /// The stable name used as the head of a node's term view.
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::Apply => "Apply",
            NodeKind::Exactly => "Exactly",
            NodeKind::MatchString => "MatchString",
            NodeKind::Many => "Many",
            NodeKind::Many1 => "Many1",
            NodeKind::Optional => "Optional",
            NodeKind::Or => "Or",
            NodeKind::Xor => "Xor",
            NodeKind::And => "And",
            NodeKind::Not => "Not",
            NodeKind::Lookahead => "Lookahead",
            NodeKind::Bind => "Bind",
            NodeKind::Predicate => "Predicate",
            NodeKind::Action => "Action",
            NodeKind::List => "List",
            NodeKind::ConsumedBy => "ConsumedBy",
            NodeKind::IndexConsumedBy => "IndexConsumedBy",
            NodeKind::Range => "Range",
            NodeKind::Interleave => "Interleave",
            NodeKind::Rule => "Rule",
            NodeKind::Grammar => "Grammar",
        }
    }

    pub fn from_tag(tag: &str) -> Option<NodeKind> {
        NodeKind::ALL.iter().copied().find(|k| k.tag() == tag)
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Apply { .. } => NodeKind::Apply,
            Node::Exactly(_) => NodeKind::Exactly,
            Node::MatchString(_) => NodeKind::MatchString,
            Node::Many(_) => NodeKind::Many,
            Node::Many1(_) => NodeKind::Many1,
            Node::Optional(_) => NodeKind::Optional,
            Node::Or(_) => NodeKind::Or,
            Node::Xor(_) => NodeKind::Xor,
            Node::And(_) => NodeKind::And,
            Node::Not(_) => NodeKind::Not,
            Node::Lookahead(_) => NodeKind::Lookahead,
            Node::Bind { .. } => NodeKind::Bind,
            Node::Predicate(_) => NodeKind::Predicate,
            Node::Action(_) => NodeKind::Action,
            Node::List(_) => NodeKind::List,
            Node::ConsumedBy(_) => NodeKind::ConsumedBy,
            Node::IndexConsumedBy(_) => NodeKind::IndexConsumedBy,
            Node::Range(..) => NodeKind::Range,
            Node::Interleave(_) => NodeKind::Interleave,
            Node::Rule { .. } => NodeKind::Rule,
            Node::Grammar { .. } => NodeKind::Grammar,
        }
    }

    /// Fold the tree bottom-up through `builder`.
    ///
    /// Rebuilding with a `TreeBuilder` reproduces an equal tree for anything
    /// a `TreeBuilder` produced in the first place.
    pub fn rebuild<B: Builder>(&self, builder: &B) -> Result<B::Output, BuildError> {
        let all = |nodes: &[Node]| -> Result<Vec<B::Output>, BuildError> {
            nodes.iter().map(|n| n.rebuild(builder)).collect()
        };
        match self {
            Node::Apply {
                rule,
                context,
                args,
            } => builder.apply(rule, context, all(args)?),
            Node::Exactly(lit) => builder.exactly(lit.clone()),
            Node::MatchString(s) => builder.match_string(s),
            Node::Many(e) => builder.many(e.rebuild(builder)?),
            Node::Many1(e) => builder.many1(e.rebuild(builder)?),
            Node::Optional(e) => builder.optional(e.rebuild(builder)?),
            Node::Or(es) => builder.or_(all(es)?),
            Node::Xor(es) => builder.xor(all(es)?),
            Node::And(es) => builder.sequence(all(es)?),
            Node::Not(e) => builder.not_(e.rebuild(builder)?),
            Node::Lookahead(e) => builder.lookahead(e.rebuild(builder)?),
            Node::Bind { name, expr } => builder.bind(name, expr.rebuild(builder)?),
            Node::Predicate(code) => builder.predicate(code),
            Node::Action(code) => builder.action(code),
            Node::List(e) => builder.list_pattern(e.rebuild(builder)?),
            Node::ConsumedBy(e) => builder.consumed_by(e.rebuild(builder)?),
            Node::IndexConsumedBy(e) => builder.index_consumed_by(e.rebuild(builder)?),
            Node::Range(low, high) => builder.range(*low, *high),
            Node::Interleave(parts) => {
                let parts = parts
                    .iter()
                    .map(|p| p.map(|e| e.rebuild(builder)))
                    .collect::<Result<Vec<_>, _>>()?;
                builder.interleave(parts)
            }
            Node::Rule { name, body } => builder.rule(name, body.rebuild(builder)?),
            Node::Grammar { name, rules } => builder.make_grammar(name, all(rules)?),
        }
    }

    /// Name of a rule or grammar.
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Rule { name, .. } | Node::Grammar { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The rules of a grammar, empty for anything else.
    pub fn rules(&self) -> &[Node] {
        match self {
            Node::Grammar { rules, .. } => rules,
            _ => &[],
        }
    }

    /// Look up a rule of a grammar by name.
    pub fn rule(&self, name: &str) -> Option<&Node> {
        self.rules().iter().find(|r| r.name() == Some(name))
    }

    /// Direct sub-expressions, in order.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Apply { args, .. } => args.iter().collect(),
            Node::Or(es) | Node::Xor(es) | Node::And(es) => es.iter().collect(),
            Node::Grammar { rules, .. } => rules.iter().collect(),
            Node::Many(e)
            | Node::Many1(e)
            | Node::Optional(e)
            | Node::Not(e)
            | Node::Lookahead(e)
            | Node::List(e)
            | Node::ConsumedBy(e)
            | Node::IndexConsumedBy(e)
            | Node::Bind { expr: e, .. }
            | Node::Rule { body: e, .. } => vec![&**e],
            Node::Interleave(parts) => parts.iter().map(|p| &p.expr).collect(),
            Node::Exactly(_)
            | Node::MatchString(_)
            | Node::Predicate(_)
            | Node::Action(_)
            | Node::Range(..) => Vec::new(),
        }
    }

    /// Number of nodes in the tree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(Node::node_count)
            .sum::<usize>()
    }
}
