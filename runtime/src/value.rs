use std::any::Any;
use std::fmt::{self, Debug, Display};
use std::rc::Rc;

use ometa_grammar::{Literal, Node};

/// An opaque value owned by the embedding program.
#[derive(Clone)]
pub struct HostValue(Rc<dyn Any>);

impl HostValue {
    pub fn new<T: Any>(value: T) -> Self {
        HostValue(Rc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &HostValue) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HostValue({:p})", Rc::as_ptr(&self.0))
    }
}

/// Everything a grammar can match on, bind, or compute.
#[derive(Clone, Debug)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Char(char),
    Str(Rc<str>),
    List(Rc<Vec<Value>>),
    Node(Rc<Node>),
    Host(HostValue),
}

impl Value {
    pub fn str(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(items))
    }

    pub fn node(node: Node) -> Value {
        Value::Node(Rc::new(node))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Node(_) => "node",
            Value::Host(_) => "host value",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Char(_) | Value::Node(_) | Value::Host(_) => true,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(c) => Some(*c),
            Value::Str(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Text of a string or char.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Char(c) => Some(c.to_string()),
            Value::Str(s) => Some(s.to_string()),
            _ => None,
        }
    }

    /// What a list pattern sees when it enters this value.
    pub fn items(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(items) => Some(items.as_ref().clone()),
            Value::Str(s) => Some(s.chars().map(Value::Char).collect()),
            Value::Node(node) => Some(term(node)),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Char(_), Value::Str(_)) | (Value::Str(_), Value::Char(_)) => {
                self.as_char().is_some() && self.as_char() == other.as_char()
            }
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a == b,
            (Value::Host(a), Value::Host(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&Literal> for Value {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Str(s) => Value::str(s),
            Literal::Int(n) => Value::Int(*n),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Char(c) => write!(f, "{:?}", c),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Node(node) => write!(f, "<{}>", node.kind()),
            Value::Host(h) => write!(f, "{:?}", h),
        }
    }
}

fn nodes(nodes: &[Node]) -> Value {
    Value::list(nodes.iter().cloned().map(Value::node).collect())
}

fn boxed(node: &Node) -> Value {
    Value::node(node.clone())
}

/// The sequence a list pattern matches against when it enters a node: the
/// kind's tag followed by the node's fields.
pub fn term(node: &Node) -> Vec<Value> {
    let tag = Value::str(node.kind().tag());
    let fields = match node {
        Node::Apply {
            rule,
            context,
            args,
        } => vec![Value::str(rule), Value::str(context), nodes(args)],
        Node::Exactly(lit) => vec![Value::from(lit)],
        Node::MatchString(s) | Node::Predicate(s) | Node::Action(s) => vec![Value::str(s)],
        Node::Many(e)
        | Node::Many1(e)
        | Node::Optional(e)
        | Node::Not(e)
        | Node::Lookahead(e)
        | Node::List(e)
        | Node::ConsumedBy(e)
        | Node::IndexConsumedBy(e) => vec![boxed(e)],
        Node::Or(es) | Node::Xor(es) | Node::And(es) => vec![nodes(es)],
        Node::Bind { name, expr } => vec![Value::str(name), boxed(expr)],
        Node::Range(low, high) => vec![Value::Char(*low), Value::Char(*high)],
        Node::Interleave(parts) => vec![Value::list(
            parts
                .iter()
                .map(|p| {
                    Value::list(vec![
                        Value::str(p.mode.symbol()),
                        boxed(&p.expr),
                        p.name.as_deref().map(Value::str).unwrap_or(Value::None),
                    ])
                })
                .collect(),
        )],
        Node::Rule { name, body } => vec![Value::str(name), boxed(body)],
        Node::Grammar { name, rules } => vec![Value::str(name), nodes(rules)],
    };
    let mut items = Vec::with_capacity(fields.len() + 1);
    items.push(tag);
    items.extend(fields);
    items
}

/// Builder output that can travel through grammar values.
pub trait HostNode: Sized + 'static {
    fn into_value(self) -> Value;
    fn from_value(value: &Value) -> Option<Self>;
}

impl HostNode for Node {
    fn into_value(self) -> Value {
        Value::node(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Node(node) => Some(node.as_ref().clone()),
            _ => None,
        }
    }
}

impl HostNode for Value {
    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ometa_grammar::{InterleavePart, Mode};

    #[test]
    fn chars_equal_single_char_strings() {
        assert_eq!(Value::Char('a'), Value::str("a"));
        assert_ne!(Value::Char('a'), Value::str("ab"));
        assert_ne!(Value::Char('a'), Value::Int(97));
    }

    #[test]
    fn terms() {
        let e = Node::Apply {
            rule: "x".to_owned(),
            context: "r".to_owned(),
            args: vec![],
        };
        let tests = vec![
            (
                Node::Bind {
                    name: "n".to_owned(),
                    expr: Box::new(e.clone()),
                },
                vec![Value::str("Bind"), Value::str("n"), Value::node(e.clone())],
            ),
            (
                Node::Range('a', 'f'),
                vec![Value::str("Range"), Value::Char('a'), Value::Char('f')],
            ),
            (
                Node::Interleave(vec![InterleavePart::new(Mode::ZeroOrMore, e.clone(), None)]),
                vec![
                    Value::str("Interleave"),
                    Value::list(vec![Value::list(vec![
                        Value::str("*"),
                        Value::node(e.clone()),
                        Value::None,
                    ])]),
                ],
            ),
            (
                Node::Or(vec![e.clone()]),
                vec![Value::str("Or"), Value::list(vec![Value::node(e)])],
            ),
        ];

        for (node, out) in tests {
            assert_eq!(term(&node), out, "node: {:?}", node);
        }
    }

    #[test]
    fn host_values_compare_by_identity() {
        let a = HostValue::new(1u8);
        let b = HostValue::new(1u8);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.downcast_ref::<u8>(), Some(&1));
    }
}
