use std::collections::HashMap;
use std::rc::Rc;

use ometa_grammar::{Builder, InterleavePart, Literal, Mode, SyntaxErrorKind};

use crate::error::HostError;
use crate::value::{HostNode, Value};

pub type HostFn = Rc<dyn Fn(Vec<Value>) -> Result<Value, HostError>>;

/// Host values and functions visible to a grammar's actions and predicates.
#[derive(Clone, Default)]
pub struct Bindings {
    values: HashMap<String, Value>,
    functions: HashMap<String, HostFn>,
}

fn arity(function: &str, args: &[Value], expected: usize) -> Result<(), HostError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(HostError::Arity {
            function: function.to_owned(),
            expected,
            found: args.len(),
        })
    }
}

fn type_error<T>(expected: &'static str, found: &Value) -> Result<T, HostError> {
    Err(HostError::Type {
        expected,
        found: found.type_name(),
    })
}

fn text(v: &Value) -> Result<String, HostError> {
    v.as_text()
        .map_or_else(|| type_error("string", v), Ok)
}

fn list(v: &Value) -> Result<Rc<Vec<Value>>, HostError> {
    match v {
        Value::List(items) => Ok(items.clone()),
        other => type_error("list", other),
    }
}

fn int(v: &Value) -> Result<i64, HostError> {
    match v {
        Value::Int(n) => Ok(*n),
        other => type_error("int", other),
    }
}

fn one_char(v: &Value) -> Result<char, HostError> {
    v.as_char().map_or_else(|| type_error("char", v), Ok)
}

fn join(args: Vec<Value>) -> Result<Value, HostError> {
    arity("join", &args, 1)?;
    let mut s = String::new();
    for item in list(&args[0])?.iter() {
        s.push_str(&text(item)?);
    }
    Ok(Value::str(&s))
}

fn parse_int(args: Vec<Value>) -> Result<Value, HostError> {
    let radix = match args.len() {
        1 => 10,
        2 => int(&args[1])?,
        n => {
            return Err(HostError::Arity {
                function: "int".to_owned(),
                expected: 2,
                found: n,
            })
        }
    };
    if !(2..=36).contains(&radix) {
        return Err(HostError::Custom(format!("invalid radix {}", radix)));
    }
    let digits = text(&args[0])?;
    ometa_grammar::lexical::parse_radix(&digits, radix as u32)
        .map(Value::Int)
        .map_err(HostError::Syntax)
}

fn len(args: Vec<Value>) -> Result<Value, HostError> {
    arity("len", &args, 1)?;
    let n = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        other => return type_error("list or string", other),
    };
    Ok(Value::Int(n as i64))
}

fn syntax_error(args: Vec<Value>) -> Result<Value, HostError> {
    arity("syntax_error", &args, 1)?;
    let name = text(&args[0])?;
    match SyntaxErrorKind::from_name(&name) {
        Some(kind) => Err(HostError::Syntax(kind)),
        None => Err(HostError::Custom(format!("unknown syntax error '{}'", name))),
    }
}

fn unknown_node(args: Vec<Value>) -> Result<Value, HostError> {
    arity("unknown_node", &args, 1)?;
    let tag = match &args[0] {
        Value::Node(node) => node.kind().tag().to_owned(),
        other => other.type_name().to_owned(),
    };
    Err(HostError::UnknownNode(tag))
}

impl Bindings {
    pub fn new() -> Self {
        Bindings::default()
    }

    /// `join`, `int`, `len`, `syntax_error` and `unknown_node`.
    pub fn prelude() -> Self {
        Bindings::new()
            .function("join", join)
            .function("int", parse_int)
            .function("len", len)
            .function("syntax_error", syntax_error)
            .function("unknown_node", unknown_node)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn set_value(mut self, name: &str, value: Value) -> Self {
        self.values.insert(name.to_owned(), value);
        self
    }

    pub fn function<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, HostError> + 'static,
    {
        self.functions.insert(name.to_owned(), Rc::new(f));
        self
    }

    pub fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, HostError> {
        match self.functions.get(name) {
            Some(f) => f(args),
            None => Err(HostError::UnknownFunction(name.to_owned())),
        }
    }

    /// Expose every method of `builder` as a function of the same name.
    pub fn builder<B>(self, builder: B) -> Self
    where
        B: Builder + 'static,
        B::Output: HostNode,
    {
        let b = Rc::new(builder);
        let mut bindings = self;

        macro_rules! unary {
            ($($name:ident),*) => {
                $(
                    let bb = b.clone();
                    bindings = bindings.function(stringify!($name), move |args| {
                        arity(stringify!($name), &args, 1)?;
                        let e = output::<B>(&args[0])?;
                        Ok(bb.$name(e)?.into_value())
                    });
                )*
            };
        }
        macro_rules! nary {
            ($($name:ident),*) => {
                $(
                    let bb = b.clone();
                    bindings = bindings.function(stringify!($name), move |args| {
                        arity(stringify!($name), &args, 1)?;
                        let es = outputs::<B>(&args[0])?;
                        Ok(bb.$name(es)?.into_value())
                    });
                )*
            };
        }
        macro_rules! code {
            ($($name:ident),*) => {
                $(
                    let bb = b.clone();
                    bindings = bindings.function(stringify!($name), move |args| {
                        arity(stringify!($name), &args, 1)?;
                        Ok(bb.$name(&text(&args[0])?)?.into_value())
                    });
                )*
            };
        }

        unary!(many, many1, optional, not_, lookahead, list_pattern, consumed_by, index_consumed_by);
        nary!(or_, xor, sequence);
        code!(match_string, predicate, action);

        let bb = b.clone();
        bindings = bindings.function("apply", move |args| {
            arity("apply", &args, 3)?;
            let rule = text(&args[0])?;
            let context = text(&args[1])?;
            Ok(bb.apply(&rule, &context, outputs::<B>(&args[2])?)?.into_value())
        });

        let bb = b.clone();
        bindings = bindings.function("exactly", move |args| {
            arity("exactly", &args, 1)?;
            let lit = match &args[0] {
                Value::Int(n) => Literal::Int(*n),
                other => Literal::Str(text(other)?),
            };
            Ok(bb.exactly(lit)?.into_value())
        });

        let bb = b.clone();
        bindings = bindings.function("bind", move |args| {
            arity("bind", &args, 2)?;
            let name = text(&args[0])?;
            Ok(bb.bind(&name, output::<B>(&args[1])?)?.into_value())
        });

        let bb = b.clone();
        bindings = bindings.function("range", move |args| {
            arity("range", &args, 2)?;
            let (low, high) = (one_char(&args[0])?, one_char(&args[1])?);
            Ok(bb.range(low, high)?.into_value())
        });

        let bb = b.clone();
        bindings = bindings.function("interleave", move |args| {
            arity("interleave", &args, 1)?;
            let parts = list(&args[0])?
                .iter()
                .map(interleave_part::<B>)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(bb.interleave(parts)?.into_value())
        });

        let bb = b.clone();
        bindings = bindings.function("rule", move |args| {
            arity("rule", &args, 2)?;
            let name = text(&args[0])?;
            Ok(bb.rule(&name, output::<B>(&args[1])?)?.into_value())
        });

        bindings.function("make_grammar", move |args| {
            arity("make_grammar", &args, 2)?;
            let name = text(&args[0])?;
            Ok(b.make_grammar(&name, outputs::<B>(&args[1])?)?.into_value())
        })
    }
}

fn output<B>(v: &Value) -> Result<B::Output, HostError>
where
    B: Builder,
    B::Output: HostNode,
{
    B::Output::from_value(v).map_or_else(|| type_error("node", v), Ok)
}

fn outputs<B>(v: &Value) -> Result<Vec<B::Output>, HostError>
where
    B: Builder,
    B::Output: HostNode,
{
    list(v)?.iter().map(output::<B>).collect()
}

/// `[mode, expr, name]` with mode one of `"1" "*" "+" "?"` and name a string
/// or `None`.
fn interleave_part<B>(v: &Value) -> Result<InterleavePart<B::Output>, HostError>
where
    B: Builder,
    B::Output: HostNode,
{
    let fields = list(v)?;
    arity("interleave part", &fields, 3)?;
    let symbol = text(&fields[0])?;
    let mode = Mode::from_symbol(&symbol)
        .ok_or_else(|| HostError::Custom(format!("unknown interleave mode '{}'", symbol)))?;
    let name = match &fields[2] {
        Value::None => None,
        other => Some(text(other)?),
    };
    Ok(InterleavePart::new(mode, output::<B>(&fields[1])?, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ometa_grammar::{Node, TreeBuilder};

    #[test]
    fn builder_functions() {
        let bindings = Bindings::prelude().builder(TreeBuilder::new());
        let a = bindings
            .call(
                "apply",
                vec![Value::str("a"), Value::str("r"), Value::list(vec![])],
            )
            .unwrap();
        let many = bindings.call("many", vec![a.clone()]).unwrap();
        let part = Value::list(vec![Value::str("*"), a.clone(), Value::str("xs")]);
        let inter = bindings
            .call("interleave", vec![Value::list(vec![part])])
            .unwrap();

        let app = Node::Apply {
            rule: "a".to_owned(),
            context: "r".to_owned(),
            args: vec![],
        };
        assert_eq!(many, Value::node(Node::Many(Box::new(app.clone()))));
        assert_eq!(
            inter,
            Value::node(Node::Interleave(vec![InterleavePart::new(
                Mode::ZeroOrMore,
                app,
                Some("xs".to_owned())
            )]))
        );
    }

    #[test]
    fn builder_errors_surface() {
        let bindings = Bindings::prelude().builder(TreeBuilder::new());
        let tests = vec![
            (
                "range",
                vec![Value::Char('z'), Value::Char('a')],
                HostError::Build(ometa_grammar::BuildError::InvalidRange {
                    low: 'z',
                    high: 'a',
                }),
            ),
            (
                "many",
                vec![Value::Int(1)],
                HostError::Type {
                    expected: "node",
                    found: "int",
                },
            ),
            (
                "bind",
                vec![Value::str("x")],
                HostError::Arity {
                    function: "bind".to_owned(),
                    expected: 2,
                    found: 1,
                },
            ),
            (
                "syntax_error",
                vec![Value::str("unmatched_bracket")],
                HostError::Syntax(SyntaxErrorKind::UnmatchedBracket),
            ),
            (
                "unknown_node",
                vec![Value::node(Node::Range('a', 'b'))],
                HostError::UnknownNode("Range".to_owned()),
            ),
        ];

        for (name, args, err) in tests {
            assert_eq!(bindings.call(name, args), Err(err), "function: {}", name);
        }
    }
}
