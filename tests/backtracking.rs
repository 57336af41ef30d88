//! Fragments built on abandoned branches must not survive a compilation.

use std::cell::Cell;
use std::rc::Rc;

use ometa_grammar::{BuildError, Builder, InterleavePart, Literal, Node, TreeBuilder};
use ometa_runtime::{HostNode, HostValue, Value};

struct Tracked {
    node: Node,
    _children: Vec<Counted>,
    live: Rc<Cell<usize>>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

#[derive(Clone)]
struct Counted(Rc<Tracked>);

impl HostNode for Counted {
    fn into_value(self) -> Value {
        Value::Host(HostValue::new(self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Host(host) => host.downcast_ref::<Counted>().cloned(),
            _ => None,
        }
    }
}

/// Builds trees while counting how many nodes are alive.
#[derive(Clone, Default)]
struct CountingBuilder {
    live: Rc<Cell<usize>>,
}

impl CountingBuilder {
    fn track(&self, node: Result<Node, BuildError>, children: Vec<Counted>) -> Result<Counted, BuildError> {
        let node = node?;
        self.live.set(self.live.get() + 1);
        Ok(Counted(Rc::new(Tracked {
            node,
            _children: children,
            live: self.live.clone(),
        })))
    }

    fn unary<F>(&self, expr: Counted, f: F) -> Result<Counted, BuildError>
    where
        F: FnOnce(Node) -> Result<Node, BuildError>,
    {
        let node = f(expr.0.node.clone());
        self.track(node, vec![expr])
    }

    fn nary<F>(&self, mut exprs: Vec<Counted>, f: F) -> Result<Counted, BuildError>
    where
        F: FnOnce(Vec<Node>) -> Result<Node, BuildError>,
    {
        if exprs.len() == 1 {
            return Ok(exprs.remove(0));
        }
        let node = f(nodes(&exprs));
        self.track(node, exprs)
    }
}

fn nodes(exprs: &[Counted]) -> Vec<Node> {
    exprs.iter().map(|e| e.0.node.clone()).collect()
}

const T: TreeBuilder = TreeBuilder;

impl Builder for CountingBuilder {
    type Output = Counted;

    fn apply(&self, rule: &str, context: &str, args: Vec<Counted>) -> Result<Counted, BuildError> {
        let node = T.apply(rule, context, nodes(&args));
        self.track(node, args)
    }

    fn exactly(&self, literal: Literal) -> Result<Counted, BuildError> {
        self.track(T.exactly(literal), vec![])
    }

    fn match_string(&self, s: &str) -> Result<Counted, BuildError> {
        self.track(T.match_string(s), vec![])
    }

    fn many(&self, expr: Counted) -> Result<Counted, BuildError> {
        self.unary(expr, |e| T.many(e))
    }

    fn many1(&self, expr: Counted) -> Result<Counted, BuildError> {
        self.unary(expr, |e| T.many1(e))
    }

    fn optional(&self, expr: Counted) -> Result<Counted, BuildError> {
        self.unary(expr, |e| T.optional(e))
    }

    fn or_(&self, exprs: Vec<Counted>) -> Result<Counted, BuildError> {
        self.nary(exprs, |es| T.or_(es))
    }

    fn xor(&self, exprs: Vec<Counted>) -> Result<Counted, BuildError> {
        self.nary(exprs, |es| T.xor(es))
    }

    fn sequence(&self, exprs: Vec<Counted>) -> Result<Counted, BuildError> {
        self.nary(exprs, |es| T.sequence(es))
    }

    fn not_(&self, expr: Counted) -> Result<Counted, BuildError> {
        self.unary(expr, |e| T.not_(e))
    }

    fn lookahead(&self, expr: Counted) -> Result<Counted, BuildError> {
        self.unary(expr, |e| T.lookahead(e))
    }

    fn bind(&self, name: &str, expr: Counted) -> Result<Counted, BuildError> {
        self.unary(expr, |e| T.bind(name, e))
    }

    fn predicate(&self, code: &str) -> Result<Counted, BuildError> {
        self.track(T.predicate(code), vec![])
    }

    fn action(&self, code: &str) -> Result<Counted, BuildError> {
        self.track(T.action(code), vec![])
    }

    fn list_pattern(&self, expr: Counted) -> Result<Counted, BuildError> {
        self.unary(expr, |e| T.list_pattern(e))
    }

    fn consumed_by(&self, expr: Counted) -> Result<Counted, BuildError> {
        self.unary(expr, |e| T.consumed_by(e))
    }

    fn index_consumed_by(&self, expr: Counted) -> Result<Counted, BuildError> {
        self.unary(expr, |e| T.index_consumed_by(e))
    }

    fn range(&self, low: char, high: char) -> Result<Counted, BuildError> {
        self.track(T.range(low, high), vec![])
    }

    fn interleave(&self, parts: Vec<InterleavePart<Counted>>) -> Result<Counted, BuildError> {
        let node = T.interleave(
            parts
                .iter()
                .map(|p| InterleavePart::new(p.mode, p.expr.0.node.clone(), p.name.clone()))
                .collect(),
        );
        self.track(node, parts.into_iter().map(|p| p.expr).collect())
    }

    fn rule(&self, name: &str, body: Counted) -> Result<Counted, BuildError> {
        self.unary(body, |b| T.rule(name, b))
    }

    fn make_grammar(&self, name: &str, rules: Vec<Counted>) -> Result<Counted, BuildError> {
        let node = T.make_grammar(name, nodes(&rules));
        self.track(node, rules)
    }
}

struct TestCase {
    input: &'static str,
}

#[test]
fn abandoned_fragments_are_dropped() {
    let tests = vec![
        TestCase {
            input: "r = a b | a c\n",
        },
        TestCase {
            input: "r = (x | y)* && z:q\nr = 'a'..'z' | 'a' \"abc\"\n",
        },
        TestCase {
            input: "expr = expr:l '+' num:r -> l + r\n     | num\nnum = <digit+>:ds -> int(ds, 10)\n",
        },
        TestCase {
            input: "r :x = ~~x [:y @<z>] ?(y > 1) !(y) -> [x, y]\n",
        },
    ];

    for t in tests {
        let builder = CountingBuilder::default();
        let live = builder.live.clone();
        let out = ometa::compile_with(t.input, "G", builder).unwrap();

        let expected = ometa::compile(t.input, "G").unwrap();
        assert_eq!(out.0.node, expected, "input: {:?}", t.input);
        assert_eq!(live.get(), expected.node_count(), "input: {:?}", t.input);

        drop(out);
        assert_eq!(live.get(), 0, "input: {:?}", t.input);
    }
}

#[test]
fn interleave_parts_do_not_depend_on_the_builder() {
    use ometa_grammar::Mode;

    let input = "r = a* && b+ && c? && d:y && :z && (e f) && g h\n";
    let out = ometa::compile_with(input, "G", CountingBuilder::default()).unwrap();
    let parts = match out.0.node.rule("r") {
        Some(Node::Rule { body, .. }) => match &**body {
            Node::Interleave(parts) => parts.clone(),
            other => panic!("not an interleave: {}", other),
        },
        other => panic!("missing rule: {:?}", other),
    };

    let modes: Vec<(Mode, Option<&str>)> = parts.iter().map(|p| (p.mode, p.name.as_deref())).collect();
    assert_eq!(
        modes,
        vec![
            (Mode::ZeroOrMore, None),
            (Mode::OneOrMore, None),
            (Mode::Optional, None),
            (Mode::One, Some("y")),
            (Mode::One, Some("z")),
            (Mode::One, None),
            (Mode::One, None),
        ]
    );
    assert_eq!(out.0.node, ometa::compile(input, "G").unwrap());
}

#[test]
fn failed_compilations_leave_nothing() {
    for input in &["r = a | (b", "r = a\ns = 'z'..'a'", "r = a:x a:x"] {
        let builder = CountingBuilder::default();
        let live = builder.live.clone();
        assert!(ometa::compile_with(input, "G", builder).is_err(), "input: {:?}", input);
        assert_eq!(live.get(), 0, "input: {:?}", input);
    }
}
