//! Hand-written parser for grammar text.
//!
//! Every method mirrors the rule of the same name in
//! `grammars/metagrammar.ometa` and calls the builder in the same order, so
//! that the tree it produces for the metagrammar is the tree the metagrammar
//! produces for itself. It only exists to get the first generation going.

use std::cell::Cell;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{anychar, char, digit0, digit1, one_of},
    combinator::{eof, not, opt, recognize, verify},
    error::{ErrorKind, ParseError},
    multi::{many0, many1},
    sequence::pair,
    IResult,
};

use crate::builder::Builder;
use crate::error::{BuildError, Error, SyntaxError, SyntaxErrorKind};
use crate::lexical;
use crate::node::{InterleavePart, Literal, Mode};

#[derive(Debug, PartialEq)]
enum SeedErrorKind {
    Nom(ErrorKind),
    Syntax(SyntaxErrorKind),
    Build(BuildError),
}

#[derive(Debug, PartialEq)]
struct SeedError<'a> {
    input: &'a str,
    kind: SeedErrorKind,
}

impl<'a> ParseError<&'a str> for SeedError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        SeedError {
            input,
            kind: SeedErrorKind::Nom(kind),
        }
    }

    fn append(_: &'a str, _: ErrorKind, other: Self) -> Self {
        other
    }
}

type PResult<'a, T> = IResult<&'a str, T, SeedError<'a>>;

/// Abort the whole parse with a syntax error at `input`.
fn failure<'a, T>(input: &'a str, kind: SyntaxErrorKind) -> PResult<'a, T> {
    Err(nom::Err::Failure(SeedError {
        input,
        kind: SeedErrorKind::Syntax(kind),
    }))
}

fn built<'a, T>(input: &'a str, result: Result<T, BuildError>) -> PResult<'a, T> {
    match result {
        Ok(v) => Ok((input, v)),
        Err(e) => Err(nom::Err::Failure(SeedError {
            input,
            kind: SeedErrorKind::Build(e),
        })),
    }
}

/// Turn a recoverable failure into `None`, pass aborts through.
fn attempt<'a, T>(
    result: PResult<'a, T>,
) -> Result<Option<(&'a str, T)>, nom::Err<SeedError<'a>>> {
    match result {
        Ok(ok) => Ok(Some(ok)),
        Err(nom::Err::Error(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn spaces(input: &str) -> PResult<&str> {
    take_while(|c: char| c.is_whitespace())(input)
}

fn hspace(input: &str) -> PResult<char> {
    verify(anychar, |c: &char| lexical::is_hspace(*c))(input)
}

fn vspace(input: &str) -> PResult<&str> {
    alt((tag("\r\n"), tag("\r"), tag("\n")))(input)
}

fn emptyline(input: &str) -> PResult<&str> {
    recognize(pair(many0(hspace), vspace))(input)
}

fn indentation(input: &str) -> PResult<&str> {
    recognize(pair(many0(emptyline), many1(hspace)))(input)
}

fn noindentation(input: &str) -> PResult<()> {
    let (input, _) = many0(emptyline)(input)?;
    not(hspace)(input)
}

fn escaped_char(input: &str) -> PResult<char> {
    let (rest, _) = char('\\')(input)?;
    match rest.chars().next() {
        Some(e) => match lexical::decode_escape(e) {
            Some(c) => Ok((&rest[e.len_utf8()..], c)),
            None => failure(rest, SyntaxErrorKind::InvalidEscape),
        },
        None => failure(rest, SyntaxErrorKind::InvalidEscape),
    }
}

fn quoted_char(input: &str, quote: char) -> PResult<char> {
    alt((escaped_char, verify(anychar, move |c: &char| *c != quote)))(input)
}

/// Host code up to one of `end_chars`, trimmed.
fn host_expr<'a>(input: &'a str, end_chars: &str) -> PResult<'a, &'a str> {
    match lexical::scan_host_expr(input.chars(), end_chars) {
        Ok(n) => {
            let split = input
                .char_indices()
                .nth(n)
                .map(|(i, _)| i)
                .unwrap_or_else(|| input.len());
            Ok((&input[split..], input[..split].trim()))
        }
        Err(kind) => failure(input, kind),
    }
}

/// A postfixed and possibly bound expression, kept apart until its use is
/// known so interleave parts can be classified without inspecting output.
struct Term<O> {
    base: O,
    postfix: Option<Mode>,
    name: Option<String>,
}

struct Seed<'b, B> {
    builder: &'b B,
    /// Shortest remaining input seen at a recoverable failure.
    furthest: Cell<usize>,
}

impl<'b, B: Builder> Seed<'b, B> {
    fn mark(&self, input: &str) {
        if input.len() < self.furthest.get() {
            self.furthest.set(input.len());
        }
    }

    fn fail<'a, T>(&self, input: &'a str) -> PResult<'a, T> {
        self.mark(input);
        Err(nom::Err::Error(SeedError::from_error_kind(
            input,
            ErrorKind::Verify,
        )))
    }

    fn lit<'a>(&self, input: &'a str, s: &str) -> PResult<'a, &'a str> {
        let result = tag(s)(input);
        if result.is_err() {
            self.mark(input);
        }
        result
    }

    fn token<'a>(&self, input: &'a str, s: &str) -> PResult<'a, &'a str> {
        let (input, _) = spaces(input)?;
        self.lit(input, s)
    }

    fn name<'a>(&self, input: &'a str) -> PResult<'a, &'a str> {
        let result = recognize(pair(
            verify(anychar, |c: &char| lexical::is_name_start(*c)),
            take_while(lexical::is_name_char),
        ))(input);
        if result.is_err() {
            self.mark(input);
        }
        result
    }

    fn number<'a>(&self, input: &'a str) -> PResult<'a, B::Output> {
        let (input, _) = spaces(input)?;
        let (rest, minus) = opt(char('-'))(input)?;
        let (rest, n) = self.barenumber(rest)?;
        let n = if minus.is_some() { -n } else { n };
        built(rest, self.builder.exactly(Literal::Int(n)))
    }

    fn barenumber<'a>(&self, input: &'a str) -> PResult<'a, i64> {
        let hex: PResult<'a, (char, char)> = pair(char('0'), one_of("xX"))(input);
        if let Ok((rest, _)) = hex {
            let digits: PResult<'a, &str> = take_while1(|c: char| c.is_ascii_hexdigit())(rest);
            return match digits {
                Ok((rest, hs)) => self.int(rest, hs, 16),
                Err(_) => failure(rest, SyntaxErrorKind::InvalidNumber),
            };
        }
        let octal: PResult<'a, &str> = recognize(pair(char('0'), digit0))(input);
        if let Ok((rest, ds)) = octal {
            return self.int(rest, ds, 8);
        }
        let decimal: PResult<'a, &str> = digit1(input);
        match decimal {
            Ok((rest, ds)) => self.int(rest, ds, 10),
            Err(e) => {
                self.mark(input);
                Err(e)
            }
        }
    }

    fn int<'a>(&self, rest: &'a str, digits: &str, radix: u32) -> PResult<'a, i64> {
        match lexical::parse_radix(digits, radix) {
            Ok(n) => Ok((rest, n)),
            Err(kind) => failure(rest, kind),
        }
    }

    fn character<'a>(&self, input: &'a str) -> PResult<'a, B::Output> {
        let (rest, _) = self.token(input, "'")?;
        let (rest, cs) = many0(|i| quoted_char(i, '\''))(rest)?;
        match self.lit(rest, "'") {
            Ok((rest, _)) => {
                let s: String = cs.into_iter().collect();
                built(rest, self.builder.exactly(Literal::Str(s)))
            }
            Err(_) => failure(rest, SyntaxErrorKind::UnterminatedChar),
        }
    }

    fn character2<'a>(&self, input: &'a str) -> PResult<'a, char> {
        let (rest, _) = self.token(input, "'")?;
        let (rest, c) = quoted_char(rest, '\'')?;
        let (rest, _) = self.lit(rest, "'")?;
        Ok((rest, c))
    }

    fn range<'a>(&self, input: &'a str) -> PResult<'a, B::Output> {
        let (rest, low) = self.character2(input)?;
        let (rest, _) = self.token(rest, "..")?;
        let (rest, high) = self.character2(rest)?;
        built(rest, self.builder.range(low, high))
    }

    fn string<'a>(&self, input: &'a str) -> PResult<'a, B::Output> {
        let (rest, _) = self.token(input, "\"")?;
        let (rest, cs) = many0(|i| quoted_char(i, '"'))(rest)?;
        match self.lit(rest, "\"") {
            Ok((rest, _)) => {
                let s: String = cs.into_iter().collect();
                built(rest, self.builder.match_string(&s))
            }
            Err(_) => failure(rest, SyntaxErrorKind::UnterminatedString),
        }
    }

    fn application<'a>(&self, input: &'a str, r: &str) -> PResult<'a, B::Output> {
        let (rest, _) = opt(indentation)(input)?;
        let (rest, name) = self.name(rest)?;
        if let Ok((rest, _)) = self.lit(rest, "(") {
            let (rest, args) = self.application_args(rest)?;
            return built(rest, self.builder.apply(name, r, args));
        }
        built(rest, self.builder.apply(name, r, Vec::new()))
    }

    fn application_args<'a>(&self, input: &'a str) -> PResult<'a, Vec<B::Output>> {
        if let Ok((rest, _)) = self.token(input, ")") {
            return Ok((rest, Vec::new()));
        }
        let (mut rest, first) = self.host_arg(input)?;
        let mut args = vec![first];
        while let Ok((after, _)) = self.lit(rest, ",") {
            let (after, arg) = self.host_arg(after)?;
            args.push(arg);
            rest = after;
        }
        match self.lit(rest, ")") {
            Ok((rest, _)) => Ok((rest, args)),
            Err(_) => failure(rest, SyntaxErrorKind::UnmatchedBracket),
        }
    }

    fn host_arg<'a>(&self, input: &'a str) -> PResult<'a, B::Output> {
        let (rest, code) = host_expr(input, ",)")?;
        built(rest, self.builder.action(code))
    }

    fn rule_value<'a>(&self, input: &'a str) -> PResult<'a, B::Output> {
        let (rest, _) = self.token(input, "->")?;
        let (rest, code) = host_expr(rest, "\r\n)]|")?;
        built(rest, self.builder.action(code))
    }

    fn semantic_predicate<'a>(&self, input: &'a str) -> PResult<'a, B::Output> {
        let (rest, _) = self.token(input, "?(")?;
        let (rest, code) = host_expr(rest, ")")?;
        match self.lit(rest, ")") {
            Ok((rest, _)) => built(rest, self.builder.predicate(code)),
            Err(_) => failure(rest, SyntaxErrorKind::UnmatchedBracket),
        }
    }

    fn semantic_action<'a>(&self, input: &'a str) -> PResult<'a, B::Output> {
        let (rest, _) = self.token(input, "!(")?;
        let (rest, code) = host_expr(rest, ")")?;
        match self.lit(rest, ")") {
            Ok((rest, _)) => built(rest, self.builder.action(code)),
            Err(_) => failure(rest, SyntaxErrorKind::UnmatchedBracket),
        }
    }

    /// `open expr close`, where a missing `close` is fatal.
    fn group<'a>(
        &self,
        input: &'a str,
        r: &str,
        open: &str,
        close: &str,
    ) -> PResult<'a, B::Output> {
        let (rest, _) = self.token(input, open)?;
        let (rest, e) = self.expr(rest, r)?;
        match self.token(rest, close) {
            Ok((rest, _)) => Ok((rest, e)),
            Err(_) => failure(rest, SyntaxErrorKind::UnmatchedBracket),
        }
    }

    fn expr1<'a>(&self, input: &'a str, r: &str) -> PResult<'a, B::Output> {
        alt((
            |i: &'a str| self.application(i, r),
            |i: &'a str| self.rule_value(i),
            |i: &'a str| self.semantic_predicate(i),
            |i: &'a str| self.semantic_action(i),
            |i: &'a str| self.number(i),
            |i: &'a str| self.range(i),
            |i: &'a str| self.character(i),
            |i: &'a str| self.string(i),
            |i: &'a str| self.group(i, r, "(", ")"),
            |i: &'a str| {
                let (rest, e) = self.group(i, r, "[", "]")?;
                built(rest, self.builder.list_pattern(e))
            },
            |i: &'a str| {
                let (rest, e) = self.group(i, r, "<", ">")?;
                built(rest, self.builder.consumed_by(e))
            },
            |i: &'a str| {
                let (rest, e) = self.group(i, r, "@<", ">")?;
                built(rest, self.builder.index_consumed_by(e))
            },
        ))(input)
    }

    fn expr2<'a>(&self, input: &'a str, r: &str) -> PResult<'a, B::Output> {
        if let Ok((rest, _)) = self.token(input, "~") {
            if let Ok((after, _)) = self.token(rest, "~") {
                if let Some((after, e)) = attempt(self.expr2(after, r))? {
                    return built(after, self.builder.lookahead(e));
                }
            }
            if let Some((after, e)) = attempt(self.expr2(rest, r))? {
                return built(after, self.builder.not_(e));
            }
        }
        self.expr1(input, r)
    }

    fn expr3<'a>(&self, input: &'a str, r: &str) -> PResult<'a, Term<B::Output>> {
        if let Some((rest, base)) = attempt(self.expr2(input, r))? {
            let postfix = match rest.chars().next() {
                Some('*') => Some(Mode::ZeroOrMore),
                Some('+') => Some(Mode::OneOrMore),
                Some('?') => Some(Mode::Optional),
                _ => None,
            };
            let rest = if postfix.is_some() { &rest[1..] } else { rest };
            let (rest, name) = match self.lit(rest, ":") {
                Ok((after, _)) => match attempt(self.name(after))? {
                    Some((after, n)) => (after, Some(n.to_owned())),
                    None => (rest, None),
                },
                Err(_) => (rest, None),
            };
            return Ok((
                rest,
                Term {
                    base,
                    postfix,
                    name,
                },
            ));
        }
        let (rest, _) = self.token(input, ":")?;
        match attempt(self.name(rest))? {
            Some((rest, n)) => {
                let (rest, base) = built(rest, self.builder.apply("anything", r, Vec::new()))?;
                Ok((
                    rest,
                    Term {
                        base,
                        postfix: None,
                        name: Some(n.to_owned()),
                    },
                ))
            }
            None => failure(rest, SyntaxErrorKind::NameExpected),
        }
    }

    fn build_term<'a>(&self, input: &'a str, term: Term<B::Output>) -> PResult<'a, B::Output> {
        let b = self.builder;
        let (input, x) = match term.postfix {
            Some(Mode::ZeroOrMore) => built(input, b.many(term.base))?,
            Some(Mode::OneOrMore) => built(input, b.many1(term.base))?,
            Some(Mode::Optional) => built(input, b.optional(term.base))?,
            Some(Mode::One) | None => (input, term.base),
        };
        match term.name {
            Some(n) => built(input, b.bind(&n, x)),
            None => Ok((input, x)),
        }
    }

    fn expr4<'a>(&self, input: &'a str, ne: bool, r: &str) -> PResult<'a, Vec<Term<B::Output>>> {
        if ne {
            many1(|i: &'a str| self.expr3(i, r))(input)
        } else {
            many0(|i: &'a str| self.expr3(i, r))(input)
        }
    }

    fn sequence<'a>(&self, input: &'a str, terms: Vec<Term<B::Output>>) -> PResult<'a, B::Output> {
        let mut es = Vec::with_capacity(terms.len());
        for t in terms {
            let (_, e) = self.build_term(input, t)?;
            es.push(e);
        }
        built(input, self.builder.sequence(es))
    }

    fn expr5<'a>(&self, input: &'a str, ne: bool, r: &str) -> PResult<'a, B::Output> {
        if let Some((mut rest, first)) = attempt(self.interleave_part(input, r))? {
            let mut parts = vec![first];
            loop {
                let next = match self.token(rest, "&&") {
                    Ok((after, _)) => attempt(self.interleave_part(after, r))?,
                    Err(_) => None,
                };
                match next {
                    Some((after, part)) => {
                        parts.push(part);
                        rest = after;
                    }
                    None => break,
                }
            }
            if parts.len() > 1 {
                return built(rest, self.builder.interleave(parts));
            }
        }
        let (rest, terms) = self.expr4(input, ne, r)?;
        self.sequence(rest, terms)
    }

    fn interleave_part<'a>(&self, input: &'a str, r: &str) -> PResult<'a, InterleavePart<B::Output>> {
        if let Ok((rest, _)) = self.token(input, "(") {
            if let Some((rest, terms)) = attempt(self.expr4(rest, true, r))? {
                let (rest, e) = self.sequence(rest, terms)?;
                if let Ok((rest, _)) = self.token(rest, ")") {
                    return Ok((rest, InterleavePart::new(Mode::One, e, None)));
                }
            }
        }
        let (rest, mut terms) = self.expr4(input, true, r)?;
        if terms.len() == 1 {
            let t = terms.remove(0);
            let mode = t.postfix.unwrap_or(Mode::One);
            return Ok((rest, InterleavePart::new(mode, t.base, t.name)));
        }
        let (rest, e) = self.sequence(rest, terms)?;
        Ok((rest, InterleavePart::new(Mode::One, e, None)))
    }

    fn alternatives<'a>(&self, input: &'a str, sep: &str, r: &str) -> PResult<'a, Vec<B::Output>> {
        many0(|i: &'a str| {
            let (i, _) = self.token(i, sep)?;
            self.expr5(i, true, r)
        })(input)
    }

    fn expr<'a>(&self, input: &'a str, r: &str) -> PResult<'a, B::Output> {
        if let Some((rest, e)) = attempt(self.expr5(input, true, r))? {
            let (after, es) = self.alternatives(rest, "|", r)?;
            if !es.is_empty() {
                let mut all = vec![e];
                all.extend(es);
                return built(after, self.builder.or_(all));
            }
            let (after, es) = self.alternatives(rest, "||", r)?;
            if !es.is_empty() {
                let mut all = vec![e];
                all.extend(es);
                return built(after, self.builder.xor(all));
            }
            return Ok((rest, e));
        }
        self.expr5(input, false, r)
    }

    fn rule_part<'a>(&self, input: &'a str, required: &str) -> PResult<'a, B::Output> {
        let (rest, _) = noindentation(input)?;
        let (rest, n) = self.name(rest)?;
        if n != required {
            return self.fail(rest);
        }
        if let Ok((rest, _)) = self.token(rest, "=") {
            return self.expr(rest, n);
        }
        let (rest, args) = self.expr5(rest, false, n)?;
        if let Ok((rest, _)) = self.token(rest, "=") {
            let (rest, e) = self.expr(rest, n)?;
            return built(rest, self.builder.sequence(vec![args, e]));
        }
        Ok((rest, args))
    }

    fn rule<'a>(&self, input: &'a str) -> PResult<'a, B::Output> {
        let (rest, _) = noindentation(input)?;
        let (_, n) = self.name(rest)?;
        let (mut rest, first) = self.rule_part(rest, n)?;
        let mut clauses = vec![first];
        while let Some((after, clause)) = attempt(self.rule_part(rest, n))? {
            clauses.push(clause);
            rest = after;
        }
        if clauses.len() == 1 {
            let body = clauses.remove(0);
            return built(rest, self.builder.rule(n, body));
        }
        let (rest, body) = built(rest, self.builder.or_(clauses))?;
        built(rest, self.builder.rule(n, body))
    }

    fn grammar<'a>(&self, input: &'a str, name: &str) -> PResult<'a, B::Output> {
        let (rest, rules) = many0(|i: &'a str| self.rule(i))(input)?;
        let (rest, _) = spaces(rest)?;
        let end: PResult<'a, &str> = eof(rest);
        if let Err(e) = end {
            self.mark(rest);
            return Err(e);
        }
        built(rest, self.builder.make_grammar(name, rules))
    }
}

fn position(text: &str, rest: &str) -> usize {
    let byte = text.len() - rest.len();
    text[..byte].chars().count()
}

/// Parse grammar text into a `Grammar` built by `builder`.
pub fn parse_grammar<B: Builder>(text: &str, name: &str, builder: &B) -> Result<B::Output, Error> {
    log::debug!("seed parsing grammar {} ({} bytes)", name, text.len());
    let seed = Seed {
        builder,
        furthest: Cell::new(text.len()),
    };
    let err = match seed.grammar(text, name) {
        Ok((_, grammar)) => return Ok(grammar),
        Err(err) => err,
    };
    let furthest = &text[text.len() - seed.furthest.get()..];
    let unexpected = SyntaxError::at(SyntaxErrorKind::Unexpected, text, position(text, furthest));
    let err = match err {
        nom::Err::Failure(SeedError { input, kind }) => match kind {
            SeedErrorKind::Syntax(kind) => {
                Error::Syntax(SyntaxError::at(kind, text, position(text, input)))
            }
            SeedErrorKind::Build(BuildError::InvalidRange { .. }) => Error::Syntax(
                SyntaxError::at(SyntaxErrorKind::InvalidRange, text, position(text, input)),
            ),
            SeedErrorKind::Build(e) => Error::Build(e),
            SeedErrorKind::Nom(_) => Error::Syntax(unexpected),
        },
        nom::Err::Error(_) | nom::Err::Incomplete(_) => Error::Syntax(unexpected),
    };
    log::debug!("seed parse of {} failed: {}", name, err);
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TreeBuilder;
    use crate::node::Node;

    fn app(rule: &str, context: &str) -> Node {
        Node::Apply {
            rule: rule.to_owned(),
            context: context.to_owned(),
            args: Vec::new(),
        }
    }

    fn rule(name: &str, body: Node) -> Node {
        Node::Rule {
            name: name.to_owned(),
            body: Box::new(body),
        }
    }

    fn grammar(rules: Vec<Node>) -> Node {
        Node::Grammar {
            name: "G".to_owned(),
            rules,
        }
    }

    fn bind(name: &str, expr: Node) -> Node {
        Node::Bind {
            name: name.to_owned(),
            expr: Box::new(expr),
        }
    }

    struct TestCase {
        input: &'static str,
        out: Result<Node, Error>,
    }

    fn assert_test_cases(tests: Vec<TestCase>) {
        let b = TreeBuilder::new();
        for t in tests {
            assert_eq!(parse_grammar(t.input, "G", &b), t.out, "input: {:?}", t.input);
        }
    }

    fn syntax(kind: SyntaxErrorKind, line: usize, column: usize) -> Result<Node, Error> {
        Err(Error::Syntax(SyntaxError::new(kind, line, column)))
    }

    #[test]
    fn parse_rules() {
        let tests = vec![
            TestCase {
                input: "",
                out: Ok(grammar(vec![])),
            },
            TestCase {
                input: "r = a b",
                out: Ok(grammar(vec![rule(
                    "r",
                    Node::And(vec![app("a", "r"), app("b", "r")]),
                )])),
            },
            TestCase {
                input: "r = a\n  b\ns = c",
                out: Ok(grammar(vec![
                    rule("r", Node::And(vec![app("a", "r"), app("b", "r")])),
                    rule("s", app("c", "s")),
                ])),
            },
            TestCase {
                input: "r = 'a' -> 1\nr = 'b' -> 2\n",
                out: Ok(grammar(vec![rule(
                    "r",
                    Node::Or(vec![
                        Node::And(vec![
                            Node::Exactly(Literal::Str("a".to_owned())),
                            Node::Action("1".to_owned()),
                        ]),
                        Node::And(vec![
                            Node::Exactly(Literal::Str("b".to_owned())),
                            Node::Action("2".to_owned()),
                        ]),
                    ]),
                )])),
            },
            TestCase {
                input: "r :x = foo(x, \"a,b\")",
                out: Ok(grammar(vec![rule(
                    "r",
                    Node::And(vec![
                        bind("x", app("anything", "r")),
                        Node::Apply {
                            rule: "foo".to_owned(),
                            context: "r".to_owned(),
                            args: vec![
                                Node::Action("x".to_owned()),
                                Node::Action("\"a,b\"".to_owned()),
                            ],
                        },
                    ]),
                )])),
            },
            TestCase {
                input: "r = a | b\n  | c",
                out: Ok(grammar(vec![rule(
                    "r",
                    Node::Or(vec![app("a", "r"), app("b", "r"), app("c", "r")]),
                )])),
            },
        ];

        assert_test_cases(tests);
    }

    #[test]
    fn parse_atoms() {
        let tests = vec![
            TestCase {
                input: "r = 0x1F 017 42 -5",
                out: Ok(grammar(vec![rule(
                    "r",
                    Node::And(vec![
                        Node::Exactly(Literal::Int(31)),
                        Node::Exactly(Literal::Int(15)),
                        Node::Exactly(Literal::Int(42)),
                        Node::Exactly(Literal::Int(-5)),
                    ]),
                )])),
            },
            TestCase {
                input: r#"r = '\n' "\t\"" 'a'..'z'"#,
                out: Ok(grammar(vec![rule(
                    "r",
                    Node::And(vec![
                        Node::Exactly(Literal::Str("\n".to_owned())),
                        Node::MatchString("\t\"".to_owned()),
                        Node::Range('a', 'z'),
                    ]),
                )])),
            },
            TestCase {
                input: "r = a* b+:x c? ~d ~~e",
                out: Ok(grammar(vec![rule(
                    "r",
                    Node::And(vec![
                        Node::Many(Box::new(app("a", "r"))),
                        bind("x", Node::Many1(Box::new(app("b", "r")))),
                        Node::Optional(Box::new(app("c", "r"))),
                        Node::Not(Box::new(app("d", "r"))),
                        Node::Lookahead(Box::new(app("e", "r"))),
                    ]),
                )])),
            },
            TestCase {
                input: "r = [a] <b> @<c> ?(x > 1) !(f(x))",
                out: Ok(grammar(vec![rule(
                    "r",
                    Node::And(vec![
                        Node::List(Box::new(app("a", "r"))),
                        Node::ConsumedBy(Box::new(app("b", "r"))),
                        Node::IndexConsumedBy(Box::new(app("c", "r"))),
                        Node::Predicate("x > 1".to_owned()),
                        Node::Action("f(x)".to_owned()),
                    ]),
                )])),
            },
            TestCase {
                input: "r = a || b\n",
                out: Ok(grammar(vec![rule(
                    "r",
                    Node::Xor(vec![app("a", "r"), app("b", "r")]),
                )])),
            },
        ];

        assert_test_cases(tests);
    }

    #[test]
    fn parse_interleave() {
        let part = |mode, expr, name: Option<&str>| InterleavePart::new(mode, expr, name.map(str::to_owned));
        let tests = vec![TestCase {
            input: "r = a* && b+ && c? && d && e*:x && (f g)",
            out: Ok(grammar(vec![rule(
                "r",
                Node::Interleave(vec![
                    part(Mode::ZeroOrMore, app("a", "r"), None),
                    part(Mode::OneOrMore, app("b", "r"), None),
                    part(Mode::Optional, app("c", "r"), None),
                    part(Mode::One, app("d", "r"), None),
                    part(Mode::ZeroOrMore, app("e", "r"), Some("x")),
                    part(
                        Mode::One,
                        Node::And(vec![app("f", "r"), app("g", "r")]),
                        None,
                    ),
                ]),
            )])),
        }];

        assert_test_cases(tests);
    }

    #[test]
    fn parse_errors() {
        let tests = vec![
            TestCase {
                input: "r = \"abc",
                out: syntax(SyntaxErrorKind::UnterminatedString, 1, 9),
            },
            TestCase {
                input: "r = 'abc",
                out: syntax(SyntaxErrorKind::UnterminatedChar, 1, 9),
            },
            TestCase {
                input: "r = '\\q'",
                out: syntax(SyntaxErrorKind::InvalidEscape, 1, 7),
            },
            TestCase {
                input: "r = 'z'..'a'",
                out: syntax(SyntaxErrorKind::InvalidRange, 1, 13),
            },
            TestCase {
                input: "r = (a",
                out: syntax(SyntaxErrorKind::UnmatchedBracket, 1, 7),
            },
            TestCase {
                input: "r = 0x",
                out: syntax(SyntaxErrorKind::InvalidNumber, 1, 7),
            },
            TestCase {
                input: "r = 09",
                out: syntax(SyntaxErrorKind::InvalidNumber, 1, 7),
            },
            TestCase {
                input: "r = :1",
                out: syntax(SyntaxErrorKind::NameExpected, 1, 6),
            },
            TestCase {
                input: "r = a )",
                out: syntax(SyntaxErrorKind::Unexpected, 1, 7),
            },
            TestCase {
                input: "r = a\ns = \"x",
                out: syntax(SyntaxErrorKind::UnterminatedString, 2, 7),
            },
            TestCase {
                input: "r = a:x a:x",
                out: Err(Error::Build(BuildError::DuplicateBinding("x".to_owned()))),
            },
            TestCase {
                input: "r = a\ns = b\nr = c",
                out: Err(Error::Build(BuildError::DuplicateRule("r".to_owned()))),
            },
        ];

        assert_test_cases(tests);
    }
}
