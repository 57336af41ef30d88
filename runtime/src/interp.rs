use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, trace};
use ometa_grammar::{lexical, Node, SyntaxErrorKind};

use crate::bindings::Bindings;
use crate::error::{HostError, LoadError, Position, RuntimeError};
use crate::host::{self, Expr};
use crate::input::{Cursor, Input, Stream};
use crate::program::{Arg, Part, Pattern, Program, Target};
use crate::value::Value;

type Locals = HashMap<String, Value>;

pub(crate) enum Halt {
    /// Backtrack.
    Fail,
    /// Abort the whole run.
    Error(RuntimeError),
}

pub(crate) type Step = Result<(Value, Cursor), Halt>;

enum Memo {
    Pending { detected: bool },
    Done(Option<(Value, usize)>),
}

/// A loaded grammar together with the host bindings its actions call.
///
/// Loading resolves every rule application and parses every host expression,
/// so a grammar that loads never fails on a missing name at match time.
pub struct Interpreter {
    program: Program,
    bindings: Bindings,
}

impl Interpreter {
    pub fn new(grammar: &Node, bindings: Bindings) -> Result<Interpreter, LoadError> {
        Ok(Interpreter {
            program: Program::load(grammar)?,
            bindings,
        })
    }

    pub fn name(&self) -> &str {
        &self.program.name
    }

    pub fn has_rule(&self, rule: &str) -> bool {
        self.program.index.contains_key(rule)
    }

    /// Match `rule` against a prefix of `input`.
    pub fn apply(&self, rule: &str, input: Input, args: Vec<Value>) -> Result<Value, RuntimeError> {
        self.run(rule, input, args, false)
    }

    /// Match `rule` against all of `input`.
    pub fn parse(&self, rule: &str, input: Input, args: Vec<Value>) -> Result<Value, RuntimeError> {
        self.run(rule, input, args, true)
    }

    fn run(
        &self,
        rule: &str,
        input: Input,
        args: Vec<Value>,
        whole: bool,
    ) -> Result<Value, RuntimeError> {
        let idx = *self
            .program
            .index
            .get(rule)
            .ok_or_else(|| RuntimeError::UnknownRule(rule.to_owned()))?;
        let top = Rc::new(match input {
            Input::Text(text) => Stream::text(0, text),
            Input::Values(items) => Stream::values(0, items),
        });
        debug!(
            "running {}.{} over {} items",
            self.program.name,
            rule,
            top.items.len()
        );

        let mut run = Run {
            program: &self.program,
            bindings: &self.bindings,
            memo: HashMap::new(),
            streams: 1,
            top: top.clone(),
            furthest: 0,
        };
        match run.apply_rule(idx, &Cursor::new(top), args) {
            Ok((value, end)) => {
                if whole && !end.at_end() {
                    run.fail(&end);
                    Err(run.no_match())
                } else {
                    Ok(value)
                }
            }
            Err(Halt::Fail) => Err(run.no_match()),
            Err(Halt::Error(err)) => Err(err),
        }
    }
}

/// State of one top level application.
pub(crate) struct Run<'p> {
    program: &'p Program,
    bindings: &'p Bindings,
    memo: HashMap<(usize, usize, usize), Memo>,
    streams: usize,
    top: Rc<Stream>,
    /// Furthest offset into the top stream where an item failed to match.
    furthest: usize,
}

impl<'p> Run<'p> {
    fn position_at(&self, offset: usize) -> Position {
        if self.top.is_text {
            let (line, column) =
                lexical::line_col(self.top.items.iter().filter_map(Value::as_char), offset);
            Position {
                offset,
                line,
                column,
            }
        } else {
            Position {
                offset,
                line: 1,
                column: offset + 1,
            }
        }
    }

    fn position(&self, c: &Cursor) -> Position {
        if Rc::ptr_eq(&c.stream, &self.top) {
            self.position_at(c.pos)
        } else {
            self.position_at(self.furthest)
        }
    }

    fn no_match(&self) -> RuntimeError {
        RuntimeError::Match {
            position: self.position_at(self.furthest),
        }
    }

    /// Record an item level failure at `c`.
    pub fn fail(&mut self, c: &Cursor) -> Halt {
        if Rc::ptr_eq(&c.stream, &self.top) && !c.has_pushed() && c.pos > self.furthest {
            self.furthest = c.pos;
        }
        Halt::Fail
    }

    pub fn syntax_error(&self, kind: SyntaxErrorKind, c: &Cursor) -> Halt {
        Halt::Error(RuntimeError::Syntax {
            kind,
            position: self.position(c),
        })
    }

    pub fn host_error(&self, err: HostError, c: &Cursor) -> Halt {
        match err {
            HostError::Syntax(kind) => self.syntax_error(kind, c),
            source => Halt::Error(RuntimeError::Host {
                position: self.position(c),
                source,
            }),
        }
    }

    fn host(&self, expr: &Expr, c: &Cursor, locals: &Locals) -> Result<Value, Halt> {
        host::eval(expr, locals, self.bindings).map_err(|e| self.host_error(e, c))
    }

    pub fn match_exactly(&mut self, want: &Value, c: &Cursor) -> Step {
        if let Some((item, next)) = c.next() {
            if item == *want {
                return Ok((item, next));
            }
        }
        match want {
            Value::Str(s) if s.chars().count() != 1 => self.match_chars(s, c),
            _ => Err(self.fail(c)),
        }
    }

    pub fn match_chars(&mut self, s: &str, c: &Cursor) -> Step {
        let mut cur = c.clone();
        for want in s.chars() {
            match cur.next() {
                Some((Value::Char(got), next)) if got == want => cur = next,
                _ => return Err(self.fail(&cur)),
            }
        }
        Ok((Value::str(s), cur))
    }

    fn invoke(&mut self, idx: usize, c: &Cursor) -> Step {
        let program = self.program;
        let mut locals = Locals::new();
        self.eval(&program.rules[idx].body, c, &mut locals)
    }

    fn apply_rule(&mut self, idx: usize, c: &Cursor, args: Vec<Value>) -> Step {
        if args.is_empty() && !c.has_pushed() {
            return self.apply_memo(idx, c);
        }
        let mut start = c.clone();
        for arg in args.into_iter().rev() {
            start = start.push(arg);
        }
        self.invoke(idx, &start)
    }

    /// Packrat application with seed growing for left recursive rules.
    fn apply_memo(&mut self, idx: usize, c: &Cursor) -> Step {
        let key = (c.stream.id, c.pos, idx);
        let program = self.program;
        let name = &program.rules[idx].name;
        match self.memo.get_mut(&key) {
            Some(Memo::Pending { detected }) => {
                trace!("left recursion in '{}' at {}", name, c.pos);
                *detected = true;
                return Err(self.fail(c));
            }
            Some(Memo::Done(Some((value, end)))) => {
                trace!("memo hit for '{}' at {}", name, c.pos);
                let (value, n) = (value.clone(), *end - c.pos);
                return Ok((value, c.skip(n)));
            }
            Some(Memo::Done(None)) => return Err(Halt::Fail),
            None => {}
        }

        self.memo.insert(key, Memo::Pending { detected: false });
        let mut result = match self.invoke(idx, c) {
            Ok(found) => Some(found),
            Err(Halt::Fail) => None,
            Err(err) => return Err(err),
        };
        let detected = matches!(self.memo.get(&key), Some(Memo::Pending { detected: true }));
        if matches!(&result, Some((_, end)) if end.has_pushed()) {
            self.memo.remove(&key);
            return result.ok_or(Halt::Fail);
        }
        self.memo.insert(
            key,
            Memo::Done(result.as_ref().map(|(v, end)| (v.clone(), end.pos))),
        );

        if detected {
            while let Some((_, end)) = &result {
                let prev = end.pos;
                match self.invoke(idx, c) {
                    Ok((value, next)) if !next.has_pushed() && next.pos > prev => {
                        trace!("grew '{}' at {} to {}", name, c.pos, next.pos);
                        self.memo
                            .insert(key, Memo::Done(Some((value.clone(), next.pos))));
                        result = Some((value, next));
                    }
                    Ok(_) | Err(Halt::Fail) => break,
                    Err(err) => return Err(err),
                }
            }
        }

        match result {
            Some(found) => Ok(found),
            None => Err(Halt::Fail),
        }
    }

    fn eval(&mut self, pattern: &Pattern, c: &Cursor, locals: &mut Locals) -> Step {
        match pattern {
            Pattern::Apply { target, args } => self.apply(*target, args, c, locals),
            Pattern::Exactly(want) => self.match_exactly(want, c),
            Pattern::MatchString(s) => self.match_chars(s, c),
            Pattern::Many(e) => self.many(e, c, locals, false),
            Pattern::Many1(e) => self.many(e, c, locals, true),
            Pattern::Optional(e) => match self.eval(e, c, locals) {
                Err(Halt::Fail) => Ok((Value::None, c.clone())),
                other => other,
            },
            Pattern::Or(es) => {
                for e in es {
                    match self.eval(e, c, locals) {
                        Err(Halt::Fail) => continue,
                        other => return other,
                    }
                }
                Err(Halt::Fail)
            }
            Pattern::Xor(es) => self.xor(es, c, locals),
            Pattern::And(es) => {
                let mut cur = c.clone();
                let mut last = Value::None;
                for e in es {
                    let (value, next) = self.eval(e, &cur, locals)?;
                    last = value;
                    cur = next;
                }
                Ok((last, cur))
            }
            Pattern::Not(e) => match self.eval(e, c, locals) {
                Ok(_) => Err(Halt::Fail),
                Err(Halt::Fail) => Ok((Value::None, c.clone())),
                Err(err) => Err(err),
            },
            Pattern::Lookahead(e) => {
                let (value, _) = self.eval(e, c, locals)?;
                Ok((value, c.clone()))
            }
            Pattern::Bind(name, e) => {
                let (value, next) = self.eval(e, c, locals)?;
                locals.insert(name.clone(), value.clone());
                Ok((value, next))
            }
            Pattern::Predicate(expr) => {
                if self.host(expr, c, locals)?.is_truthy() {
                    Ok((Value::Bool(true), c.clone()))
                } else {
                    Err(Halt::Fail)
                }
            }
            Pattern::Action(expr) => Ok((self.host(expr, c, locals)?, c.clone())),
            Pattern::List(e) => self.list(e, c, locals),
            Pattern::ConsumedBy(e) => {
                let (_, end) = self.eval(e, c, locals)?;
                Ok((self.slice(c, &end), end))
            }
            Pattern::IndexConsumedBy(e) => {
                let (_, end) = self.eval(e, c, locals)?;
                let start = Value::Int(c.pos as i64);
                Ok((Value::list(vec![start, self.slice(c, &end)]), end))
            }
            Pattern::Range(low, high) => match c.next() {
                Some((v, next)) if v.as_char().map_or(false, |ch| *low <= ch && ch <= *high) => {
                    Ok((v, next))
                }
                _ => Err(self.fail(c)),
            },
            Pattern::Interleave(parts) => self.interleave(parts, c, locals),
        }
    }

    fn apply(&mut self, target: Target, args: &[Arg], c: &Cursor, locals: &mut Locals) -> Step {
        let values = args
            .iter()
            .map(|arg| match arg {
                Arg::Const(v) => Ok(v.clone()),
                Arg::Expr(expr) => self.host(expr, c, locals),
            })
            .collect::<Result<Vec<_>, _>>()?;
        match target {
            Target::Rule(idx) => self.apply_rule(idx, c, values),
            Target::Builtin(builtin) => builtin.call(self, c, values),
        }
    }

    fn many(&mut self, e: &Pattern, c: &Cursor, locals: &mut Locals, at_least_one: bool) -> Step {
        let mut items = Vec::new();
        let mut cur = c.clone();
        if at_least_one {
            let (value, next) = self.eval(e, &cur, locals)?;
            items.push(value);
            cur = next;
        }
        loop {
            match self.eval(e, &cur, locals) {
                Ok((_, ref next)) if next.same_place(&cur) => break,
                Ok((value, next)) => {
                    items.push(value);
                    cur = next;
                }
                Err(Halt::Fail) => break,
                Err(err) => return Err(err),
            }
        }
        Ok((Value::list(items), cur))
    }

    /// Exclusive choice: every branch runs from the same place in its own
    /// scope and exactly one of them may succeed.
    fn xor(&mut self, es: &[Pattern], c: &Cursor, locals: &mut Locals) -> Step {
        let mut matched = None;
        let mut count = 0;
        for e in es {
            let mut scope = locals.clone();
            match self.eval(e, c, &mut scope) {
                Ok((value, next)) => {
                    count += 1;
                    if matched.is_none() {
                        matched = Some((value, next, scope));
                    }
                }
                Err(Halt::Fail) => {}
                Err(err) => return Err(err),
            }
        }
        match matched {
            Some((value, next, scope)) if count == 1 => {
                *locals = scope;
                Ok((value, next))
            }
            Some(_) => {
                trace!("{} branches of an exclusive choice matched at {}", count, c.pos);
                Err(Halt::Fail)
            }
            None => Err(Halt::Fail),
        }
    }

    fn list(&mut self, e: &Pattern, c: &Cursor, locals: &mut Locals) -> Step {
        let (value, next) = match c.next() {
            Some(found) => found,
            None => return Err(self.fail(c)),
        };
        let items = match value.items() {
            Some(items) => items,
            None => return Err(self.fail(c)),
        };
        let stream = Rc::new(Stream {
            id: self.streams,
            items,
            is_text: matches!(value, Value::Str(_)),
        });
        self.streams += 1;

        let (_, end) = self.eval(e, &Cursor::new(stream), locals)?;
        if end.at_end() {
            Ok((value, next))
        } else {
            Err(Halt::Fail)
        }
    }

    fn slice(&self, start: &Cursor, end: &Cursor) -> Value {
        let items = start.consumed(end);
        if start.stream.is_text && items.iter().all(|v| matches!(v, Value::Char(_))) {
            let text: String = items.iter().filter_map(Value::as_char).collect();
            Value::str(&text)
        } else {
            Value::list(items)
        }
    }

    /// Try the parts in turn until a full round makes no progress. Parts
    /// that match without consuming anything count once.
    fn interleave(&mut self, parts: &[Part], c: &Cursor, locals: &mut Locals) -> Step {
        let mut matches: Vec<Vec<Value>> = vec![Vec::new(); parts.len()];
        let mut cur = c.clone();
        loop {
            let mut progressed = false;
            for (part, found) in parts.iter().zip(matches.iter_mut()) {
                if !found.is_empty() && !part.mode.repeats() {
                    continue;
                }
                match self.eval(&part.pattern, &cur, locals) {
                    Ok((value, next)) => {
                        let moved = !next.same_place(&cur);
                        if moved || found.is_empty() {
                            found.push(value);
                            cur = next;
                            progressed |= moved;
                        }
                    }
                    Err(Halt::Fail) => {}
                    Err(err) => return Err(err),
                }
            }
            if !progressed {
                break;
            }
        }

        let mut values = Vec::with_capacity(parts.len());
        for (part, found) in parts.iter().zip(matches) {
            if found.is_empty() && !part.mode.is_optional() {
                return Err(self.fail(&cur));
            }
            let value = if part.mode.repeats() {
                Value::list(found)
            } else {
                found.into_iter().next().unwrap_or(Value::None)
            };
            if let Some(name) = &part.name {
                locals.insert(name.clone(), value.clone());
            }
            values.push(value);
        }
        Ok((Value::list(values), cur))
    }
}
