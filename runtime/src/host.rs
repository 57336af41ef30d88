//! The expression language used inside actions, predicates and rule
//! arguments.
//!
//! It is deliberately tiny: literals, lists, variables, calls, indexing,
//! negation, `+` and comparisons. Anything richer belongs in a host function
//! registered through `Bindings`.

use std::collections::HashMap;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{anychar, char, digit1, hex_digit1, multispace0, none_of},
    combinator::{all_consuming, map, map_opt, not as not_followed_by, opt, recognize, value, verify},
    multi::{fold_many0, many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use ometa_grammar::lexical;

use crate::bindings::Bindings;
use crate::error::HostError;
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Lit(Value),
    List(Vec<Expr>),
    Var(String),
    Call(String, Vec<Expr>),
    Index(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Compare(CmpOp, Box<Expr>, Box<Expr>),
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn integer(input: &str) -> IResult<&str, Expr> {
    map_opt(
        recognize(alt((preceded(tag("0x"), hex_digit1), digit1))),
        |text: &str| lexical::decode_number(text).ok().map(|n| Expr::Lit(Value::Int(n))),
    )(input)
}

fn quoted(input: &str, quote: char) -> IResult<&str, String> {
    let body = many0(alt((
        preceded(char('\\'), map_opt(anychar, lexical::decode_escape)),
        verify(none_of("\\"), move |c: &char| *c != quote),
    )));
    map(delimited(char(quote), body, char(quote)), |cs: Vec<char>| {
        cs.into_iter().collect()
    })(input)
}

fn string(input: &str) -> IResult<&str, Expr> {
    map(|i| quoted(i, '"'), |s| Expr::Lit(Value::str(&s)))(input)
}

/// `'x'` is a char, anything longer in single quotes is a string.
fn character(input: &str) -> IResult<&str, Expr> {
    map(|i| quoted(i, '\''), |s| {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Expr::Lit(Value::Char(c)),
            _ => Expr::Lit(Value::str(&s)),
        }
    })(input)
}

fn name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        verify(anychar, |c: &char| lexical::is_name_start(*c)),
        take_while(lexical::is_name_char),
    ))(input)
}

fn args(input: &str) -> IResult<&str, Vec<Expr>> {
    delimited(
        char('('),
        separated_list0(char(','), ws(expr)),
        preceded(multispace0, char(')')),
    )(input)
}

fn call_or_var(input: &str) -> IResult<&str, Expr> {
    let (rest, n) = name(input)?;
    let (rest, call) = opt(args)(rest)?;
    let e = match (n, call) {
        (_, Some(args)) => Expr::Call(n.to_owned(), args),
        ("true", None) | ("True", None) => Expr::Lit(Value::Bool(true)),
        ("false", None) | ("False", None) => Expr::Lit(Value::Bool(false)),
        ("None", None) => Expr::Lit(Value::None),
        (_, None) => Expr::Var(n.to_owned()),
    };
    Ok((rest, e))
}

fn list(input: &str) -> IResult<&str, Expr> {
    map(
        delimited(
            char('['),
            separated_list0(char(','), ws(expr)),
            preceded(multispace0, char(']')),
        ),
        Expr::List,
    )(input)
}

fn primary(input: &str) -> IResult<&str, Expr> {
    alt((
        integer,
        string,
        character,
        list,
        delimited(char('('), ws(expr), char(')')),
        call_or_var,
    ))(input)
}

fn postfix(input: &str) -> IResult<&str, Expr> {
    let (rest, first) = primary(input)?;
    fold_many0(
        delimited(ws(char('[')), expr, char(']')),
        first,
        |acc, index| Expr::Index(Box::new(acc), Box::new(index)),
    )(rest)
}

fn unary(input: &str) -> IResult<&str, Expr> {
    let keyword_not = terminated(
        tag("not"),
        not_followed_by(verify(anychar, |c: &char| lexical::is_name_char(*c))),
    );
    alt((
        map(preceded(ws(char('-')), unary), |e| Expr::Neg(Box::new(e))),
        map(preceded(ws(keyword_not), unary), |e| Expr::Not(Box::new(e))),
        ws(postfix),
    ))(input)
}

fn sum(input: &str) -> IResult<&str, Expr> {
    let (rest, first) = unary(input)?;
    fold_many0(preceded(char('+'), unary), first, |acc, e| {
        Expr::Add(Box::new(acc), Box::new(e))
    })(rest)
}

fn cmp_op(input: &str) -> IResult<&str, CmpOp> {
    alt((
        value(CmpOp::Eq, tag("==")),
        value(CmpOp::Ne, tag("!=")),
        value(CmpOp::Le, tag("<=")),
        value(CmpOp::Ge, tag(">=")),
        value(CmpOp::Lt, tag("<")),
        value(CmpOp::Gt, tag(">")),
    ))(input)
}

fn expr(input: &str) -> IResult<&str, Expr> {
    let (rest, lhs) = sum(input)?;
    let (rest, rhs) = opt(pair(cmp_op, sum))(rest)?;
    let e = match rhs {
        Some((op, rhs)) => Expr::Compare(op, Box::new(lhs), Box::new(rhs)),
        None => lhs,
    };
    Ok((rest, e))
}

/// Parse a complete host expression.
pub fn parse(code: &str) -> Option<Expr> {
    all_consuming(ws(expr))(code).ok().map(|(_, e)| e)
}

fn text_of(v: &Value) -> Result<String, HostError> {
    v.as_text().ok_or(HostError::Type {
        expected: "string",
        found: v.type_name(),
    })
}

fn add(lhs: Value, rhs: Value) -> Result<Value, HostError> {
    match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(*b)
            .map(Value::Int)
            .ok_or_else(|| HostError::Custom("integer overflow".to_owned())),
        (Value::List(a), Value::List(b)) => {
            let mut items = a.as_ref().clone();
            items.extend(b.iter().cloned());
            Ok(Value::list(items))
        }
        (Value::Str(_), _) | (Value::Char(_), _) => {
            let mut s = text_of(&lhs)?;
            s.push_str(&text_of(&rhs)?);
            Ok(Value::str(&s))
        }
        _ => Err(HostError::Type {
            expected: "int, list or string",
            found: lhs.type_name(),
        }),
    }
}

fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> Result<bool, HostError> {
    use std::cmp::Ordering;

    match op {
        CmpOp::Eq => return Ok(lhs == rhs),
        CmpOp::Ne => return Ok(lhs != rhs),
        _ => {}
    }
    let ord = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Char(a), Value::Char(b)) => a.cmp(b),
        _ => text_of(lhs)?.cmp(&text_of(rhs)?),
    };
    Ok(match op {
        CmpOp::Lt => ord == Ordering::Less,
        CmpOp::Le => ord != Ordering::Greater,
        CmpOp::Gt => ord == Ordering::Greater,
        CmpOp::Ge => ord != Ordering::Less,
        CmpOp::Eq => ord == Ordering::Equal,
        CmpOp::Ne => ord != Ordering::Equal,
    })
}

fn index(target: Value, idx: Value) -> Result<Value, HostError> {
    let i = match idx {
        Value::Int(i) => i,
        other => {
            return Err(HostError::Type {
                expected: "int",
                found: other.type_name(),
            })
        }
    };
    let items = match &target {
        Value::List(items) => items.as_ref().clone(),
        Value::Str(_) | Value::Node(_) => target.items().unwrap_or_default(),
        other => {
            return Err(HostError::Type {
                expected: "list",
                found: other.type_name(),
            })
        }
    };
    let len = items.len();
    let at = if i < 0 { len as i64 + i } else { i };
    if at < 0 || at as usize >= len {
        return Err(HostError::Index { index: i, len });
    }
    Ok(items[at as usize].clone())
}

/// Evaluate `expr` with rule-local variables shadowing global bindings.
pub fn eval(
    expr: &Expr,
    locals: &HashMap<String, Value>,
    bindings: &Bindings,
) -> Result<Value, HostError> {
    match expr {
        Expr::Lit(v) => Ok(v.clone()),
        Expr::List(es) => {
            let items = es
                .iter()
                .map(|e| eval(e, locals, bindings))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::list(items))
        }
        Expr::Var(name) => locals
            .get(name)
            .or_else(|| bindings.value(name))
            .cloned()
            .ok_or_else(|| HostError::UnknownName(name.clone())),
        Expr::Call(name, args) => {
            let args = args
                .iter()
                .map(|e| eval(e, locals, bindings))
                .collect::<Result<Vec<_>, _>>()?;
            bindings.call(name, args)
        }
        Expr::Index(target, idx) => index(
            eval(target, locals, bindings)?,
            eval(idx, locals, bindings)?,
        ),
        Expr::Neg(e) => match eval(e, locals, bindings)? {
            Value::Int(n) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| HostError::Custom("integer overflow".to_owned())),
            other => Err(HostError::Type {
                expected: "int",
                found: other.type_name(),
            }),
        },
        Expr::Not(e) => Ok(Value::Bool(!eval(e, locals, bindings)?.is_truthy())),
        Expr::Add(lhs, rhs) => add(eval(lhs, locals, bindings)?, eval(rhs, locals, bindings)?),
        Expr::Compare(op, lhs, rhs) => {
            let lhs = eval(lhs, locals, bindings)?;
            let rhs = eval(rhs, locals, bindings)?;
            compare(*op, &lhs, &rhs).map(Value::Bool)
        }
    }
}
