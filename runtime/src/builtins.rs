use ometa_grammar::lexical;

use crate::error::HostError;
use crate::input::Cursor;
use crate::interp::{Halt, Run, Step};
use crate::value::Value;

/// Rules every grammar can apply without defining them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Builtin {
    Anything,
    End,
    Empty,
    Exactly,
    Token,
    Spaces,
    Letter,
    Digit,
    LetterOrDigit,
    HostExpr,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Builtin> {
        Some(match name {
            "anything" => Builtin::Anything,
            "end" => Builtin::End,
            "empty" => Builtin::Empty,
            "exactly" => Builtin::Exactly,
            "token" => Builtin::Token,
            "spaces" => Builtin::Spaces,
            "letter" => Builtin::Letter,
            "digit" => Builtin::Digit,
            "letterOrDigit" => Builtin::LetterOrDigit,
            "hostExpr" => Builtin::HostExpr,
            _ => return None,
        })
    }

    pub fn arity(self) -> usize {
        match self {
            Builtin::Exactly | Builtin::Token | Builtin::HostExpr => 1,
            _ => 0,
        }
    }

    pub fn call(self, run: &mut Run, c: &Cursor, args: Vec<Value>) -> Step {
        match self {
            Builtin::Anything => match c.next() {
                Some(found) => Ok(found),
                None => Err(run.fail(c)),
            },
            Builtin::End => {
                if c.at_end() {
                    Ok((Value::None, c.clone()))
                } else {
                    Err(run.fail(c))
                }
            }
            Builtin::Empty => Ok((Value::None, c.clone())),
            Builtin::Exactly => run.match_exactly(&args[0], c),
            Builtin::Token => {
                let text = arg_text(run, &args[0], c)?;
                run.match_chars(&text, &skip_spaces(c))
            }
            Builtin::Spaces => Ok((Value::None, skip_spaces(c))),
            Builtin::Letter => char_class(run, c, char::is_alphabetic),
            Builtin::Digit => char_class(run, c, |ch| ch.is_ascii_digit()),
            Builtin::LetterOrDigit => char_class(run, c, char::is_alphanumeric),
            Builtin::HostExpr => {
                let end_chars = arg_text(run, &args[0], c)?;
                let chars = c.remaining_chars();
                match lexical::scan_host_expr(chars.iter().copied(), &end_chars) {
                    Ok(n) => {
                        let code: String = chars[..n].iter().collect();
                        Ok((Value::str(code.trim()), c.skip(n)))
                    }
                    Err(kind) => Err(run.syntax_error(kind, c)),
                }
            }
        }
    }
}

fn arg_text(run: &Run, arg: &Value, c: &Cursor) -> Result<String, Halt> {
    arg.as_text().ok_or_else(|| {
        run.host_error(
            HostError::Type {
                expected: "string",
                found: arg.type_name(),
            },
            c,
        )
    })
}

fn skip_spaces(c: &Cursor) -> Cursor {
    let mut cur = c.clone();
    while let Some((Value::Char(ch), next)) = cur.next() {
        if !ch.is_whitespace() {
            break;
        }
        cur = next;
    }
    cur
}

fn char_class(run: &mut Run, c: &Cursor, pred: fn(char) -> bool) -> Step {
    match c.next() {
        Some((v, next)) if v.as_char().map_or(false, pred) => Ok((v, next)),
        _ => Err(run.fail(c)),
    }
}
