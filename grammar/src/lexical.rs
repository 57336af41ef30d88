//! Character level helpers shared by the seed parser, the runtime built-ins
//! and the printer.

use crate::error::SyntaxErrorKind;

/// Horizontal whitespace, the only thing allowed in front of an indented
/// application.
pub fn is_hspace(c: char) -> bool {
    c == ' ' || c == '\t'
}

pub fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

pub fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Decode the character following a backslash.
pub fn decode_escape(c: char) -> Option<char> {
    let decoded = match c {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'b' => '\u{8}',
        'f' => '\u{c}',
        '"' => '"',
        '\'' => '\'',
        '\\' => '\\',
        _ => return None,
    };
    Some(decoded)
}

/// The escape letter for `c`, if `c` must be escaped inside a literal
/// delimited by `quote`.
pub fn encode_escape(c: char, quote: char) -> Option<char> {
    match c {
        '\n' => Some('n'),
        '\r' => Some('r'),
        '\t' => Some('t'),
        '\u{8}' => Some('b'),
        '\u{c}' => Some('f'),
        '\\' => Some('\\'),
        c if c == quote => Some(c),
        _ => None,
    }
}

/// Quote `text` so that reading it back with escapes applied yields `text`.
pub fn quote(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match encode_escape(c, quote) {
            Some(e) => {
                out.push('\\');
                out.push(e);
            }
            None => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Parse unsigned digits in the given radix.
pub fn parse_radix(text: &str, radix: u32) -> Result<i64, SyntaxErrorKind> {
    if text.is_empty() {
        return Err(SyntaxErrorKind::InvalidNumber);
    }
    let mut n: i64 = 0;
    for c in text.chars() {
        let d = c.to_digit(radix).ok_or(SyntaxErrorKind::InvalidNumber)?;
        n = n
            .checked_mul(radix as i64)
            .and_then(|n| n.checked_add(d as i64))
            .ok_or(SyntaxErrorKind::InvalidNumber)?;
    }
    Ok(n)
}

/// Decode a numeric literal: decimal, `0x`/`0X` hexadecimal or `0`-prefixed
/// octal, with an optional leading minus.
pub fn decode_number(text: &str) -> Result<i64, SyntaxErrorKind> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let n = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        parse_radix(hex, 16)?
    } else if digits.len() > 1 && digits.starts_with('0') {
        parse_radix(digits, 8)?
    } else {
        parse_radix(digits, 10)?
    };
    Ok(if negative { -n } else { n })
}

/// 1-based line and column of the char at `offset`.
pub fn line_col<I>(chars: I, offset: usize) -> (usize, usize)
where
    I: IntoIterator<Item = char>,
{
    let mut line = 1;
    let mut column = 1;
    let mut prev_cr = false;
    for c in chars.into_iter().take(offset) {
        match c {
            '\n' if prev_cr => {}
            '\n' | '\r' => {
                line += 1;
                column = 1;
            }
            _ => column += 1,
        }
        prev_cr = c == '\r';
    }
    (line, column)
}

/// Measure the extent of an opaque host expression.
///
/// Returns the number of chars before the first char of `end_chars` found
/// outside brackets and quotes, before an unbalanced closing bracket, or the
/// full length if neither occurs.
pub fn scan_host_expr<I>(chars: I, end_chars: &str) -> Result<usize, SyntaxErrorKind>
where
    I: IntoIterator<Item = char>,
{
    let mut iter = chars.into_iter();
    let mut depth = 0usize;
    let mut n = 0;
    while let Some(c) = iter.next() {
        match c {
            '"' | '\'' => {
                n += 1;
                let mut closed = false;
                while let Some(q) = iter.next() {
                    n += 1;
                    if q == '\\' {
                        if iter.next().is_none() {
                            break;
                        }
                        n += 1;
                    } else if q == c {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(if c == '"' {
                        SyntaxErrorKind::UnterminatedString
                    } else {
                        SyntaxErrorKind::UnterminatedChar
                    });
                }
                continue;
            }
            _ if depth == 0 && end_chars.contains(c) => return Ok(n),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                if depth == 0 {
                    return Ok(n);
                }
                depth -= 1;
            }
            _ => {}
        }
        n += 1;
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct TestCase<T> {
        input: &'static str,
        out: T,
    }

    #[test]
    fn numbers() {
        let tests = vec![
            TestCase { input: "42", out: Ok(42) },
            TestCase { input: "0x1F", out: Ok(31) },
            TestCase { input: "0X1f", out: Ok(31) },
            TestCase { input: "017", out: Ok(15) },
            TestCase { input: "0", out: Ok(0) },
            TestCase { input: "-5", out: Ok(-5) },
            TestCase { input: "-0x10", out: Ok(-16) },
            TestCase {
                input: "0x",
                out: Err(SyntaxErrorKind::InvalidNumber),
            },
            TestCase {
                input: "09",
                out: Err(SyntaxErrorKind::InvalidNumber),
            },
            TestCase {
                input: "",
                out: Err(SyntaxErrorKind::InvalidNumber),
            },
            TestCase {
                input: "99999999999999999999",
                out: Err(SyntaxErrorKind::InvalidNumber),
            },
        ];

        for t in tests {
            assert_eq!(decode_number(t.input), t.out, "input: {}", t.input);
        }
    }

    #[test]
    fn host_expr_extent() {
        let tests = vec![
            TestCase { input: "a, b)", out: Ok(1) },
            TestCase { input: "f(a, b), c", out: Ok(7) },
            TestCase { input: "x)", out: Ok(1) },
            TestCase { input: "[1, 2] + y", out: Ok(10) },
            TestCase { input: "\",)\", z", out: Ok(4) },
            TestCase { input: "'\\'', z", out: Ok(4) },
            TestCase { input: "foo(bar", out: Ok(7) },
            TestCase {
                input: "\"abc",
                out: Err(SyntaxErrorKind::UnterminatedString),
            },
            TestCase {
                input: "'a",
                out: Err(SyntaxErrorKind::UnterminatedChar),
            },
        ];

        for t in tests {
            assert_eq!(
                scan_host_expr(t.input.chars(), ",)"),
                t.out,
                "input: {}",
                t.input
            );
        }
    }

    #[test]
    fn rule_value_stops_at_layout() {
        let end = "\r\n)]|";
        assert_eq!(scan_host_expr("many(e) | x".chars(), end), Ok(8));
        assert_eq!(scan_host_expr("e\nnext".chars(), end), Ok(1));
        assert_eq!(scan_host_expr("[a | b]".chars(), end), Ok(7));
    }

    #[test]
    fn line_columns() {
        let text = "ab\ncd\r\nef";
        assert_eq!(line_col(text.chars(), 0), (1, 1));
        assert_eq!(line_col(text.chars(), 1), (1, 2));
        assert_eq!(line_col(text.chars(), 3), (2, 1));
        assert_eq!(line_col(text.chars(), 7), (3, 1));
        assert_eq!(line_col(text.chars(), 8), (3, 2));
    }

    #[test]
    fn escapes() {
        for (letter, decoded) in [
            ('n', '\n'),
            ('r', '\r'),
            ('t', '\t'),
            ('b', '\u{8}'),
            ('f', '\u{c}'),
            ('"', '"'),
            ('\'', '\''),
            ('\\', '\\'),
        ]
        .iter()
        {
            assert_eq!(decode_escape(*letter), Some(*decoded));
        }
        assert_eq!(decode_escape('q'), None);
        assert_eq!(quote("a\"b\n", '"'), "\"a\\\"b\\n\"");
        assert_eq!(quote("it's", '"'), "\"it's\"");
    }

    proptest! {
        #[test]
        fn decimal_agrees_with_std(n in 1i64..i64::MAX) {
            prop_assert_eq!(decode_number(&n.to_string()), Ok(n));
            prop_assert_eq!(decode_number(&format!("-{}", n)), Ok(-n));
        }

        #[test]
        fn hex_and_octal_agree_with_std(n in 0i64..i64::MAX) {
            prop_assert_eq!(decode_number(&format!("0x{:x}", n)), Ok(n));
            prop_assert_eq!(decode_number(&format!("0{:o}", n)), Ok(n));
        }

        #[test]
        fn quoted_text_scans_as_one_expression(s in "[^\\\\]*") {
            let quoted = quote(&s, '"');
            let len = quoted.chars().count();
            prop_assert_eq!(scan_host_expr(quoted.chars(), ",)"), Ok(len));
        }
    }
}
