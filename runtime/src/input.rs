use std::rc::Rc;

use crate::value::Value;

/// What a grammar is run against.
#[derive(Clone, Debug)]
pub enum Input<'a> {
    Text(&'a str),
    Values(Vec<Value>),
}

#[derive(Debug)]
pub(crate) struct Stream {
    pub id: usize,
    pub items: Vec<Value>,
    /// Every item is a char and consumed slices read back as strings.
    pub is_text: bool,
}

impl Stream {
    pub fn text(id: usize, text: &str) -> Stream {
        Stream {
            id,
            items: text.chars().map(Value::Char).collect(),
            is_text: true,
        }
    }

    pub fn values(id: usize, items: Vec<Value>) -> Stream {
        Stream {
            id,
            items,
            is_text: false,
        }
    }
}

/// Values pushed in front of the stream by rule arguments.
#[derive(Debug)]
struct Pushed {
    value: Value,
    next: Option<Rc<Pushed>>,
}

/// An immutable position in a stream. Advancing produces a new cursor, so
/// backtracking is just keeping the old one.
#[derive(Clone, Debug)]
pub(crate) struct Cursor {
    pub stream: Rc<Stream>,
    pub pos: usize,
    pushed: Option<Rc<Pushed>>,
}

impl Cursor {
    pub fn new(stream: Rc<Stream>) -> Cursor {
        Cursor {
            stream,
            pos: 0,
            pushed: None,
        }
    }

    pub fn next(&self) -> Option<(Value, Cursor)> {
        if let Some(p) = &self.pushed {
            let rest = Cursor {
                stream: self.stream.clone(),
                pos: self.pos,
                pushed: p.next.clone(),
            };
            return Some((p.value.clone(), rest));
        }
        let item = self.stream.items.get(self.pos)?;
        let rest = Cursor {
            stream: self.stream.clone(),
            pos: self.pos + 1,
            pushed: None,
        };
        Some((item.clone(), rest))
    }

    pub fn push(&self, value: Value) -> Cursor {
        Cursor {
            stream: self.stream.clone(),
            pos: self.pos,
            pushed: Some(Rc::new(Pushed {
                value,
                next: self.pushed.clone(),
            })),
        }
    }

    pub fn has_pushed(&self) -> bool {
        self.pushed.is_some()
    }

    pub fn at_end(&self) -> bool {
        self.pushed.is_none() && self.pos >= self.stream.items.len()
    }

    pub fn same_place(&self, other: &Cursor) -> bool {
        let pushed = match (&self.pushed, &other.pushed) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        pushed && self.pos == other.pos && Rc::ptr_eq(&self.stream, &other.stream)
    }

    /// Chars from here up to the first item that is not a char.
    pub fn remaining_chars(&self) -> Vec<char> {
        if self.pushed.is_some() {
            return Vec::new();
        }
        self.stream.items[self.pos.min(self.stream.items.len())..]
            .iter()
            .map_while(|v| match v {
                Value::Char(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    /// Items consumed between this cursor and `end`, which must be reachable
    /// from it.
    pub fn consumed(&self, end: &Cursor) -> Vec<Value> {
        let mut items = Vec::new();
        let mut cur = self.clone();
        while !cur.same_place(end) {
            match cur.next() {
                Some((v, next)) => {
                    items.push(v);
                    cur = next;
                }
                None => break,
            }
        }
        items
    }

    pub fn skip(&self, n: usize) -> Cursor {
        Cursor {
            stream: self.stream.clone(),
            pos: self.pos + n,
            pushed: self.pushed.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushed_values_come_first() {
        let c = Cursor::new(Rc::new(Stream::text(0, "ab")));
        let pushed = c.push(Value::Int(2)).push(Value::Int(1));

        let (one, c1) = pushed.next().unwrap();
        let (two, c2) = c1.next().unwrap();
        let (a, c3) = c2.next().unwrap();
        assert_eq!(vec![one, two, a], vec![Value::Int(1), Value::Int(2), Value::Char('a')]);
        assert!(c2.same_place(&c));
        assert!(!c3.at_end());
        assert_eq!(pushed.consumed(&c3).len(), 3);
        assert!(c3.next().unwrap().1.at_end());
    }

    #[test]
    fn remaining_chars_stop_at_values() {
        let s = Stream::values(0, vec![Value::Char('x'), Value::Char('y'), Value::Int(1)]);
        let c = Cursor::new(Rc::new(s));
        assert_eq!(c.remaining_chars(), vec!['x', 'y']);
        assert_eq!(c.skip(3).remaining_chars(), Vec::<char>::new());
    }
}
