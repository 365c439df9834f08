// ABOUTME: Value types: the tagged sum and its reference-counted heap entities

use crate::error::EvalError;
use crate::eval::{CallResult, Interpreter};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// A symbol. Identity is textual; the surrounding `Rc` supplies the
/// reference count that `:refs` and `:id` observe.
#[derive(Debug, PartialEq, Eq)]
pub struct Symbol {
    text: Box<str>,
}

impl Symbol {
    pub fn new(text: impl Into<Box<str>>) -> Rc<Symbol> {
        Rc::new(Symbol { text: text.into() })
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A byte string. Every substring shares the parent's `bytes` allocation,
/// which makes `[]$` slicing O(1). The buffer is immutable once built, so
/// views can never observe a torn write, and since a view only ever points
/// into an older buffer the ownership graph stays acyclic.
#[derive(Debug)]
pub struct StrBuf {
    bytes: Rc<[u8]>,
    start: usize,
    len: usize,
}

impl StrBuf {
    pub fn from_bytes(bytes: Vec<u8>) -> Rc<StrBuf> {
        let len = bytes.len();
        Rc::new(StrBuf {
            bytes: bytes.into(),
            start: 0,
            len,
        })
    }

    pub fn from_str(text: &str) -> Rc<StrBuf> {
        StrBuf::from_bytes(text.as_bytes().to_vec())
    }

    /// A view of `this` between byte offsets `begin..end`, sharing storage.
    pub fn substr(this: &Rc<StrBuf>, begin: usize, end: usize) -> Rc<StrBuf> {
        debug_assert!(begin <= end && end <= this.len);
        Rc::new(StrBuf {
            bytes: Rc::clone(&this.bytes),
            start: this.start + begin,
            len: end - begin,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[self.start..self.start + self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl PartialEq for StrBuf {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for StrBuf {}

/// One cell of a singly linked list. The empty list is `None`; cells are
/// immutable once shared, so structure sharing of tails is always safe.
#[derive(Debug)]
pub struct ListCell {
    pub head: Value,
    pub tail: List,
}

pub type List = Option<Rc<ListCell>>;

impl Drop for ListCell {
    fn drop(&mut self) {
        // Unchain uniquely owned tails iteratively; the default recursive
        // drop would overflow the host stack on long lists.
        let mut tail = self.tail.take();
        while let Some(cell) = tail {
            match Rc::try_unwrap(cell) {
                Ok(mut cell) => tail = cell.tail.take(),
                Err(_) => break,
            }
        }
    }
}

/// Prepend `head` to `tail`.
pub fn cons(head: Value, tail: &List) -> List {
    Some(Rc::new(ListCell {
        head,
        tail: tail.clone(),
    }))
}

/// Build a list from a vector, folding cells up from the right.
pub fn list_from_vec(items: Vec<Value>) -> List {
    let mut list = None;
    for head in items.into_iter().rev() {
        list = cons(head, &list);
    }
    list
}

pub fn list_iter(list: &List) -> ListIter<'_> {
    ListIter {
        cell: list.as_deref(),
    }
}

pub fn list_len(list: &List) -> usize {
    list_iter(list).count()
}

pub struct ListIter<'a> {
    cell: Option<&'a ListCell>,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        let cell = self.cell?;
        self.cell = cell.tail.as_deref();
        Some(&cell.head)
    }
}

/// The signature every primitive implements: the interpreter context plus
/// the (possibly pre-evaluated) argument list.
pub type NativeFn = fn(&mut Interpreter, &List) -> Result<CallResult, EvalError>;

/// A primitive implemented in Rust. `eval_args` distinguishes builtin
/// functions from builtin macros: a macro receives its argument forms
/// unevaluated.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub run: NativeFn,
    pub eval_args: bool,
    pub doc: &'static str,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("eval_args", &self.eval_args)
            .finish()
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.run as usize == other.run as usize
    }
}

/// The tagged sum every expression and every result reduces to. Numbers,
/// booleans and builtins are carried inline; symbols, lists and strings are
/// shared through reference counts.
#[derive(Debug, Clone)]
pub enum Value {
    Num(i64),
    Bool(bool),
    Builtin(Builtin),
    Sym(Rc<Symbol>),
    List(List),
    String(Rc<StrBuf>),
}

impl Value {
    pub fn nil() -> Value {
        Value::List(None)
    }

    pub fn symbol(text: &str) -> Value {
        Value::Sym(Symbol::new(text))
    }

    pub fn string(text: &str) -> Value {
        Value::String(StrBuf::from_str(text))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(list_from_vec(items))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::List(None))
    }

    /// The name `type` answers with.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Num(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Builtin(_) => "builtin",
            Value::Sym(_) => "symbol",
            Value::List(_) => "list",
            Value::String(_) => "string",
        }
    }

    /// Zero, F, the empty list and the empty string are falsey; everything
    /// else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Num(n) => *n != 0,
            Value::Bool(b) => *b,
            Value::List(list) => list.is_some(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Render the round-trippable text form: reading `repr` back reproduces
    /// the value for every variant except `Builtin`.
    pub fn repr(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.repr_into(&mut out);
        out
    }

    fn repr_into(&self, out: &mut Vec<u8>) {
        match self {
            Value::Num(n) => out.extend_from_slice(n.to_string().as_bytes()),
            Value::Bool(b) => out.push(if *b { b'T' } else { b'F' }),
            Value::Builtin(b) => out.extend_from_slice(if b.eval_args {
                b"<builtin function>"
            } else {
                b"<builtin macro>"
            }),
            Value::Sym(s) => out.extend_from_slice(s.text().as_bytes()),
            Value::String(s) => {
                out.push(b'"');
                for &byte in s.as_bytes() {
                    match escape_for(byte) {
                        Some(code) => {
                            out.push(b'\\');
                            out.push(code);
                        }
                        None => out.push(byte),
                    }
                }
                out.push(b'"');
            }
            Value::List(list) => {
                out.push(b'(');
                let mut cell = list.as_deref();
                while let Some(c) = cell {
                    c.head.repr_into(out);
                    if c.tail.is_some() {
                        out.push(b' ');
                    }
                    cell = c.tail.as_deref();
                }
                out.push(b')');
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.repr()))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Sym(a), Value::Sym(b)) => a.text() == b.text(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                let mut a = a.as_deref();
                let mut b = b.as_deref();
                loop {
                    match (a, b) {
                        (None, None) => return true,
                        (Some(x), Some(y)) => {
                            if x.head != y.head {
                                return false;
                            }
                            a = x.tail.as_deref();
                            b = y.tail.as_deref();
                        }
                        _ => return false,
                    }
                }
            }
            _ => false,
        }
    }
}

/// Type-appropriate three-way ordering: numbers arithmetically, F before T,
/// symbols and strings by byte order, lists lexicographically by element.
/// Values of different types do not order.
pub fn compare(a: &Value, b: &Value) -> Result<Ordering, EvalError> {
    match (a, b) {
        (Value::Num(a), Value::Num(b)) => Ok(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
        (Value::Sym(a), Value::Sym(b)) => Ok(a.text().as_bytes().cmp(b.text().as_bytes())),
        (Value::String(a), Value::String(b)) => Ok(a.as_bytes().cmp(b.as_bytes())),
        (Value::List(a), Value::List(b)) => {
            let mut a = a.as_deref();
            let mut b = b.as_deref();
            loop {
                match (a, b) {
                    (None, None) => return Ok(Ordering::Equal),
                    (None, Some(_)) => return Ok(Ordering::Less),
                    (Some(_), None) => return Ok(Ordering::Greater),
                    (Some(x), Some(y)) => {
                        let order = compare(&x.head, &y.head)?;
                        if order != Ordering::Equal {
                            return Ok(order);
                        }
                        a = x.tail.as_deref();
                        b = y.tail.as_deref();
                    }
                }
            }
        }
        _ => Err(EvalError::runtime(
            "cmp",
            format!("cannot order {} against {}", a.type_name(), b.type_name()),
        )),
    }
}

/// Escape table shared by the reader and the printer: raw byte, escape code.
pub const ESCAPES: [(u8, u8); 9] = [
    (0x00, b'0'),
    (b'\t', b't'),
    (0x0b, b'v'),
    (b'\r', b'r'),
    (b'\n', b'n'),
    (b'\\', b'\\'),
    (b'"', b'"'),
    (0x07, b'a'),
    (0x08, b'b'),
];

pub fn escape_for(raw: u8) -> Option<u8> {
    ESCAPES.iter().find(|(b, _)| *b == raw).map(|(_, c)| *c)
}

pub fn unescape(code: u8) -> Option<u8> {
    ESCAPES.iter().find(|(_, c)| *c == code).map(|(b, _)| *b)
}

/// A function read out of an ordinary list. The shape is
/// `(<params> [(name doc)] <is-macro> <body>)`: `<params>` holds positional
/// symbols, optionally ending with a list element followed by the symbol
/// that takes all remaining arguments.
#[derive(Debug, Clone)]
pub struct ListFn {
    pub params: List,
    pub name: Option<Rc<Symbol>>,
    pub doc: Option<Rc<StrBuf>>,
    pub is_macro: bool,
    pub body: Value,
}

impl ListFn {
    /// Read a function out of a list, or `None` when the shape does not
    /// match.
    pub fn from_list(list: &Rc<ListCell>) -> Option<ListFn> {
        let params = match &list.head {
            Value::List(p) => p,
            _ => return None,
        };
        if !params_well_formed(params) {
            return None;
        }

        let second = list.tail.as_deref()?;
        match &second.head {
            // (params (name doc) is-macro body)
            Value::List(meta) => {
                let meta = meta.as_deref()?;
                let name = match &meta.head {
                    Value::Sym(s) => Rc::clone(s),
                    _ => return None,
                };
                let doc_cell = meta.tail.as_deref()?;
                let doc = match &doc_cell.head {
                    Value::String(s) => Rc::clone(s),
                    _ => return None,
                };
                if doc_cell.tail.is_some() {
                    return None;
                }

                let third = second.tail.as_deref()?;
                let is_macro = match third.head {
                    Value::Bool(b) => b,
                    _ => return None,
                };
                let fourth = third.tail.as_deref()?;
                if fourth.tail.is_some() {
                    return None;
                }
                Some(ListFn {
                    params: params.clone(),
                    name: Some(name),
                    doc: Some(doc),
                    is_macro,
                    body: fourth.head.clone(),
                })
            }
            // (params is-macro body)
            Value::Bool(is_macro) => {
                let third = second.tail.as_deref()?;
                if third.tail.is_some() {
                    return None;
                }
                Some(ListFn {
                    params: params.clone(),
                    name: None,
                    doc: None,
                    is_macro: *is_macro,
                    body: third.head.clone(),
                })
            }
            _ => None,
        }
    }
}

fn params_well_formed(params: &List) -> bool {
    let mut cell = params.as_deref();
    while let Some(c) = cell {
        match &c.head {
            Value::Sym(_) => cell = c.tail.as_deref(),
            Value::List(_) => {
                // rest marker: the one remaining element names the binding
                // that takes every leftover argument
                let next = match c.tail.as_deref() {
                    Some(next) => next,
                    None => return false,
                };
                if !matches!(next.head, Value::Sym(_)) {
                    return false;
                }
                return next.tail.is_none();
            }
            _ => return false,
        }
    }
    true
}

/// Whether a non-empty list can be called.
pub fn is_function(list: &Rc<ListCell>) -> bool {
    ListFn::from_list(list).is_some()
}
