// ABOUTME: Reader turning source bytes into values, built on nom over &[u8]

use crate::error::SyntaxError;
use crate::value::{list_from_vec, unescape, StrBuf, Symbol, Value};
use nom::bytes::complete::{take_while, take_while1};
use nom::IResult;

pub type PResult<'a, T> = IResult<&'a [u8], T, SyntaxError>;

/// Break characters terminate symbols and the single-character prefixes
/// (`T`, `F`, `'`, `#`).
pub fn is_break(c: u8) -> bool {
    matches!(c, b' ' | b'(' | b')' | b'\t' | b'\n' | b';' | b'"')
}

fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n')
}

/// Skip whitespace and `;`-to-end-of-line comments.
pub fn skip_ws(input: &[u8]) -> PResult<'_, ()> {
    let mut rest = input;
    loop {
        let (after, _) = take_while(is_space)(rest)?;
        rest = after;
        if rest.first() == Some(&b';') {
            let (after, _) = take_while(|c| c != b'\n')(rest)?;
            rest = after;
        } else {
            return Ok((rest, ()));
        }
    }
}

/// Unsigned decimal run. There is no sign prefix; negation goes through the
/// `-` builtin.
fn number(input: &[u8]) -> PResult<'_, Value> {
    let (rest, digits) = take_while1(|c: u8| c.is_ascii_digit())(input)?;
    let mut n: i64 = 0;
    for &d in digits {
        n = n.wrapping_mul(10).wrapping_add(i64::from(d - b'0'));
    }
    Ok((rest, Value::Num(n)))
}

/// Everything up to the next break character is a symbol.
fn symbol(input: &[u8]) -> PResult<'_, Value> {
    let (rest, text) = take_while1(|c| !is_break(c))(input)?;
    let text = String::from_utf8_lossy(text).into_owned();
    Ok((rest, Value::Sym(Symbol::new(text))))
}

/// Double-quoted string, decoding the escape table. An unknown escape or an
/// unterminated literal fails the whole parse.
fn string(input: &[u8]) -> PResult<'_, Value> {
    debug_assert_eq!(input.first(), Some(&b'"'));
    let mut bytes = Vec::new();
    let mut rest = &input[1..];
    loop {
        match rest.first() {
            None => return Err(nom::Err::Failure(SyntaxError::UnterminatedString)),
            Some(b'"') => return Ok((&rest[1..], Value::String(StrBuf::from_bytes(bytes)))),
            Some(b'\\') => {
                let code = match rest.get(1) {
                    Some(code) => *code,
                    None => return Err(nom::Err::Failure(SyntaxError::UnterminatedString)),
                };
                match unescape(code) {
                    Some(raw) => bytes.push(raw),
                    None => return Err(nom::Err::Failure(SyntaxError::UnknownEscape(code))),
                }
                rest = &rest[2..];
            }
            Some(&c) => {
                bytes.push(c);
                rest = &rest[1..];
            }
        }
    }
}

/// The byte code of one source character, read after the `#` prefix.
/// Leading whitespace is skipped and `\`-escapes are honoured.
fn char_code(input: &[u8]) -> PResult<'_, Value> {
    let (rest, _) = skip_ws(input)?;
    match rest.first() {
        None => Err(nom::Err::Failure(SyntaxError::UnterminatedChar)),
        Some(b'\\') => {
            let code = match rest.get(1) {
                Some(code) => *code,
                None => return Err(nom::Err::Failure(SyntaxError::UnterminatedChar)),
            };
            match unescape(code) {
                Some(raw) => Ok((&rest[2..], Value::Num(i64::from(raw)))),
                None => Err(nom::Err::Failure(SyntaxError::UnknownEscape(code))),
            }
        }
        Some(&c) => Ok((&rest[1..], Value::Num(i64::from(c)))),
    }
}

/// Parenthesised list, recursing into `expr` for every element.
fn list(input: &[u8]) -> PResult<'_, Value> {
    debug_assert_eq!(input.first(), Some(&b'('));
    let mut items = Vec::new();
    let mut rest = &input[1..];
    loop {
        let (after, _) = skip_ws(rest)?;
        rest = after;
        match rest.first() {
            None => return Err(nom::Err::Failure(SyntaxError::UnterminatedList)),
            Some(b')') => return Ok((&rest[1..], Value::List(list_from_vec(items)))),
            Some(_) => {
                let (after, item) = expr(rest)?;
                items.push(item);
                rest = after;
            }
        }
    }
}

/// `' value` reads as `(quote value)`.
fn quoted(input: &[u8]) -> PResult<'_, Value> {
    let (rest, value) = expr(&input[1..])?;
    Ok((rest, Value::list(vec![Value::symbol("quote"), value])))
}

/// Read one value, skipping leading whitespace and comments. The returned
/// remainder begins immediately after the value.
pub fn expr(input: &[u8]) -> PResult<'_, Value> {
    let (input, _) = skip_ws(input)?;
    let first = match input.first() {
        Some(&c) => c,
        None => return Err(nom::Err::Failure(SyntaxError::UnexpectedEof)),
    };
    let break_follows = input.len() == 1 || is_break(input[1]);
    match first {
        b'(' => list(input),
        b'"' => string(input),
        b'0'..=b'9' => number(input),
        b'T' | b'F' if break_follows => Ok((&input[1..], Value::Bool(first == b'T'))),
        b'\'' if break_follows => quoted(input),
        b'#' if break_follows => char_code(&input[1..]),
        _ => symbol(input),
    }
}

/// Read the first value from `src`, returning it with the byte offset at
/// which the remainder begins.
pub fn read_value(src: &[u8]) -> Result<(Value, usize), SyntaxError> {
    match expr(src) {
        Ok((rest, value)) => Ok((value, src.len() - rest.len())),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(e),
        Err(nom::Err::Incomplete(_)) => Err(SyntaxError::UnexpectedEof),
    }
}

/// Iterator over every top-level form in a source buffer.
pub struct Reader<'a> {
    src: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(src: &'a [u8]) -> Reader<'a> {
        Reader { src }
    }
}

impl Iterator for Reader<'_> {
    type Item = Result<Value, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (rest, _) = skip_ws(self.src).ok()?;
        self.src = rest;
        if self.src.is_empty() {
            return None;
        }
        match read_value(self.src) {
            Ok((value, used)) => {
                self.src = &self.src[used..];
                Some(Ok(value))
            }
            Err(err) => {
                self.src = b"";
                Some(Err(err))
            }
        }
    }
}
