//! String operations: `pstr &$ []$ len$ repr parse`
//!
//! Strings are byte sequences. Slicing through `[]$` never copies: the
//! result is a view into the same buffer. `parse` exposes the reader to the
//! language and returns the unconsumed remainder the same way, as a view of
//! its input.

use super::{as_byte, as_string, fixed, least};
use crate::error::{EvalError, ARITY_ONE, ARITY_TWO_OR_THREE};
use crate::eval::{CallResult, Interpreter};
use crate::parser;
use crate::value::{list_from_vec, List, StrBuf, Value};
use std::io::Write;

/// Prints a string, or a single character given as its byte code, to
/// stdout.
pub fn pstr(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [value] = fixed("pstr", args, ARITY_ONE)?;
    let mut stdout = std::io::stdout();
    let written = match value {
        Value::String(s) => stdout.write_all(s.as_bytes()),
        other => stdout.write_all(&[as_byte("pstr", other, 0)?]),
    };
    if let Err(err) = written {
        eprintln!("error while writing to stdout: {err}");
        std::process::exit(1);
    }
    Ok(CallResult::done(Value::nil()))
}

/// Joins strings and character codes into one fresh string.
pub fn join(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let parts = least("&$", args, 1)?;
    let mut bytes = Vec::new();
    for (position, part) in parts.iter().enumerate() {
        match part {
            Value::String(s) => bytes.extend_from_slice(s.as_bytes()),
            other => bytes.push(as_byte("&$", other, position)?),
        }
    }
    Ok(CallResult::done(Value::String(StrBuf::from_bytes(bytes))))
}

/// With two arguments, the byte at an index; with three, the substring
/// `start..stop` as a zero-copy view.
pub fn index(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let parts = least("[]$", args, 2)?;
    if parts.len() > 3 {
        return Err(EvalError::arity("[]$", ARITY_TWO_OR_THREE, parts.len()));
    }
    let string = as_string("[]$", parts[0], 0)?;
    let start = super::as_num("[]$", parts[1], 1)?;

    if parts.len() == 2 {
        let byte = usize::try_from(start)
            .ok()
            .and_then(|i| string.as_bytes().get(i).copied());
        return match byte {
            Some(byte) => Ok(CallResult::done(Value::Num(i64::from(byte)))),
            None => Err(EvalError::runtime(
                "[]$",
                format!("index {start} is out of range"),
            )),
        };
    }

    let stop = super::as_num("[]$", parts[2], 2)?;
    let valid = 0 <= start && start <= stop && stop <= string.len() as i64;
    if !valid {
        return Err(EvalError::runtime(
            "[]$",
            format!("range {start}..{stop} is out of bounds"),
        ));
    }
    Ok(CallResult::done(Value::String(StrBuf::substr(
        string,
        start as usize,
        stop as usize,
    ))))
}

/// The length of a string in bytes.
pub fn len(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [string] = fixed("len$", args, ARITY_ONE)?;
    let string = as_string("len$", string, 0)?;
    Ok(CallResult::done(Value::Num(string.len() as i64)))
}

/// The round-trippable text form of a value, as a string.
pub fn repr(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [value] = fixed("repr", args, ARITY_ONE)?;
    Ok(CallResult::done(Value::String(StrBuf::from_bytes(
        value.repr(),
    ))))
}

/// Reads one value from a string. Gives `(remainder value)` on success,
/// `(remainder)` when there is nothing to read or the text is malformed;
/// the remainder is a view of the input.
pub fn parse(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [input] = fixed("parse", args, ARITY_ONE)?;
    let input = as_string("parse", input, 0)?;
    let bytes = input.as_bytes();

    let blank = match parser::skip_ws(bytes) {
        Ok((rest, _)) => rest.is_empty(),
        Err(_) => false,
    };
    if blank {
        let empty = Value::String(StrBuf::from_bytes(Vec::new()));
        return Ok(CallResult::done(Value::list(vec![empty])));
    }

    let result = match parser::read_value(bytes) {
        Ok((value, used)) => {
            let remainder = Value::String(StrBuf::substr(input, used, input.len()));
            list_from_vec(vec![remainder, value])
        }
        // nothing consumed; hand the whole input back
        Err(_) => list_from_vec(vec![Value::String(std::rc::Rc::clone(input))]),
    };
    Ok(CallResult::done(Value::List(result)))
}
