//! Arithmetic and bitwise operations: `+ - / % << >> ~ & | ^ cmp`
//!
//! All numeric operations work on 64-bit signed integers and wrap on
//! overflow. There is no multiplication primitive; the language never had
//! one. Division inherits the host's divide-by-zero behaviour.

use super::{as_num, fixed, least};
use crate::error::{EvalError, ARITY_ONE, ARITY_TWO};
use crate::eval::{CallResult, Interpreter};
use crate::value::{compare, list_iter, List, Value};
use std::cmp::Ordering;

/// Returns the sum of all arguments. `(+)` is 0.
///
/// ```lisp
/// (+ 1 2 3) -> 6
/// (+) -> 0
/// ```
pub fn add(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let mut sum: i64 = 0;
    for (position, arg) in list_iter(args).enumerate() {
        sum = sum.wrapping_add(as_num("+", arg, position)?);
    }
    Ok(CallResult::done(Value::Num(sum)))
}

/// Negates a single argument, or subtracts every subsequent argument from
/// the first.
///
/// ```lisp
/// (- 5) -> -5
/// (- 10 3 2) -> 5
/// ```
pub fn sub(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let args = least("-", args, 1)?;
    let first = as_num("-", args[0], 0)?;
    if args.len() == 1 {
        return Ok(CallResult::done(Value::Num(first.wrapping_neg())));
    }
    let mut result = first;
    for (position, arg) in args.iter().enumerate().skip(1) {
        result = result.wrapping_sub(as_num("-", arg, position)?);
    }
    Ok(CallResult::done(Value::Num(result)))
}

/// Divides the first argument by each subsequent argument in turn, with
/// integer division.
pub fn div(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let args = least("/", args, 2)?;
    let mut result = as_num("/", args[0], 0)?;
    for (position, arg) in args.iter().enumerate().skip(1) {
        result /= as_num("/", arg, position)?;
    }
    Ok(CallResult::done(Value::Num(result)))
}

/// The remainder of dividing the first argument by the second.
pub fn rem(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [a, b] = fixed("%", args, ARITY_TWO)?;
    let a = as_num("%", a, 0)?;
    let b = as_num("%", b, 1)?;
    Ok(CallResult::done(Value::Num(a % b)))
}

/// Three-way comparison: -1, 0 or 1.
pub fn cmp(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [a, b] = fixed("cmp", args, ARITY_TWO)?;
    let order = match compare(a, b)? {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    };
    Ok(CallResult::done(Value::Num(order)))
}

pub fn shl(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [a, b] = fixed("<<", args, ARITY_TWO)?;
    let a = as_num("<<", a, 0)?;
    let b = as_num("<<", b, 1)?;
    Ok(CallResult::done(Value::Num(a.wrapping_shl(b as u32))))
}

/// Arithmetic right shift: the sign bit fills in from the left.
pub fn shr(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [a, b] = fixed(">>", args, ARITY_TWO)?;
    let a = as_num(">>", a, 0)?;
    let b = as_num(">>", b, 1)?;
    Ok(CallResult::done(Value::Num(a.wrapping_shr(b as u32))))
}

pub fn bnot(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [a] = fixed("~", args, ARITY_ONE)?;
    let a = as_num("~", a, 0)?;
    Ok(CallResult::done(Value::Num(!a)))
}

pub fn band(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [a, b] = fixed("&", args, ARITY_TWO)?;
    Ok(CallResult::done(Value::Num(
        as_num("&", a, 0)? & as_num("&", b, 1)?,
    )))
}

pub fn bor(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [a, b] = fixed("|", args, ARITY_TWO)?;
    Ok(CallResult::done(Value::Num(
        as_num("|", a, 0)? | as_num("|", b, 1)?,
    )))
}

pub fn bxor(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [a, b] = fixed("^", args, ARITY_TWO)?;
    Ok(CallResult::done(Value::Num(
        as_num("^", a, 0)? ^ as_num("^", b, 1)?,
    )))
}

#[cfg(test)]
mod tests {
    use crate::eval::Interpreter;
    use crate::value::Value;

    fn run(src: &str) -> Value {
        Interpreter::new().run(src.as_bytes()).expect("parse")
    }

    #[test]
    fn test_add() {
        assert_eq!(run("(+ 1 2 3)"), Value::Num(6));
        assert_eq!(run("(+ 10)"), Value::Num(10));
        assert_eq!(run("(+)"), Value::Num(0));
    }

    #[test]
    fn test_sub() {
        assert_eq!(run("(- 5)"), Value::Num(-5));
        assert_eq!(run("(- 10 3 2)"), Value::Num(5));
    }

    #[test]
    fn test_div_and_rem() {
        assert_eq!(run("(/ 20 4)"), Value::Num(5));
        assert_eq!(run("(/ 100 2 5)"), Value::Num(10));
        assert_eq!(run("(/ 7 2)"), Value::Num(3));
        assert_eq!(run("(% 17 5)"), Value::Num(2));
    }

    #[test]
    fn test_cmp() {
        assert_eq!(run("(cmp 1 2)"), Value::Num(-1));
        assert_eq!(run("(cmp 2 2)"), Value::Num(0));
        assert_eq!(run("(cmp 3 2)"), Value::Num(1));
        assert_eq!(run("(cmp \"abc\" \"abd\")"), Value::Num(-1));
        assert_eq!(run("(cmp (list 1 2) (list 1 2))"), Value::Num(0));
        assert_eq!(run("(cmp F T)"), Value::Num(-1));
        // disparate types report an error and yield nil
        assert_eq!(run("(cmp 1 \"1\")"), Value::nil());
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(run("(<< 1 4)"), Value::Num(16));
        assert_eq!(run("(>> 16 4)"), Value::Num(1));
        assert_eq!(run("(>> (- 8) 1)"), Value::Num(-4));
        assert_eq!(run("(~ 0)"), Value::Num(-1));
        assert_eq!(run("(& 6 3)"), Value::Num(2));
        assert_eq!(run("(| 6 3)"), Value::Num(7));
        assert_eq!(run("(^ 6 3)"), Value::Num(5));
    }

    #[test]
    fn test_type_errors_are_reported_not_fatal() {
        assert_eq!(run("(+ 1 \"x\")"), Value::nil());
        assert_eq!(run("(+ 1 \"x\") (+ 1 1)"), Value::Num(2));
    }
}
