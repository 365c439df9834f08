//! List surgery: `list cons append head tail nth`
//!
//! Lists are chains of immutable refcounted cells, so `cons` and `tail`
//! share structure with their inputs for free. `append` is the exception:
//! it produces a fresh chain because the new cell hangs off the far end.

use super::{as_list, as_num, fixed};
use crate::error::{EvalError, ARITY_ONE, ARITY_TWO};
use crate::eval::{CallResult, Interpreter};
use crate::value::{self, list_from_vec, list_iter, List, Value};

/// Returns its arguments as a list.
///
/// ```lisp
/// (list 1 2 (+ 3 4)) -> (1 2 7)
/// (list) -> ()
/// ```
pub fn list(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    Ok(CallResult::done(Value::List(args.clone())))
}

/// Prepends a value to a list, sharing the tail.
pub fn cons(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [head, tail] = fixed("cons", args, ARITY_TWO)?;
    let tail = as_list("cons", tail, 1)?;
    Ok(CallResult::done(Value::List(value::cons(
        head.clone(),
        tail,
    ))))
}

/// Appends a value to the end of a list. The input chain is copied; the
/// original list is untouched.
pub fn append(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [list, value] = fixed("append", args, ARITY_TWO)?;
    let list = as_list("append", list, 0)?;
    let mut items: Vec<Value> = list_iter(list).cloned().collect();
    items.push(value.clone());
    Ok(CallResult::done(Value::List(list_from_vec(items))))
}

/// The first element of a non-empty list.
pub fn head(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [list] = fixed("head", args, ARITY_ONE)?;
    match as_list("head", list, 0)? {
        Some(cell) => Ok(CallResult::done(cell.head.clone())),
        None => Err(EvalError::runtime("head", "empty list")),
    }
}

/// Everything after the first element.
pub fn tail(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [list] = fixed("tail", args, ARITY_ONE)?;
    match as_list("tail", list, 0)? {
        Some(cell) => Ok(CallResult::done(Value::List(cell.tail.clone()))),
        None => Err(EvalError::runtime("tail", "empty list")),
    }
}

/// The element at the given zero-based index.
pub fn nth(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [list, index] = fixed("nth", args, ARITY_TWO)?;
    let list = as_list("nth", list, 0)?;
    let index = as_num("nth", index, 1)?;
    let found = usize::try_from(index)
        .ok()
        .and_then(|i| list_iter(list).nth(i));
    match found {
        Some(value) => Ok(CallResult::done(value.clone())),
        None => Err(EvalError::runtime(
            "nth",
            format!("index {index} is out of range"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use crate::eval::Interpreter;
    use crate::value::Value;

    fn run(src: &str) -> Value {
        Interpreter::new().run(src.as_bytes()).expect("parse")
    }

    fn nums(items: &[i64]) -> Value {
        Value::list(items.iter().map(|n| Value::Num(*n)).collect())
    }

    #[test]
    fn test_list() {
        assert_eq!(run("(list 1 2 (+ 3 4))"), nums(&[1, 2, 7]));
        assert_eq!(run("(list)"), Value::nil());
    }

    #[test]
    fn test_cons() {
        assert_eq!(run("(cons 42 nil)"), nums(&[42]));
        assert_eq!(run("(cons 1 (list 2 3))"), nums(&[1, 2, 3]));
        assert_eq!(
            run("(cons ' a '(b))"),
            Value::list(vec![Value::symbol("a"), Value::symbol("b")])
        );
    }

    #[test]
    fn test_append() {
        assert_eq!(run("(append (list 1 2) 3)"), nums(&[1, 2, 3]));
        assert_eq!(run("(append nil 1)"), nums(&[1]));
        // the source list is unchanged
        assert_eq!(run("(def xs (list 1)) (append xs 2) xs"), nums(&[1]));
    }

    #[test]
    fn test_head_tail_nth() {
        assert_eq!(run("(head (list 1 2 3))"), Value::Num(1));
        assert_eq!(run("(tail (list 1 2 3))"), nums(&[2, 3]));
        assert_eq!(run("(tail (list 1))"), Value::nil());
        assert_eq!(run("(nth (list 1 2 3) 0)"), Value::Num(1));
        assert_eq!(run("(nth (list 1 2 3) 2)"), Value::Num(3));
    }

    #[test]
    fn test_errors_yield_nil() {
        assert_eq!(run("(head nil)"), Value::nil());
        assert_eq!(run("(tail nil)"), Value::nil());
        assert_eq!(run("(nth (list 1) 5)"), Value::nil());
        assert_eq!(run("(cons 1 2)"), Value::nil());
        assert_eq!(run("(head)"), Value::nil());
    }
}
