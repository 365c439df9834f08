//! Evaluation control: `quote eval if do and or call exit truthy?`
//!
//! The forms that steer evaluation are builtin macros (`eval_args` false):
//! they receive their argument forms untouched and hand the chosen form
//! back to the evaluator with `re_eval` set, which is what puts `if`
//! branches, `do` tails and the last operand of `and`/`or` in tail position.

use super::{as_num, fixed, least};
use crate::error::{EvalError, ARITY_ONE, ARITY_TWO, ARITY_TWO_OR_THREE, ARITY_ZERO_OR_ONE};
use crate::eval::{CallResult, Interpreter};
use crate::value::{List, Value};
use std::io::Write;

/// Returns the argument form unevaluated.
pub fn quote(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [value] = fixed("quote", args, ARITY_ONE)?;
    Ok(CallResult::done(value.clone()))
}

/// Evaluates its (already evaluated) argument once more.
pub fn eval(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [value] = fixed("eval", args, ARITY_ONE)?;
    Ok(CallResult::again(value.clone()))
}

/// Evaluates the condition, then exactly one branch, in tail position. The
/// else branch is optional; a falsey condition without one gives nil.
pub fn if_(interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let collected = least("if", args, 2)?;
    if collected.len() > 3 {
        return Err(EvalError::arity("if", ARITY_TWO_OR_THREE, collected.len()));
    }
    let cond = interp.eval(collected[0]);
    if cond.is_truthy() {
        Ok(CallResult::again(collected[1].clone()))
    } else if let Some(alternative) = collected.get(2) {
        Ok(CallResult::again((*alternative).clone()))
    } else {
        Ok(CallResult::done(Value::nil()))
    }
}

/// Evaluates each form in turn; the last one is left in tail position.
pub fn do_(interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let mut cell = match args.as_deref() {
        Some(cell) => cell,
        None => return Ok(CallResult::done(Value::nil())),
    };
    while let Some(next) = cell.tail.as_deref() {
        interp.eval(&cell.head);
        cell = next;
    }
    Ok(CallResult::again(cell.head.clone()))
}

/// Short-circuit conjunction. An early falsey operand is returned as-is
/// (it has already been evaluated); only the final operand is handed back
/// for re-evaluation in tail position.
pub fn and(interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let collected = least("and", args, 2)?;
    for arg in &collected[..collected.len() - 1] {
        let value = interp.eval(arg);
        if !value.is_truthy() {
            return Ok(CallResult::done(value));
        }
    }
    Ok(CallResult::again((*collected[collected.len() - 1]).clone()))
}

/// Short-circuit disjunction; mirrors `and`.
pub fn or(interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let collected = least("or", args, 2)?;
    for arg in &collected[..collected.len() - 1] {
        let value = interp.eval(arg);
        if value.is_truthy() {
            return Ok(CallResult::done(value));
        }
    }
    Ok(CallResult::again((*collected[collected.len() - 1]).clone()))
}

/// Invokes a callable with an already-built argument list, bypassing
/// argument evaluation. Useful both to keep a function from re-evaluating
/// data and to hand evaluated values to a macro.
pub fn call(interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [callable, call_args] = fixed("call", args, ARITY_TWO)?;
    let call_args = super::as_list("call", call_args, 1)?;
    match callable {
        Value::Builtin(b) => interp.call_builtin(*b, call_args, true),
        Value::List(Some(f)) => interp.call_function(f, call_args, false, true),
        other => Err(EvalError::type_mismatch("call", "callable", other, 0)),
    }
}

/// Whether `if` would take the first branch on this value.
pub fn truthy(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [value] = fixed("truthy?", args, ARITY_ONE)?;
    Ok(CallResult::done(Value::Bool(value.is_truthy())))
}

/// Terminates the process with the given exit code (default 0).
pub fn exit(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let code = match args {
        None => 0,
        Some(cell) if cell.tail.is_none() => as_num("exit", &cell.head, 0)?,
        _ => {
            return Err(EvalError::arity(
                "exit",
                ARITY_ZERO_OR_ONE,
                crate::value::list_len(args),
            ))
        }
    };
    let _ = std::io::stdout().flush();
    std::process::exit(code as i32);
}

#[cfg(test)]
mod tests {
    use crate::eval::Interpreter;
    use crate::value::Value;

    fn run(src: &str) -> Value {
        Interpreter::new().run(src.as_bytes()).expect("parse")
    }

    #[test]
    fn test_quote_and_eval() {
        assert_eq!(run("(quote x)"), Value::symbol("x"));
        assert_eq!(
            run("(quote (+ 1 2))"),
            Value::list(vec![Value::symbol("+"), Value::Num(1), Value::Num(2)])
        );
        assert_eq!(run("(eval (quote (+ 1 2)))"), Value::Num(3));
        assert_eq!(run("' (1 2)"), Value::list(vec![Value::Num(1), Value::Num(2)]));
    }

    #[test]
    fn test_if_branches() {
        assert_eq!(run("(if T 1 2)"), Value::Num(1));
        assert_eq!(run("(if F 1 2)"), Value::Num(2));
        assert_eq!(run("(if (truthy? \"\") 1 2)"), Value::Num(2));
        assert_eq!(run("(if F 1)"), Value::nil());
        // only the taken branch evaluates
        assert_eq!(run("(def x 0) (if T (:= x 1) (:= x 2)) x"), Value::Num(1));
    }

    #[test]
    fn test_do_sequences() {
        assert_eq!(run("(do 1 2 3)"), Value::Num(3));
        assert_eq!(run("(do)"), Value::nil());
        assert_eq!(run("(def x 0) (do (:= x (+ x 1)) (:= x (+ x 1)) x)"), Value::Num(2));
    }

    #[test]
    fn test_and_or_short_circuit() {
        assert_eq!(run("(and 1 2 3)"), Value::Num(3));
        assert_eq!(run("(and 1 0 3)"), Value::Num(0));
        assert_eq!(run("(or 0 F 7)"), Value::Num(7));
        assert_eq!(run("(or 0 2 3)"), Value::Num(2));
        // operands after the short-circuit point never evaluate
        assert_eq!(run("(def x 0) (and 0 (:= x 1)) x"), Value::Num(0));
        assert_eq!(run("(def x 0) (or 1 (:= x 1)) x"), Value::Num(0));
    }

    #[test]
    fn test_and_or_evaluate_each_operand_once() {
        // an early exit returns its operand's value directly, while the
        // final operand is handed back to the trampoline; either way each
        // operand is evaluated exactly once, so a quoted form comes out as
        // data on both paths
        let plus_form = Value::list(vec![Value::symbol("+"), Value::Num(1), Value::Num(2)]);
        assert_eq!(run("(and ' (+ 1 2) 0 ' (+ 2 3))"), Value::Num(0));
        assert_eq!(run("(or ' (+ 1 2) T)"), plus_form.clone());
        assert_eq!(run("(and T ' (+ 1 2))"), plus_form);
    }

    #[test]
    fn test_call() {
        assert_eq!(run("(call + (list 1 2 3))"), Value::Num(6));
        assert_eq!(
            run("(def inc (() (x) F (+ x 1))) (call inc (list 41))"),
            Value::Num(42)
        );
        // call hands a macro evaluated values
        assert_eq!(
            run("(def q (() (x) T (quote x))) (call q (list (+ 1 2)))"),
            Value::Num(3)
        );
        assert_eq!(run("(call nil (list 1 2))"), Value::nil());
    }

    #[test]
    fn test_truthy() {
        assert_eq!(run("(truthy? 0)"), Value::Bool(false));
        assert_eq!(run("(truthy? \"\")"), Value::Bool(false));
        assert_eq!(run("(truthy? nil)"), Value::Bool(false));
        assert_eq!(run("(truthy? F)"), Value::Bool(false));
        assert_eq!(run("(truthy? 1)"), Value::Bool(true));
        assert_eq!(run("(truthy? ' sym)"), Value::Bool(true));
    }
}
