//! Binding forms: `def := assoc env-new subs subs-with`
//!
//! `def` tunnels through fixed frames, so a definition made inside a
//! function body or an `assoc` lands in the enclosing scope. `assoc` and
//! `env-new` push a scope and leave their body in tail position; the
//! evaluator unwinds the scope when the body has reduced.

use super::fixed;
use crate::error::{EvalError, ARITY_ONE, ARITY_TWO};
use crate::eval::{substitute, CallResult, Interpreter};
use crate::value::{List, ListCell, Symbol, Value};
use crate::env::Frame;
use std::rc::Rc;

fn binding_name(function: &'static str, value: &Value) -> Result<Rc<Symbol>, EvalError> {
    match value {
        Value::Sym(name) => Ok(Rc::clone(name)),
        other => Err(EvalError::type_mismatch(function, "symbol", other, 0)),
    }
}

/// Walk `(name expr name expr ...)` pairs, handing each name and its
/// evaluated value to `out`. Evaluation happens pair by pair, so later
/// values can see earlier bindings.
fn each_pair(
    interp: &mut Interpreter,
    function: &'static str,
    mut cell: Option<&Rc<ListCell>>,
    mut out: impl FnMut(&mut Interpreter, Rc<Symbol>, Value),
) -> Result<(), EvalError> {
    while let Some(pair) = cell {
        let name = binding_name(function, &pair.head)?;
        let value_cell = match pair.tail.as_ref() {
            Some(value_cell) => value_cell,
            None => {
                return Err(EvalError::runtime(
                    function,
                    format!("`{}` has no paired value", name.text()),
                ))
            }
        };
        let value = interp.eval(&value_cell.head);
        out(interp, name, value);
        cell = value_cell.tail.as_ref();
    }
    Ok(())
}

/// Defines each `name expr` pair in the nearest frame that is not fixed.
pub fn def(interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    each_pair(interp, "def", args.as_ref(), |interp, name, value| {
        interp.env.define(name, value)
    })?;
    Ok(CallResult::done(Value::nil()))
}

/// Overwrites an existing binding, wherever it lives, and returns the new
/// value.
pub fn assign(interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [name, expr] = fixed(":=", args, ARITY_TWO)?;
    let name = binding_name(":=", name)?;
    let value = interp.eval(expr);
    let stored = interp.env.assign(name.text(), value)?;
    Ok(CallResult::done(stored))
}

/// Pushes a fixed frame holding the given bindings and evaluates the body
/// there, in tail position. Binding values are evaluated inside the new
/// frame, so each one can see those before it.
pub fn assoc(interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [bindings, body] = fixed("assoc", args, ARITY_TWO)?;
    let bindings = super::as_list("assoc", bindings, 0)?.clone();
    let body = body.clone();

    interp.env.push(Frame::new(true));
    let bound = each_pair(interp, "assoc", bindings.as_ref(), |interp, name, value| {
        interp.env.define_local(name, value)
    });
    if let Err(err) = bound {
        interp.env.pop();
        return Err(err);
    }
    Ok(CallResult::again_scoped(body))
}

/// Pushes an empty frame and evaluates the body there, in tail position.
/// The frame is not fixed: `def` inside it defines locally.
pub fn env_new(interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [body] = fixed("env-new", args, ARITY_ONE)?;
    let body = body.clone();
    interp.env.push(Frame::new(false));
    Ok(CallResult::again_scoped(body))
}

/// Substitutes every symbol bound anywhere in the current environment chain
/// into the (already evaluated) argument.
pub fn subs(interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [value] = fixed("subs", args, ARITY_ONE)?;
    Ok(CallResult::done(substitute(value, interp.env.frames())))
}

/// Binds the given pairs in a transient frame, substitutes only those
/// bindings through the body, and leaves the substituted body to evaluate.
pub fn subs_with(interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [bindings, body] = fixed("subs-with", args, ARITY_TWO)?;
    let bindings = super::as_list("subs-with", bindings, 0)?;

    let mut frame = Frame::new(false);
    each_pair(
        interp,
        "subs-with",
        bindings.as_ref(),
        |_interp, name, value| frame.define(name, value),
    )?;
    Ok(CallResult::again(substitute(
        body,
        std::slice::from_ref(&frame),
    )))
}
