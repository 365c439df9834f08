//! Introspection: `type :refs :id :name :docs :macro? :callable?`
//!
//! Callables are ordinary lists, so `:name`, `:docs` and `:macro?` are
//! structural reads over the function shape rather than reflection over
//! opaque closures. `:refs` and `:id` expose the reference counts and
//! identities of the heap-shared values, which is what makes the ownership
//! discipline observable from inside the language.

use super::fixed;
use crate::error::{EvalError, ARITY_ONE};
use crate::eval::{CallResult, Interpreter};
use crate::value::{is_function, List, ListFn, StrBuf, Value};
use std::rc::Rc;

/// The type of a value, as a symbol.
pub fn type_(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [value] = fixed("type", args, ARITY_ONE)?;
    Ok(CallResult::done(Value::symbol(value.type_name())))
}

/// The current reference count of a heap-shared value, or nil for values
/// carried inline.
pub fn refs(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [value] = fixed(":refs", args, ARITY_ONE)?;
    let count = match value {
        Value::Sym(s) => Some(Rc::strong_count(s)),
        Value::List(Some(cell)) => Some(Rc::strong_count(cell)),
        Value::String(s) => Some(Rc::strong_count(s)),
        _ => None,
    };
    Ok(CallResult::done(match count {
        Some(count) => Value::Num(count as i64),
        None => Value::nil(),
    }))
}

/// A stable identity for a heap-shared value (its address), 0 for nil, the
/// implementation address for a builtin, or nil for inline values.
pub fn id(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [value] = fixed(":id", args, ARITY_ONE)?;
    let id = match value {
        Value::Sym(s) => Some(Rc::as_ptr(s) as usize),
        Value::List(Some(cell)) => Some(Rc::as_ptr(cell) as usize),
        Value::List(None) => Some(0),
        Value::String(s) => Some(Rc::as_ptr(s) as usize),
        Value::Builtin(b) => Some(b.run as usize),
        _ => None,
    };
    Ok(CallResult::done(match id {
        Some(id) => Value::Num(id as i64),
        None => Value::nil(),
    }))
}

/// Read a callable argument as a function view, or fail.
fn callable_view(function: &'static str, value: &Value) -> Result<CallableView, EvalError> {
    match value {
        Value::Builtin(b) => Ok(CallableView::Builtin(*b)),
        Value::List(Some(cell)) => match ListFn::from_list(cell) {
            Some(func) => Ok(CallableView::Function(func)),
            None => Err(EvalError::MalformedFunction(value.to_string())),
        },
        other => Err(EvalError::type_mismatch(function, "callable", other, 0)),
    }
}

enum CallableView {
    Builtin(crate::value::Builtin),
    Function(ListFn),
}

/// A callable's name as a symbol, or nil when it has none.
pub fn name(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [value] = fixed(":name", args, ARITY_ONE)?;
    Ok(CallResult::done(match callable_view(":name", value)? {
        CallableView::Builtin(b) => Value::symbol(b.name),
        CallableView::Function(func) => match func.name {
            Some(name) => Value::Sym(name),
            None => Value::nil(),
        },
    }))
}

/// A callable's docstring, or nil when it has none.
pub fn docs(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [value] = fixed(":docs", args, ARITY_ONE)?;
    Ok(CallResult::done(match callable_view(":docs", value)? {
        CallableView::Builtin(b) => Value::String(StrBuf::from_str(b.doc)),
        CallableView::Function(func) => match func.doc {
            Some(doc) => Value::String(doc),
            None => Value::nil(),
        },
    }))
}

/// T when the callable is a macro.
pub fn is_macro(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [value] = fixed(":macro?", args, ARITY_ONE)?;
    Ok(CallResult::done(match callable_view(":macro?", value)? {
        CallableView::Builtin(b) => Value::Bool(!b.eval_args),
        CallableView::Function(func) => Value::Bool(func.is_macro),
    }))
}

/// T when the value can be called: a builtin, or a list with the function
/// shape.
pub fn is_callable(_interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [value] = fixed(":callable?", args, ARITY_ONE)?;
    let callable = match value {
        Value::Builtin(_) => true,
        Value::List(Some(cell)) => is_function(cell),
        _ => false,
    };
    Ok(CallResult::done(Value::Bool(callable)))
}
