// ABOUTME: The evaluator: trampolined dispatch, the call protocol and substitution

use crate::builtins;
use crate::builtins::files::Stream;
use crate::env::{Env, Frame};
use crate::error::{EvalError, SyntaxError};
use crate::parser::Reader;
use crate::value::{list_from_vec, list_iter, Builtin, List, ListCell, ListFn, Symbol, Value};
use std::rc::Rc;

/// What a call hands back to the evaluator: either a finished value, or a
/// form to evaluate in the caller's place (`re_eval`), optionally under a
/// freshly pushed scope that the caller must unwind (`scoped`).
#[derive(Debug)]
pub struct CallResult {
    pub value: Value,
    pub re_eval: bool,
    pub scoped: bool,
}

impl CallResult {
    pub fn done(value: Value) -> CallResult {
        CallResult {
            value,
            re_eval: false,
            scoped: false,
        }
    }

    pub fn again(value: Value) -> CallResult {
        CallResult {
            value,
            re_eval: true,
            scoped: false,
        }
    }

    pub fn again_scoped(value: Value) -> CallResult {
        CallResult {
            value,
            re_eval: true,
            scoped: true,
        }
    }
}

/// All interpreter state: the environment chain, the `_` register and the
/// table of open streams. Packaging it here keeps the evaluator embeddable;
/// nothing lives in process globals.
pub struct Interpreter {
    pub env: Env,
    last_res: Value,
    streams: Vec<Option<Stream>>,
}

impl Interpreter {
    /// A fresh interpreter with `nil`, the standard streams and an empty
    /// `args` list bound in the root environment.
    pub fn new() -> Interpreter {
        let mut interp = Interpreter {
            env: Env::new(),
            last_res: Value::nil(),
            streams: vec![
                Some(Stream::Stdin),
                Some(Stream::Stdout),
                Some(Stream::Stderr),
            ],
        };
        interp.env.define(Symbol::new("nil"), Value::nil());
        interp.env.define(Symbol::new("stdin"), file_value(0));
        interp.env.define(Symbol::new("stdout"), file_value(1));
        interp.env.define(Symbol::new("stderr"), file_value(2));
        interp.bind_args(None, &[]);
        interp
    }

    /// Bind `args`: the script name (or nil when there is none) followed by
    /// the positional arguments as strings.
    pub fn bind_args(&mut self, script: Option<&str>, rest: &[String]) {
        let mut items = vec![match script {
            Some(name) => Value::string(name),
            None => Value::nil(),
        }];
        items.extend(rest.iter().map(|arg| Value::string(arg)));
        self.env.define(Symbol::new("args"), Value::list(items));
    }

    /// The value `_` resolves to.
    pub fn last_result(&self) -> &Value {
        &self.last_res
    }

    /// Parse and evaluate every form in `src`, updating the `_` register
    /// after each one. Returns the final result.
    pub fn run(&mut self, src: &[u8]) -> Result<Value, SyntaxError> {
        for form in Reader::new(src) {
            let result = self.eval(&form?);
            self.last_res = result;
        }
        Ok(self.last_res.clone())
    }

    /// Reduce one value to its result. Evaluation errors are reported on
    /// stderr and yield nil; the session keeps going.
    ///
    /// The body is a trampoline: a call that answers `re_eval` feeds its
    /// value back into the dispatch instead of recursing, and the scopes it
    /// opened are unwound in one sweep when the loop delivers a result.
    /// Writing it this way is what makes the tail-call splice effective.
    pub fn eval(&mut self, expr: &Value) -> Value {
        let mut val = expr.clone();
        let mut scopes = 0usize;
        let mut tailcall = false;
        loop {
            let result = match &val {
                Value::Sym(s) if s.text() == "_" => self.last_res.clone(),
                Value::Sym(s) => {
                    if let Some(found) = self.env.lookup(s.text()) {
                        found.clone()
                    } else if let Some(builtin) = builtins::find(s.text()) {
                        Value::Builtin(builtin)
                    } else {
                        eprintln!("undefined symbol `{}`", s.text());
                        Value::nil()
                    }
                }
                Value::List(None) => val.clone(),
                Value::List(Some(cell)) => {
                    let cell = Rc::clone(cell);
                    // A literal () in head position quotes the argument
                    // list; this is how function literals are written:
                    // (() <params> <is-macro> <body>)
                    if matches!(cell.head, Value::List(None)) {
                        self.env.unwind(scopes);
                        return Value::List(cell.tail.clone());
                    }
                    let target = self.eval(&cell.head);
                    let outcome = match &target {
                        Value::Builtin(b) => self.call_builtin(*b, &cell.tail, false),
                        Value::List(Some(f)) => self.call_function(f, &cell.tail, tailcall, false),
                        other => {
                            eprintln!("error: tried calling value {other} as function");
                            Ok(CallResult::done(Value::nil()))
                        }
                    };
                    match outcome {
                        Ok(CallResult {
                            value,
                            re_eval: true,
                            scoped,
                        }) => {
                            if scoped {
                                scopes += 1;
                            }
                            val = value;
                            tailcall = true;
                            continue;
                        }
                        Ok(CallResult { value, .. }) => value,
                        Err(err) => {
                            eprintln!("error: {err}");
                            Value::nil()
                        }
                    }
                }
                other => other.clone(),
            };
            self.env.unwind(scopes);
            return result;
        }
    }

    /// Invoke a builtin. When it evaluates its arguments and they have not
    /// been pre-evaluated (the `call` path), each is reduced in order into a
    /// fresh list first.
    pub fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: &List,
        pre_evald: bool,
    ) -> Result<CallResult, EvalError> {
        if builtin.eval_args && !pre_evald {
            let evald: Vec<Value> = list_iter(args).map(|arg| self.eval(arg)).collect();
            (builtin.run)(self, &list_from_vec(evald))
        } else {
            (builtin.run)(self, args)
        }
    }

    /// Invoke a list-shaped function or macro.
    ///
    /// A macro binds its parameters to the unevaluated argument forms in a
    /// transient frame, substitutes that frame through the body, and hands
    /// the result back for re-evaluation; no scope is pushed.
    ///
    /// A function binds evaluated arguments into a fixed frame. When the
    /// call is in tail position and the innermost frame belongs to this very
    /// function, the new frame replaces it instead of stacking, which keeps
    /// self-recursion at constant environment depth.
    pub fn call_function(
        &mut self,
        function: &Rc<ListCell>,
        args: &List,
        tailcall: bool,
        pre_evald: bool,
    ) -> Result<CallResult, EvalError> {
        let func = match ListFn::from_list(function) {
            Some(func) => func,
            None => {
                let shown = Value::List(Some(Rc::clone(function)));
                return Err(EvalError::MalformedFunction(shown.to_string()));
            }
        };

        if func.is_macro {
            let mut frame = Frame::new(false);
            self.bind_params(&mut frame, &func.params, args, false);
            let body = substitute(&func.body, std::slice::from_ref(&frame));
            return Ok(CallResult::again(body));
        }

        // Decide the splice before binding: argument evaluation must see the
        // caller's frame, and the splice condition is about that same frame.
        let splice = tailcall && self.env.splices_with(function);
        let mut frame = Frame::for_call(Rc::clone(function));
        self.bind_params(&mut frame, &func.params, args, !pre_evald);
        if splice {
            self.env.replace_top(frame);
            Ok(CallResult::again(func.body))
        } else {
            self.env.push(frame);
            Ok(CallResult::again_scoped(func.body))
        }
    }

    /// Bind `params` against `args` into `frame`. With `eval_args` each
    /// consumed argument is reduced first; macros and pre-evaluated calls
    /// bind the forms verbatim. Arity mismatches are diagnosed but not
    /// fatal: missing positionals stay unbound, extras are dropped.
    fn bind_params(&mut self, frame: &mut Frame, params: &List, args: &List, eval_args: bool) {
        let mut params = params.clone();
        let mut args = args.clone();
        while let Some(param) = params {
            if let Value::List(_) = &param.head {
                // rest marker: the following symbol takes every remaining
                // argument as one list
                if let Some(rest_cell) = &param.tail {
                    if let Value::Sym(name) = &rest_cell.head {
                        let rest = if eval_args {
                            list_from_vec(list_iter(&args).map(|arg| self.eval(arg)).collect())
                        } else {
                            args.clone()
                        };
                        frame.define(Rc::clone(name), Value::List(rest));
                    }
                }
                args = None;
                break;
            }

            let name = match &param.head {
                Value::Sym(name) => Rc::clone(name),
                // unreachable once the shape has been validated
                _ => break,
            };
            match args.take() {
                None => {
                    eprintln!("not enough arguments provided!");
                    break;
                }
                Some(arg) => {
                    let value = if eval_args {
                        self.eval(&arg.head)
                    } else {
                        arg.head.clone()
                    };
                    frame.define(name, value);
                    args = arg.tail.clone();
                }
            }
            params = param.tail.clone();
        }
        if args.is_some() {
            eprintln!("too many arguments provided!");
        }
    }

    /// Register a stream, returning its handle.
    pub fn add_stream(&mut self, stream: Stream) -> usize {
        match self.streams.iter().position(Option::is_none) {
            Some(slot) => {
                self.streams[slot] = Some(stream);
                slot
            }
            None => {
                self.streams.push(Some(stream));
                self.streams.len() - 1
            }
        }
    }

    pub fn stream_mut(&mut self, handle: usize) -> Option<&mut Stream> {
        self.streams.get_mut(handle).and_then(Option::as_mut)
    }

    pub fn close_stream(&mut self, handle: usize) -> Option<Stream> {
        self.streams.get_mut(handle).and_then(Option::take)
    }
}

impl Default for Interpreter {
    fn default() -> Interpreter {
        Interpreter::new()
    }
}

/// Encode a stream handle as the `(file <handle>)` list the language sees.
pub fn file_value(handle: usize) -> Value {
    Value::list(vec![Value::symbol("file"), Value::Num(handle as i64)])
}

/// Replace every symbol that `frames` binds (innermost frame first) with its
/// bound value, rebuilding lists and cloning atoms. This one walk serves
/// macro expansion as well as the `subs` and `subs-with` builtins.
pub fn substitute(value: &Value, frames: &[Frame]) -> Value {
    match value {
        Value::Sym(s) => match frames.iter().rev().find_map(|f| f.lookup(s.text())) {
            Some(bound) => bound.clone(),
            None => value.clone(),
        },
        Value::List(list) => {
            let items: Vec<Value> = list_iter(list).map(|v| substitute(v, frames)).collect();
            Value::List(list_from_vec(items))
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> Value {
        Interpreter::new().run(src.as_bytes()).expect("parse")
    }

    #[test]
    fn test_atoms_self_evaluate() {
        assert_eq!(run("42"), Value::Num(42));
        assert_eq!(run("T"), Value::Bool(true));
        assert_eq!(run("\"s\""), Value::string("s"));
        assert_eq!(run("()"), Value::nil());
    }

    #[test]
    fn test_nil_binding_and_undefined_symbols() {
        assert_eq!(run("nil"), Value::nil());
        // an undefined symbol reports and yields nil, the session survives
        assert_eq!(run("no-such-thing 7"), Value::Num(7));
    }

    #[test]
    fn test_builtin_lookup_by_name() {
        assert_eq!(run("(+ 1 2 3)"), Value::Num(6));
        assert!(matches!(run("+"), Value::Builtin(b) if b.name == "+"));
    }

    #[test]
    fn test_nil_application_quotes_its_arguments() {
        assert_eq!(
            run("(() a 1)"),
            Value::list(vec![Value::symbol("a"), Value::Num(1)])
        );
        // only a literal () forms a list this way; a head that merely
        // evaluates to nil is an error like any other non-callable
        assert_eq!(run("(def empty nil) (empty 1 2)"), Value::nil());
        assert_eq!(run("(missing-function 1 2)"), Value::nil());
    }

    #[test]
    fn test_calling_a_number_reports_and_yields_nil() {
        assert_eq!(run("(1 2 3)"), Value::nil());
    }

    #[test]
    fn test_function_call_binds_parameters() {
        assert_eq!(run("(def inc (() (x) F (+ x 1))) (inc 41)"), Value::Num(42));
    }

    #[test]
    fn test_rest_parameters_collect_remaining_args() {
        assert_eq!(
            run("(def f (() (() xs) F (cons 0 xs))) (f 1 2 3)"),
            Value::list(vec![
                Value::Num(0),
                Value::Num(1),
                Value::Num(2),
                Value::Num(3),
            ])
        );
        assert_eq!(
            run("(def g (() (a () rest) F rest)) (g 1 2 3)"),
            Value::list(vec![Value::Num(2), Value::Num(3)])
        );
        assert_eq!(run("(def h (() (() xs) F xs)) (h)"), Value::nil());
    }

    #[test]
    fn test_arity_mismatch_is_not_fatal() {
        // missing parameters stay unbound; referencing one errors to nil,
        // and the session continues
        assert_eq!(run("(def f (() (a b) F b)) (f 1) (+ 2 2)"), Value::Num(4));
        // extra arguments are dropped
        assert_eq!(run("(def f (() (a) F a)) (f 1 2 3)"), Value::Num(1));
    }

    #[test]
    fn test_macro_substitutes_unevaluated_forms() {
        // the macro receives the form (+ 1 2), not 3
        assert_eq!(
            run("(def q (() (x) T (quote x))) (q (+ 1 2))"),
            Value::list(vec![Value::symbol("+"), Value::Num(1), Value::Num(2)])
        );
        // and its body re-evaluates after substitution
        assert_eq!(run("(def twice (() (x) T (+ x x))) (twice (+ 1 2))"), Value::Num(6));
    }

    #[test]
    fn test_last_result_register() {
        let mut interp = Interpreter::new();
        interp.run(b"(+ 20 22)").unwrap();
        assert_eq!(interp.run(b"_").unwrap(), Value::Num(42));
        assert_eq!(interp.run(b"(+ _ 0)").unwrap(), Value::Num(42));
    }

    #[test]
    fn test_tail_recursion_splices_frames() {
        let mut interp = Interpreter::new();
        let depth_before = interp.env.depth();
        let result = interp
            .run(
                b"(def n 0)
                  (def loop (() () F (if (cmp n 100000) (do (:= n (+ n 1)) (loop)) n)))
                  (loop)",
            )
            .unwrap();
        assert_eq!(result, Value::Num(100_000));
        assert_eq!(interp.env.depth(), depth_before);
    }

    #[test]
    fn test_def_inside_function_reaches_enclosing_scope() {
        assert_eq!(
            run("(def setter (() () F (def y 9))) (setter) y"),
            Value::Num(9)
        );
    }

    #[test]
    fn test_lookup_shadowing_through_assoc() {
        assert_eq!(run("(assoc (x 1) (assoc (x 2) x))"), Value::Num(2));
        assert_eq!(run("(assoc (x 1) (do (assoc (x 2) nil) x))"), Value::Num(1));
    }

    #[test]
    fn test_substitute_rebuilds_lists() {
        let mut frame = Frame::new(false);
        frame.define(Symbol::new("a"), Value::Num(10));
        let input = Value::list(vec![
            Value::symbol("+"),
            Value::symbol("a"),
            Value::list(vec![Value::symbol("a"), Value::symbol("b")]),
        ]);
        let output = substitute(&input, std::slice::from_ref(&frame));
        assert_eq!(
            output,
            Value::list(vec![
                Value::symbol("+"),
                Value::Num(10),
                Value::list(vec![Value::Num(10), Value::symbol("b")]),
            ])
        );
        // the original is untouched
        assert_eq!(
            input,
            Value::list(vec![
                Value::symbol("+"),
                Value::symbol("a"),
                Value::list(vec![Value::symbol("a"), Value::symbol("b")]),
            ])
        );
    }

    #[test]
    fn test_quote_identity() {
        assert_eq!(
            run("(quote (1 two \"three\"))"),
            Value::list(vec![Value::Num(1), Value::symbol("two"), Value::string("three")])
        );
        assert_eq!(run("(eval (quote (+ 1 2)))"), Value::Num(3));
    }

    #[test]
    fn test_environment_depth_restored_after_errors() {
        let mut interp = Interpreter::new();
        let depth = interp.env.depth();
        interp.run(b"(head 42)").unwrap();
        interp.run(b"(assoc (x 1) (head x))").unwrap();
        assert_eq!(interp.env.depth(), depth);
    }
}
