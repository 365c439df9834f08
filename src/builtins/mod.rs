//! # Built-in Functions Module
//!
//! The primitive library, organized by category. Each submodule implements
//! its builtins against the shared [`crate::value::NativeFn`] signature; the
//! [`BUILTINS`] table below ties names, `eval_args` flags and docstrings to
//! the implementations. The evaluator falls back to this table when a symbol
//! has no environment binding, so primitives can be shadowed by `def`.
//!
//! ## Categories
//!
//! - **[arithmetic]**: `+ - / % << >> ~ & | ^ cmp`
//! - **[lists]**: `list cons append head tail nth`
//! - **[control]**: `quote eval if do and or call exit truthy?`
//! - **[binding]**: `def := assoc env-new subs subs-with`
//! - **[strings]**: `pstr &$ []$ len$ repr parse`
//! - **[files]**: `open close read readline write`
//! - **[introspect]**: `type :refs :id :name :docs :macro? :callable?`

use crate::error::{EvalError, ARITY_AT_LEAST_ONE, ARITY_AT_LEAST_TWO};
use crate::value::{list_iter, Builtin, List, Value};

pub mod arithmetic;
pub mod binding;
pub mod control;
pub mod files;
pub mod introspect;
pub mod lists;
pub mod strings;

/// Look a builtin up by its textual name.
pub fn find(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|b| b.name == name).copied()
}

// ===== Shared argument accessors =====

/// Collect exactly `N` arguments, or fail with the given arity description.
pub(crate) fn fixed<'a, const N: usize>(
    function: &'static str,
    args: &'a List,
    expected: &'static str,
) -> Result<[&'a Value; N], EvalError> {
    let collected: Vec<&Value> = list_iter(args).collect();
    match <[&Value; N]>::try_from(collected) {
        Ok(array) => Ok(array),
        Err(collected) => Err(EvalError::arity(function, expected, collected.len())),
    }
}

/// Collect at least `min` arguments (only ever 1 or 2).
pub(crate) fn least<'a>(
    function: &'static str,
    args: &'a List,
    min: usize,
) -> Result<Vec<&'a Value>, EvalError> {
    let collected: Vec<&Value> = list_iter(args).collect();
    if collected.len() < min {
        let expected = if min <= 1 {
            ARITY_AT_LEAST_ONE
        } else {
            ARITY_AT_LEAST_TWO
        };
        return Err(EvalError::arity(function, expected, collected.len()));
    }
    Ok(collected)
}

pub(crate) fn as_num(
    function: &'static str,
    value: &Value,
    position: usize,
) -> Result<i64, EvalError> {
    match value {
        Value::Num(n) => Ok(*n),
        other => Err(EvalError::type_mismatch(function, "number", other, position)),
    }
}

pub(crate) fn as_list<'a>(
    function: &'static str,
    value: &'a Value,
    position: usize,
) -> Result<&'a crate::value::List, EvalError> {
    match value {
        Value::List(list) => Ok(list),
        other => Err(EvalError::type_mismatch(function, "list", other, position)),
    }
}

pub(crate) fn as_string<'a>(
    function: &'static str,
    value: &'a Value,
    position: usize,
) -> Result<&'a std::rc::Rc<crate::value::StrBuf>, EvalError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(EvalError::type_mismatch(function, "string", other, position)),
    }
}

/// A byte argument: a number in `0..256`.
pub(crate) fn as_byte(
    function: &'static str,
    value: &Value,
    position: usize,
) -> Result<u8, EvalError> {
    let n = as_num(function, value, position)?;
    u8::try_from(n).map_err(|_| {
        EvalError::runtime(function, format!("{n} is not a character code (0..256)"))
    })
}

/// The builtin table: name, implementation, `eval_args`, docstring. Scanned
/// linearly; order matches rough frequency of use.
pub static BUILTINS: &[Builtin] = &[
    Builtin {
        name: "+",
        run: arithmetic::add,
        eval_args: true,
        doc: "  num... -> the sum of the inputs",
    },
    Builtin {
        name: "-",
        run: arithmetic::sub,
        eval_args: true,
        doc: "  num -> the negation of the input\n  init num... -> all subsequent inputs subtracted from the first",
    },
    Builtin {
        name: "list",
        run: lists::list,
        eval_args: true,
        doc: "  (no arguments) -> nil\n  args... -> the list containing args as given\n  example: (list 1 2 (+ 3 4) (- 5)) -> (1 2 7 -5)",
    },
    Builtin {
        name: "cons",
        run: lists::cons,
        eval_args: true,
        doc: "  head tail -> prepends `head` to the list `tail`\n  example: (cons 42 nil) -> (42) ; (cons ' a '(b)) -> (a b)",
    },
    Builtin {
        name: "append",
        run: lists::append,
        eval_args: true,
        doc: "  list val -> appends `val` to `list`",
    },
    Builtin {
        name: "quote",
        run: control::quote,
        eval_args: false,
        doc: "  val -> returns the value as-is\n  used to represent values literally rather than evaluating them",
    },
    Builtin {
        name: "eval",
        run: control::eval,
        eval_args: true,
        doc: "  val -> evaluates the argument\n  note: (eval (quote <val>)) == <val>",
    },
    Builtin {
        name: "def",
        run: binding::def,
        eval_args: false,
        doc: "  name expr -> evaluates `expr` and defines the symbol `name` to point to the result",
    },
    Builtin {
        name: "assoc",
        run: binding::assoc,
        eval_args: false,
        doc: "  (name1 val1 name2 val2...) expr -> creates a new parameter-environment with each name associated with the result of evaluating the paired value, and evaluates `expr` in that environment",
    },
    Builtin {
        name: "env-new",
        run: binding::env_new,
        eval_args: false,
        doc: "  expr -> creates a new, empty environment and evaluates `expr` in that environment",
    },
    Builtin {
        name: ":=",
        run: binding::assign,
        eval_args: false,
        doc: "  name val -> finds the binding of `name` in this environment or a parent environment, and re-binds it to the result of evaluating `val`, also giving that as the result",
    },
    Builtin {
        name: "truthy?",
        run: control::truthy,
        eval_args: true,
        doc: "  val -> whether the val is considered truthy by `if`",
    },
    Builtin {
        name: "if",
        run: control::if_,
        eval_args: false,
        doc: "  cond then else -> if `cond` evaluates to T, runs `then`, otherwise runs `else`",
    },
    Builtin {
        name: "do",
        run: control::do_,
        eval_args: false,
        doc: "  val... -> evaluates each argument in turn, returning the result",
    },
    Builtin {
        name: "call",
        run: control::call,
        eval_args: true,
        doc: "  callable args -> call the callable with the given arguments; prevents re-evaluation of arguments by a function, and can be used to pass evaluated arguments to a macro",
    },
    Builtin {
        name: "pstr",
        run: strings::pstr,
        eval_args: true,
        doc: "  str -> prints the string to stdout, or ASCII character if the argument is a number",
    },
    Builtin {
        name: "head",
        run: lists::head,
        eval_args: true,
        doc: "  list -> the first element of the list",
    },
    Builtin {
        name: "tail",
        run: lists::tail,
        eval_args: true,
        doc: "  list -> the list without the first element",
    },
    Builtin {
        name: "nth",
        run: lists::nth,
        eval_args: true,
        doc: "  list n -> the nth element of the list",
    },
    Builtin {
        name: "subs",
        run: binding::subs,
        eval_args: true,
        doc: "  value -> substitutes any occurrence of a symbol in `value` which is defined in the current environment, with its associated value",
    },
    Builtin {
        name: "subs-with",
        run: binding::subs_with,
        eval_args: false,
        doc: "  (name1 val1 name2 val2...) body -> associates each name with the associated value as in (assoc), substitutes them through `body` as if with (subs), and evaluates the result",
    },
    Builtin {
        name: "/",
        run: arithmetic::div,
        eval_args: true,
        doc: "  a b... -> the first argument divided by each of the subsequent arguments in turn",
    },
    Builtin {
        name: "%",
        run: arithmetic::rem,
        eval_args: true,
        doc: "  a b -> a modulo b",
    },
    Builtin {
        name: "cmp",
        run: arithmetic::cmp,
        eval_args: true,
        doc: "  a b -> -1 if a<b, 0 if a==b, or 1 if a>b",
    },
    Builtin {
        name: "<<",
        run: arithmetic::shl,
        eval_args: true,
        doc: "  a b -> a left-shifted by b bits",
    },
    Builtin {
        name: ">>",
        run: arithmetic::shr,
        eval_args: true,
        doc: "  a b -> a right-shifted by b bits",
    },
    Builtin {
        name: "~",
        run: arithmetic::bnot,
        eval_args: true,
        doc: "  num -> bitwise negation",
    },
    Builtin {
        name: "&",
        run: arithmetic::band,
        eval_args: true,
        doc: "  a b -> bitwise and",
    },
    Builtin {
        name: "|",
        run: arithmetic::bor,
        eval_args: true,
        doc: "  a b -> bitwise or",
    },
    Builtin {
        name: "^",
        run: arithmetic::bxor,
        eval_args: true,
        doc: "  a b -> bitwise exclusive or",
    },
    Builtin {
        name: "and",
        run: control::and,
        eval_args: false,
        doc: "  a b... -> evaluates each of its arguments in turn, returning the first falsey argument (leaving the rest unevaluated) or otherwise the last argument",
    },
    Builtin {
        name: "or",
        run: control::or,
        eval_args: false,
        doc: "  a b... -> evaluates each of its arguments in turn, returning the first truthy argument (leaving the rest unevaluated) or otherwise the last argument",
    },
    Builtin {
        name: "type",
        run: introspect::type_,
        eval_args: true,
        doc: "  val -> the type of the value, as a symbol (number, builtin, symbol, list, boolean, string)",
    },
    Builtin {
        name: "exit",
        run: control::exit,
        eval_args: true,
        doc: "  (no arguments) -> exits the program with exit code 0\n  exitcode -> exits the program with the specified exit code",
    },
    Builtin {
        name: "&$",
        run: strings::join,
        eval_args: true,
        doc: "  args... -> joins all its arguments into one string, which should be strings, or numbers interpreted as characters",
    },
    Builtin {
        name: "[]$",
        run: strings::index,
        eval_args: true,
        doc: "  str idx -> the character at index `idx` (a number)\n  str start stop -> the substring with first character at index `start` and last character just preceding index `stop`",
    },
    Builtin {
        name: ":refs",
        run: introspect::refs,
        eval_args: true,
        doc: "  val -> the number of references a garbage-collected value (strings, symbols, or lists) has, or nil",
    },
    Builtin {
        name: ":id",
        run: introspect::id,
        eval_args: true,
        doc: "  val -> the unique id (memory location) of a garbage-collected value (strings, symbols, or lists), or nil",
    },
    Builtin {
        name: "repr",
        run: strings::repr,
        eval_args: true,
        doc: "  val -> the string representation of the given value, such that (nth (parse (repr <val>)) 1) == <val>",
    },
    Builtin {
        name: "parse",
        run: strings::parse,
        eval_args: true,
        doc: "  str -> attempts to parse a lisp value from a string, giving (rest-of-string value) on success, or just (rest-of-string) on failure",
    },
    Builtin {
        name: "open",
        run: files::open,
        eval_args: true,
        doc: "  filename mode -> opens the given file with the given mode, giving a file object",
    },
    Builtin {
        name: "close",
        run: files::close,
        eval_args: true,
        doc: "  file -> closes the specified file",
    },
    Builtin {
        name: "readline",
        run: files::readline,
        eval_args: true,
        doc: "  file -> a line of text from the file, without the trailing newline, or nil on eof",
    },
    Builtin {
        name: "read",
        run: files::read,
        eval_args: true,
        doc: "  file -> the contents of the file as a string",
    },
    Builtin {
        name: "write",
        run: files::write,
        eval_args: true,
        doc: "  file data -> write the data to the file, the data being a string or a number interpreted as a character",
    },
    Builtin {
        name: ":name",
        run: introspect::name,
        eval_args: true,
        doc: "  callable -> a callable's name, or nil if it doesn't have one",
    },
    Builtin {
        name: ":docs",
        run: introspect::docs,
        eval_args: true,
        doc: "  callable -> a callable's docstring, or nil if it doesn't have one",
    },
    Builtin {
        name: ":macro?",
        run: introspect::is_macro,
        eval_args: true,
        doc: "  callable -> T if the callable is a macro, F if it is a function",
    },
    Builtin {
        name: ":callable?",
        run: introspect::is_callable,
        eval_args: true,
        doc: "  val -> T if the value is a callable (builtin or correctly-structured list), F otherwise",
    },
    Builtin {
        name: "len$",
        run: strings::len,
        eval_args: true,
        doc: "  string -> the length of the string",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_name() {
        assert!(find("+").is_some());
        assert!(find(":callable?").is_some());
        assert!(find("no-such-builtin").is_none());
    }

    #[test]
    fn test_table_names_are_unique() {
        for (i, a) in BUILTINS.iter().enumerate() {
            for b in &BUILTINS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_every_builtin_is_documented() {
        for b in BUILTINS {
            assert!(!b.doc.is_empty(), "{} has no docstring", b.name);
        }
    }

    #[test]
    fn test_eval_args_flags() {
        // the builtin macros are exactly these
        let macros: Vec<&str> = BUILTINS
            .iter()
            .filter(|b| !b.eval_args)
            .map(|b| b.name)
            .collect();
        assert_eq!(
            macros,
            ["quote", "def", "assoc", "env-new", ":=", "if", "do", "subs-with", "and", "or"]
        );
    }
}
