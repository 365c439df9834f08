// ABOUTME: Error types for the reader and the evaluator

use crate::value::Value;
use thiserror::Error;

// ===== Arity constant strings (shared by the builtin argument checks) =====
pub const ARITY_ONE: &str = "1";
pub const ARITY_TWO: &str = "2";
pub const ARITY_ONE_OR_TWO: &str = "1-2";
pub const ARITY_TWO_OR_THREE: &str = "2-3";
pub const ARITY_ZERO_OR_ONE: &str = "0-1";
pub const ARITY_AT_LEAST_ONE: &str = "at least 1";
pub const ARITY_AT_LEAST_TWO: &str = "at least 2";

/// Reader errors. These are fatal to the parse in progress: script execution
/// aborts the process, the REPL abandons the offending line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("expected value, got end of input")]
    UnexpectedEof,

    #[error("expected value or `)`, got end of input")]
    UnterminatedList,

    #[error("unexpected end of input while reading string")]
    UnterminatedString,

    #[error("unexpected end of input while reading character")]
    UnterminatedChar,

    #[error("unrecognised escape code `\\{}`", *.0 as char)]
    UnknownEscape(u8),

    #[error("malformed expression")]
    Malformed,
}

impl<'a> nom::error::ParseError<&'a [u8]> for SyntaxError {
    fn from_error_kind(_input: &'a [u8], _kind: nom::error::ErrorKind) -> Self {
        SyntaxError::Malformed
    }

    fn append(_input: &'a [u8], _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

/// Evaluation errors. The evaluator writes these to stderr and yields nil,
/// so a failed form never kills the session.
#[derive(Error, Debug, Clone)]
pub enum EvalError {
    /// Type mismatch with the builtin name, expected type, actual type, and
    /// argument position
    #[error("{function}: expected {expected}, got {actual} at argument {position}")]
    TypeMismatch {
        function: &'static str,
        expected: &'static str,
        actual: &'static str,
        position: usize,
    },

    /// Arity error with the builtin name, expected count or range, and
    /// actual count
    #[error("{function}: expected {expected} argument(s), got {actual}")]
    Arity {
        function: &'static str,
        expected: &'static str,
        actual: usize,
    },

    /// Runtime error with builtin context
    #[error("{function}: {message}")]
    Runtime {
        function: &'static str,
        message: String,
    },

    #[error("`:=` of unbound symbol `{0}`")]
    UnboundAssign(String),

    #[error("value {0} does not have the function shape")]
    MalformedFunction(String),
}

impl EvalError {
    /// Create a type mismatch error with full context
    pub fn type_mismatch(
        function: &'static str,
        expected: &'static str,
        actual: &Value,
        position: usize,
    ) -> Self {
        EvalError::TypeMismatch {
            function,
            expected,
            actual: actual.type_name(),
            position,
        }
    }

    /// Create an arity error with expected and actual counts
    pub fn arity(function: &'static str, expected: &'static str, actual: usize) -> Self {
        EvalError::Arity {
            function,
            expected,
            actual,
        }
    }

    /// Create a runtime error with builtin context
    pub fn runtime(function: &'static str, message: impl Into<String>) -> Self {
        EvalError::Runtime {
            function,
            message: message.into(),
        }
    }
}
