// ABOUTME: Interpreter constants: version, REPL strings and the embedded prelude

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const PROMPT: &str = "> ";
pub const HISTORY_FILE: &str = ".rholisp_history";

/// The standard prelude, written in the language itself. Loaded into the
/// root environment before any preload, script or REPL line unless the user
/// passes `--nostd`.
pub const PRELUDE: &str = include_str!("stdlib/std.lisp");
