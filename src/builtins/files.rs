//! File handles: `open close read readline write`
//!
//! The language sees a file as the opaque list `(file <handle>)`, where the
//! handle indexes the interpreter's stream table. Handles 0, 1 and 2 are
//! the standard streams and exist from startup. Host I/O failures are
//! fatal: a perror-style message on stderr, then exit 1.

use super::fixed;
use crate::error::{EvalError, ARITY_ONE, ARITY_TWO};
use crate::eval::{CallResult, Interpreter};
use crate::value::{List, StrBuf, Value};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};

/// One entry in the interpreter's stream table.
pub enum Stream {
    Stdin,
    Stdout,
    Stderr,
    Handle(File),
}

impl Stream {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        let got = match self {
            Stream::Stdin => io::stdin().lock().read(&mut byte)?,
            Stream::Handle(file) => file.read(&mut byte)?,
            _ => return Err(not_readable()),
        };
        Ok((got == 1).then(|| byte[0]))
    }

    fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        match self {
            Stream::Stdin => io::stdin().lock().read_to_end(buf),
            Stream::Handle(file) => file.read_to_end(buf),
            _ => Err(not_readable()),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Stream::Stdout => io::stdout().write_all(bytes),
            Stream::Stderr => io::stderr().write_all(bytes),
            Stream::Handle(file) => file.write_all(bytes),
            Stream::Stdin => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "stream is not writable",
            )),
        }
    }
}

fn not_readable() -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, "stream is not readable")
}

fn io_fatal(context: &str, err: io::Error) -> ! {
    eprintln!("error while processing file {context}: {err}");
    std::process::exit(1);
}

/// Decode a `(file <handle>)` value into its handle.
fn handle_of(function: &'static str, value: &Value) -> Result<usize, EvalError> {
    let shape = || EvalError::type_mismatch(function, "file", value, 0);
    let cell = match value {
        Value::List(Some(cell)) => cell,
        _ => return Err(shape()),
    };
    match &cell.head {
        Value::Sym(s) if s.text() == "file" => {}
        _ => return Err(shape()),
    }
    let num_cell = cell.tail.as_deref().ok_or_else(shape)?;
    if num_cell.tail.is_some() {
        return Err(shape());
    }
    match num_cell.head {
        Value::Num(handle) => usize::try_from(handle).map_err(|_| shape()),
        _ => Err(shape()),
    }
}

/// A filename or mode argument: a string or a bare symbol.
fn text_arg(function: &'static str, value: &Value, position: usize) -> Result<String, EvalError> {
    match value {
        Value::String(s) => Ok(String::from_utf8_lossy(s.as_bytes()).into_owned()),
        Value::Sym(s) => Ok(s.text().to_string()),
        other => Err(EvalError::type_mismatch(function, "string", other, position)),
    }
}

/// Translate an fopen-style mode string into open options.
fn open_options(mode: &str) -> Option<OpenOptions> {
    let mut options = OpenOptions::new();
    let update = mode.contains('+');
    match mode.chars().next()? {
        'r' => {
            options.read(true);
            if update {
                options.write(true);
            }
        }
        'w' => {
            options.write(true).create(true).truncate(true);
            if update {
                options.read(true);
            }
        }
        'a' => {
            options.append(true).create(true);
            if update {
                options.read(true);
            }
        }
        _ => return None,
    }
    Some(options)
}

/// Opens a file, registering it in the stream table. Failure to open is a
/// host error and aborts.
pub fn open(interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [name, mode] = fixed("open", args, ARITY_TWO)?;
    let name = text_arg("open", name, 0)?;
    let mode = text_arg("open", mode, 1)?;

    let options = match open_options(&mode) {
        Some(options) => options,
        None => {
            return Err(EvalError::runtime(
                "open",
                format!("unsupported mode `{mode}`"),
            ))
        }
    };
    match options.open(&name) {
        Ok(file) => {
            let handle = interp.add_stream(Stream::Handle(file));
            Ok(CallResult::done(crate::eval::file_value(handle)))
        }
        Err(err) => io_fatal(&name, err),
    }
}

/// Closes a file, dropping its table entry. Closing an already closed
/// handle is an error.
pub fn close(interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [file] = fixed("close", args, ARITY_ONE)?;
    let handle = handle_of("close", file)?;
    match interp.close_stream(handle) {
        Some(_) => Ok(CallResult::done(Value::nil())),
        None => Err(EvalError::runtime(
            "close",
            format!("handle {handle} is not open"),
        )),
    }
}

/// Reads one line, without its newline. At end of input with nothing read,
/// gives nil.
pub fn readline(interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [file] = fixed("readline", args, ARITY_ONE)?;
    let handle = handle_of("readline", file)?;
    let stream = interp
        .stream_mut(handle)
        .ok_or_else(|| EvalError::runtime("readline", format!("handle {handle} is not open")))?;

    let mut line = Vec::new();
    loop {
        match stream.read_byte() {
            Ok(Some(b'\n')) => break,
            Ok(Some(byte)) => line.push(byte),
            Ok(None) => {
                if line.is_empty() {
                    return Ok(CallResult::done(Value::nil()));
                }
                break;
            }
            Err(err) if err.kind() == io::ErrorKind::Unsupported => {
                return Err(EvalError::runtime("readline", err.to_string()))
            }
            Err(err) => io_fatal("", err),
        }
    }
    Ok(CallResult::done(Value::String(StrBuf::from_bytes(line))))
}

/// Reads the rest of the file as one string.
pub fn read(interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [file] = fixed("read", args, ARITY_ONE)?;
    let handle = handle_of("read", file)?;
    let stream = interp
        .stream_mut(handle)
        .ok_or_else(|| EvalError::runtime("read", format!("handle {handle} is not open")))?;

    let mut contents = Vec::new();
    match stream.read_to_end(&mut contents) {
        Ok(_) => Ok(CallResult::done(Value::String(StrBuf::from_bytes(
            contents,
        )))),
        Err(err) if err.kind() == io::ErrorKind::Unsupported => {
            Err(EvalError::runtime("read", err.to_string()))
        }
        Err(err) => io_fatal("", err),
    }
}

/// Writes a string, or a single character given as its byte code.
pub fn write(interp: &mut Interpreter, args: &List) -> Result<CallResult, EvalError> {
    let [file, data] = fixed("write", args, ARITY_TWO)?;
    let handle = handle_of("write", file)?;
    let bytes = match data {
        Value::String(s) => s.as_bytes().to_vec(),
        other => vec![super::as_byte("write", other, 1)?],
    };
    let stream = interp
        .stream_mut(handle)
        .ok_or_else(|| EvalError::runtime("write", format!("handle {handle} is not open")))?;

    match stream.write_all(&bytes) {
        Ok(()) => Ok(CallResult::done(Value::nil())),
        Err(err) if err.kind() == io::ErrorKind::Unsupported => {
            Err(EvalError::runtime("write", err.to_string()))
        }
        Err(err) => io_fatal("", err),
    }
}

#[cfg(test)]
mod tests {
    use crate::eval::Interpreter;
    use crate::value::Value;
    use std::path::PathBuf;

    fn run(src: &str) -> Value {
        Interpreter::new().run(src.as_bytes()).expect("parse")
    }

    fn scratch_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("rholisp-{}-{name}", std::process::id()));
        path
    }

    #[test]
    fn test_std_streams_are_bound() {
        assert_eq!(run("stdin"), run("(list ' file 0)"));
        assert_eq!(run("stdout"), run("(list ' file 1)"));
        assert_eq!(run("stderr"), run("(list ' file 2)"));
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let path = scratch_path("round-trip");
        let path_str = path.display().to_string();
        let src = format!(
            r#"(def f (open "{path_str}" "w"))
               (write f "line one")
               (write f 10)
               (write f "line two")
               (close f)
               (def g (open "{path_str}" "r"))
               (def contents (read g))
               (close g)
               contents"#
        );
        assert_eq!(run(&src), Value::string("line one\nline two"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_readline_strips_newline_and_ends_with_nil() {
        let path = scratch_path("readline");
        std::fs::write(&path, "alpha\nbeta\n").unwrap();
        let path_str = path.display().to_string();
        let src = format!(
            r#"(def f (open "{path_str}" "r"))
               (def result (list (readline f) (readline f) (readline f)))
               (close f)
               result"#
        );
        assert_eq!(
            run(&src),
            Value::list(vec![
                Value::string("alpha"),
                Value::string("beta"),
                Value::nil(),
            ])
        );
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_close_twice_reports() {
        let path = scratch_path("close-twice");
        std::fs::write(&path, "").unwrap();
        let path_str = path.display().to_string();
        let src = format!(
            r#"(def f (open "{path_str}" "r"))
               (close f)
               (close f)
               7"#
        );
        assert_eq!(run(&src), Value::Num(7));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_bad_file_shapes_report() {
        assert_eq!(run("(read 42) 1"), Value::Num(1));
        assert_eq!(run("(read (list ' file)) 1"), Value::Num(1));
        assert_eq!(run("(write (list ' file 99) \"x\") 1"), Value::Num(1));
    }

    #[test]
    fn test_writing_to_stdin_reports() {
        assert_eq!(run("(write stdin \"x\") 5"), Value::Num(5));
    }
}
