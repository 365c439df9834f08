// ABOUTME: Command-line driver: argument handling, preloads, script runner and REPL

use clap::Parser;
use rholisp::config;
use rholisp::eval::Interpreter;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::io::Write;
use std::path::{Path, PathBuf};

/// rholisp interpreter
#[derive(Parser, Debug)]
#[command(name = "rholisp")]
#[command(version = config::VERSION)]
#[command(about = "An interpreter for the rholisp language")]
struct CliArgs {
    /// Script file to run (starts the REPL when omitted)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Arguments handed to the program through the `args` binding
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    script_args: Vec<String>,

    /// Skip loading the standard prelude
    #[arg(long = "nostd")]
    nostd: bool,

    /// Run FILE before the script or REPL (can be repeated)
    #[arg(long = "preload", value_name = "FILE", action = clap::ArgAction::Append)]
    preloads: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Everything after a bare `--` belongs to the interpreted program, not
    // to us; clap would otherwise swallow the first token as the script.
    let mut raw: Vec<String> = std::env::args().collect();
    let mut passthrough: Vec<String> = Vec::new();
    if let Some(split) = raw.iter().position(|arg| arg == "--") {
        passthrough = raw.split_off(split + 1);
        raw.pop();
    }
    let cli = CliArgs::parse_from(raw);

    let mut interp = Interpreter::new();
    let mut script_args = cli.script_args.clone();
    script_args.extend(passthrough);
    match &cli.script {
        Some(path) => interp.bind_args(Some(&path.display().to_string()), &script_args),
        None => interp.bind_args(None, &script_args),
    }

    if !cli.nostd {
        run_source(&mut interp, config::PRELUDE.as_bytes(), "<prelude>");
    }
    for file in &cli.preloads {
        run_file(&mut interp, file);
    }

    match cli.script {
        Some(path) => {
            run_file(&mut interp, &path);
            Ok(())
        }
        None => repl(&mut interp),
    }
}

/// Evaluate a whole source buffer. A parse error here is fatal: report it
/// and exit 1.
fn run_source(interp: &mut Interpreter, src: &[u8], origin: &str) {
    if let Err(err) = interp.run(src) {
        eprintln!("{origin}: {err}");
        std::process::exit(1);
    }
}

fn run_file(interp: &mut Interpreter, path: &Path) {
    match std::fs::read(path) {
        Ok(src) => run_source(interp, &src, &path.display().to_string()),
        Err(err) => {
            eprintln!("error while processing file {}: {}", path.display(), err);
            std::process::exit(1);
        }
    }
}

/// The interactive loop: read a line, evaluate it, print the result's text
/// form. A parse error abandons the line; Ctrl-C clears it; Ctrl-D exits.
fn repl(interp: &mut Interpreter) -> Result<(), Box<dyn std::error::Error>> {
    let rl_config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(rl_config)?;
    let _ = rl.load_history(config::HISTORY_FILE);

    loop {
        match rl.readline(config::PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                match interp.run(line.as_bytes()) {
                    Ok(result) => {
                        let mut out = result.repr();
                        out.push(b'\n');
                        std::io::stdout().write_all(&out)?;
                    }
                    Err(err) => eprintln!("parse error: {err}"),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(config::HISTORY_FILE);
    Ok(())
}
