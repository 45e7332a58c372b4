//! Clockwork CLI: run a script file or start the REPL.

use std::env;
use std::fs;
use std::process;

use clockwork::error::ClockworkError;

mod repl;

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    match args.len() {
        0 => repl::Repl::new().run(),
        1 => process::exit(run_file(&args[0])),
        _ => eprintln!("Usage: clockwork <path>"),
    }
}

fn run_file(path: &str) -> i32 {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(_) => {
            eprintln!("Could not open file \"{}\".", path);
            return 1;
        }
    };

    match clockwork::Vm::new().interpret(&source) {
        Ok(()) => 0,
        Err(ClockworkError::Compile(_)) | Err(ClockworkError::Io(_)) => 1,
        Err(ClockworkError::Runtime(_)) => 2,
    }
}
