//! Interactive read-evaluate-print loop.

use std::path::PathBuf;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use clockwork::Vm;

const HISTORY_FILE: &str = ".clockwork_history";

pub struct Repl {
    vm: Vm,
    history_file: PathBuf,
}

impl Repl {
    pub fn new() -> Self {
        Self {
            vm: Vm::new(),
            history_file: Self::history_path(),
        }
    }

    fn history_path() -> PathBuf {
        match dirs::home_dir() {
            Some(home) => home.join(HISTORY_FILE),
            None => PathBuf::from(HISTORY_FILE),
        }
    }

    /// Read lines until end of input. One VM for the whole session, so
    /// globals and interned strings persist across lines; per-line results
    /// are discarded (diagnostics were already printed).
    pub fn run(&mut self) {
        let mut rl = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(_) => {
                self.run_basic();
                return;
            }
        };
        let _ = rl.load_history(&self.history_file);

        loop {
            match rl.readline("> ") {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(line.as_str());
                    let _ = self.vm.interpret(&line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error: {}", err);
                    break;
                }
            }
        }
        let _ = rl.save_history(&self.history_file);
    }

    /// Plain stdin fallback when no terminal editor is available.
    fn run_basic(&mut self) {
        use std::io::{BufRead, Write};

        let stdin = std::io::stdin();
        loop {
            print!("> ");
            let _ = std::io::stdout().flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) => {
                    println!();
                    break;
                }
                Ok(_) => {
                    let _ = self.vm.interpret(&line);
                }
                Err(err) => {
                    eprintln!("Error: {}", err);
                    break;
                }
            }
        }
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}
