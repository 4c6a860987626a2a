//! The read–execute loop: interactive prompt and batch script modes.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::executor;
use crate::lexer;
use crate::parser;
use crate::session::{ExitCode, Outcome, Session};

/// Printed before each interactive read.
pub const PROMPT: &str = "wsh> ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Exit,
}

/// The shell's read–execute loop over a [`Session`].
///
/// Lines move through Reading → Tokenized → Executing → Recording:
/// blank lines and tokenizer errors fall straight back to Reading,
/// executed lines are appended to history and update the last status,
/// and the `exit` builtin's request ends the loop without recording
/// its own line or touching the status.
pub struct Interpreter {
    session: Session,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            session: Session::new(),
        }
    }

    /// Status of the last completed command, reported as the process
    /// exit code.
    pub fn last_status(&self) -> ExitCode {
        self.session.last_status
    }

    fn eval_line(&mut self, line: &str) -> Step {
        let tokens = match lexer::tokenize(line) {
            Ok(tokens) => tokens,
            Err(e) => {
                // The line produced zero stages: report it, keep the
                // last status, record nothing.
                eprintln!("wsh: {e}");
                return Step::Continue;
            }
        };
        if tokens.is_empty() {
            return Step::Continue;
        }

        let outcome = match parser::parse(tokens) {
            Ok(pipeline) => executor::run(&mut self.session, pipeline),
            Err(e) => {
                eprintln!("wsh: {e}");
                Outcome::Code(1)
            }
        };

        match outcome {
            Outcome::ExitRequest => Step::Exit,
            Outcome::Code(code) => {
                self.session.last_status = code;
                self.session.history.record(line);
                Step::Continue
            }
        }
    }

    /// Interactive mode: prompt, read and execute until end of input
    /// or an exit request.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()?;
        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let _ = rl.add_history_entry(line.as_str());
                    if self.eval_line(&line) == Step::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Batch mode: execute each line of `script` in order.
    pub fn run_script(&mut self, script: &Path) -> anyhow::Result<()> {
        let file = File::open(script).with_context(|| script.display().to_string())?;
        for line in BufReader::new(file).lines() {
            let line = line.with_context(|| script.display().to_string())?;
            if self.eval_line(&line) == Step::Exit {
                break;
            }
        }
        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Only lines handled without forking are evaluated here; process
    // spawning is covered by the batch-mode tests against the binary.

    #[test]
    fn blank_lines_are_not_recorded() {
        let mut interpreter = Interpreter::new();
        assert_eq!(interpreter.eval_line(""), Step::Continue);
        assert_eq!(interpreter.eval_line("   \t "), Step::Continue);
        assert!(interpreter.session.history.is_empty());
        assert_eq!(interpreter.last_status(), 0);
    }

    #[test]
    fn unclosed_quote_keeps_status_and_history() {
        let mut interpreter = Interpreter::new();
        assert_eq!(interpreter.eval_line("echo 'oops"), Step::Continue);
        assert_eq!(interpreter.last_status(), 0);
        assert!(interpreter.session.history.is_empty());
    }

    #[test]
    fn empty_pipeline_segment_fails_and_is_recorded() {
        let mut interpreter = Interpreter::new();
        assert_eq!(interpreter.eval_line("alias a | | alias b"), Step::Continue);
        assert_eq!(interpreter.last_status(), 1);
        assert_eq!(interpreter.session.history.len(), 1);
        assert_eq!(interpreter.session.history.get(0), Some("alias a | | alias b"));
    }

    #[test]
    fn executed_lines_are_recorded_with_status() {
        let mut interpreter = Interpreter::new();
        assert_eq!(interpreter.eval_line("alias ll = echo hi"), Step::Continue);
        assert_eq!(interpreter.last_status(), 0);
        assert_eq!(interpreter.session.aliases.get("ll"), Some("echo hi"));
        assert_eq!(interpreter.session.history.get(0), Some("alias ll = echo hi"));

        // A failing builtin is still recorded, with a failure status.
        assert_eq!(interpreter.eval_line("alias broken"), Step::Continue);
        assert_eq!(interpreter.last_status(), 1);
        assert_eq!(interpreter.session.history.len(), 2);
    }

    #[test]
    fn exit_stops_the_loop_without_recording() {
        let mut interpreter = Interpreter::new();
        assert_eq!(interpreter.eval_line("alias ll = echo hi"), Step::Continue);
        assert_eq!(interpreter.eval_line("exit"), Step::Exit);
        // The exit line itself is absent and the status is untouched.
        assert_eq!(interpreter.session.history.len(), 1);
        assert_eq!(interpreter.last_status(), 0);
    }

    #[test]
    fn exit_with_arguments_keeps_the_loop_running() {
        let mut interpreter = Interpreter::new();
        assert_eq!(interpreter.eval_line("exit now"), Step::Continue);
        assert_eq!(interpreter.last_status(), 1);
        assert_eq!(interpreter.session.history.len(), 1);
    }
}
