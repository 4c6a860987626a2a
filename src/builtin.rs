//! Built-in commands and their dispatch.
//!
//! Builtins are parsed with the [`argh`] crate (`FromArgs`); each one
//! validates its own argument shape and a violation is reported as a
//! usage error with a failure status and no state change. The same
//! [`dispatch`] entry point serves both execution contexts: directly
//! in the parent for a lone builtin command, and inside a forked
//! pipeline stage, where the mutated session copy dies with the child.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use argh::{EarlyExit, FromArgs};

use crate::external;
use crate::session::{Outcome, Session};

/// The fixed set of builtin command names.
pub const BUILTIN_NAMES: [&str; 7] =
    ["exit", "path", "cd", "which", "history", "alias", "unalias"];

/// Exact-match test against the builtin table.
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

/// A builtin known to the shell at compile time.
trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "alias".
    fn name() -> &'static str;

    /// Execute against the session, writing regular output to `stdout`.
    ///
    /// Errors are reported by the dispatcher and fold into a failure
    /// status; only `exit` produces a non-status outcome.
    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<Outcome>;
}

/// Run the builtin named by `argv[0]`.
pub fn dispatch(argv: &[String], session: &mut Session, stdout: &mut dyn Write) -> Outcome {
    let args: Vec<&str> = argv[1..].iter().map(String::as_str).collect();
    match argv[0].as_str() {
        "exit" => run::<Exit>(&args, session, stdout),
        "path" => run::<SearchPath>(&args, session, stdout),
        "cd" => run::<Cd>(&args, session, stdout),
        "which" => run::<Which>(&args, session, stdout),
        "history" => run::<History>(&args, session, stdout),
        "alias" => run::<Alias>(&args, session, stdout),
        "unalias" => run::<Unalias>(&args, session, stdout),
        other => {
            eprintln!("wsh: {other}: not a builtin");
            Outcome::Code(1)
        }
    }
}

fn run<T: BuiltinCommand>(args: &[&str], session: &mut Session, stdout: &mut dyn Write) -> Outcome {
    let cmd = match T::from_args(&[T::name()], args) {
        Ok(cmd) => cmd,
        // argh routes both usage errors and --help output here.
        Err(EarlyExit { output, status }) => {
            if status.is_err() {
                eprintln!("{}", output.trim_end());
                return Outcome::Code(1);
            }
            let _ = writeln!(stdout, "{}", output.trim_end());
            return Outcome::Code(0);
        }
    };
    match cmd.execute(stdout, session) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("wsh: {}: {e}", T::name());
            Outcome::Code(1)
        }
    }
}

#[derive(FromArgs)]
/// Leave the shell, keeping the status of the last completed command.
struct Exit {}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, _session: &mut Session) -> Result<Outcome> {
        Ok(Outcome::ExitRequest)
    }
}

#[derive(FromArgs)]
/// Print or replace the directory list used to find commands.
struct SearchPath {
    #[argh(positional)]
    /// replacement search path, directories separated by ':'
    value: Option<String>,
}

impl BuiltinCommand for SearchPath {
    fn name() -> &'static str {
        "path"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<Outcome> {
        match self.value {
            Some(value) => session.search_path = value,
            None => writeln!(stdout, "{}", session.search_path)?,
        }
        Ok(Outcome::Code(0))
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
struct Cd {
    #[argh(positional)]
    /// directory to switch to; defaults to the home directory
    target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, session: &mut Session) -> Result<Outcome> {
        let target = match self.target {
            Some(t) => PathBuf::from(t),
            None => match &session.home {
                Some(home) => home.clone(),
                None => anyhow::bail!("HOME not set"),
            },
        };
        std::env::set_current_dir(&target)
            .map_err(|e| anyhow::anyhow!("{}: {e}", target.display()))?;
        Ok(Outcome::Code(0))
    }
}

#[derive(FromArgs)]
/// Report how a command name would be interpreted.
struct Which {
    #[argh(positional)]
    /// command name to look up
    name: String,
}

impl BuiltinCommand for Which {
    fn name() -> &'static str {
        "which"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<Outcome> {
        let name = self.name.as_str();

        // Priority order: alias, then builtin, then executable lookup.
        if let Some(value) = session.aliases.get(name) {
            writeln!(stdout, "{name}: aliased to {value}")?;
            return Ok(Outcome::Code(0));
        }
        if is_builtin(name) {
            writeln!(stdout, "{name}: shell builtin")?;
            return Ok(Outcome::Code(0));
        }

        let resolved = if external::is_direct_path(name) {
            let path = Path::new(name);
            external::is_executable(path).then(|| path.to_path_buf())
        } else {
            external::find_in_path(name, &session.search_path).ok()
        };
        match resolved {
            Some(path) => {
                writeln!(stdout, "{name}: {}", path.display())?;
                Ok(Outcome::Code(0))
            }
            None => {
                writeln!(stdout, "{name}: not found")?;
                Ok(Outcome::Code(1))
            }
        }
    }
}

#[derive(FromArgs)]
/// Show previously executed command lines, oldest first.
struct History {
    #[argh(positional)]
    /// index (1-based) of a single entry to print
    entry: Option<String>,
}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<Outcome> {
        match self.entry {
            None => {
                for line in session.history.iter() {
                    writeln!(stdout, "{line}")?;
                }
            }
            Some(raw) => {
                let index: usize = raw
                    .parse()
                    .map_err(|_| anyhow::anyhow!("{raw}: invalid index"))?;
                let line = index
                    .checked_sub(1)
                    .and_then(|i| session.history.get(i))
                    .ok_or_else(|| anyhow::anyhow!("{raw}: no such entry"))?;
                writeln!(stdout, "{line}")?;
            }
        }
        Ok(Outcome::Code(0))
    }
}

#[derive(FromArgs)]
/// Define a command alias or list the current bindings.
struct Alias {
    #[argh(positional, greedy)]
    /// binding of the form `name = value...`; empty to list all
    binding: Vec<String>,
}

impl BuiltinCommand for Alias {
    fn name() -> &'static str {
        "alias"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<Outcome> {
        if self.binding.is_empty() {
            for (name, value) in session.aliases.iter() {
                writeln!(stdout, "{name} = {value}")?;
            }
            return Ok(Outcome::Code(0));
        }
        if self.binding.len() < 2 || self.binding[1] != "=" || self.binding[0].is_empty() {
            anyhow::bail!("expected `name = value`");
        }
        let value = self.binding[2..].join(" ");
        session.aliases.set(self.binding[0].clone(), value);
        Ok(Outcome::Code(0))
    }
}

#[derive(FromArgs)]
/// Remove a command alias.
struct Unalias {
    #[argh(positional)]
    /// alias name to remove; removing an unknown name is not an error
    name: String,
}

impl BuiltinCommand for Unalias {
    fn name() -> &'static str {
        "unalias"
    }

    fn execute(self, _stdout: &mut dyn Write, session: &mut Session) -> Result<Outcome> {
        if self.name.is_empty() {
            anyhow::bail!("expected an alias name");
        }
        session.aliases.remove(&self.name);
        Ok(Outcome::Code(0))
    }
}
