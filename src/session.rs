//! Session state shared across the read–execute loop.

use std::path::PathBuf;

use crate::alias::AliasTable;
use crate::history::History;

/// The single directory the search path starts out with.
pub const DEFAULT_SEARCH_PATH: &str = "/bin";

/// Conventional exit code: 0 for success, non-zero for failure.
pub type ExitCode = i32;

/// What executing one command line produced.
///
/// `ExitRequest` is the control signal raised by the `exit` builtin; it
/// is distinct from any status so the loop can stop without treating it
/// as the last command's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Code(ExitCode),
    ExitRequest,
}

/// Mutable interpreter state: alias table, history log, search path and
/// the status of the last completed command.
///
/// The session is owned by the read–execute loop and mutated only
/// between pipeline runs; forked pipeline stages see a copy and never
/// write back. Fields are public so builtins can reach the state they
/// operate on.
#[derive(Debug)]
pub struct Session {
    pub aliases: AliasTable,
    pub history: History,
    /// Colon-delimited directory list consulted for bare command names.
    /// Mutable only through the `path` builtin.
    pub search_path: String,
    /// Home directory captured at startup; `cd` with no argument goes
    /// here and fails when it is unset.
    pub home: Option<PathBuf>,
    pub last_status: ExitCode,
}

impl Session {
    pub fn new() -> Self {
        Self {
            aliases: AliasTable::new(),
            history: History::new(),
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            home: std::env::var_os("HOME").map(PathBuf::from),
            last_status: 0,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_default_search_path_and_success() {
        let session = Session::new();
        assert_eq!(session.search_path, DEFAULT_SEARCH_PATH);
        assert_eq!(session.last_status, 0);
        assert!(session.aliases.is_empty());
        assert!(session.history.is_empty());
    }
}
