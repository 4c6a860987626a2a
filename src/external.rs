//! Classifying command names and resolving them to executables.
//!
//! A stage's first token is interpreted as one of: a builtin name, a
//! direct path (starts with `/` or `.`, used as given), or a bare name
//! looked up through the colon-delimited search path. Resolution runs
//! for every stage before any process is created, so a failure in a
//! late stage aborts the whole pipeline with nothing spawned.

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::builtin;

/// Why a command name failed to resolve. The two conditions are
/// distinct: an empty search path is reported once, without a
/// follow-up "not found".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("search path is empty")]
    NoSearchPath,
    #[error("{0}: command not found")]
    CommandNotFound(String),
}

/// How a stage will be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The name matches the builtin table; the dispatcher runs it.
    Builtin,
    /// An external program at a verified executable path.
    Program(PathBuf),
}

/// A name starting with `/` or `.` is used as a path verbatim, with no
/// search-path lookup.
pub fn is_direct_path(name: &str) -> bool {
    name.starts_with('/') || name.starts_with('.')
}

/// True when `path` names an executable regular file.
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = path.metadata() else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    unsafe { libc::access(c_path.as_ptr(), libc::X_OK) == 0 }
}

/// Search the colon-delimited `search_path` for the first executable
/// `<dir>/<name>`, in listed order. Empty directory components are
/// skipped.
pub fn find_in_path(name: &str, search_path: &str) -> Result<PathBuf, ResolveError> {
    if search_path.is_empty() {
        return Err(ResolveError::NoSearchPath);
    }
    for dir in search_path.split(':') {
        if dir.is_empty() {
            continue;
        }
        let candidate = Path::new(dir).join(name);
        if is_executable(&candidate) {
            return Ok(candidate);
        }
    }
    Err(ResolveError::CommandNotFound(name.to_string()))
}

/// Classify `name` and, for external commands, resolve it to an
/// executable path.
pub fn resolve(name: &str, search_path: &str) -> Result<Target, ResolveError> {
    if builtin::is_builtin(name) {
        return Ok(Target::Builtin);
    }
    if is_direct_path(name) {
        let path = Path::new(name);
        if is_executable(path) {
            Ok(Target::Program(path.to_path_buf()))
        } else {
            Err(ResolveError::CommandNotFound(name.to_string()))
        }
    } else {
        find_in_path(name, search_path).map(Target::Program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn touch_executable(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        File::create(&path).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn direct_path_prefixes() {
        assert!(is_direct_path("/bin/ls"));
        assert!(is_direct_path("./tool"));
        assert!(is_direct_path(".."));
        assert!(!is_direct_path("ls"));
        assert!(!is_direct_path(""));
    }

    #[test]
    fn finds_first_match_in_listed_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        touch_executable(&first, "tool");
        touch_executable(&second, "tool");

        let search = format!("{}:{}", first.path().display(), second.path().display());
        let found = find_in_path("tool", &search).unwrap();
        assert_eq!(found, first.path().join("tool"));
    }

    #[test]
    fn skips_non_executable_files() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let plain = first.path().join("tool");
        File::create(&plain).unwrap();
        fs::set_permissions(&plain, fs::Permissions::from_mode(0o644)).unwrap();
        touch_executable(&second, "tool");

        let search = format!("{}:{}", first.path().display(), second.path().display());
        let found = find_in_path("tool", &search).unwrap();
        assert_eq!(found, second.path().join("tool"));
    }

    #[test]
    fn directories_do_not_count_as_executables() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("tool")).unwrap();
        let search = dir.path().display().to_string();
        assert_eq!(
            find_in_path("tool", &search),
            Err(ResolveError::CommandNotFound("tool".to_string()))
        );
    }

    #[test]
    fn empty_search_path_is_its_own_condition() {
        assert_eq!(find_in_path("ls", ""), Err(ResolveError::NoSearchPath));
        // Empty components are skipped, not treated as an empty path.
        let dir = TempDir::new().unwrap();
        touch_executable(&dir, "tool");
        let search = format!(":{}:", dir.path().display());
        assert!(find_in_path("tool", &search).is_ok());
    }

    #[test]
    fn resolve_classifies_builtins_first() {
        assert_eq!(resolve("cd", ""), Ok(Target::Builtin));
        assert_eq!(resolve("history", ""), Ok(Target::Builtin));
    }

    #[test]
    fn resolve_checks_direct_paths_without_searching() {
        let dir = TempDir::new().unwrap();
        let tool = touch_executable(&dir, "tool");
        let direct = tool.display().to_string();
        assert_eq!(resolve(&direct, "").unwrap(), Target::Program(tool));

        let missing = dir.path().join("missing").display().to_string();
        assert_eq!(
            resolve(&missing, ""),
            Err(ResolveError::CommandNotFound(missing.clone()))
        );
    }

    #[test]
    fn resolve_searches_bare_names() {
        let dir = TempDir::new().unwrap();
        let tool = touch_executable(&dir, "tool");
        let search = dir.path().display().to_string();
        assert_eq!(resolve("tool", &search).unwrap(), Target::Program(tool));
        assert_eq!(
            resolve("other", &search),
            Err(ResolveError::CommandNotFound("other".to_string()))
        );
    }
}
