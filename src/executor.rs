//! Pipeline orchestration: alias expansion per stage, up-front
//! resolution, pipe/fork wiring and status collection.
//!
//! A lone builtin command runs directly in the parent so that
//! state-changing builtins (`cd`, `path`, `alias`, `exit`) affect the
//! session. Everything else executes in forked children: stage i reads
//! from pipe i-1 and writes to pipe i, and a builtin that appears in
//! the middle of a pipeline runs in its own child against a copy of
//! the session, so its effects are scoped to that stage. The parent
//! closes its pipe ends after the spawn loop and waits for every
//! child; the reported status is the last stage's alone.

use std::ffi::CString;
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::alias;
use crate::builtin;
use crate::external::{self, Target};
use crate::parser::{ParseError, Pipeline};
use crate::session::{Outcome, Session};

/// One stage with its expanded argument list and resolved target.
struct Stage {
    argv: Vec<String>,
    target: Target,
}

/// Execute a parsed pipeline and report its outcome.
pub fn run(session: &mut Session, pipeline: Pipeline) -> Outcome {
    // Expand each stage independently, against its own original
    // leading token.
    let mut expanded = Vec::with_capacity(pipeline.stages.len());
    for stage in &pipeline.stages {
        match alias::expand_leading(stage, &session.aliases) {
            Ok(argv) => expanded.push(argv),
            Err(e) => {
                eprintln!("wsh: {e}");
                return Outcome::Code(1);
            }
        }
    }

    // An alias with an empty value can erase a lone command entirely.
    if expanded.is_empty() || (expanded.len() == 1 && expanded[0].is_empty()) {
        return Outcome::Code(0);
    }

    // The single-stage builtin case runs in-process; this is the only
    // place a builtin may mutate the session.
    if expanded.len() == 1 && builtin::is_builtin(&expanded[0][0]) {
        return builtin::dispatch(&expanded[0], session, &mut io::stdout());
    }

    // Resolve every stage before creating any resource, so a failure
    // in any stage aborts the pipeline with nothing spawned.
    let mut stages = Vec::with_capacity(expanded.len());
    for argv in expanded {
        if argv.is_empty() {
            eprintln!("wsh: {}", ParseError::EmptyPipelineSegment);
            return Outcome::Code(1);
        }
        match external::resolve(&argv[0], &session.search_path) {
            Ok(target) => stages.push(Stage { argv, target }),
            Err(e) => {
                eprintln!("wsh: {e}");
                return Outcome::Code(1);
            }
        }
    }

    spawn_stages(session, &stages)
}

/// Everything a forked child needs, prepared before the fork.
enum Prepared {
    Builtin,
    Program(ExecArgv),
}

/// NULL-terminated argv for `execv`, with the backing strings kept
/// alive for as long as the pointers are.
struct ExecArgv {
    path: CString,
    _args: Vec<CString>,
    ptrs: Vec<*const libc::c_char>,
}

impl ExecArgv {
    fn new(path: &Path, argv: &[String]) -> Self {
        let path = CString::new(path.as_os_str().as_bytes()).unwrap_or_default();
        let args: Vec<CString> = argv
            .iter()
            .map(|arg| CString::new(arg.as_str()).unwrap_or_default())
            .collect();
        let mut ptrs: Vec<*const libc::c_char> = args.iter().map(|arg| arg.as_ptr()).collect();
        ptrs.push(std::ptr::null());
        Self {
            path,
            _args: args,
            ptrs,
        }
    }
}

fn close_pipes(pipes: &[[libc::c_int; 2]]) {
    for fds in pipes {
        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
    }
}

fn spawn_stages(session: &mut Session, stages: &[Stage]) -> Outcome {
    let n = stages.len();

    // Anything buffered on stdout would otherwise be replayed by every
    // child.
    let _ = io::stdout().flush();

    let mut pipes: Vec<[libc::c_int; 2]> = Vec::with_capacity(n - 1);
    for _ in 1..n {
        let mut fds = [-1; 2];
        if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
            eprintln!("wsh: pipe: {}", io::Error::last_os_error());
            close_pipes(&pipes);
            return Outcome::Code(1);
        }
        pipes.push(fds);
    }

    // argv CStrings are built before forking so children do not
    // allocate between fork and exec.
    let prepared: Vec<Prepared> = stages
        .iter()
        .map(|stage| match &stage.target {
            Target::Builtin => Prepared::Builtin,
            Target::Program(path) => Prepared::Program(ExecArgv::new(path, &stage.argv)),
        })
        .collect();

    let mut pids: Vec<libc::pid_t> = Vec::with_capacity(n);
    let mut spawn_failed = false;

    for (i, stage) in stages.iter().enumerate() {
        let pid = unsafe { libc::fork() };
        if pid < 0 {
            eprintln!("wsh: fork: {}", io::Error::last_os_error());
            spawn_failed = true;
            break;
        }
        if pid == 0 {
            child_exec(session, stage, &prepared[i], &pipes, i, n);
        }
        pids.push(pid);
    }

    close_pipes(&pipes);

    // Reap everything that was spawned, even on an abort path, so no
    // child is left behind.
    let mut last_status: libc::c_int = 0;
    for (i, &pid) in pids.iter().enumerate() {
        let mut status: libc::c_int = 0;
        if unsafe { libc::waitpid(pid, &mut status, 0) } >= 0 && i == n - 1 {
            last_status = status;
        }
    }

    if spawn_failed {
        return Outcome::Code(1);
    }

    // Only the last stage determines the reported status: success iff
    // it exited normally with code 0.
    if libc::WIFEXITED(last_status) && libc::WEXITSTATUS(last_status) == 0 {
        Outcome::Code(0)
    } else {
        Outcome::Code(1)
    }
}

/// Runs in the forked child for stage `i` of `n`; never returns.
fn child_exec(
    session: &mut Session,
    stage: &Stage,
    prepared: &Prepared,
    pipes: &[[libc::c_int; 2]],
    i: usize,
    n: usize,
) -> ! {
    unsafe {
        if i > 0 && libc::dup2(pipes[i - 1][0], libc::STDIN_FILENO) < 0 {
            libc::_exit(1);
        }
        if i < n - 1 && libc::dup2(pipes[i][1], libc::STDOUT_FILENO) < 0 {
            libc::_exit(1);
        }
        // Only the two ends wired above stay open; every other pipe fd
        // is closed so readers can observe end-of-stream.
        for fds in pipes {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
    }

    match prepared {
        Prepared::Builtin => {
            // The builtin runs against this child's copy of the
            // session; an `exit` here only ends the stage, as a
            // failure.
            let outcome = builtin::dispatch(&stage.argv, session, &mut io::stdout());
            let _ = io::stdout().flush();
            let code = match outcome {
                Outcome::Code(0) => 0,
                _ => 1,
            };
            unsafe { libc::_exit(code) }
        }
        Prepared::Program(argv) => {
            unsafe { libc::execv(argv.path.as_ptr(), argv.ptrs.as_ptr()) };
            // execv only returns on failure.
            eprintln!("wsh: {}: command not found", stage.argv[0]);
            unsafe { libc::_exit(127) }
        }
    }
}
