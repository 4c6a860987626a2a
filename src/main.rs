use std::path::PathBuf;
use std::process::ExitCode;

use argh::FromArgs;
use wsh::Interpreter;

#[derive(FromArgs)]
/// A small command shell with aliases, history and pipelines.
struct Args {
    #[argh(positional)]
    /// script to run in batch mode; interactive when omitted
    script: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();
    let mut interpreter = Interpreter::new();

    let result = match &args.script {
        Some(script) => interpreter.run_script(script),
        None => interpreter.repl(),
    };

    if let Err(e) = result {
        eprintln!("wsh: {e:#}");
        return ExitCode::FAILURE;
    }

    match interpreter.last_status() {
        0 => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
