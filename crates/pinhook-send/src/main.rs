//! CLI entrypoint for the pinhook producer.
//!
//! Delegates to [`pinhook_send::run`] with the locked process streams.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    pinhook_send::run(std::env::args_os(), &mut stdout, &mut stderr)
}
