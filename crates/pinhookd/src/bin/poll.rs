use std::process::ExitCode;

fn main() -> ExitCode {
    match pinhookd::run_poller() {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("pinhook-poll: {error}");
            ExitCode::FAILURE
        }
    }
}
