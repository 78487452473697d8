use std::process::ExitCode;

fn main() -> ExitCode {
    match pinhookd::run_dispatcher() {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("pinhook-dispatch: {error}");
            ExitCode::FAILURE
        }
    }
}
