use std::process::ExitCode;

fn main() -> ExitCode {
    match gitbridge::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            gitbridge::cli::report_error(&err);
            ExitCode::FAILURE
        }
    }
}
