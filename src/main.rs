//! Binary entrypoint for the `vcr-splice` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    match vcr_splice::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
