//! Command dispatch and handlers.

pub mod fetch;
pub mod inspect;

use crate::cli::Command;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    match command {
        Command::Fetch(args) => fetch::run(args),
        Command::Inspect { path, json } => inspect::run(path, *json),
    }
}
