//! Record/replay interception for asynchronous HTTP clients.
//!
//! Each intercepted client keeps its own continuation shape: a single
//! callback ([`ports::CallbackClient`]), a deferred response with a body
//! protocol ([`ports::Agent`]), or a key stage followed by a response stage
//! ([`ports::FetchClient`]). The [`splice::Splicer`] decides per call whether
//! to replay from the [`cassette::Cassette`], forward and record, or answer
//! with a synthetic `599`, and guarantees exactly one delivery.

pub mod adapters;
pub mod canonical;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod ports;
pub mod splice;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    config::load_dotenv();
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        // --help and --version
        Err(err) if !err.use_stderr() => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    logging::init_cli_logger(cli.verbose);
    commands::dispatch(&cli.command)
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_errors_on_unknown_subcommand() {
        let result = run(["vcr-splice", "unknown"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_errors_on_missing_cassette_for_inspect() {
        let path = std::env::temp_dir().join("vcr_splice_lib_missing.yaml");
        let _ = std::fs::remove_file(&path);
        let result = run(["vcr-splice".into(), "inspect".into(), path.into_os_string()]);
        assert!(result.is_err());
    }
}
