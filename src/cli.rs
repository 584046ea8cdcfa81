//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::InterceptArgs;

/// Top-level CLI parser for `vcr-splice`.
#[derive(Debug, Parser)]
#[command(name = "vcr-splice", version, about = "Record and replay HTTP interactions")]
pub struct Cli {
    /// Log routing decisions at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Issue one request through an intercepting client.
    Fetch(FetchArgs),
    /// List the interactions stored in a cassette.
    Inspect {
        /// Cassette file to read.
        path: PathBuf,
        /// Print the cassette as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },
}

/// The client continuation shape to drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ClientKind {
    /// Single completion callback.
    #[default]
    Callback,
    /// Deferred response with a body protocol.
    Agent,
    /// Key callback followed by a response callback.
    Fetch,
}

/// Arguments of `vcr-splice fetch`.
#[derive(Debug, clap::Args)]
pub struct FetchArgs {
    /// Request URL.
    pub url: String,

    /// Client shape to issue the request through.
    #[arg(long, value_enum, default_value_t = ClientKind::Callback)]
    pub client: ClientKind,

    /// HTTP method.
    #[arg(short = 'X', long = "request", default_value = "GET")]
    pub method: String,

    /// Request header as `Name: value`. Repeatable.
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Request body.
    #[arg(short, long)]
    pub data: Option<String>,

    /// Cassette and policy settings.
    #[command(flatten)]
    pub intercept: InterceptArgs,
}

#[cfg(test)]
mod tests {
    use super::{ClientKind, Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_fetch_subcommand() {
        let cli = Cli::parse_from([
            "vcr-splice",
            "fetch",
            "--client",
            "agent",
            "-X",
            "POST",
            "-H",
            "Accept: application/json",
            "--data",
            "{}",
            "http://example.test/items",
        ]);
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.client, ClientKind::Agent);
        assert_eq!(args.method, "POST");
        assert_eq!(args.headers, ["Accept: application/json"]);
        assert_eq!(args.data.as_deref(), Some("{}"));
    }

    #[test]
    fn parses_inspect_subcommand() {
        let cli = Cli::parse_from(["vcr-splice", "inspect", "cassettes/a.yaml"]);
        assert!(matches!(cli.command, Command::Inspect { .. }));
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["vcr-splice", "inspect", "a.yaml", "--verbose"]);
        assert!(cli.verbose);
    }
}
