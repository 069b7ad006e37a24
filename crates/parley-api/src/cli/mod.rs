//! CLI command definitions for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod session;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat with a language model and keep your conversations.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Only log errors. Command results are still printed.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans via OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "PARLEY_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default tracing directives for the verbosity flags. `RUST_LOG` wins
    /// over these when set.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "warn",
            1 => "info,parley=debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to config.toml, then 3000).
        #[arg(short, long, env = "PARLEY_PORT")]
        port: Option<u16>,

        /// Host to bind to (defaults to config.toml, then 127.0.0.1).
        #[arg(long, env = "PARLEY_HOST")]
        host: Option<String>,
    },

    /// Send one message and print the reply.
    Chat {
        /// The message to send.
        message: String,

        /// Continue an existing session instead of starting a new one.
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Start a new, empty session and print its ID.
    New,

    /// Show the sidebar: recent, pinned and archived sessions.
    #[command(alias = "ls")]
    Sessions,

    /// Print the full conversation of a session.
    History {
        /// Session ID.
        session_id: String,
    },

    /// Toggle whether a session is pinned.
    Pin {
        /// Session ID.
        session_id: String,
    },

    /// Toggle whether a session is archived.
    Archive {
        /// Session ID.
        session_id: String,
    },

    /// Delete a session.
    #[command(alias = "rm")]
    Delete {
        /// Session ID.
        session_id: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_chat_with_session() {
        let cli = Cli::try_parse_from(["parley", "chat", "hello there", "--session", "abc", "--json"])
            .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Chat { message, session } => {
                assert_eq!(message, "hello there");
                assert_eq!(session.as_deref(), Some("abc"));
            }
            _ => panic!("expected chat command"),
        }
    }

    #[test]
    fn test_quiet_only_lowers_log_filter() {
        let quiet = Cli::try_parse_from(["parley", "--quiet", "sessions"]).unwrap();
        assert_eq!(quiet.log_filter(), "error");
        assert!(matches!(quiet.command, Commands::Sessions));

        let verbose = Cli::try_parse_from(["parley", "-v", "sessions"]).unwrap();
        assert_eq!(verbose.log_filter(), "info,parley=debug");

        let default = Cli::try_parse_from(["parley", "sessions"]).unwrap();
        assert_eq!(default.log_filter(), "warn");
    }

    #[test]
    fn test_parse_delete_force() {
        let cli = Cli::try_parse_from(["parley", "rm", "abc", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Delete { ref session_id, force: true } if session_id == "abc"
        ));
    }
}
