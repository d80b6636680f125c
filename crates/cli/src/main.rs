//! f1telemetry - F1 legacy UDP telemetry CLI
//!
//! Listens for the legacy telemetry stream and prints a line per tick, or
//! decodes a captured datagram from disk.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod completion;
mod error;
mod output;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{DecodeArgs, ListenArgs};
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "f1telemetry")]
#[command(about = "F1 legacy UDP telemetry listener and packet inspector")]
#[command(version)]
#[command(long_about = "
f1telemetry listens for the fixed-layout legacy F1 UDP telemetry stream and
prints one snapshot per tick. When the game stops sending, snapshots fall back
to defaults after the staleness timeout.

Use --json for one machine-readable object per line.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for live telemetry and print each snapshot
    Listen(ListenArgs),

    /// Decode a captured datagram from a file
    Decode(DecodeArgs),

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "f1telemetry={log_level},f1_telemetry_udp={log_level},f1_telemetry_packet={log_level}"
                )
                .into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute_command(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }

            let exit_code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(exit_code)
        }
    }
}

async fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Listen(args) => commands::listen::execute(args, cli.json).await,
        Commands::Decode(args) => commands::decode::execute(args, cli.json).await,
        Commands::Completion { shell } => {
            completion::generate_completion(*shell);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::net::Ipv4Addr;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_listen_flags() -> TestResult {
        let cli = Cli::try_parse_from([
            "f1telemetry",
            "listen",
            "--host",
            "0.0.0.0",
            "--port",
            "20778",
            "--interval-ms",
            "20",
            "--timeout-ms",
            "1500",
            "--ticks",
            "3",
            "--json",
            "-vv",
        ])?;
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Listen(args) => {
                assert_eq!(args.host, Ipv4Addr::UNSPECIFIED);
                assert_eq!(args.port, 20778);
                assert_eq!(args.interval_ms, 20);
                assert_eq!(args.timeout_ms, 1500);
                assert_eq!(args.ticks, Some(3));
            }
            _ => return Err("expected listen".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_decode_strict() -> TestResult {
        let cli = Cli::try_parse_from(["f1telemetry", "decode", "--strict", "packet.bin"])?;
        match cli.command {
            Commands::Decode(args) => {
                assert!(args.strict);
                assert_eq!(args.file, std::path::PathBuf::from("packet.bin"));
            }
            _ => return Err("expected decode".into()),
        }
        Ok(())
    }

    #[test]
    fn decode_requires_a_file() {
        assert!(Cli::try_parse_from(["f1telemetry", "decode"]).is_err());
    }

    #[test]
    fn rejects_non_ipv4_host() {
        assert!(Cli::try_parse_from(["f1telemetry", "listen", "--host", "localhost"]).is_err());
    }
}
