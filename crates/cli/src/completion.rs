//! Shell completion generation for f1telemetry

use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io;

use crate::Cli;

/// Generate shell completion script
pub fn generate_completion(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN_NAME, &mut io::stdout());
}

const BIN_NAME: &str = "f1telemetry";
