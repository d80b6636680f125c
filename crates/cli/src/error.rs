//! Error types for the f1telemetry CLI

use f1_telemetry_packet::DecodeError;
use f1_telemetry_udp::IngestError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Cannot listen: {0}")]
    Ingest(#[from] IngestError),

    #[error("Malformed packet: {0}")]
    MalformedPacket(#[from] DecodeError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Ingest(error) if error.is_bind_failure() => 2,
            CliError::MalformedPacket(_) => 3,
            CliError::Ingest(IngestError::InvalidConfig { .. }) => 4,
            _ => 1,
        }
    }
}
