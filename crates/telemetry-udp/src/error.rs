use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced to whoever constructs an ingestor.
///
/// Receive errors while listening are not represented here: they are logged,
/// counted in [`IngestorStats`](crate::IngestorStats) and the loop carries on.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to bind UDP telemetry socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid ingestor configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        IngestError::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Whether this error came from binding the socket.
    pub fn is_bind_failure(&self) -> bool {
        matches!(self, IngestError::Bind { .. })
    }
}
