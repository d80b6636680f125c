use thiserror::Error;

use crate::TelemetryField;

/// Errors raised while reading fields out of a bound packet.
///
/// The absence of a packet is not an error; accessors answer it with the
/// caller's fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed packet: {field} needs bytes {offset}..{end}, buffer holds {len}")]
    MalformedPacket {
        field: TelemetryField,
        offset: usize,
        end: usize,
        len: usize,
    },
}

impl DecodeError {
    /// The field that could not be read.
    pub fn field(&self) -> TelemetryField {
        match self {
            DecodeError::MalformedPacket { field, .. } => *field,
        }
    }
}
