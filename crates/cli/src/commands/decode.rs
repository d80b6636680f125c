//! Offline decoding of a captured datagram.

use anyhow::{Context, Result};
use f1_telemetry_packet::{PacketDecoder, TelemetryField};
use tracing::debug;

use crate::commands::DecodeArgs;
use crate::error::CliError;
use crate::output::{self, DecodeReport};

pub async fn execute(args: &DecodeArgs, json: bool) -> Result<()> {
    let bytes = tokio::fs::read(&args.file)
        .await
        .map_err(CliError::from)
        .with_context(|| format!("Failed to read packet file {}", args.file.display()))?;
    debug!(path = %args.file.display(), len = bytes.len(), "Read captured packet");

    let packet = PacketDecoder::new(bytes);
    // An empty capture binds nothing; report it against the first field.
    let validation = match packet.as_bytes() {
        Some(_) => packet.validate(),
        None => TelemetryField::LapTime.read(&[]).map(drop),
    };
    output::print_decode_report(&DecodeReport::new(&packet, validation), json)?;

    if args.strict {
        validation.map_err(CliError::from)?;
    }
    Ok(())
}
