//! Live listening on the telemetry port.

use anyhow::Result;
use f1_telemetry_udp::{SnapshotReceiver, UdpIngestor};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::commands::ListenArgs;
use crate::error::CliError;
use crate::output;

/// Print one line per emitted snapshot until Ctrl-C or `--ticks` runs out.
pub async fn execute(args: &ListenArgs, json: bool) -> Result<()> {
    let ingestor = UdpIngestor::bind(args.to_config())
        .await
        .map_err(CliError::from)?;
    let mut snapshots = ingestor.subscribe();

    if !json {
        eprintln!("Listening on {}", ingestor.local_addr());
    }

    let result = print_snapshots(&ingestor, &mut snapshots, args.ticks, json).await;

    ingestor.stop().await;
    let stats = ingestor.stats();
    info!(
        datagrams = stats.datagrams_received,
        malformed = stats.malformed_datagrams,
        receive_errors = stats.receive_errors,
        ticks = stats.ticks_emitted,
        "Listener finished"
    );

    result
}

async fn print_snapshots(
    ingestor: &UdpIngestor,
    snapshots: &mut SnapshotReceiver,
    ticks: Option<u64>,
    json: bool,
) -> Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut printed: u64 = 0;
    loop {
        if ticks.is_some_and(|limit| printed >= limit) {
            return Ok(());
        }

        tokio::select! {
            signal = &mut ctrl_c => {
                if let Err(error) = signal {
                    warn!(error = %error, "Failed to listen for Ctrl-C");
                }
                return Ok(());
            }
            received = snapshots.recv() => match received {
                Ok(packet) => {
                    output::print_tick(&packet, ingestor.is_connected(), json)?;
                    printed = printed.saturating_add(1);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Output fell behind; skipped snapshots");
                }
                Err(RecvError::Closed) => return Ok(()),
            },
        }
    }
}
