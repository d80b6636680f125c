//! UDP ingestion for the F1 legacy telemetry stream.
//!
//! [`UdpIngestor`] binds a UDP socket (default `127.0.0.1:20777`), keeps only
//! the most recent datagram, and every `interval_ms` (default 50 ms) publishes
//! a [`PacketDecoder`] snapshot to all subscribers. Once no datagram has
//! arrived for `timeout_ms` (default 1000 ms) the published snapshots are
//! empty, so subscribers read their fallbacks without polling connectivity.
//!
//! # Usage
//!
//! ```rust,no_run
//! use f1_telemetry_udp::{IngestorConfig, ReadOptions, UdpIngestor};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), f1_telemetry_udp::IngestError> {
//! let ingestor = UdpIngestor::bind(IngestorConfig::from_env()).await?;
//! let mut snapshots = ingestor.subscribe();
//!
//! while let Ok(packet) = snapshots.recv().await {
//!     println!("Speed: {}Km/h", packet.kmh_speed(ReadOptions::default()));
//! }
//! # Ok(())
//! # }
//! ```

#![deny(static_mut_refs)]

use std::sync::OnceLock;
use std::time::Instant;

pub mod config;
pub mod error;
pub mod ingestor;
pub mod state;

pub use config::IngestorConfig;
pub use error::IngestError;
pub use f1_telemetry_packet::{PacketDecoder, ReadOptions, Rounding, TelemetrySummary};
pub use ingestor::{IngestorPhase, MAX_DATAGRAM_SIZE, SnapshotReceiver, UdpIngestor};
pub use state::{IngestorStats, NEVER_RECEIVED, is_live};

static TELEMETRY_EPOCH: OnceLock<Instant> = OnceLock::new();

/// Return a monotonic timestamp in nanoseconds using a process-wide epoch.
pub fn telemetry_now_ns() -> u64 {
    let epoch = TELEMETRY_EPOCH.get_or_init(Instant::now);
    Instant::now()
        .checked_duration_since(*epoch)
        .map(|duration| duration.as_nanos())
        .unwrap_or(0)
        .min(u128::from(u64::MAX)) as u64
}
