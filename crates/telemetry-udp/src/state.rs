//! Shared state between the ingestion task and direct queries.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use f1_telemetry_packet::{MIN_PACKET_SIZE, PacketDecoder};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Arrival timestamp meaning "no datagram yet".
pub const NEVER_RECEIVED: u64 = 0;

/// `true` iff a datagram arrived strictly less than `timeout` before `now_ns`.
///
/// Exactly `timeout` old is stale.
pub fn is_live(last_received_ns: u64, now_ns: u64, timeout: Duration) -> bool {
    if last_received_ns == NEVER_RECEIVED {
        return false;
    }
    let elapsed_ns = u128::from(now_ns.saturating_sub(last_received_ns));
    elapsed_ns < timeout.as_nanos()
}

/// Latest datagram and its arrival time, always updated together.
#[derive(Debug, Default)]
struct Latest {
    raw: Option<Arc<[u8]>>,
    received_ns: u64,
}

#[derive(Debug)]
pub(crate) struct SharedState {
    latest: Mutex<Latest>,
    timeout: Duration,
    counters: Counters,
}

impl SharedState {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            latest: Mutex::new(Latest::default()),
            timeout,
            counters: Counters::default(),
        }
    }

    /// Receive path: swap in the new datagram, no decoding.
    pub(crate) fn record_datagram(&self, bytes: &[u8], peer: SocketAddr, now_ns: u64) {
        self.counters.datagrams.fetch_add(1, Ordering::Relaxed);
        if bytes.len() < MIN_PACKET_SIZE {
            self.counters.malformed.fetch_add(1, Ordering::Relaxed);
            warn!(
                len = bytes.len(),
                min = MIN_PACKET_SIZE,
                peer = %peer,
                "Short telemetry datagram; fields past its end will read as fallbacks"
            );
        }

        let raw: Arc<[u8]> = Arc::from(bytes);
        let mut latest = self.latest.lock();
        latest.raw = Some(raw);
        // Never step backwards, never collide with the sentinel.
        latest.received_ns = now_ns.max(latest.received_ns).max(1);
    }

    pub(crate) fn record_receive_error(&self) {
        self.counters.receive_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_tick(&self) {
        self.counters.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn last_received_ns(&self) -> u64 {
        self.latest.lock().received_ns
    }

    pub(crate) fn is_connected_at(&self, now_ns: u64) -> bool {
        is_live(self.last_received_ns(), now_ns, self.timeout)
    }

    /// Bound to the last datagram ever seen, stale or not.
    pub(crate) fn latest_snapshot(&self) -> PacketDecoder {
        PacketDecoder::from_option(self.latest.lock().raw.clone())
    }

    /// Bound to the last datagram only while the source is live.
    pub(crate) fn emission_snapshot(&self, now_ns: u64) -> PacketDecoder {
        let latest = self.latest.lock();
        if is_live(latest.received_ns, now_ns, self.timeout) {
            PacketDecoder::from_option(latest.raw.clone())
        } else {
            PacketDecoder::empty()
        }
    }

    /// Drop the held datagram. The arrival time is kept.
    pub(crate) fn release(&self) {
        self.latest.lock().raw = None;
    }

    pub(crate) fn stats(&self) -> IngestorStats {
        IngestorStats {
            datagrams_received: self.counters.datagrams.load(Ordering::Relaxed),
            malformed_datagrams: self.counters.malformed.load(Ordering::Relaxed),
            receive_errors: self.counters.receive_errors.load(Ordering::Relaxed),
            ticks_emitted: self.counters.ticks.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    datagrams: AtomicU64,
    malformed: AtomicU64,
    receive_errors: AtomicU64,
    ticks: AtomicU64,
}

/// Point-in-time ingestion counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestorStats {
    pub datagrams_received: u64,
    /// Datagrams shorter than the full packet layout.
    pub malformed_datagrams: u64,
    pub receive_errors: u64,
    pub ticks_emitted: u64,
}
