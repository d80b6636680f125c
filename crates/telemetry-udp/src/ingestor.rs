//! UDP ingestion loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use f1_telemetry_packet::PacketDecoder;
use parking_lot::Mutex;
use tokio::net::UdpSocket as TokioUdpSocket;
use tokio::sync::{Mutex as AsyncMutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::state::{IngestorStats, NEVER_RECEIVED, SharedState};
use crate::{IngestError, IngestorConfig, telemetry_now_ns};

/// Receive buffer size; longer datagrams are truncated.
pub const MAX_DATAGRAM_SIZE: usize = 2048;

/// Stream of per-tick snapshots handed to a subscriber.
pub type SnapshotReceiver = broadcast::Receiver<PacketDecoder>;

/// Lifecycle of an ingestor. There is no way back from `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestorPhase {
    Listening,
    Stopped,
}

/// Owns the telemetry socket and the emit timer.
///
/// One task multiplexes datagram receipt and timer ticks. Receipt only swaps
/// in the newest datagram (most recent wins, nothing is queued); each tick
/// decodes nothing itself but hands every subscriber a [`PacketDecoder`]
/// bound to the latest datagram while the source is live, or an empty one
/// once it has gone stale.
///
/// Dropping the ingestor shuts the task down; [`UdpIngestor::stop`] does the
/// same and waits for it.
#[derive(Debug)]
pub struct UdpIngestor {
    config: IngestorConfig,
    local_addr: SocketAddr,
    shared: Arc<SharedState>,
    sender: Mutex<Option<broadcast::Sender<PacketDecoder>>>,
    shutdown: watch::Sender<bool>,
    // Held across the join so concurrent `stop` calls all wait for the task.
    task: AsyncMutex<Option<JoinHandle<()>>>,
}

impl UdpIngestor {
    /// Bind `config.host:config.port` and start emitting.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidConfig`] for unusable settings and
    /// [`IngestError::Bind`] when the socket cannot be bound. Nothing is left
    /// running on error.
    pub async fn bind(config: IngestorConfig) -> Result<Self, IngestError> {
        config.validate()?;

        let bind_addr = config.bind_addr();
        let socket = TokioUdpSocket::bind(bind_addr)
            .await
            .map_err(|source| IngestError::Bind {
                addr: bind_addr,
                source,
            })?;
        let local_addr = socket.local_addr()?;

        info!(
            addr = %local_addr,
            interval_ms = config.interval_ms,
            timeout_ms = config.timeout_ms,
            "UDP telemetry ingestor bound"
        );

        let shared = Arc::new(SharedState::new(config.timeout()));
        let (sender, _) = broadcast::channel(config.channel_capacity);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(run_ingest_loop(
            socket,
            Arc::clone(&shared),
            sender.clone(),
            config.interval(),
            shutdown_rx,
        ));

        Ok(Self {
            config,
            local_addr,
            shared,
            sender: Mutex::new(Some(sender)),
            shutdown,
            task: AsyncMutex::new(Some(task)),
        })
    }

    /// Bind with [`IngestorConfig::default`].
    ///
    /// # Errors
    ///
    /// See [`UdpIngestor::bind`].
    pub async fn bind_default() -> Result<Self, IngestError> {
        Self::bind(IngestorConfig::default()).await
    }

    pub fn config(&self) -> &IngestorConfig {
        &self.config
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn phase(&self) -> IngestorPhase {
        if *self.shutdown.borrow() {
            IngestorPhase::Stopped
        } else {
            IngestorPhase::Listening
        }
    }

    /// Register for every subsequent tick's snapshot.
    ///
    /// Each receiver sees ticks in order. A receiver that falls more than
    /// `channel_capacity` ticks behind gets `RecvError::Lagged` and resumes
    /// from the oldest retained snapshot. After [`UdpIngestor::stop`] the
    /// returned receiver is already closed.
    pub fn subscribe(&self) -> SnapshotReceiver {
        match self.sender.lock().as_ref() {
            Some(sender) => sender.subscribe(),
            None => {
                let (closed, receiver) = broadcast::channel(1);
                drop(closed);
                receiver
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender
            .lock()
            .as_ref()
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Whether a datagram arrived within the staleness timeout. Never cached.
    ///
    /// Always `false` once stopped.
    pub fn is_connected(&self) -> bool {
        self.is_connected_at(telemetry_now_ns())
    }

    /// [`UdpIngestor::is_connected`] against an explicit
    /// [`telemetry_now_ns`] reading.
    pub fn is_connected_at(&self, now_ns: u64) -> bool {
        self.phase() == IngestorPhase::Listening && self.shared.is_connected_at(now_ns)
    }

    /// Arrival time of the last datagram on the [`telemetry_now_ns`] clock,
    /// or [`NEVER_RECEIVED`].
    pub fn last_received_ns(&self) -> u64 {
        self.shared.last_received_ns()
    }

    pub fn time_since_last_datagram(&self) -> Option<Duration> {
        match self.last_received_ns() {
            NEVER_RECEIVED => None,
            last => Some(Duration::from_nanos(
                telemetry_now_ns().saturating_sub(last),
            )),
        }
    }

    /// Decoder over the last datagram ever received, regardless of staleness.
    ///
    /// Unlike the emitted stream, this does not switch to an empty snapshot
    /// once the source goes quiet. It is empty only before the first datagram
    /// and after [`UdpIngestor::stop`].
    pub fn latest_snapshot(&self) -> PacketDecoder {
        self.shared.latest_snapshot()
    }

    pub fn stats(&self) -> IngestorStats {
        self.shared.stats()
    }

    /// Stop the timer, close the socket and release the held datagram.
    ///
    /// No snapshot is emitted once this returns, whichever of several
    /// concurrent callers it returns to. Calling it again is a no-op.
    pub async fn stop(&self) {
        self.shutdown.send_replace(true);

        let mut task = self.task.lock().await;
        if let Some(handle) = task.take() {
            if let Err(error) = handle.await {
                warn!(error = %error, "UDP telemetry ingest task ended abnormally");
            }
            info!(addr = %self.local_addr, "UDP telemetry ingestor stopped");
        }
        drop(task);

        // Closes every subscriber once the task's clone is gone too.
        drop(self.sender.lock().take());
        self.shared.release();
    }
}

impl Drop for UdpIngestor {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

async fn run_ingest_loop(
    socket: TokioUdpSocket,
    shared: Arc<SharedState>,
    sender: broadcast::Sender<PacketDecoder>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        // Shutdown first so nothing is handled once it is signalled; the tick
        // ahead of receipt so a datagram flood cannot starve emission.
        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }

            _ = ticker.tick() => {
                let snapshot = shared.emission_snapshot(telemetry_now_ns());
                shared.record_tick();
                if sender.send(snapshot).is_err() {
                    trace!("No telemetry subscribers for tick");
                }
            }

            recv = socket.recv_from(&mut buf) => match recv {
                Ok((len, peer)) => {
                    let data = buf.get(..len).unwrap_or_default();
                    shared.record_datagram(data, peer, telemetry_now_ns());
                }
                Err(error) => {
                    shared.record_receive_error();
                    warn!(error = %error, "UDP telemetry receive error");
                }
            },
        }
    }

    debug!("UDP telemetry ingest loop exited");
}
