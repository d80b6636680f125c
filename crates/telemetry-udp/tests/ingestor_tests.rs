//! End-to-end tests for the UDP ingestor over loopback.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use f1_telemetry_packet::field::OFF_SPEED;
use f1_telemetry_packet::{MIN_PACKET_SIZE, PacketDecoder, ReadOptions, TelemetrySummary};
use f1_telemetry_udp::{IngestError, IngestorConfig, IngestorPhase, SnapshotReceiver, UdpIngestor};
use tokio::net::UdpSocket;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const WAIT: Duration = Duration::from_secs(3);

fn loopback_config() -> IngestorConfig {
    IngestorConfig::default()
        .with_host(Ipv4Addr::LOCALHOST)
        .with_port(0)
        .with_interval_ms(10)
}

fn packet_with_speed(speed_ms: f32) -> Vec<u8> {
    let mut raw = vec![0u8; MIN_PACKET_SIZE];
    raw[OFF_SPEED..OFF_SPEED + 4].copy_from_slice(&speed_ms.to_le_bytes());
    raw
}

async fn send_to(target: SocketAddr, bytes: &[u8]) -> TestResult {
    let sender = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    sender.send_to(bytes, target).await?;
    Ok(())
}

/// Receive snapshots until one satisfies `accept`, skipping lag.
async fn next_matching(
    receiver: &mut SnapshotReceiver,
    accept: impl Fn(&PacketDecoder) -> bool,
) -> Result<PacketDecoder, Box<dyn std::error::Error>> {
    let deadline = tokio::time::Instant::now() + WAIT;
    loop {
        match tokio::time::timeout_at(deadline, receiver.recv()).await? {
            Ok(snapshot) if accept(&snapshot) => return Ok(snapshot),
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => return Err("snapshot channel closed".into()),
        }
    }
}

#[tokio::test]
async fn bind_fails_on_occupied_port() -> TestResult {
    let occupied = std::net::UdpSocket::bind((Ipv4Addr::LOCALHOST, 0))?;
    let port = occupied.local_addr()?.port();

    let result = UdpIngestor::bind(loopback_config().with_port(port)).await;
    match result {
        Err(error) => assert!(error.is_bind_failure(), "unexpected error: {error}"),
        Ok(_) => return Err("bind on an occupied port should fail".into()),
    }
    Ok(())
}

#[tokio::test]
async fn zero_interval_is_rejected() {
    let result = UdpIngestor::bind(loopback_config().with_interval_ms(0)).await;
    assert!(matches!(result, Err(IngestError::InvalidConfig { .. })));
}

#[tokio::test]
async fn silence_emits_empty_snapshots() -> TestResult {
    let ingestor = UdpIngestor::bind(loopback_config()).await?;
    let mut snapshots = ingestor.subscribe();

    let snapshot = next_matching(&mut snapshots, |_| true).await?;
    assert!(!snapshot.has_data());
    assert_eq!(snapshot.summary(), TelemetrySummary::default());
    assert!(!ingestor.is_connected());
    assert!(ingestor.time_since_last_datagram().is_none());

    ingestor.stop().await;
    Ok(())
}

#[tokio::test]
async fn live_datagram_is_emitted() -> TestResult {
    let ingestor = UdpIngestor::bind(loopback_config()).await?;
    let mut snapshots = ingestor.subscribe();

    send_to(ingestor.local_addr(), &packet_with_speed(44.0)).await?;
    let snapshot = next_matching(&mut snapshots, PacketDecoder::has_data).await?;

    assert!((snapshot.speed(ReadOptions::default()) - 44.0).abs() < f64::EPSILON);
    assert!((snapshot.kmh_speed(ReadOptions::default()) - 158.0).abs() < f64::EPSILON);
    assert!(ingestor.is_connected());
    assert!(ingestor.latest_snapshot().has_data());

    ingestor.stop().await;
    Ok(())
}

#[tokio::test]
async fn empty_datagram_is_live_without_data() -> TestResult {
    let ingestor = UdpIngestor::bind(loopback_config()).await?;
    send_to(ingestor.local_addr(), &[]).await?;

    let deadline = tokio::time::Instant::now() + WAIT;
    while ingestor.stats().datagrams_received == 0 {
        if tokio::time::Instant::now() > deadline {
            return Err("empty datagram never arrived".into());
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(ingestor.is_connected());
    assert!(!ingestor.latest_snapshot().has_data());

    ingestor.stop().await;
    Ok(())
}

#[tokio::test]
async fn stale_source_emits_empty_but_keeps_latest() -> TestResult {
    let ingestor = UdpIngestor::bind(loopback_config().with_timeout_ms(200)).await?;
    let mut snapshots = ingestor.subscribe();

    send_to(ingestor.local_addr(), &packet_with_speed(10.0)).await?;
    next_matching(&mut snapshots, PacketDecoder::has_data).await?;

    tokio::time::sleep(Duration::from_millis(300)).await;
    let stale = next_matching(&mut snapshots, |p| !p.has_data()).await?;
    assert!(
        (stale.kmh_speed(ReadOptions::fallback(-1.0)) + 1.0).abs() < f64::EPSILON,
        "stale snapshot must read fallbacks"
    );
    assert!(!ingestor.is_connected());

    let latest = ingestor.latest_snapshot();
    assert!(latest.has_data());
    assert!((latest.speed(ReadOptions::default()) - 10.0).abs() < f64::EPSILON);

    ingestor.stop().await;
    Ok(())
}

#[tokio::test]
async fn newest_datagram_wins() -> TestResult {
    let ingestor = UdpIngestor::bind(loopback_config()).await?;
    let mut snapshots = ingestor.subscribe();

    send_to(ingestor.local_addr(), &packet_with_speed(10.0)).await?;
    next_matching(&mut snapshots, PacketDecoder::has_data).await?;
    send_to(ingestor.local_addr(), &packet_with_speed(20.0)).await?;

    let newer = next_matching(&mut snapshots, |p| {
        (p.speed(ReadOptions::default()) - 20.0).abs() < f64::EPSILON
    })
    .await?;
    assert!(newer.has_data());

    ingestor.stop().await;
    Ok(())
}

#[tokio::test]
async fn stats_count_datagrams_and_ticks() -> TestResult {
    let ingestor = UdpIngestor::bind(loopback_config()).await?;
    let mut snapshots = ingestor.subscribe();

    send_to(ingestor.local_addr(), &packet_with_speed(1.0)).await?;
    send_to(ingestor.local_addr(), &[0u8; 16]).await?;

    let deadline = tokio::time::Instant::now() + WAIT;
    while ingestor.stats().datagrams_received < 2 {
        if tokio::time::Instant::now() >= deadline {
            return Err("datagrams were not counted".into());
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    next_matching(&mut snapshots, |_| true).await?;

    let stats = ingestor.stats();
    assert_eq!(stats.datagrams_received, 2);
    assert_eq!(stats.malformed_datagrams, 1);
    assert_eq!(stats.receive_errors, 0);
    assert!(stats.ticks_emitted >= 1);

    // A short datagram is still the latest one, and its fields fall back.
    let latest = ingestor.latest_snapshot();
    assert_eq!(latest.len(), 16);
    assert!(latest.validate().is_err());

    ingestor.stop().await;
    Ok(())
}

#[tokio::test]
async fn stop_is_idempotent_and_releases_everything() -> TestResult {
    let ingestor = UdpIngestor::bind(loopback_config()).await?;
    let addr = ingestor.local_addr();
    let mut snapshots = ingestor.subscribe();
    assert_eq!(ingestor.subscriber_count(), 1);

    send_to(addr, &packet_with_speed(30.0)).await?;
    next_matching(&mut snapshots, PacketDecoder::has_data).await?;

    ingestor.stop().await;
    ingestor.stop().await;

    assert_eq!(ingestor.phase(), IngestorPhase::Stopped);
    assert!(!ingestor.is_connected());
    assert!(!ingestor.latest_snapshot().has_data());
    assert_eq!(ingestor.subscriber_count(), 0);

    // Buffered snapshots drain, then the channel reports closed.
    loop {
        match tokio::time::timeout(WAIT, snapshots.recv()).await? {
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }

    let mut late = ingestor.subscribe();
    assert!(matches!(late.recv().await, Err(RecvError::Closed)));

    let rebound = UdpIngestor::bind(loopback_config().with_port(addr.port())).await?;
    assert_eq!(rebound.local_addr(), addr);
    rebound.stop().await;
    Ok(())
}

/// Drain without waiting; the channel must already be closed.
fn assert_closed_now(snapshots: &mut SnapshotReceiver) -> TestResult {
    loop {
        match snapshots.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Closed) => return Ok(()),
            Err(TryRecvError::Empty) => return Err("ingest task still running after stop".into()),
        }
    }
}

#[tokio::test]
async fn concurrent_stops_both_wait_for_the_task() -> TestResult {
    let ingestor = Arc::new(UdpIngestor::bind(loopback_config().with_interval_ms(1)).await?);
    let mut first_rx = ingestor.subscribe();
    let mut second_rx = ingestor.subscribe();

    send_to(ingestor.local_addr(), &packet_with_speed(25.0)).await?;
    next_matching(&mut first_rx, PacketDecoder::has_data).await?;

    let first = Arc::clone(&ingestor);
    let second = Arc::clone(&ingestor);
    let (first_result, second_result) = tokio::join!(
        async move {
            first.stop().await;
            assert_closed_now(&mut first_rx)?;
            TestResult::Ok(())
        },
        async move {
            second.stop().await;
            assert_closed_now(&mut second_rx)?;
            assert!(!second.latest_snapshot().has_data());
            TestResult::Ok(())
        },
    );
    first_result?;
    second_result?;

    let ticks = ingestor.stats().ticks_emitted;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(ingestor.stats().ticks_emitted, ticks);
    assert!(!ingestor.latest_snapshot().has_data());
    Ok(())
}

#[tokio::test]
async fn stop_from_spawned_tasks_is_consistent() -> TestResult {
    let ingestor = Arc::new(UdpIngestor::bind(loopback_config().with_interval_ms(1)).await?);
    send_to(ingestor.local_addr(), &packet_with_speed(25.0)).await?;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ingestor = Arc::clone(&ingestor);
            let mut snapshots = ingestor.subscribe();
            tokio::spawn(async move {
                ingestor.stop().await;
                assert_closed_now(&mut snapshots).map_err(|e| e.to_string())?;
                if ingestor.latest_snapshot().has_data() {
                    return Err("datagram held after stop".to_string());
                }
                Ok::<(), String>(())
            })
        })
        .collect();

    for handle in handles {
        handle.await??;
    }
    assert_eq!(ingestor.phase(), IngestorPhase::Stopped);
    Ok(())
}

#[tokio::test]
async fn dropping_ingestor_frees_port() -> TestResult {
    let ingestor = UdpIngestor::bind(loopback_config()).await?;
    let addr = ingestor.local_addr();
    let mut snapshots = ingestor.subscribe();
    drop(ingestor);

    loop {
        match tokio::time::timeout(WAIT, snapshots.recv()).await? {
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }

    // The task closes the socket as it unwinds; give it a moment.
    let deadline = tokio::time::Instant::now() + WAIT;
    let rebound = loop {
        match UdpIngestor::bind(loopback_config().with_port(addr.port())).await {
            Ok(rebound) => break rebound,
            Err(error) if error.is_bind_failure() && tokio::time::Instant::now() < deadline => {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            Err(error) => return Err(error.into()),
        }
    };
    rebound.stop().await;
    Ok(())
}
