//! Construction-time configuration for [`UdpIngestor`](crate::UdpIngestor).

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::IngestError;

/// Well-known legacy telemetry port.
pub const DEFAULT_PORT: u16 = 20777;
pub const DEFAULT_HOST: Ipv4Addr = Ipv4Addr::LOCALHOST;
pub const DEFAULT_INTERVAL_MS: u64 = 50;
pub const DEFAULT_TIMEOUT_MS: u64 = 1_000;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Timeouts below this risk flapping between connected and disconnected.
pub const RECOMMENDED_MIN_TIMEOUT_MS: u64 = 1_000;

pub const ENV_HOST: &str = "F1_TELEMETRY_HOST";
pub const ENV_PORT: &str = "F1_TELEMETRY_PORT";
pub const ENV_INTERVAL_MS: &str = "F1_TELEMETRY_INTERVAL_MS";
pub const ENV_TIMEOUT_MS: &str = "F1_TELEMETRY_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestorConfig {
    /// IPv4 address to bind.
    pub host: Ipv4Addr,
    /// UDP port to bind; 0 picks an ephemeral port.
    pub port: u16,
    /// Emit cadence in milliseconds.
    pub interval_ms: u64,
    /// Staleness timeout in milliseconds.
    pub timeout_ms: u64,
    /// Snapshots buffered per subscriber before the oldest are skipped.
    pub channel_capacity: usize,
}

impl Default for IngestorConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST,
            port: DEFAULT_PORT,
            interval_ms: DEFAULT_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl IngestorConfig {
    /// Defaults overridden by `F1_TELEMETRY_*` environment variables.
    ///
    /// Unparseable or zero values are ignored.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(host) = std::env::var(ENV_HOST)
            .ok()
            .and_then(|v| v.trim().parse::<Ipv4Addr>().ok())
        {
            self.host = host;
        }
        self.port = parse_env(ENV_PORT, self.port);
        self.interval_ms = parse_env(ENV_INTERVAL_MS, self.interval_ms);
        self.timeout_ms = parse_env(ENV_TIMEOUT_MS, self.timeout_ms);
        self
    }

    pub fn with_host(mut self, host: Ipv4Addr) -> Self {
        self.host = host;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = channel_capacity;
        self
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.host, self.port))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Reject values the ingestion loop cannot run with.
    ///
    /// A timeout below [`RECOMMENDED_MIN_TIMEOUT_MS`] is accepted with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidConfig`] for a zero interval, timeout or
    /// channel capacity.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.interval_ms == 0 {
            return Err(IngestError::invalid_config("interval_ms must be > 0"));
        }
        if self.timeout_ms == 0 {
            return Err(IngestError::invalid_config("timeout_ms must be > 0"));
        }
        if self.channel_capacity == 0 {
            return Err(IngestError::invalid_config("channel_capacity must be > 0"));
        }
        if self.timeout_ms < RECOMMENDED_MIN_TIMEOUT_MS {
            warn!(
                timeout_ms = self.timeout_ms,
                recommended_ms = RECOMMENDED_MIN_TIMEOUT_MS,
                "Staleness timeout below recommended minimum may cause spurious disconnects"
            );
        }
        Ok(())
    }
}

fn parse_env<T>(key: &str, current: T) -> T
where
    T: std::str::FromStr + PartialEq + Default,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v != T::default())
        .unwrap_or(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn defaults_match_legacy_stream() {
        let config = IngestorConfig::default();
        assert_eq!(config.host, Ipv4Addr::new(127, 0, 0, 1));
        assert_eq!(config.port, 20777);
        assert_eq!(config.interval(), Duration::from_millis(50));
        assert_eq!(config.timeout(), Duration::from_millis(1000));
        assert_eq!(
            config.bind_addr(),
            SocketAddr::from(([127, 0, 0, 1], 20777))
        );
    }

    #[test]
    fn validate_rejects_zero_values() {
        let base = IngestorConfig::default();
        assert!(base.clone().with_interval_ms(0).validate().is_err());
        assert!(base.clone().with_timeout_ms(0).validate().is_err());
        assert!(base.clone().with_channel_capacity(0).validate().is_err());
        assert!(base.validate().is_ok());
    }

    #[test]
    #[traced_test]
    fn short_timeout_is_accepted_with_warning() -> TestResult {
        IngestorConfig::default().with_timeout_ms(200).validate()?;
        assert!(logs_contain(
            "Staleness timeout below recommended minimum may cause spurious disconnects"
        ));
        assert!(logs_contain("timeout_ms=200"));
        Ok(())
    }

    #[test]
    #[traced_test]
    fn recommended_timeout_does_not_warn() -> TestResult {
        IngestorConfig::default().validate()?;
        assert!(!logs_contain("Staleness timeout below recommended minimum"));
        Ok(())
    }

    #[test]
    fn deserialize_fills_missing_fields_with_defaults() -> TestResult {
        let config: IngestorConfig =
            serde_json::from_str(r#"{ "port": 20778, "host": "0.0.0.0" }"#)?;
        assert_eq!(config.port, 20778);
        assert_eq!(config.host, Ipv4Addr::UNSPECIFIED);
        assert_eq!(config.interval_ms, DEFAULT_INTERVAL_MS);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        Ok(())
    }

    #[test]
    fn parse_env_ignores_missing_values() {
        assert_eq!(parse_env("F1_TELEMETRY_TEST_UNSET_VARIABLE", 42u64), 42);
    }
}
