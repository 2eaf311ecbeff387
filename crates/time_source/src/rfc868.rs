//! RFC 868 Time Protocol client
//!
//! The server writes the current time as a 32-bit big-endian count of seconds
//! since 1900-01-01T00:00:00Z and closes the connection. Resolution is one
//! second, which is enough for "best effort" server time.

use std::time::Duration;

use contracts::{ProviderError, RemoteTimeProvider, Rfc868SourceConfig};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{instrument, trace};

/// Seconds between 1900-01-01 and 1970-01-01
pub const RFC868_EPOCH_OFFSET: u64 = 2_208_988_800;

const ERA_SECONDS: u64 = 1 << 32;

/// Decode an RFC 868 timestamp into seconds since the Unix epoch.
///
/// Values below the 1970 boundary are read as the next 32-bit era
/// (from 2036-02-07 onwards).
pub fn rfc868_to_unix(raw: u32) -> f64 {
    let raw = raw as u64;
    let since_1900 = if raw < RFC868_EPOCH_OFFSET {
        raw + ERA_SECONDS
    } else {
        raw
    };
    (since_1900 - RFC868_EPOCH_OFFSET) as f64
}

/// Encode seconds since the Unix epoch as an RFC 868 timestamp (wrapping per era)
pub fn unix_to_rfc868(unix_seconds: u64) -> u32 {
    ((unix_seconds + RFC868_EPOCH_OFFSET) % ERA_SECONDS) as u32
}

/// TCP client for an RFC 868 time server
#[derive(Debug, Clone)]
pub struct Rfc868TimeSource {
    name: String,
    addr: String,
    connect_timeout: Duration,
}

impl Rfc868TimeSource {
    /// Create a client for `addr` (`host:port`)
    pub fn new(addr: impl Into<String>, connect_timeout: Duration) -> Self {
        let addr = addr.into();
        Self {
            name: format!("rfc868://{addr}"),
            addr,
            connect_timeout,
        }
    }

    /// Create from configuration
    pub fn from_config(config: &Rfc868SourceConfig) -> Self {
        Self::new(
            format!("{}:{}", config.host, config.port),
            Duration::from_millis(config.connect_timeout_ms),
        )
    }

    /// Server address
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl RemoteTimeProvider for Rfc868TimeSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "rfc868_fetch", level = "trace", skip(self), fields(addr = %self.addr))]
    async fn fetch(&self) -> Result<f64, ProviderError> {
        let mut stream = timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| {
                ProviderError::timeout(&self.name, self.connect_timeout.as_millis() as u64)
            })??;

        // A server that accepts and never writes must not hold the cycle.
        let mut buf = [0u8; 4];
        timeout(self.connect_timeout, stream.read_exact(&mut buf))
            .await
            .map_err(|_| {
                ProviderError::timeout(&self.name, self.connect_timeout.as_millis() as u64)
            })?
            .map_err(|e| {
                ProviderError::protocol(&self.name, format!("expected 4-byte timestamp: {e}"))
            })?;

        let raw = u32::from_be_bytes(buf);
        trace!(raw, "rfc868 timestamp received");
        Ok(rfc868_to_unix(raw))
    }
}
