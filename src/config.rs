use std::path::PathBuf;

use tokio::time::Duration;

use crate::{crypto::SignatureScheme, packet::Framing};

pub const DEFAULT_COLLECTOR_HOST: &str = "127.0.0.1";
pub const DEFAULT_COLLECTOR_PORT: u16 = 12345;
pub const DEFAULT_SENSOR_ID: i16 = 101;
pub const DEFAULT_PRIVATE_KEY_PATH: &str = "private.pem";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorAddr {
    pub host: String,

    pub port: u16,
}

impl std::fmt::Display for CollectorAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Everything the sensor side needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct TransmitterConfig {
    pub collector: CollectorAddr,

    pub sensor_id: i16,

    pub private_key_path: PathBuf,

    /// Must match the collector's configured scheme.
    pub scheme: SignatureScheme,

    pub framing: Framing,

    /// Fixed delay after every cycle, successful or not.
    pub interval: Duration,

    pub connect_timeout: Duration,

    pub write_timeout: Duration,
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            collector: CollectorAddr {
                host: DEFAULT_COLLECTOR_HOST.to_string(),
                port: DEFAULT_COLLECTOR_PORT,
            },
            sensor_id: DEFAULT_SENSOR_ID,
            private_key_path: PathBuf::from(DEFAULT_PRIVATE_KEY_PATH),
            scheme: SignatureScheme::default(),
            framing: Framing::default(),
            interval: DEFAULT_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}
