use std::path::PathBuf;

use clap::Parser;
use signed_telemetry::{
    config::{
        CollectorAddr, DEFAULT_COLLECTOR_HOST, DEFAULT_COLLECTOR_PORT, DEFAULT_CONNECT_TIMEOUT,
        DEFAULT_INTERVAL, DEFAULT_PRIVATE_KEY_PATH, DEFAULT_SENSOR_ID, DEFAULT_WRITE_TIMEOUT,
        TransmitterConfig,
    },
    crypto::SignatureScheme,
    packet::Framing,
};
use tokio::time::Duration;

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(long, env = "COLLECTOR_HOST", default_value = DEFAULT_COLLECTOR_HOST)]
    pub collector_host: String,

    #[arg(long, env = "COLLECTOR_PORT", default_value_t = DEFAULT_COLLECTOR_PORT)]
    pub collector_port: u16,

    #[arg(long, env = "SENSOR_ID", default_value_t = DEFAULT_SENSOR_ID, allow_negative_numbers = true)]
    pub sensor_id: i16,

    #[arg(long, env = "PRIVATE_KEY_PATH", default_value = DEFAULT_PRIVATE_KEY_PATH)]
    pub private_key: PathBuf,

    /// Must match the collector: rsa-pkcs1v15-sha256, rsa-pss-sha256 or ed25519-sha256.
    #[arg(long, env = "SIGNATURE_SCHEME", default_value_t = SignatureScheme::default())]
    pub scheme: SignatureScheme,

    /// `length-prefixed` is not understood by implicit-framing collectors.
    #[arg(long, env = "FRAMING", default_value_t = Framing::default())]
    pub framing: Framing,

    /// Delay after every cycle, at least one second.
    #[arg(
        long,
        env = "INTERVAL_SECS",
        default_value_t = DEFAULT_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval_secs: u64,

    #[arg(long, env = "CONNECT_TIMEOUT_MS", default_value_t = DEFAULT_CONNECT_TIMEOUT.as_millis() as u64)]
    pub connect_timeout_ms: u64,

    #[arg(long, env = "WRITE_TIMEOUT_MS", default_value_t = DEFAULT_WRITE_TIMEOUT.as_millis() as u64)]
    pub write_timeout_ms: u64,

    /// Seed for simulated readings. Defaults to the current time.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop after this many cycles instead of running forever.
    #[arg(long)]
    pub cycles: Option<u64>,
}

impl Args {
    pub fn config(&self) -> TransmitterConfig {
        TransmitterConfig {
            collector: CollectorAddr {
                host: self.collector_host.clone(),
                port: self.collector_port,
            },
            sensor_id: self.sensor_id,
            private_key_path: self.private_key.clone(),
            scheme: self.scheme,
            framing: self.framing,
            interval: Duration::from_secs(self.interval_secs),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            write_timeout: Duration::from_millis(self.write_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_match_library_config() {
        let config = Args::try_parse_from(["sensor-client"]).unwrap().config();
        let default = TransmitterConfig::default();

        assert_eq!(config.collector, default.collector);
        assert_eq!(config.sensor_id, default.sensor_id);
        assert_eq!(config.private_key_path, default.private_key_path);
        assert_eq!(config.scheme, default.scheme);
        assert_eq!(config.framing, default.framing);
        assert_eq!(config.interval, default.interval);
        assert_eq!(config.connect_timeout, default.connect_timeout);
        assert_eq!(config.write_timeout, default.write_timeout);
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(Args::try_parse_from(["sensor-client", "--interval-secs", "0"]).is_err());

        let args = Args::try_parse_from(["sensor-client", "--interval-secs", "1"]).unwrap();
        assert_eq!(args.config().interval, Duration::from_secs(1));
    }
}
