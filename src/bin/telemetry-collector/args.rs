use std::{net::SocketAddr, path::PathBuf};

use chrono_tz::Tz;
use clap::Parser;
use signed_telemetry::{crypto::SignatureScheme, packet::Framing};

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(long, env = "COLLECTOR_LISTEN", default_value = "127.0.0.1:12345")]
    pub listen: SocketAddr,

    #[arg(long, env = "PUBLIC_KEY_PATH", default_value = "public.pem")]
    pub public_key: PathBuf,

    #[arg(long, env = "SIGNATURE_SCHEME", default_value = "rsa-pkcs1v15-sha256")]
    pub scheme: SignatureScheme,

    #[arg(long, env = "FRAMING", default_value = "implicit")]
    pub framing: Framing,

    /// Time zone used when printing record timestamps.
    #[arg(long, env = "TZ", default_value = "UTC")]
    pub timezone: Tz,

    #[arg(long, env = "READ_TIMEOUT_MS", default_value_t = 5000)]
    pub read_timeout_ms: u64,
}
