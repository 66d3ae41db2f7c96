use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncReadExt as _},
    time::{Duration, timeout},
};

use crate::{
    crypto::{OpenError, PacketVerifier},
    packet::{Framing, SensorRecord},
};

#[derive(Debug, Error)]
pub enum ReceiveError {
    #[error("failed to read packet: {0}")]
    Read(#[source] std::io::Error),

    #[error("timed out reading packet after {0:?}")]
    ReadTimeout(Duration),

    #[error(transparent)]
    Open(#[from] OpenError),
}

/// The receiving end of one-packet-per-connection delivery.
#[derive(Debug)]
pub struct Collector {
    verifier: PacketVerifier,
    framing: Framing,
    read_timeout: Duration,
}

impl Collector {
    pub fn new(verifier: PacketVerifier, framing: Framing, read_timeout: Duration) -> Self {
        Self {
            verifier,
            framing,
            read_timeout,
        }
    }

    /// The only packet size this collector accepts.
    pub fn packet_len(&self) -> usize {
        self.framing.packet_len(self.verifier.signature_len())
    }

    /// Reads until the sender closes, then verifies and decodes.
    pub async fn receive<R: AsyncRead + Unpin>(
        &self,
        stream: R,
    ) -> Result<SensorRecord, ReceiveError> {
        let bytes = match timeout(self.read_timeout, read_packet(stream, self.packet_len())).await
        {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(err)) => return Err(ReceiveError::Read(err)),
            Err(_) => return Err(ReceiveError::ReadTimeout(self.read_timeout)),
        };

        Ok(self.verifier.open(&bytes, self.framing)?)
    }
}

/// Reads a whole packet until end of stream.
///
/// At most `limit + 1` bytes are buffered, enough for the length check to see
/// that an oversized packet is too long without reading all of it.
pub async fn read_packet<R: AsyncRead + Unpin>(
    stream: R,
    limit: usize,
) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(limit);
    stream.take(limit as u64 + 1).read_to_end(&mut buf).await?;
    Ok(buf)
}
