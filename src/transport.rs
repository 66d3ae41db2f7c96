use std::future::Future;

use thiserror::Error;
use tokio::{
    io::AsyncWriteExt as _,
    net::TcpStream,
    time::{Duration, timeout},
};

use crate::config::{CollectorAddr, TransmitterConfig};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out connecting to {addr} after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    /// Covers short writes: anything short of the whole packet is an error.
    #[error("failed to write packet: {0}")]
    Write(#[source] std::io::Error),

    #[error("timed out writing packet after {0:?}")]
    WriteTimeout(Duration),
}

/// Opens one connection per packet.
pub trait Transport {
    type Connection: Connection;

    fn connect(&self) -> impl Future<Output = Result<Self::Connection, TransportError>>;
}

/// An open connection, owned by a single transmission cycle.
///
/// Dropping it releases the underlying descriptor, so an early return cannot
/// leak it; [`Connection::close`] is the orderly path.
pub trait Connection {
    /// Writes the whole packet. No acknowledgment is read back.
    fn send(&mut self, packet: &[u8]) -> impl Future<Output = Result<(), TransportError>>;

    fn close(self) -> impl Future<Output = ()>;
}

#[derive(Debug, Clone)]
pub struct TcpTransport {
    addr: CollectorAddr,
    connect_timeout: Duration,
    write_timeout: Duration,
}

impl TcpTransport {
    pub fn new(addr: CollectorAddr, connect_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            addr,
            connect_timeout,
            write_timeout,
        }
    }

    pub fn from_config(config: &TransmitterConfig) -> Self {
        Self::new(
            config.collector.clone(),
            config.connect_timeout,
            config.write_timeout,
        )
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;

    async fn connect(&self) -> Result<TcpConnection, TransportError> {
        let connecting = TcpStream::connect((self.addr.host.as_str(), self.addr.port));

        let stream = match timeout(self.connect_timeout, connecting).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(TransportError::Connect {
                    addr: self.addr.to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(TransportError::ConnectTimeout {
                    addr: self.addr.to_string(),
                    timeout: self.connect_timeout,
                });
            }
        };

        Ok(TcpConnection {
            stream,
            write_timeout: self.write_timeout,
        })
    }
}

#[derive(Debug)]
pub struct TcpConnection {
    stream: TcpStream,
    write_timeout: Duration,
}

impl Connection for TcpConnection {
    async fn send(&mut self, packet: &[u8]) -> Result<(), TransportError> {
        match timeout(self.write_timeout, self.stream.write_all(packet)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(TransportError::Write(err)),
            Err(_) => Err(TransportError::WriteTimeout(self.write_timeout)),
        }
    }

    async fn close(mut self) {
        if let Err(err) = self.stream.shutdown().await {
            tracing::debug!("failed to shut down connection: {err}");
        }
    }
}
