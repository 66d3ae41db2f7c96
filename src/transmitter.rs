use thiserror::Error;

use crate::{
    clock::Clock,
    config::TransmitterConfig,
    crypto::{RecordSigner, SignError, SignatureScheme},
    packet::{FrameError, Framing, SensorRecord, SignedPacket},
    sampling::ReadingSource,
    transport::{Connection as _, Transport, TransportError},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("configured scheme {configured} does not match the {signer} signing key")]
    SchemeMismatch {
        configured: SignatureScheme,
        signer: SignatureScheme,
    },

    #[error(transparent)]
    Frame(#[from] FrameError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Sampling,
    Encoding,
    Signing,
    Connecting,
    Sending,
}

/// How a single cycle ended. Every variant is followed by the same delay.
#[derive(Debug)]
pub enum CycleOutcome {
    Sent { record: SensorRecord, bytes: usize },
    SignFailed(SignError),
    /// The signer returned more bytes than a length prefix can announce,
    /// despite reporting a `signature_len` that fits.
    FrameFailed(FrameError),
    ConnectFailed(TransportError),
    SendFailed(TransportError),
}

impl CycleOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, CycleOutcome::Sent { .. })
    }
}

/// Drives `sample → encode → sign → connect → send → delay`, one cycle at a
/// time.
///
/// No error escapes a cycle. The next cycle always samples fresh readings;
/// nothing is buffered for resend.
pub struct Transmitter<R, S, T, C> {
    config: TransmitterConfig,
    source: R,
    signer: S,
    transport: T,
    clock: C,
    state: CycleState,
    cycles: u64,
}

impl<R, S, T, C> Transmitter<R, S, T, C>
where
    R: ReadingSource,
    S: RecordSigner,
    T: Transport,
    C: Clock,
{
    pub fn new(
        config: TransmitterConfig,
        source: R,
        signer: S,
        transport: T,
        clock: C,
    ) -> Result<Self, SetupError> {
        if config.scheme != signer.scheme() {
            return Err(SetupError::SchemeMismatch {
                configured: config.scheme,
                signer: signer.scheme(),
            });
        }

        if config.framing == Framing::LengthPrefixed
            && signer.signature_len() > u16::MAX as usize
        {
            return Err(FrameError::SignatureTooLong(signer.signature_len()).into());
        }

        Ok(Self {
            config,
            source,
            signer,
            transport,
            clock,
            state: CycleState::Idle,
            cycles: 0,
        })
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Size of every packet this transmitter writes.
    pub fn packet_len(&self) -> usize {
        self.config.framing.packet_len(self.signer.signature_len())
    }

    /// Runs cycles back to back. `None` runs until the process is terminated.
    pub async fn run(&mut self, max_cycles: Option<u64>) {
        tracing::info!(
            collector = %self.config.collector,
            sensor_id = self.config.sensor_id,
            scheme = %self.signer.scheme(),
            framing = %self.config.framing,
            packet_len = self.packet_len(),
            "starting transmission"
        );

        while max_cycles.is_none_or(|max| self.cycles < max) {
            self.run_cycle().await;
        }
    }

    /// Runs one full cycle including the trailing delay.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let outcome = self.transmit().await;
        self.cycles += 1;

        match &outcome {
            CycleOutcome::Sent { record, bytes } => tracing::info!(
                sensor_id = record.sensor_id,
                timestamp = record.timestamp,
                temperature = record.temperature,
                pressure = record.pressure,
                humidity = record.humidity,
                "packet sent ({bytes} bytes)"
            ),
            CycleOutcome::SignFailed(err) => tracing::warn!("skipping cycle: {err}"),
            CycleOutcome::FrameFailed(err) => tracing::warn!("skipping cycle: {err}"),
            CycleOutcome::ConnectFailed(err) => tracing::warn!("skipping cycle: {err}"),
            CycleOutcome::SendFailed(err) => tracing::warn!("packet not delivered: {err}"),
        }

        self.clock.sleep(self.config.interval).await;
        self.transition(CycleState::Idle);

        outcome
    }

    async fn transmit(&mut self) -> CycleOutcome {
        self.transition(CycleState::Sampling);
        let readings = self.source.sample();
        let record = SensorRecord {
            sensor_id: self.config.sensor_id,
            timestamp: self.clock.unix_timestamp(),
            temperature: readings.temperature,
            pressure: readings.pressure,
            humidity: readings.humidity,
        };

        self.transition(CycleState::Encoding);
        let record_bytes = record.encode();

        self.transition(CycleState::Signing);
        let signature = match self.signer.sign(&record_bytes) {
            Ok(signature) => signature,
            Err(err) => return CycleOutcome::SignFailed(err),
        };
        let packet = match SignedPacket::new(record_bytes, signature).to_bytes(self.config.framing)
        {
            Ok(packet) => packet,
            Err(err) => return CycleOutcome::FrameFailed(err),
        };

        self.transition(CycleState::Connecting);
        let mut connection = match self.transport.connect().await {
            Ok(connection) => connection,
            Err(err) => return CycleOutcome::ConnectFailed(err),
        };

        self.transition(CycleState::Sending);
        let sent = connection.send(&packet).await;
        connection.close().await;

        match sent {
            Ok(()) => CycleOutcome::Sent {
                record,
                bytes: packet.len(),
            },
            Err(err) => CycleOutcome::SendFailed(err),
        }
    }

    fn transition(&mut self, next: CycleState) {
        tracing::trace!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

impl<R, S, T, C> std::fmt::Debug for Transmitter<R, S, T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transmitter")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .finish_non_exhaustive()
    }
}
