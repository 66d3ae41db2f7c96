use std::io::Write as _;

use rsa::{
    RsaPrivateKey,
    pkcs8::{EncodePrivateKey as _, EncodePublicKey as _, LineEnding},
};
use signed_telemetry::{
    clock::SystemClock,
    collector::Collector,
    config::{CollectorAddr, TransmitterConfig},
    crypto::{PacketSigner, PacketVerifier, SignatureScheme},
    packet::{Framing, RECORD_LEN, SensorRecord},
    sampling::SimulatedSource,
    transmitter::{CycleOutcome, Transmitter},
    transport::TcpTransport,
};
use tokio::{net::TcpListener, time::Duration};

struct KeyFiles {
    _dir: tempfile::TempDir,
    private: std::path::PathBuf,
    public: std::path::PathBuf,
}

fn write_rsa_keys() -> KeyFiles {
    let key = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let private = dir.path().join("private.pem");
    let mut file = std::fs::File::create(&private).unwrap();
    file.write_all(key.to_pkcs8_pem(LineEnding::LF).unwrap().as_bytes())
        .unwrap();

    let public = dir.path().join("public.pem");
    std::fs::write(
        &public,
        key.to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap(),
    )
    .unwrap();

    KeyFiles {
        _dir: dir,
        private,
        public,
    }
}

async fn spawn_collector(
    collector: Collector,
    packets: usize,
) -> (u16, tokio::task::JoinHandle<Vec<SensorRecord>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let mut records = Vec::new();
        for _ in 0..packets {
            let (stream, _) = listener.accept().await.unwrap();
            records.push(collector.receive(stream).await.unwrap());
        }
        records
    });

    (port, handle)
}

fn config(keys: &KeyFiles, port: u16, framing: Framing) -> TransmitterConfig {
    TransmitterConfig {
        collector: CollectorAddr {
            host: "127.0.0.1".to_string(),
            port,
        },
        sensor_id: 101,
        private_key_path: keys.private.clone(),
        scheme: SignatureScheme::RsaPkcs1v15Sha256,
        framing,
        interval: Duration::from_millis(10),
        connect_timeout: Duration::from_secs(2),
        write_timeout: Duration::from_secs(2),
    }
}

#[tokio::test]
async fn sensor_packets_verify_at_collector() {
    let keys = write_rsa_keys();
    let scheme = SignatureScheme::RsaPkcs1v15Sha256;

    let verifier = PacketVerifier::load(scheme, &keys.public).unwrap();
    let collector = Collector::new(verifier, Framing::Implicit, Duration::from_secs(2));
    assert_eq!(collector.packet_len(), RECORD_LEN + 128);
    let (port, handle) = spawn_collector(collector, 3).await;

    let config = config(&keys, port, Framing::Implicit);
    let signer = PacketSigner::load(scheme, &config.private_key_path).unwrap();
    let transport = TcpTransport::from_config(&config);
    let mut transmitter = Transmitter::new(
        config,
        SimulatedSource::from_seed(1),
        signer,
        transport,
        SystemClock,
    )
    .unwrap();

    transmitter.run(Some(3)).await;

    let records = handle.await.unwrap();
    assert_eq!(records.len(), 3);
    for record in records {
        assert_eq!(record.sensor_id, 101);
        assert!(record.timestamp > 1_700_000_000);
        assert!((20.0..25.0).contains(&record.temperature));
    }
}

#[tokio::test]
async fn length_prefixed_framing_end_to_end() {
    let keys = write_rsa_keys();
    let scheme = SignatureScheme::RsaPkcs1v15Sha256;

    let verifier = PacketVerifier::load(scheme, &keys.public).unwrap();
    let collector = Collector::new(verifier, Framing::LengthPrefixed, Duration::from_secs(2));
    let (port, handle) = spawn_collector(collector, 1).await;

    let config = config(&keys, port, Framing::LengthPrefixed);
    let signer = PacketSigner::load(scheme, &config.private_key_path).unwrap();
    let transport = TcpTransport::from_config(&config);
    let mut transmitter = Transmitter::new(
        config,
        SimulatedSource::from_seed(2),
        signer,
        transport,
        SystemClock,
    )
    .unwrap();

    let outcome = transmitter.run_cycle().await;
    let CycleOutcome::Sent { record, bytes } = &outcome else {
        panic!("expected a sent packet, got {outcome:?}");
    };

    assert_eq!(*bytes, 2 + RECORD_LEN + 128);
    assert_eq!(handle.await.unwrap(), vec![*record]);
}

#[tokio::test]
async fn unreachable_collector_is_skipped_not_fatal() {
    let keys = write_rsa_keys();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = config(&keys, port, Framing::Implicit);
    let signer = PacketSigner::load(config.scheme, &config.private_key_path).unwrap();
    let transport = TcpTransport::from_config(&config);
    let mut transmitter = Transmitter::new(
        config,
        SimulatedSource::from_seed(3),
        signer,
        transport,
        SystemClock,
    )
    .unwrap();

    for _ in 0..2 {
        let outcome = transmitter.run_cycle().await;
        assert!(
            matches!(outcome, CycleOutcome::ConnectFailed(_)),
            "{outcome:?}"
        );
    }
    assert_eq!(transmitter.cycles(), 2);
}
