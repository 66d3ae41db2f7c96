mod args;

use std::process::ExitCode;

use anyhow::{Context as _, Result};
use args::Args;
use clap::Parser as _;
use signed_telemetry::{
    clock::SystemClock,
    crypto::{PacketSigner, RecordSigner as _},
    sampling::SimulatedSource,
    transmitter::Transmitter,
    transport::TcpTransport,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let config = args.config();

    let signer = PacketSigner::load(config.scheme, &config.private_key_path)
        .context("failed to load private key")?;
    tracing::info!(
        "loaded {} private key from {} ({}-byte signatures)",
        signer.scheme(),
        config.private_key_path.display(),
        signer.signature_len()
    );

    let source = match args.seed {
        Some(seed) => SimulatedSource::from_seed(seed),
        None => SimulatedSource::from_clock(),
    };
    let transport = TcpTransport::from_config(&config);

    let mut transmitter = Transmitter::new(config, source, signer, transport, SystemClock)
        .context("failed to set up transmitter")?;

    transmitter.run(args.cycles).await;

    Ok(())
}
