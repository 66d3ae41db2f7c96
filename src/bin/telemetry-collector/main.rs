mod args;

use std::process::ExitCode;

use anyhow::{Context as _, Result};
use args::Args;
use chrono::DateTime;
use chrono_tz::Tz;
use clap::Parser as _;
use signed_telemetry::{collector::Collector, crypto::PacketVerifier, packet::SensorRecord};
use tokio::{net::TcpListener, time::Duration};
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

    let verifier = PacketVerifier::load(args.scheme, &args.public_key)
        .context("failed to load public key")?;
    let collector = Collector::new(
        verifier,
        args.framing,
        Duration::from_millis(args.read_timeout_ms),
    );

    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to listen on {}", args.listen))?;
    tracing::info!(
        "listening on {} ({}, {} framing, {}-byte packets)",
        args.listen,
        args.scheme,
        args.framing,
        collector.packet_len()
    );

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::warn!("failed to accept connection: {err}");
                continue;
            }
        };

        match collector.receive(stream).await {
            Ok(record) => log_record(&record, args.timezone),
            Err(err) => tracing::warn!("rejected packet from {peer}: {err}"),
        }
    }
}

fn log_record(record: &SensorRecord, timezone: Tz) {
    let measured_at = match DateTime::from_timestamp(record.timestamp, 0) {
        Some(dt) => dt.with_timezone(&timezone).to_rfc3339(),
        None => format!("invalid timestamp {}", record.timestamp),
    };

    tracing::info!(
        sensor_id = record.sensor_id,
        measured_at = %measured_at,
        temperature = %format!("{:.2}", record.temperature),
        pressure = %format!("{:.2}", record.pressure),
        humidity = %format!("{:.2}", record.humidity),
        "verified packet"
    );
}
