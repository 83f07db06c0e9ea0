// Main entry point - Configuration, engine wiring and output
use anyhow::Context;
use futures::StreamExt;
use vitals_telemetry::application::alert_monitor::alert_stream;
use vitals_telemetry::application::random_source::{RandomSource, ThreadRandom};
use vitals_telemetry::infrastructure::config::load_monitor_config;
use vitals_telemetry::infrastructure::logging;
use vitals_telemetry::presentation::sink::{forward_snapshots, log_transition, sink_for};
use vitals_telemetry::TelemetryEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = load_monitor_config()?;
    let output = config.output.clone();

    let rng: Box<dyn RandomSource> = match config.seed {
        Some(seed) => Box::new(ThreadRandom::seeded(seed)),
        None => Box::new(ThreadRandom::new()),
    };

    let engine = TelemetryEngine::configure_with(config.channels, config.waveform, config.cadence, rng)
        .context("refusing to start the monitor")?;

    // Tier changes are logged as they happen, independent of output throttling
    let alerts = alert_stream(engine.snapshot_stream());
    let alert_task = tokio::spawn(async move {
        futures::pin_mut!(alerts);
        while let Some(transition) = alerts.next().await {
            log_transition(&transition);
        }
    });

    engine.start();

    let sink = sink_for(output.format);
    let result = tokio::select! {
        result = forward_snapshots(engine.snapshot_stream(), sink.as_ref(), output.every) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received, shutting down");
            Ok(())
        }
    };

    engine.stop().await;
    alert_task.abort();

    result
}
