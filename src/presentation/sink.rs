// Snapshot sinks - where the binary sends published telemetry
use crate::application::alert_monitor::TierTransition;
use crate::domain::snapshot::TelemetrySnapshot;
use crate::domain::tier::SeverityTier;
use crate::infrastructure::config::OutputFormat;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn publish(&self, snapshot: &TelemetrySnapshot) -> anyhow::Result<()>;
}

/// One log line per snapshot.
pub struct LogSink;

#[async_trait]
impl SnapshotSink for LogSink {
    async fn publish(&self, snapshot: &TelemetrySnapshot) -> anyhow::Result<()> {
        tracing::info!("#{} {}", snapshot.sequence, summary_line(snapshot));
        Ok(())
    }
}

/// Newline-delimited JSON, one object per snapshot.
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> SnapshotSink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn publish(&self, snapshot: &TelemetrySnapshot) -> anyhow::Result<()> {
        let mut line = serde_json::to_vec(snapshot)?;
        line.push(b'\n');
        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}

pub fn sink_for(format: OutputFormat) -> Box<dyn SnapshotSink> {
    match format {
        OutputFormat::Log => Box::new(LogSink),
        OutputFormat::Json => Box::new(JsonLinesSink::new(tokio::io::stdout())),
    }
}

/// `HR 72 BPM [normal] | O2 98 % [normal] | ...` with a waveform peak marker.
pub fn summary_line(snapshot: &TelemetrySnapshot) -> String {
    let channels: Vec<String> = snapshot
        .channels
        .iter()
        .map(|c| format!("{} {} {} [{}]", c.label, c.display_value(), c.unit, c.tier))
        .collect();
    let peak = snapshot
        .waveform
        .iter()
        .copied()
        .fold(0.0_f64, f64::max);
    format!("{} | wave peak {:.2}", channels.join(" | "), peak)
}

pub fn log_transition(transition: &TierTransition) {
    let message = format!(
        "{} {} -> {} at {} {}",
        transition.label, transition.from, transition.to, transition.display_value, transition.unit
    );
    match transition.to {
        SeverityTier::Critical => tracing::error!("{}", message),
        SeverityTier::Warning if transition.is_escalation() => tracing::warn!("{}", message),
        _ => tracing::info!("{}", message),
    }
}

/// Forward every `every`-th snapshot to `sink` until the stream ends.
pub async fn forward_snapshots<S>(
    snapshots: S,
    sink: &dyn SnapshotSink,
    every: u64,
) -> anyhow::Result<()>
where
    S: Stream<Item = Arc<TelemetrySnapshot>>,
{
    let every = every.max(1);
    futures::pin_mut!(snapshots);
    while let Some(snapshot) = snapshots.next().await {
        if snapshot.sequence % every == 0 {
            sink.publish(&snapshot).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::channel::tests::heart_rate;
    use crate::domain::channel::ChannelReading;

    fn snapshot(sequence: u64) -> Arc<TelemetrySnapshot> {
        let reading = ChannelReading::new(&heart_rate(), 106.0, vec![72.0, 106.0]);
        Arc::new(TelemetrySnapshot::new(sequence, vec![reading], vec![0.1, 0.9, 0.15]))
    }

    #[test]
    fn test_summary_line() {
        let line = summary_line(&snapshot(3));
        assert_eq!(line, "HEART RATE 106 BPM [warning] | wave peak 0.90");
    }

    #[tokio::test]
    async fn test_json_lines_sink() {
        let sink = JsonLinesSink::new(Vec::<u8>::new());
        sink.publish(&snapshot(1)).await.unwrap();
        sink.publish(&snapshot(2)).await.unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["sequence"], 1);
        assert_eq!(first["channels"][0]["key"], "hr");
        assert_eq!(first["channels"][0]["tier"], "warning");
        assert_eq!(first["waveform"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_forward_throttles() {
        let sink = JsonLinesSink::new(Vec::<u8>::new());
        let snapshots = tokio_stream::iter((0..10).map(snapshot));
        forward_snapshots(snapshots, &sink, 4).await.unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        // sequences 0, 4 and 8
        assert_eq!(output.lines().count(), 3);
    }
}
