// Published telemetry snapshot
use super::channel::ChannelReading;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Immutable view of every channel and the waveform at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    pub sequence: u64,
    pub taken_at: DateTime<Utc>,
    pub channels: Vec<ChannelReading>,
    pub waveform: Vec<f64>,
}

impl TelemetrySnapshot {
    pub fn new(sequence: u64, channels: Vec<ChannelReading>, waveform: Vec<f64>) -> Self {
        Self {
            sequence,
            taken_at: Utc::now(),
            channels,
            waveform,
        }
    }

    pub fn channel(&self, key: &str) -> Option<&ChannelReading> {
        self.channels.iter().find(|c| c.key == key)
    }
}
