// Alert monitor - tier transitions between consecutive snapshots
use crate::domain::snapshot::TelemetrySnapshot;
use crate::domain::tier::SeverityTier;
use futures::Stream;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_stream::StreamExt;

#[derive(Debug, Clone, PartialEq)]
pub struct TierTransition {
    pub key: String,
    pub label: String,
    pub from: SeverityTier,
    pub to: SeverityTier,
    pub value: f64,
    pub display_value: String,
    pub unit: String,
}

impl TierTransition {
    pub fn is_escalation(&self) -> bool {
        self.to > self.from
    }
}

/// Remembers the last tier seen per channel.
#[derive(Debug, Default)]
pub struct AlertMonitor {
    last: HashMap<String, SeverityTier>,
}

impl AlertMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transitions since the previously observed snapshot. The first
    /// observation of a channel only records its tier.
    pub fn observe(&mut self, snapshot: &TelemetrySnapshot) -> Vec<TierTransition> {
        let mut transitions = Vec::new();
        for reading in &snapshot.channels {
            let previous = self.last.insert(reading.key.clone(), reading.tier);
            if let Some(from) = previous.filter(|&t| t != reading.tier) {
                transitions.push(TierTransition {
                    key: reading.key.clone(),
                    label: reading.label.clone(),
                    from,
                    to: reading.tier,
                    value: reading.value,
                    display_value: reading.display_value(),
                    unit: reading.unit.clone(),
                });
            }
        }
        transitions
    }
}

/// Turn a snapshot stream into a stream of tier transitions.
pub fn alert_stream<S>(snapshots: S) -> impl Stream<Item = TierTransition>
where
    S: Stream<Item = Arc<TelemetrySnapshot>> + Unpin,
{
    async_stream::stream! {
        let mut snapshots = snapshots;
        let mut monitor = AlertMonitor::new();
        while let Some(snapshot) = snapshots.next().await {
            for transition in monitor.observe(&snapshot) {
                yield transition;
            }
        }
    }
}
