// Telemetry engine - owns the simulators, drives them, publishes snapshots
use crate::application::channel_simulator::{ChannelSimulator, Policy};
use crate::application::random_source::{RandomSource, ThreadRandom};
use crate::application::waveform_generator::{WaveformBand, WaveformGenerator};
use crate::domain::channel::{ChannelDefinition, ChannelReading};
use crate::domain::error::ConfigError;
use crate::domain::snapshot::TelemetrySnapshot;
use crate::domain::window::SlidingWindow;
use crate::infrastructure::config::{CadenceConfig, ChannelConfig, WaveformConfig};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::WatchStream;

struct ChannelState {
    simulator: ChannelSimulator,
    trend: SlidingWindow,
    reading: ChannelReading,
}

impl ChannelState {
    fn new(definition: ChannelDefinition, trend_length: usize) -> Self {
        let trend = SlidingWindow::filled(trend_length, definition.seed);
        let reading = ChannelReading::new(&definition, definition.seed, trend.to_vec());
        Self {
            simulator: ChannelSimulator::new(definition),
            trend,
            reading,
        }
    }

    /// Value, trend and tier are replaced together.
    fn record(&mut self, value: f64) {
        self.trend.push(value);
        self.reading = ChannelReading::new(self.simulator.definition(), value, self.trend.to_vec());
        tracing::debug!(
            "channel {} -> {} ({})",
            self.reading.key,
            self.reading.display_value(),
            self.reading.tier
        );
    }
}

/// Mutable generator state. Only reachable through `Shared::core`.
struct EngineCore {
    channels: Vec<ChannelState>,
    waveform: WaveformGenerator,
    rng: Box<dyn RandomSource>,
    sequence: u64,
}

impl EngineCore {
    fn build_snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot::new(
            self.sequence,
            self.channels.iter().map(|c| c.reading.clone()).collect(),
            self.waveform.samples(),
        )
    }

    fn index_of(&self, key: &str) -> Option<usize> {
        self.channels
            .iter()
            .position(|c| c.simulator.definition().key == key)
    }
}

struct Shared {
    core: Mutex<EngineCore>,
    publisher: watch::Sender<Arc<TelemetrySnapshot>>,
}

impl Shared {
    /// Mutate under the lock, then publish before releasing it so snapshots
    /// go out in tick order.
    fn with_core<R>(&self, mutate: impl FnOnce(&mut EngineCore) -> R) -> R {
        let mut core = self.core.lock();
        let result = mutate(&mut core);
        core.sequence += 1;
        self.publisher.send_replace(Arc::new(core.build_snapshot()));
        result
    }

    fn tick_channels(&self, indices: &[usize]) {
        self.with_core(|core| {
            let EngineCore { channels, rng, .. } = core;
            for &index in indices {
                let state = &mut channels[index];
                let value = state.simulator.step(rng.as_mut());
                state.record(value);
            }
        });
    }

    fn tick_waveform(&self) -> f64 {
        self.with_core(|core| {
            let EngineCore { waveform, rng, .. } = core;
            let sample = waveform.tick(rng.as_mut());
            tracing::trace!("waveform sample {:.3}", sample);
            sample
        })
    }
}

struct Session {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

/// Owns every channel simulator and the waveform generator.
///
/// `start` spawns the periodic tickers on the current tokio runtime and
/// `stop` tears them down. Readers call `snapshot` or `subscribe`; neither
/// waits on a tick in progress beyond the publication swap.
pub struct TelemetryEngine {
    shared: Arc<Shared>,
    channel_groups: Vec<(Duration, Vec<usize>)>,
    waveform_interval: Duration,
    session: Mutex<Option<Session>>,
}

impl TelemetryEngine {
    /// Build an engine with default cadences and an entropy-seeded source.
    pub fn configure(
        channels: Vec<ChannelConfig>,
        waveform: WaveformConfig,
    ) -> Result<Self, ConfigError> {
        Self::configure_with(
            channels,
            waveform,
            CadenceConfig::default(),
            Box::new(ThreadRandom::new()),
        )
    }

    pub fn configure_with(
        channels: Vec<ChannelConfig>,
        waveform: WaveformConfig,
        cadence: CadenceConfig,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        if channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        cadence.validate()?;

        let mut seen = HashSet::new();
        let mut definitions = Vec::with_capacity(channels.len());
        for channel in channels {
            let definition = ChannelDefinition::try_from(channel)?;
            if !seen.insert(definition.key.clone()) {
                return Err(ConfigError::DuplicateKey(definition.key));
            }
            definitions.push(definition);
        }

        let mut groups: BTreeMap<Duration, Vec<usize>> = BTreeMap::new();
        for (index, definition) in definitions.iter().enumerate() {
            let interval = definition.cadence.unwrap_or(cadence.channel_interval());
            groups.entry(interval).or_default().push(index);
        }

        let waveform = WaveformGenerator::new(waveform)?;
        let core = EngineCore {
            channels: definitions
                .into_iter()
                .map(|d| ChannelState::new(d, cadence.trend_length))
                .collect(),
            waveform,
            rng,
            sequence: 0,
        };
        let (publisher, _) = watch::channel(Arc::new(core.build_snapshot()));

        Ok(Self {
            shared: Arc::new(Shared {
                core: Mutex::new(core),
                publisher,
            }),
            channel_groups: groups.into_iter().collect(),
            waveform_interval: cadence.waveform_interval(),
            session: Mutex::new(None),
        })
    }

    /// Begin periodic ticking. Returns `false` if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut session = self.session.lock();
        if session.is_some() {
            return false;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::with_capacity(self.channel_groups.len() + 1);

        for (interval, indices) in &self.channel_groups {
            let shared = self.shared.clone();
            let indices = indices.clone();
            tasks.push(spawn_ticker(*interval, shutdown_rx.clone(), move || {
                shared.tick_channels(&indices);
            }));
        }

        let shared = self.shared.clone();
        tasks.push(spawn_ticker(
            self.waveform_interval,
            shutdown_rx,
            move || {
                shared.tick_waveform();
            },
        ));

        tracing::info!(
            "Telemetry engine started: {} channel cadence group(s), waveform every {:?}",
            self.channel_groups.len(),
            self.waveform_interval
        );
        *session = Some(Session { shutdown, tasks });
        true
    }

    /// Halt all ticking. Once this returns no further tick will run; a tick
    /// already in flight is allowed to finish. Returns `false` if not running.
    pub async fn stop(&self) -> bool {
        let Some(session) = self.session.lock().take() else {
            return false;
        };

        let _ = session.shutdown.send(true);
        for task in session.tasks {
            if let Err(e) = task.await {
                tracing::warn!("Ticker task ended abnormally: {}", e);
            }
        }

        tracing::info!("Telemetry engine stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Latest published snapshot. Does not tick.
    pub fn snapshot(&self) -> Arc<TelemetrySnapshot> {
        self.shared.publisher.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<TelemetrySnapshot>> {
        self.shared.publisher.subscribe()
    }

    /// Stream of snapshots, starting with the current one.
    pub fn snapshot_stream(&self) -> WatchStream<Arc<TelemetrySnapshot>> {
        WatchStream::new(self.subscribe())
    }

    /// Run one tick of every channel immediately.
    pub fn tick_channels(&self) {
        let all: Vec<usize> = (0..self.channel_count()).collect();
        self.shared.tick_channels(&all);
    }

    /// Run one tick of a single channel immediately.
    pub fn tick_channel(&self, key: &str) -> Option<ChannelReading> {
        self.with_channel(key, |state, rng| state.simulator.step(rng))
    }

    /// Run one waveform tick immediately, returning the new sample.
    pub fn tick_waveform(&self) -> f64 {
        self.shared.tick_waveform()
    }

    /// Apply a specific policy to one channel, bypassing policy selection.
    pub fn apply_policy(&self, key: &str, policy: Policy) -> Option<ChannelReading> {
        self.with_channel(key, |state, rng| state.simulator.apply(policy, rng))
    }

    /// Overwrite a channel's value. Non-finite values are ignored.
    pub fn force_value(&self, key: &str, value: f64) -> Option<ChannelReading> {
        self.with_channel(key, |state, _| state.simulator.force(value))
    }

    /// Push a sample from a specific band, bypassing band selection.
    pub fn apply_waveform_band(&self, band: WaveformBand) -> f64 {
        self.shared.with_core(|core| {
            let EngineCore { waveform, rng, .. } = core;
            waveform.apply(band, rng.as_mut())
        })
    }

    pub fn channel_count(&self) -> usize {
        self.shared.core.lock().channels.len()
    }

    fn with_channel(
        &self,
        key: &str,
        produce: impl FnOnce(&mut ChannelState, &mut dyn RandomSource) -> f64,
    ) -> Option<ChannelReading> {
        let index = self.shared.core.lock().index_of(key)?;
        let reading = self.shared.with_core(|core| {
            let EngineCore { channels, rng, .. } = core;
            let state = &mut channels[index];
            let value = produce(state, rng.as_mut());
            state.record(value);
            state.reading.clone()
        });
        Some(reading)
    }
}

impl Drop for TelemetryEngine {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().take() {
            let _ = session.shutdown.send(true);
        }
    }
}

fn spawn_ticker<F>(period: Duration, mut shutdown: watch::Receiver<bool>, mut on_tick: F) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = interval.tick() => on_tick(),
            }
        }
    })
}
