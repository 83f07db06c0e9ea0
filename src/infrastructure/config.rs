use crate::domain::channel::ChannelDefinition;
use crate::domain::error::ConfigError;
use crate::domain::tier::Range;
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelConfig>,
    #[serde(default)]
    pub waveform: WaveformConfig,
    #[serde(default)]
    pub cadence: CadenceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Fixed RNG seed for a reproducible session.
    pub seed: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            waveform: WaveformConfig::default(),
            cadence: CadenceConfig::default(),
            output: OutputConfig::default(),
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChannelConfig {
    pub key: String,
    pub label: String,
    pub unit: String,
    #[serde(default)]
    pub precision: usize,
    pub seed: f64,
    pub normal: Range,
    pub bound: Range,
    pub drift: f64,
    pub comfort: Range,
    pub excursion_high: Range,
    pub excursion_low: Range,
    #[serde(default = "default_excursion_probability")]
    pub excursion_probability: f64,
    pub cadence_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WaveformConfig {
    pub capacity: usize,
    pub major_probability: f64,
    pub major_amplitude: f64,
    pub minor_probability: f64,
    pub minor_amplitude: f64,
    pub baseline_min: f64,
    pub baseline_jitter: f64,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            capacity: 60,
            major_probability: 0.10,
            major_amplitude: 0.9,
            minor_probability: 0.05,
            minor_amplitude: 0.4,
            baseline_min: 0.1,
            baseline_jitter: 0.1,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CadenceConfig {
    pub channel_ms: u64,
    pub waveform_ms: u64,
    /// Values kept per channel for the trend strip.
    pub trend_length: usize,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            channel_ms: 3000,
            waveform_ms: 50,
            trend_length: 20,
        }
    }
}

impl CadenceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_ms == 0 {
            return Err(ConfigError::Cadence("channel_ms must be positive".to_string()));
        }
        if self.waveform_ms == 0 {
            return Err(ConfigError::Cadence("waveform_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn channel_interval(&self) -> Duration {
        Duration::from_millis(self.channel_ms)
    }

    pub fn waveform_interval(&self) -> Duration {
        Duration::from_millis(self.waveform_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Log,
    Json,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Emit every n-th snapshot.
    pub every: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Log,
            every: 20,
        }
    }
}

impl TryFrom<ChannelConfig> for ChannelDefinition {
    type Error = ConfigError;

    fn try_from(config: ChannelConfig) -> Result<Self, Self::Error> {
        let definition = ChannelDefinition {
            key: config.key,
            label: config.label,
            unit: config.unit,
            precision: config.precision,
            seed: config.seed,
            normal: config.normal,
            bound: config.bound,
            drift: config.drift,
            comfort: config.comfort,
            excursion_high: config.excursion_high,
            excursion_low: config.excursion_low,
            excursion_probability: config.excursion_probability,
            cadence: config.cadence_ms.map(Duration::from_millis),
        };
        definition.validate()?;
        Ok(definition)
    }
}

fn default_excursion_probability() -> f64 {
    0.2
}

impl ChannelConfig {
    pub fn heart_rate() -> Self {
        Self {
            key: "hr".to_string(),
            label: "HEART RATE".to_string(),
            unit: "BPM".to_string(),
            precision: 0,
            seed: 72.0,
            normal: Range::new(60.0, 100.0),
            bound: Range::new(50.0, 110.0),
            drift: 1.5,
            comfort: Range::new(65.0, 95.0),
            excursion_high: Range::new(105.0, 110.0),
            excursion_low: Range::new(55.0, 60.0),
            excursion_probability: default_excursion_probability(),
            cadence_ms: None,
        }
    }

    pub fn oxygen_saturation() -> Self {
        Self {
            key: "o2".to_string(),
            label: "OXYGEN".to_string(),
            unit: "%".to_string(),
            precision: 0,
            seed: 98.0,
            normal: Range::new(95.0, 100.0),
            bound: Range::new(90.0, 105.0),
            drift: 1.5,
            comfort: Range::new(95.5, 99.5),
            excursion_high: Range::new(92.0, 94.0),
            excursion_low: Range::new(91.0, 93.0),
            excursion_probability: default_excursion_probability(),
            cadence_ms: None,
        }
    }

    pub fn blood_pressure() -> Self {
        Self {
            key: "bp".to_string(),
            label: "BLOOD PRESSURE".to_string(),
            unit: "/80".to_string(),
            precision: 0,
            seed: 120.0,
            normal: Range::new(90.0, 140.0),
            bound: Range::new(80.0, 150.0),
            drift: 1.5,
            comfort: Range::new(105.0, 135.0),
            excursion_high: Range::new(145.0, 155.0),
            excursion_low: Range::new(85.0, 90.0),
            excursion_probability: default_excursion_probability(),
            cadence_ms: None,
        }
    }

    pub fn temperature() -> Self {
        Self {
            key: "temp".to_string(),
            label: "TEMPERATURE".to_string(),
            unit: "°C".to_string(),
            precision: 1,
            seed: 36.8,
            normal: Range::new(36.5, 37.5),
            bound: Range::new(35.5, 38.5),
            drift: 0.1,
            comfort: Range::new(36.6, 37.3),
            excursion_high: Range::new(37.8, 38.2),
            excursion_low: Range::new(36.0, 36.3),
            excursion_probability: default_excursion_probability(),
            cadence_ms: None,
        }
    }
}

pub fn default_channels() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig::heart_rate(),
        ChannelConfig::oxygen_saturation(),
        ChannelConfig::blood_pressure(),
        ChannelConfig::temperature(),
    ]
}

pub fn load_monitor_config() -> anyhow::Result<MonitorConfig> {
    load_monitor_config_from("config/monitor")
}

/// Load from an optional file at `path` (extension inferred), then apply
/// `MONITOR__` environment overrides such as `MONITOR__CADENCE__WAVEFORM_MS`.
pub fn load_monitor_config_from(path: &str) -> anyhow::Result<MonitorConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("MONITOR")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("failed to read monitor configuration from {path}"))?;

    settings
        .try_deserialize()
        .context("invalid monitor configuration")
}
