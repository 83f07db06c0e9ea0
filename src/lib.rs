//! Vital-signs telemetry core: simulated physiological channels, a scrolling
//! waveform, and per-channel severity tiers published as immutable snapshots.
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::telemetry_engine::TelemetryEngine;
pub use domain::error::ConfigError;
pub use domain::snapshot::TelemetrySnapshot;
pub use domain::tier::{classify, Range, SeverityTier};
pub use infrastructure::config::{ChannelConfig, WaveformConfig};
