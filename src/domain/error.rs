// Configuration errors - the only failure mode of the telemetry core
use super::tier::Range;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("at least one channel must be configured")]
    NoChannels,

    #[error("duplicate channel key '{0}'")]
    DuplicateKey(String),

    #[error("channel '{key}': {field} is not a finite number")]
    NonFinite { key: String, field: &'static str },

    #[error("channel '{key}': drift magnitude {drift} must not be negative")]
    Drift { key: String, drift: f64 },

    #[error("channel '{key}': excursion probability {probability} is outside [0, 1]")]
    Probability { key: String, probability: f64 },

    #[error("channel '{key}': {field} range {range} has lo greater than hi")]
    InvertedRange {
        key: String,
        field: &'static str,
        range: Range,
    },

    #[error("channel '{key}': bound range {bound} does not contain normal range {normal}")]
    RangeNesting {
        key: String,
        normal: Range,
        bound: Range,
    },

    #[error("channel '{key}': comfort band {comfort} must lie strictly inside normal range {normal}")]
    ComfortBand {
        key: String,
        comfort: Range,
        normal: Range,
    },

    #[error("channel '{key}': {field} range {range} reaches into normal range {normal}")]
    Excursion {
        key: String,
        field: &'static str,
        range: Range,
        normal: Range,
    },

    #[error("channel '{key}': seed {seed} is outside normal range {normal}")]
    SeedOutsideNormal { key: String, seed: f64, normal: Range },

    #[error("waveform: {0}")]
    Waveform(String),

    #[error("cadence: {0}")]
    Cadence(String),
}
