// Channel domain models
use super::error::ConfigError;
use super::tier::{classify, Range, SeverityTier};
use serde::Serialize;
use std::time::Duration;

/// Validated, immutable description of one monitored quantity.
///
/// Ranges never change after construction; the simulator only ever moves the
/// channel's value.
#[derive(Debug, Clone)]
pub struct ChannelDefinition {
    pub key: String,
    pub label: String,
    pub unit: String,
    pub precision: usize,
    pub seed: f64,
    pub normal: Range,
    pub bound: Range,
    /// Largest perturbation applied by a drift tick, in either direction.
    pub drift: f64,
    /// Band drift is clamped into. Strictly inside `normal`.
    pub comfort: Range,
    /// Draw ranges for excursions, half-open `[lo, hi)`.
    pub excursion_high: Range,
    pub excursion_low: Range,
    /// Chance per tick of an excursion instead of drift.
    pub excursion_probability: f64,
    /// Overrides the engine's shared channel cadence when set.
    pub cadence: Option<Duration>,
}

impl ChannelDefinition {
    pub fn classify(&self, value: f64) -> SeverityTier {
        classify(value, &self.normal, &self.bound)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let key = || self.key.clone();

        for (field, range) in self.ranges() {
            if !range.is_finite() {
                return Err(ConfigError::NonFinite { key: key(), field });
            }
            if range.lo > range.hi {
                return Err(ConfigError::InvertedRange {
                    key: key(),
                    field,
                    range,
                });
            }
        }
        if !self.seed.is_finite() {
            return Err(ConfigError::NonFinite {
                key: key(),
                field: "seed",
            });
        }
        if !self.drift.is_finite() {
            return Err(ConfigError::NonFinite {
                key: key(),
                field: "drift",
            });
        }
        if self.drift < 0.0 {
            return Err(ConfigError::Drift {
                key: key(),
                drift: self.drift,
            });
        }

        if !(0.0..=1.0).contains(&self.excursion_probability) {
            return Err(ConfigError::Probability {
                key: key(),
                probability: self.excursion_probability,
            });
        }

        if !self.bound.encloses(&self.normal) {
            return Err(ConfigError::RangeNesting {
                key: key(),
                normal: self.normal,
                bound: self.bound,
            });
        }
        if !self.normal.strictly_encloses(&self.comfort) {
            return Err(ConfigError::ComfortBand {
                key: key(),
                comfort: self.comfort,
                normal: self.normal,
            });
        }
        for (field, range) in [
            ("excursion_high", self.excursion_high),
            ("excursion_low", self.excursion_low),
        ] {
            if !draw_avoids(&range, &self.normal) {
                return Err(ConfigError::Excursion {
                    key: key(),
                    field,
                    range,
                    normal: self.normal,
                });
            }
        }
        if !self.normal.contains(self.seed) {
            return Err(ConfigError::SeedOutsideNormal {
                key: key(),
                seed: self.seed,
                normal: self.normal,
            });
        }
        if self.cadence.is_some_and(|c| c.is_zero()) {
            return Err(ConfigError::Cadence(format!(
                "channel '{}' has a zero interval",
                self.key
            )));
        }

        Ok(())
    }

    fn ranges(&self) -> [(&'static str, Range); 5] {
        [
            ("normal", self.normal),
            ("bound", self.bound),
            ("comfort", self.comfort),
            ("excursion_high", self.excursion_high),
            ("excursion_low", self.excursion_low),
        ]
    }
}

/// Whether every value drawn from the half-open `draw` range misses `normal`.
/// A degenerate draw range (`lo == hi`) always yields `lo`.
fn draw_avoids(draw: &Range, normal: &Range) -> bool {
    draw.lo > normal.hi || (draw.hi <= normal.lo && draw.lo < normal.lo)
}

/// One channel's published state. The tier is derived from the value at
/// construction, so a reading can never carry a stale tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelReading {
    pub key: String,
    pub label: String,
    pub unit: String,
    pub precision: usize,
    pub value: f64,
    pub tier: SeverityTier,
    pub trend: Vec<f64>,
}

impl ChannelReading {
    pub fn new(definition: &ChannelDefinition, value: f64, trend: Vec<f64>) -> Self {
        Self {
            key: definition.key.clone(),
            label: definition.label.clone(),
            unit: definition.unit.clone(),
            precision: definition.precision,
            value,
            tier: definition.classify(value),
            trend,
        }
    }

    pub fn display_value(&self) -> String {
        format!("{:.*}", self.precision, self.value)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn heart_rate() -> ChannelDefinition {
        ChannelDefinition {
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
            excursion_probability: 0.2,
            cadence: None,
        }
    }

    #[test]
    fn test_valid_definition() {
        assert_eq!(heart_rate().validate(), Ok(()));
    }

    #[test]
    fn test_bound_must_contain_normal() {
        let mut def = heart_rate();
        def.bound = Range::new(65.0, 110.0);
        assert!(matches!(def.validate(), Err(ConfigError::RangeNesting { .. })));

        let mut def = heart_rate();
        def.bound = Range::new(50.0, 99.0);
        assert!(matches!(def.validate(), Err(ConfigError::RangeNesting { .. })));
    }

    #[test]
    fn test_equal_ranges_are_allowed() {
        let mut def = heart_rate();
        def.bound = def.normal;
        def.excursion_high = Range::new(101.0, 103.0);
        assert_eq!(def.validate(), Ok(()));
    }

    #[test]
    fn test_inverted_and_non_finite_ranges() {
        let mut def = heart_rate();
        def.normal = Range::new(100.0, 60.0);
        assert!(matches!(
            def.validate(),
            Err(ConfigError::InvertedRange { field: "normal", .. })
        ));

        let mut def = heart_rate();
        def.bound = Range::new(f64::NEG_INFINITY, 110.0);
        assert!(matches!(
            def.validate(),
            Err(ConfigError::NonFinite { field: "bound", .. })
        ));

        let mut def = heart_rate();
        def.drift = f64::NAN;
        assert!(matches!(
            def.validate(),
            Err(ConfigError::NonFinite { field: "drift", .. })
        ));
    }

    #[test]
    fn test_comfort_band_must_be_strictly_inside_normal() {
        let mut def = heart_rate();
        def.comfort = Range::new(60.0, 95.0);
        assert!(matches!(def.validate(), Err(ConfigError::ComfortBand { .. })));
    }

    #[test]
    fn test_excursion_must_avoid_normal() {
        let mut def = heart_rate();
        def.excursion_high = Range::new(99.0, 110.0);
        assert!(matches!(
            def.validate(),
            Err(ConfigError::Excursion { field: "excursion_high", .. })
        ));

        let mut def = heart_rate();
        def.excursion_low = Range::new(55.0, 60.5);
        assert!(matches!(
            def.validate(),
            Err(ConfigError::Excursion { field: "excursion_low", .. })
        ));

        let mut def = heart_rate();
        def.excursion_low = Range::new(60.0, 60.0);
        assert!(matches!(def.validate(), Err(ConfigError::Excursion { .. })));
    }

    #[test]
    fn test_seed_must_be_normal() {
        let mut def = heart_rate();
        def.seed = 105.0;
        assert!(matches!(
            def.validate(),
            Err(ConfigError::SeedOutsideNormal { .. })
        ));
    }

    #[test]
    fn test_excursion_probability_in_unit_interval() {
        let mut def = heart_rate();
        def.excursion_probability = 1.5;
        assert!(matches!(def.validate(), Err(ConfigError::Probability { .. })));

        def.excursion_probability = f64::NAN;
        assert!(matches!(def.validate(), Err(ConfigError::Probability { .. })));
    }

    #[test]
    fn test_zero_cadence_rejected() {
        let mut def = heart_rate();
        def.cadence = Some(Duration::ZERO);
        assert!(matches!(def.validate(), Err(ConfigError::Cadence(_))));
    }

    #[test]
    fn test_reading_derives_tier() {
        let def = heart_rate();
        let reading = ChannelReading::new(&def, 106.4, vec![]);
        assert_eq!(reading.tier, SeverityTier::Warning);
        assert_eq!(reading.display_value(), "106");
    }
}
