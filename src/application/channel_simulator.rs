// Channel simulator - next value from the previous one
use crate::application::random_source::RandomSource;
use crate::domain::channel::ChannelDefinition;
use crate::domain::tier::Range;

/// Per-tick generation policy. Exactly one is applied per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Drift,
    ExcursionHigh,
    ExcursionLow,
}

/// Pick this tick's policy: an excursion with `excursion_probability`, split
/// evenly between high and low, otherwise drift.
pub fn select_policy(rng: &mut dyn RandomSource, excursion_probability: f64) -> Policy {
    if rng.next_unit() >= excursion_probability {
        return Policy::Drift;
    }
    if rng.next_unit() < 0.5 {
        Policy::ExcursionHigh
    } else {
        Policy::ExcursionLow
    }
}

/// Uniform draw from the half-open `[lo, hi)`; a degenerate range yields `lo`.
fn draw_in(range: &Range, unit: f64) -> f64 {
    let value = range.lo + unit * range.width();
    if value >= range.hi { range.lo } else { value }
}

/// Holds only the previous value; no longer history feeds generation.
#[derive(Debug, Clone)]
pub struct ChannelSimulator {
    definition: ChannelDefinition,
    value: f64,
}

impl ChannelSimulator {
    pub fn new(definition: ChannelDefinition) -> Self {
        let value = definition.seed;
        Self { definition, value }
    }

    pub fn definition(&self) -> &ChannelDefinition {
        &self.definition
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn step(&mut self, rng: &mut dyn RandomSource) -> f64 {
        let policy = select_policy(rng, self.definition.excursion_probability);
        self.apply(policy, rng)
    }

    pub fn apply(&mut self, policy: Policy, rng: &mut dyn RandomSource) -> f64 {
        let def = &self.definition;
        self.value = match policy {
            Policy::Drift => {
                let perturbation = (rng.next_unit() - 0.5) * 2.0 * def.drift;
                def.comfort.clamp(self.value + perturbation)
            }
            Policy::ExcursionHigh => draw_in(&def.excursion_high, rng.next_unit()),
            Policy::ExcursionLow => draw_in(&def.excursion_low, rng.next_unit()),
        };
        self.value
    }

    /// Set the value directly. Non-finite input is ignored.
    pub fn force(&mut self, value: f64) -> f64 {
        if value.is_finite() {
            self.value = value;
        }
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::random_source::{SequenceRandom, ThreadRandom};
    use crate::domain::channel::tests::heart_rate;
    use crate::domain::tier::SeverityTier;
    use proptest::prelude::*;

    #[test]
    fn test_policy_selection() {
        assert_eq!(
            select_policy(&mut SequenceRandom::new(vec![0.5]), 0.2),
            Policy::Drift
        );
        assert_eq!(
            select_policy(&mut SequenceRandom::new(vec![0.1, 0.3]), 0.2),
            Policy::ExcursionHigh
        );
        assert_eq!(
            select_policy(&mut SequenceRandom::new(vec![0.1, 0.7]), 0.2),
            Policy::ExcursionLow
        );
        assert_eq!(
            select_policy(&mut SequenceRandom::new(vec![0.0]), 0.0),
            Policy::Drift
        );
    }

    #[test]
    fn test_excursion_high_then_forced_critical() {
        let mut sim = ChannelSimulator::new(heart_rate());
        assert_eq!(sim.value(), 72.0);

        let value = sim.apply(Policy::ExcursionHigh, &mut SequenceRandom::new(vec![0.2]));
        assert!((value - 106.0).abs() < 1e-9);
        assert_eq!(sim.definition().classify(value), SeverityTier::Warning);

        let value = sim.force(115.0);
        assert_eq!(sim.definition().classify(value), SeverityTier::Critical);
    }

    #[test]
    fn test_drift_from_seed_is_normal() {
        let mut sim = ChannelSimulator::new(heart_rate());
        let value = sim.apply(Policy::Drift, &mut SequenceRandom::new(vec![0.9]));
        assert!((value - 73.2).abs() < 1e-9);
        assert_eq!(sim.definition().classify(value), SeverityTier::Normal);
    }

    #[test]
    fn test_drift_pulls_excursion_back_into_comfort() {
        let mut sim = ChannelSimulator::new(heart_rate());
        sim.force(108.0);
        let value = sim.apply(Policy::Drift, &mut SequenceRandom::new(vec![0.5]));
        assert_eq!(value, 95.0);
    }

    #[test]
    fn test_excursion_draw_never_reaches_upper_edge() {
        let mut sim = ChannelSimulator::new(heart_rate());
        let value = sim.apply(Policy::ExcursionLow, &mut SequenceRandom::new(vec![1.0]));
        assert!(value < 60.0);
        assert_ne!(sim.definition().classify(value), SeverityTier::Normal);
    }

    #[test]
    fn test_excursions_always_leave_normal() {
        let mut sim = ChannelSimulator::new(heart_rate());
        let mut rng = ThreadRandom::seeded(42);
        for i in 0..500 {
            let policy = if i % 2 == 0 {
                Policy::ExcursionHigh
            } else {
                Policy::ExcursionLow
            };
            let value = sim.apply(policy, &mut rng);
            assert_ne!(sim.definition().classify(value), SeverityTier::Normal);
        }
    }

    #[test]
    fn test_force_ignores_non_finite() {
        let mut sim = ChannelSimulator::new(heart_rate());
        assert_eq!(sim.force(f64::NAN), 72.0);
    }

    proptest! {
        #[test]
        fn drift_stays_in_comfort_band(draws in prop::collection::vec(0.0f64..1.0, 1..200)) {
            let mut sim = ChannelSimulator::new(heart_rate());
            let mut rng = SequenceRandom::new(draws.clone());
            for _ in 0..draws.len() {
                let value = sim.apply(Policy::Drift, &mut rng);
                prop_assert!(sim.definition().comfort.contains(value));
                prop_assert_eq!(sim.definition().classify(value), SeverityTier::Normal);
            }
        }
    }
}
