// Waveform generator - scrolling trace with probabilistic deflections
use crate::application::random_source::RandomSource;
use crate::domain::error::ConfigError;
use crate::domain::window::SlidingWindow;
use crate::infrastructure::config::WaveformConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveformBand {
    Baseline,
    Minor,
    Major,
}

impl WaveformConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Waveform("capacity must be at least 1".to_string()));
        }
        for (name, p) in [
            ("major_probability", self.major_probability),
            ("minor_probability", self.minor_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Waveform(format!("{name} {p} is outside [0, 1]")));
            }
        }
        if self.major_probability + self.minor_probability > 1.0 {
            return Err(ConfigError::Waveform(
                "deflection probabilities sum above 1".to_string(),
            ));
        }
        for (name, v) in [
            ("major_amplitude", self.major_amplitude),
            ("minor_amplitude", self.minor_amplitude),
            ("baseline_min", self.baseline_min),
            ("baseline_jitter", self.baseline_jitter),
        ] {
            if !v.is_finite() {
                return Err(ConfigError::Waveform(format!("{name} is not finite")));
            }
        }
        if self.baseline_jitter < 0.0 {
            return Err(ConfigError::Waveform(
                "baseline_jitter must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Map a uniform draw to a band. The major band occupies the top of
    /// `[0, 1)`, the minor band sits just below it.
    pub fn select_band(&self, draw: f64) -> WaveformBand {
        let major_cut = 1.0 - self.major_probability;
        let minor_cut = major_cut - self.minor_probability;
        if draw >= major_cut && self.major_probability > 0.0 {
            WaveformBand::Major
        } else if draw >= minor_cut && self.minor_probability > 0.0 {
            WaveformBand::Minor
        } else {
            WaveformBand::Baseline
        }
    }
}

#[derive(Debug, Clone)]
pub struct WaveformGenerator {
    config: WaveformConfig,
    buffer: SlidingWindow,
}

impl WaveformGenerator {
    pub fn new(config: WaveformConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let buffer = SlidingWindow::filled(config.capacity, config.baseline_min);
        Ok(Self { config, buffer })
    }

    pub fn tick(&mut self, rng: &mut dyn RandomSource) -> f64 {
        let band = self.config.select_band(rng.next_unit());
        self.apply(band, rng)
    }

    pub fn apply(&mut self, band: WaveformBand, rng: &mut dyn RandomSource) -> f64 {
        let sample = match band {
            WaveformBand::Major => self.config.major_amplitude,
            WaveformBand::Minor => self.config.minor_amplitude,
            WaveformBand::Baseline => {
                self.config.baseline_min + rng.next_unit() * self.config.baseline_jitter
            }
        };
        self.buffer.push(sample);
        sample
    }

    pub fn samples(&self) -> Vec<f64> {
        self.buffer.to_vec()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }
}
