// Fixed-capacity sliding window of recent samples
use std::collections::VecDeque;

/// Ordered, fixed-length history. Every push drops the oldest entry so the
/// length never changes after construction.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    samples: VecDeque<f64>,
}

impl SlidingWindow {
    /// A window of `capacity` copies of `fill`. Capacity must be non-zero;
    /// configuration validation guarantees that before construction.
    pub fn filled(capacity: usize, fill: f64) -> Self {
        Self {
            samples: std::iter::repeat_n(fill, capacity).collect(),
        }
    }

    pub fn from_samples(samples: Vec<f64>) -> Self {
        Self {
            samples: samples.into(),
        }
    }

    pub fn push(&mut self, sample: f64) {
        if self.samples.is_empty() {
            return;
        }
        self.samples.pop_front();
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Oldest-to-newest copy for publication.
    pub fn to_vec(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }
}
