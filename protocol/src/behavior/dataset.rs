//! Simulated typing telemetry.
//!
//! Two features per access attempt: typing speed (characters per second)
//! and keystroke latency variation (standard deviation of the gaps between
//! key presses, in seconds). Legitimate users type steadily; anomalous
//! sessions (bots, a different person) are erratic.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Number of legitimate samples in the generated dataset.
pub const LEGITIMATE_SAMPLES: usize = 100;

/// Number of anomalous samples in the generated dataset.
pub const ANOMALOUS_SAMPLES: usize = 20;

/// One observed access attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Characters per second.
    pub typing_speed: f64,
    /// Standard deviation of inter-key latency, in seconds.
    pub latency_variation: f64,
}

impl Sample {
    pub fn new(typing_speed: f64, latency_variation: f64) -> Self {
        Self {
            typing_speed,
            latency_variation,
        }
    }

    pub(crate) fn features(&self) -> [f64; 2] {
        [self.typing_speed, self.latency_variation]
    }
}

/// Labelled samples. `true` marks an anomalous attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub samples: Vec<Sample>,
    pub labels: Vec<bool>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn push(&mut self, sample: Sample, anomalous: bool) {
        self.samples.push(sample);
        self.labels.push(anomalous);
    }

    pub fn anomalous_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l).count()
    }
}

/// Draw the demo dataset: 100 steady typists, then 20 erratic ones.
pub fn generate_dataset<R: Rng + ?Sized>(rng: &mut R) -> Dataset {
    let mut data = Dataset::default();
    for _ in 0..LEGITIMATE_SAMPLES {
        data.push(
            Sample::new(rng.gen_range(2.5..4.0), rng.gen_range(0.01..0.05)),
            false,
        );
    }
    for _ in 0..ANOMALOUS_SAMPLES {
        data.push(
            Sample::new(rng.gen_range(1.0..5.0), rng.gen_range(0.06..0.20)),
            true,
        );
    }
    data
}

/// Shuffle with a fixed seed and split off `test_fraction` of the samples
/// (rounded up) as the test set. Returns `(train, test)`.
pub fn train_test_split(data: &Dataset, test_fraction: f64, seed: u64) -> (Dataset, Dataset) {
    let mut order: Vec<usize> = (0..data.len()).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let test_len = ((data.len() as f64) * test_fraction.clamp(0.0, 1.0)).ceil() as usize;
    let mut train = Dataset::default();
    let mut test = Dataset::default();
    for (pos, &i) in order.iter().enumerate() {
        let target = if pos < test_len { &mut test } else { &mut train };
        target.push(data.samples[i], data.labels[i]);
    }
    (train, test)
}
