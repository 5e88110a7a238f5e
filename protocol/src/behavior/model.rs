//! Two-feature logistic regression.
//!
//! Features are standardised with the training set's mean and standard
//! deviation, then fitted by full-batch gradient descent on the
//! L2-regularised log loss. Small enough that a closed loop over 120
//! samples is the whole story.

use super::dataset::{Dataset, Sample};
use super::BehaviorError;

/// Hyperparameters for [`LogisticRegression::fit`].
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub epochs: usize,
    /// L2 penalty on the weights (not the bias).
    pub l2: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            epochs: 2_000,
            l2: 1e-3,
        }
    }
}

/// A fitted binary classifier. `predict` returns `true` for "anomalous".
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    weights: [f64; 2],
    bias: f64,
    mean: [f64; 2],
    scale: [f64; 2],
}

impl LogisticRegression {
    /// Fit on `data`. Both classes must be present.
    pub fn fit(data: &Dataset, config: &TrainingConfig) -> Result<Self, BehaviorError> {
        if data.is_empty() {
            return Err(BehaviorError::EmptyDataset);
        }
        let positives = data.anomalous_count();
        if positives == 0 || positives == data.len() {
            return Err(BehaviorError::SingleClass);
        }

        let n = data.len() as f64;
        let mut mean = [0.0; 2];
        for s in &data.samples {
            let f = s.features();
            mean[0] += f[0] / n;
            mean[1] += f[1] / n;
        }
        let mut scale = [0.0; 2];
        for s in &data.samples {
            let f = s.features();
            scale[0] += (f[0] - mean[0]).powi(2) / n;
            scale[1] += (f[1] - mean[1]).powi(2) / n;
        }
        for v in &mut scale {
            *v = v.sqrt();
            // Constant feature: leave it unscaled rather than divide by zero.
            if *v < f64::EPSILON {
                *v = 1.0;
            }
        }

        let mut model = Self {
            weights: [0.0; 2],
            bias: 0.0,
            mean,
            scale,
        };

        let xs: Vec<[f64; 2]> = data.samples.iter().map(|s| model.standardise(s)).collect();
        for _ in 0..config.epochs {
            let mut grad_w = [0.0; 2];
            let mut grad_b = 0.0;
            for (x, &label) in xs.iter().zip(&data.labels) {
                let err = model.logistic(x) - if label { 1.0 } else { 0.0 };
                grad_w[0] += err * x[0] / n;
                grad_w[1] += err * x[1] / n;
                grad_b += err / n;
            }
            for (w, g) in model.weights.iter_mut().zip(grad_w) {
                *w -= config.learning_rate * (g + config.l2 * *w);
            }
            model.bias -= config.learning_rate * grad_b;
        }

        Ok(model)
    }

    /// Probability that `sample` is anomalous.
    pub fn predict_proba(&self, sample: &Sample) -> f64 {
        self.logistic(&self.standardise(sample))
    }

    pub fn predict(&self, sample: &Sample) -> bool {
        self.predict_proba(sample) >= 0.5
    }

    /// Fraction of `data` classified correctly. `0.0` for an empty set.
    pub fn accuracy(&self, data: &Dataset) -> f64 {
        if data.is_empty() {
            return 0.0;
        }
        let correct = data
            .samples
            .iter()
            .zip(&data.labels)
            .filter(|(s, label)| self.predict(s) == **label)
            .count();
        correct as f64 / data.len() as f64
    }

    pub fn weights(&self) -> [f64; 2] {
        self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    fn standardise(&self, sample: &Sample) -> [f64; 2] {
        let f = sample.features();
        [
            (f[0] - self.mean[0]) / self.scale[0],
            (f[1] - self.mean[1]) / self.scale[1],
        ]
    }

    fn logistic(&self, x: &[f64; 2]) -> f64 {
        let z = self.weights[0] * x[0] + self.weights[1] * x[1] + self.bias;
        1.0 / (1.0 + (-z).exp())
    }
}
