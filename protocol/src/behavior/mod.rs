//! # Behavioral Analytics
//!
//! Continuous authentication for QR-DID holders, demo edition. A logistic
//! regression learns what a legitimate user's typing rhythm looks like
//! from simulated telemetry, then scores new access attempts.
//!
//! A verdict of [`Verdict::Anomalous`] is where a real deployment would
//! trigger step-up authentication or block the attempt; a
//! [`Verdict::Legitimate`] attempt gets a low risk score and goes through.

pub mod dataset;
pub mod model;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use dataset::{generate_dataset, train_test_split, Dataset, Sample};
pub use model::{LogisticRegression, TrainingConfig};

/// Seed for data generation and the train/test shuffle.
pub const DEFAULT_SEED: u64 = 42;

/// Share of the dataset held out for evaluation.
pub const TEST_FRACTION: f64 = 0.2;

/// Errors from model training.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BehaviorError {
    #[error("cannot train on an empty dataset")]
    EmptyDataset,

    #[error("training data must contain both legitimate and anomalous samples")]
    SingleClass,
}

/// Classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Legitimate,
    Anomalous,
}

impl Verdict {
    /// What a real system would do with this verdict.
    pub fn advice(self) -> &'static str {
        match self {
            Verdict::Legitimate => "allow access with a low risk score",
            Verdict::Anomalous => "trigger step-up authentication or block access",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Legitimate => write!(f, "Legitimate"),
            Verdict::Anomalous => write!(f, "Anomalous"),
        }
    }
}

/// A scored access attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub sample: Sample,
    pub verdict: Verdict,
    /// Model probability that the attempt is anomalous.
    pub anomaly_probability: f64,
    pub advice: String,
}

/// A trained model plus its held-out accuracy.
#[derive(Debug, Clone)]
pub struct BehaviorModel {
    model: LogisticRegression,
    accuracy: f64,
    train_len: usize,
    test_len: usize,
}

impl BehaviorModel {
    /// Generate the dataset from `seed`, split 80/20, fit, and evaluate.
    pub fn train(seed: u64, config: &TrainingConfig) -> Result<Self, BehaviorError> {
        let data = generate_dataset(&mut StdRng::seed_from_u64(seed));
        let (train, test) = train_test_split(&data, TEST_FRACTION, seed);
        let model = LogisticRegression::fit(&train, config)?;
        let accuracy = model.accuracy(&test);
        tracing::info!(
            seed,
            train = train.len(),
            test = test.len(),
            accuracy,
            "behavior model trained"
        );
        Ok(Self {
            model,
            accuracy,
            train_len: train.len(),
            test_len: test.len(),
        })
    }

    /// [`train`](Self::train) with [`DEFAULT_SEED`] and default settings.
    pub fn train_default() -> Result<Self, BehaviorError> {
        Self::train(DEFAULT_SEED, &TrainingConfig::default())
    }

    /// Accuracy on the held-out test set.
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// `(train, test)` sample counts.
    pub fn split_sizes(&self) -> (usize, usize) {
        (self.train_len, self.test_len)
    }

    pub fn classify(&self, sample: Sample) -> Assessment {
        let anomaly_probability = self.model.predict_proba(&sample);
        let verdict = if anomaly_probability >= 0.5 {
            Verdict::Anomalous
        } else {
            Verdict::Legitimate
        };
        Assessment {
            sample,
            verdict,
            anomaly_probability,
            advice: verdict.advice().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_accurate() {
        let model = BehaviorModel::train_default().unwrap();
        assert!(model.accuracy() >= 0.9, "accuracy {}", model.accuracy());
        assert_eq!(model.split_sizes(), (96, 24));
    }

    #[test]
    fn steady_typist_is_legitimate() {
        let model = BehaviorModel::train_default().unwrap();
        let a = model.classify(Sample::new(3.2, 0.03));
        assert_eq!(a.verdict, Verdict::Legitimate);
        assert!(a.anomaly_probability < 0.5);
        assert_eq!(a.advice, Verdict::Legitimate.advice());
    }

    #[test]
    fn erratic_typist_is_anomalous() {
        let model = BehaviorModel::train_default().unwrap();
        let a = model.classify(Sample::new(1.5, 0.15));
        assert_eq!(a.verdict, Verdict::Anomalous);
        assert!(a.anomaly_probability >= 0.5);
    }

    #[test]
    fn verdict_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(Verdict::Anomalous).unwrap(),
            serde_json::json!("anomalous")
        );
        assert_eq!(Verdict::Legitimate.to_string(), "Legitimate");
    }
}
