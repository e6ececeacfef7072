//! Logistic regression over TF-IDF vectors
//!
//! Full-batch gradient descent with L2 regularization. Per-sample gradient
//! accumulation runs in parallel chunks; the weight update is applied once per
//! epoch after every chunk has been summed, in a fixed order, so training is
//! reproducible for a given seed.

use super::tfidf::FeatureVector;
use super::train::{TrainConfig, TrainingHistory};
use super::{ClassifierError, ClassifierResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub const CLASSIFIER_VERSION: u32 = 1;

/// Initial weights are drawn from `[-INIT_SCALE, INIT_SCALE]`
const INIT_SCALE: f64 = 0.05;
/// Clip for `ln` arguments in the loss
const LOSS_EPSILON: f64 = 1e-15;
/// Samples per parallel gradient chunk
const GRADIENT_CHUNK: usize = 64;

/// Logistic function, clipped to avoid overflow
pub fn sigmoid(x: f64) -> f64 {
    let x = x.clamp(-500.0, 500.0);
    1.0 / (1.0 + (-x).exp())
}

/// Learned parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl ClassifierModel {
    pub fn feature_count(&self) -> usize {
        self.weights.len()
    }

    fn logit(&self, features: &[f64]) -> f64 {
        self.bias
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

/// Serialized form: `{version, weights, bias, featureCount}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierSnapshot {
    pub version: u32,
    pub weights: Vec<f64>,
    pub bias: f64,
    pub feature_count: usize,
}

/// Binary classifier: probability that a prompt is vague
#[derive(Debug, Clone, Default)]
pub struct LinearClassifier {
    model: Option<ClassifierModel>,
}

impl LinearClassifier {
    /// An untrained classifier; predictions are a neutral 0.5
    pub fn untrained() -> Self {
        Self::default()
    }

    pub fn from_model(model: ClassifierModel) -> Self {
        Self { model: Some(model) }
    }

    /// Train a new classifier.
    ///
    /// Fails when `features` is empty, when the feature and label counts
    /// differ, when vectors have different lengths, or when a label is not 0/1.
    pub fn train(
        features: &[FeatureVector],
        labels: &[u8],
        config: &TrainConfig,
    ) -> ClassifierResult<(Self, TrainingHistory)> {
        config.validate()?;
        if features.is_empty() {
            return Err(ClassifierError::Validation(
                "cannot train on an empty feature set".to_string(),
            ));
        }
        if features.len() != labels.len() {
            return Err(ClassifierError::Validation(format!(
                "{} feature vectors but {} labels",
                features.len(),
                labels.len()
            )));
        }
        let dim = features[0].len();
        if let Some(bad) = features.iter().position(|f| f.len() != dim) {
            return Err(ClassifierError::Validation(format!(
                "feature vector {bad} has length {} (expected {dim})",
                features[bad].len()
            )));
        }
        if let Some(bad) = labels.iter().position(|&y| y > 1) {
            return Err(ClassifierError::Validation(format!(
                "label {bad} is {} (expected 0 or 1)",
                labels[bad]
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut model = ClassifierModel {
            weights: (0..dim)
                .map(|_| rng.random_range(-INIT_SCALE..=INIT_SCALE))
                .collect(),
            bias: 0.0,
        };

        let n = features.len() as f64;
        let mut losses = Vec::with_capacity(config.epochs);
        let log_every = (config.epochs / 10).max(1);

        for epoch in 0..config.epochs {
            let batch = accumulate(&model, features, labels);

            let l2 = model.weights.iter().map(|w| w * w).sum::<f64>();
            let loss = batch.loss / n + 0.5 * config.regularization * l2;
            losses.push(loss);

            for (w, g) in model.weights.iter_mut().zip(&batch.grad_w) {
                let grad = g / n + config.regularization * *w;
                *w -= config.learning_rate * grad;
            }
            model.bias -= config.learning_rate * (batch.grad_b / n);

            if epoch % log_every == 0 || epoch + 1 == config.epochs {
                tracing::debug!("Epoch {}/{}: loss={:.5}", epoch + 1, config.epochs, loss);
            }
        }

        let final_loss = losses.last().copied().unwrap_or(f64::NAN);
        Ok((
            Self::from_model(model),
            TrainingHistory { losses, final_loss },
        ))
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&ClassifierModel> {
        self.model.as_ref()
    }

    pub fn feature_count(&self) -> usize {
        self.model.as_ref().map_or(0, ClassifierModel::feature_count)
    }

    /// Probability in `[0, 1]` that the input is vague
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        match &self.model {
            Some(model) => sigmoid(model.logit(&features.values)),
            None => 0.5,
        }
    }

    /// `round(probability * 100)`
    pub fn predict_score(&self, features: &FeatureVector) -> u8 {
        (self.predict(features) * 100.0).round().clamp(0.0, 100.0) as u8
    }

    /// Distance from indifference: 0 at p = 0.5, 1 at p = 0 or 1
    pub fn confidence(&self, features: &FeatureVector) -> f64 {
        ((self.predict(features) - 0.5).abs() * 2.0).clamp(0.0, 1.0)
    }

    pub fn to_snapshot(&self) -> ClassifierResult<ClassifierSnapshot> {
        let model = self.model.as_ref().ok_or(ClassifierError::NotTrained)?;
        Ok(ClassifierSnapshot {
            version: CLASSIFIER_VERSION,
            weights: model.weights.clone(),
            bias: model.bias,
            feature_count: model.feature_count(),
        })
    }

    pub fn from_snapshot(snapshot: ClassifierSnapshot) -> ClassifierResult<Self> {
        if snapshot.version != CLASSIFIER_VERSION {
            return Err(ClassifierError::Serialization(format!(
                "unsupported classifier version {} (expected {})",
                snapshot.version, CLASSIFIER_VERSION
            )));
        }
        if snapshot.weights.len() != snapshot.feature_count {
            return Err(ClassifierError::Serialization(format!(
                "featureCount is {} but {} weights were stored",
                snapshot.feature_count,
                snapshot.weights.len()
            )));
        }
        if !snapshot.bias.is_finite() || snapshot.weights.iter().any(|w| !w.is_finite()) {
            return Err(ClassifierError::Serialization(
                "classifier parameters must be finite".to_string(),
            ));
        }
        Ok(Self::from_model(ClassifierModel {
            weights: snapshot.weights,
            bias: snapshot.bias,
        }))
    }
}

/// Sums for one epoch (not yet divided by the sample count)
struct BatchGradient {
    grad_w: Vec<f64>,
    grad_b: f64,
    loss: f64,
}

impl BatchGradient {
    fn zeros(dim: usize) -> Self {
        Self {
            grad_w: vec![0.0; dim],
            grad_b: 0.0,
            loss: 0.0,
        }
    }

    fn merge(mut self, other: BatchGradient) -> Self {
        for (a, b) in self.grad_w.iter_mut().zip(other.grad_w) {
            *a += b;
        }
        self.grad_b += other.grad_b;
        self.loss += other.loss;
        self
    }
}

/// Chunks are computed in parallel but merged in index order so the sum is
/// the same on every run.
fn accumulate(model: &ClassifierModel, features: &[FeatureVector], labels: &[u8]) -> BatchGradient {
    let dim = model.feature_count();
    let partials: Vec<BatchGradient> = features
        .par_chunks(GRADIENT_CHUNK)
        .zip(labels.par_chunks(GRADIENT_CHUNK))
        .map(|(xs, ys)| {
            let mut acc = BatchGradient::zeros(dim);
            for (x, &y) in xs.iter().zip(ys) {
                let y = f64::from(y);
                let p = sigmoid(model.logit(&x.values));
                let clipped = p.clamp(LOSS_EPSILON, 1.0 - LOSS_EPSILON);
                acc.loss -= y * clipped.ln() + (1.0 - y) * (1.0 - clipped).ln();

                let err = p - y;
                for (g, xi) in acc.grad_w.iter_mut().zip(&x.values) {
                    *g += err * xi;
                }
                acc.grad_b += err;
            }
            acc
        })
        .collect();

    partials
        .into_iter()
        .fold(BatchGradient::zeros(dim), BatchGradient::merge)
}
