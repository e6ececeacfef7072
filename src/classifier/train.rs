//! Training for the statistical scorer
//!
//! Splits a validated corpus, trains the vectorizer/classifier pair, and
//! reports loss history plus held-out metrics.

use super::dataset::TrainingCorpus;
use super::statistical::StatisticalScorer;
use super::{ClassifierError, ClassifierResult};
use crate::models::TrainingSample;
use serde::{Deserialize, Serialize};

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Gradient descent step size
    pub learning_rate: f64,
    /// Full-batch passes over the data
    pub epochs: usize,
    /// L2 penalty strength
    pub regularization: f64,
    /// Seed for weight initialization and the validation shuffle
    pub seed: u64,
    /// `vaguenessScore >= label_threshold` is labeled vague
    pub label_threshold: u8,
    /// Held-out fraction (0.0 - 0.9)
    pub val_split: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            epochs: 200,
            regularization: 0.001,
            seed: 42,
            label_threshold: 50,
            val_split: 0.2,
        }
    }
}

impl TrainConfig {
    /// Reject out-of-range settings before any work is done
    pub fn validate(&self) -> ClassifierResult<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0 && self.learning_rate <= 10.0)
        {
            return Err(ClassifierError::Validation(format!(
                "learning rate must be in (0, 10], got {}",
                self.learning_rate
            )));
        }
        if self.epochs == 0 || self.epochs > 100_000 {
            return Err(ClassifierError::Validation(format!(
                "epochs must be in 1..=100000, got {}",
                self.epochs
            )));
        }
        if !(self.regularization.is_finite() && (0.0..=1.0).contains(&self.regularization)) {
            return Err(ClassifierError::Validation(format!(
                "regularization must be in [0, 1], got {}",
                self.regularization
            )));
        }
        if self.label_threshold > 100 {
            return Err(ClassifierError::Validation(format!(
                "label threshold must be in [0, 100], got {}",
                self.label_threshold
            )));
        }
        if !(self.val_split.is_finite() && (0.0..=0.9).contains(&self.val_split)) {
            return Err(ClassifierError::Validation(format!(
                "validation split must be in [0, 0.9], got {}",
                self.val_split
            )));
        }
        Ok(())
    }
}

/// Loss per epoch (mean cross-entropy plus the L2 term)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingHistory {
    pub losses: Vec<f64>,
    pub final_loss: f64,
}

/// Binary classification metrics at the label threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub samples: usize,
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl Evaluation {
    fn from_counts(tp: usize, fp: usize, tn: usize, fn_: usize) -> Self {
        let samples = tp + fp + tn + fn_;
        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        Self {
            samples,
            true_positives: tp,
            false_positives: fp,
            true_negatives: tn,
            false_negatives: fn_,
            accuracy: ratio(tp + tn, samples),
            precision,
            recall,
            f1,
        }
    }
}

/// Score a trained model against labeled samples.
///
/// "Positive" means vague: the label is `vaguenessScore >= threshold` and the
/// prediction is `score >= threshold`.
pub fn evaluate(
    scorer: &StatisticalScorer,
    samples: &[TrainingSample],
    threshold: u8,
) -> ClassifierResult<Evaluation> {
    let (mut tp, mut fp, mut tn, mut fn_) = (0, 0, 0, 0);
    for sample in samples {
        let predicted = scorer.analyze(&sample.prompt, threshold)?.is_vague;
        match (predicted, sample.label(threshold) == 1) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, false) => tn += 1,
            (false, true) => fn_ += 1,
        }
    }
    Ok(Evaluation::from_counts(tp, fp, tn, fn_))
}

/// Outcome of a full training run
#[derive(Debug)]
pub struct TrainReport {
    pub scorer: StatisticalScorer,
    pub history: TrainingHistory,
    pub train_samples: usize,
    pub val_samples: usize,
    pub train_eval: Evaluation,
    pub val_eval: Option<Evaluation>,
}

/// Train on a validated corpus with a deterministic held-out split
pub fn train(corpus: &TrainingCorpus, config: &TrainConfig) -> ClassifierResult<TrainReport> {
    config.validate()?;
    let (train_set, val_set) = corpus.split(config.val_split, config.seed);
    if train_set.is_empty() {
        return Err(ClassifierError::Validation(
            "no samples left for training after the validation split".to_string(),
        ));
    }

    tracing::info!(
        "Training: {} examples, Validation: {} examples",
        train_set.len(),
        val_set.len()
    );

    let (scorer, history) = StatisticalScorer::train(&train_set, config)?;
    let train_eval = evaluate(&scorer, &train_set, config.label_threshold)?;
    let val_eval = if val_set.is_empty() {
        None
    } else {
        Some(evaluate(&scorer, &val_set, config.label_threshold)?)
    };

    tracing::info!(
        "Finished {} epochs: loss={:.4}, train_acc={:.2}%, val_acc={:.2}%",
        config.epochs,
        history.final_loss,
        train_eval.accuracy * 100.0,
        val_eval.map_or(0.0, |e| e.accuracy * 100.0)
    );

    Ok(TrainReport {
        scorer,
        history,
        train_samples: train_set.len(),
        val_samples: val_set.len(),
        train_eval,
        val_eval,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_config_default() {
        let config = TrainConfig::default();
        assert!(config.learning_rate > 0.0);
        assert!(config.epochs > 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_config() {
        let bad = [
            TrainConfig { learning_rate: 0.0, ..Default::default() },
            TrainConfig { learning_rate: f64::NAN, ..Default::default() },
            TrainConfig { epochs: 0, ..Default::default() },
            TrainConfig { regularization: -0.1, ..Default::default() },
            TrainConfig { label_threshold: 101, ..Default::default() },
            TrainConfig { val_split: 0.95, ..Default::default() },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(ClassifierError::Validation(_))),
                "{config:?}"
            );
        }
    }

    #[test]
    fn test_evaluation_metrics() {
        let e = Evaluation::from_counts(3, 1, 4, 2);
        assert_eq!(e.samples, 10);
        assert!((e.accuracy - 0.7).abs() < 1e-12);
        assert!((e.precision - 0.75).abs() < 1e-12);
        assert!((e.recall - 0.6).abs() < 1e-12);
        assert!(e.f1 > 0.0 && e.f1 < 1.0);
    }

    #[test]
    fn test_evaluation_handles_zero_denominators() {
        let e = Evaluation::from_counts(0, 0, 5, 0);
        assert_eq!(e.precision, 0.0);
        assert_eq!(e.recall, 0.0);
        assert_eq!(e.f1, 0.0);
        assert_eq!(e.accuracy, 1.0);
    }

    #[test]
    fn test_train_config_from_partial_toml() {
        let config: TrainConfig = toml::from_str("epochs = 50\nlearning_rate = 0.1").unwrap();
        assert_eq!(config.epochs, 50);
        assert_eq!(config.label_threshold, 50);
    }
}
