//! Statistical scorer: tokenizer, TF-IDF vectorizer and linear classifier
//! as one train/predict unit.
//!
//! The vectorizer and classifier are a matched pair. They are trained
//! together, serialized together, and a snapshot whose classifier
//! `featureCount` does not match the vocabulary size is rejected.

use super::dataset::validate_samples;
use super::model::{ClassifierSnapshot, LinearClassifier};
use super::tfidf::{TfIdfVectorizer, VectorizerSnapshot};
use super::train::{TrainConfig, TrainingHistory};
use super::{ClassifierError, ClassifierResult};
use crate::models::TrainingSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MODEL_SNAPSHOT_VERSION: u32 = 1;

/// Output of [`StatisticalScorer::analyze`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticalResult {
    pub score: u8,
    pub confidence: f64,
    pub is_vague: bool,
    pub probability: f64,
}

/// On-disk model: `{version, vectorizer, classifier, trainedAt}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSnapshot {
    pub version: u32,
    pub vectorizer: VectorizerSnapshot,
    pub classifier: ClassifierSnapshot,
    pub trained_at: DateTime<Utc>,
}

/// Trained vectorizer/classifier pair
#[derive(Debug, Clone)]
pub struct StatisticalScorer {
    vectorizer: TfIdfVectorizer,
    classifier: LinearClassifier,
    trained_at: DateTime<Utc>,
}

impl StatisticalScorer {
    /// Fit the vectorizer on the sample prompts and train the classifier on
    /// labels `vaguenessScore >= config.label_threshold`.
    ///
    /// Any record that fails validation rejects the whole set.
    pub fn train(
        samples: &[TrainingSample],
        config: &TrainConfig,
    ) -> ClassifierResult<(Self, TrainingHistory)> {
        config.validate()?;
        if samples.is_empty() {
            return Err(ClassifierError::Validation(
                "cannot train on an empty sample set".to_string(),
            ));
        }
        validate_samples(samples)?;

        let prompts: Vec<&str> = samples.iter().map(|s| s.prompt.as_str()).collect();
        let labels: Vec<u8> = samples
            .iter()
            .map(|s| s.label(config.label_threshold))
            .collect();

        let (vectorizer, features) = TfIdfVectorizer::fit_transform(&prompts);
        if vectorizer.is_empty() {
            return Err(ClassifierError::Validation(
                "training prompts produced an empty vocabulary".to_string(),
            ));
        }
        tracing::debug!(
            "Fitted vocabulary of {} terms from {} prompts",
            vectorizer.vocabulary_size(),
            prompts.len()
        );

        let (classifier, history) = LinearClassifier::train(&features, &labels, config)?;
        Ok((
            Self {
                vectorizer,
                classifier,
                trained_at: Utc::now(),
            },
            history,
        ))
    }

    /// Both halves of the pair exist and agree on dimensionality
    pub fn is_trained(&self) -> bool {
        self.classifier.is_trained()
            && !self.vectorizer.is_empty()
            && self.classifier.feature_count() == self.vectorizer.vocabulary_size()
    }

    /// Score a prompt. `is_vague` is `score >= threshold`.
    pub fn analyze(&self, prompt: &str, threshold: u8) -> ClassifierResult<StatisticalResult> {
        if !self.is_trained() {
            return Err(ClassifierError::NotTrained);
        }
        let features = self.vectorizer.transform(prompt);
        let probability = self.classifier.predict(&features);
        let score = self.classifier.predict_score(&features);
        Ok(StatisticalResult {
            score,
            confidence: self.classifier.confidence(&features),
            is_vague: score >= threshold,
            probability,
        })
    }

    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &LinearClassifier {
        &self.classifier
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn to_snapshot(&self) -> ClassifierResult<ModelSnapshot> {
        Ok(ModelSnapshot {
            version: MODEL_SNAPSHOT_VERSION,
            vectorizer: self.vectorizer.to_snapshot(),
            classifier: self.classifier.to_snapshot()?,
            trained_at: self.trained_at,
        })
    }

    /// Restore the pair, rejecting any snapshot that is internally inconsistent
    pub fn from_snapshot(snapshot: ModelSnapshot) -> ClassifierResult<Self> {
        if snapshot.version != MODEL_SNAPSHOT_VERSION {
            return Err(ClassifierError::Serialization(format!(
                "unsupported model version {} (expected {})",
                snapshot.version, MODEL_SNAPSHOT_VERSION
            )));
        }
        let vectorizer = TfIdfVectorizer::from_snapshot(snapshot.vectorizer)?;
        let classifier = LinearClassifier::from_snapshot(snapshot.classifier)?;
        if classifier.feature_count() != vectorizer.vocabulary_size() {
            return Err(ClassifierError::Serialization(format!(
                "classifier expects {} features but the vocabulary has {} terms",
                classifier.feature_count(),
                vectorizer.vocabulary_size()
            )));
        }
        if vectorizer.is_empty() {
            return Err(ClassifierError::Serialization(
                "model snapshot has an empty vocabulary".to_string(),
            ));
        }
        Ok(Self {
            vectorizer,
            classifier,
            trained_at: snapshot.trained_at,
        })
    }

    pub fn to_json(&self) -> ClassifierResult<String> {
        serde_json::to_string_pretty(&self.to_snapshot()?)
            .map_err(|e| ClassifierError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> ClassifierResult<Self> {
        let snapshot: ModelSnapshot = serde_json::from_str(json)
            .map_err(|e| ClassifierError::Serialization(format!("malformed model snapshot: {e}")))?;
        Self::from_snapshot(snapshot)
    }

    /// Write the snapshot as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> ClassifierResult<()> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)?;
        tracing::info!("Saved model to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> ClassifierResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
