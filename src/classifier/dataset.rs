//! Labeled training corpus
//!
//! The corpus is a JSON array of [`TrainingSample`] records produced offline.
//! Every record is validated before it can reach the trainer.

use super::{ClassifierError, ClassifierResult};
use crate::models::TrainingSample;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;

/// Why a single record was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    pub index: usize,
    pub reason: String,
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "record {}: {}", self.index, self.reason)
    }
}

/// A validated set of training samples
#[derive(Debug, Clone, Default)]
pub struct TrainingCorpus {
    samples: Vec<TrainingSample>,
}

impl TrainingCorpus {
    /// Build from samples, rejecting the whole set if any record is invalid
    pub fn new(samples: Vec<TrainingSample>) -> ClassifierResult<Self> {
        validate_samples(&samples)?;
        if samples.is_empty() {
            return Err(ClassifierError::Validation(
                "training corpus is empty".to_string(),
            ));
        }
        Ok(Self { samples })
    }

    /// Strict parse: any invalid record fails the load, listing every offender
    pub fn from_json(json: &str) -> ClassifierResult<Self> {
        let mut samples = Vec::new();
        let mut errors = Vec::new();
        for (index, record) in parse_records(json)?.into_iter().enumerate() {
            match record {
                Ok(sample) => samples.push(sample),
                Err(reason) => errors.push(RecordError { index, reason }),
            }
        }
        if !errors.is_empty() {
            return Err(invalid_records(&errors));
        }
        Self::new(samples)
    }

    /// Lenient parse: invalid records are dropped with a warning.
    ///
    /// Returns the corpus and the number of records dropped. Still fails when
    /// nothing valid remains.
    pub fn from_json_lenient(json: &str) -> ClassifierResult<(Self, usize)> {
        let records = parse_records(json)?;
        let total = records.len();
        let samples: Vec<TrainingSample> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match record {
                Ok(sample) => Some(sample),
                Err(reason) => {
                    tracing::warn!("Dropping training record {}: {}", index, reason);
                    None
                }
            })
            .collect();
        let dropped = total - samples.len();
        Ok((Self::new(samples)?, dropped))
    }

    /// Read and strictly validate a corpus file
    pub fn load(path: &Path) -> ClassifierResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn load_lenient(path: &Path) -> ClassifierResult<(Self, usize)> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_lenient(&json)
    }

    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Count of samples labeled vague at `threshold`
    pub fn positives(&self, threshold: u8) -> usize {
        self.samples
            .iter()
            .filter(|s| s.label(threshold) == 1)
            .count()
    }

    /// Seeded shuffle, then split off `val_split` of the samples for validation.
    ///
    /// The same seed always yields the same split. A corpus of one sample is
    /// never split.
    pub fn split(&self, val_split: f64, seed: u64) -> (Vec<TrainingSample>, Vec<TrainingSample>) {
        let mut shuffled = self.samples.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        shuffled.shuffle(&mut rng);

        let n = shuffled.len();
        let val_len = if n < 2 {
            0
        } else {
            let wanted = ((n as f64) * val_split.clamp(0.0, 1.0)).round() as usize;
            wanted.min(n - 1)
        };

        let val = shuffled.split_off(n - val_len);
        (shuffled, val)
    }
}

/// Parse the outer array, then each record on its own so one malformed
/// element cannot sink the rest.
fn parse_records(json: &str) -> ClassifierResult<Vec<Result<TrainingSample, String>>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| ClassifierError::Validation(format!("corpus is not a JSON array: {e}")))?;
    Ok(values
        .into_iter()
        .map(|value| -> Result<TrainingSample, String> {
            let sample: TrainingSample =
                serde_json::from_value(value).map_err(|e| format!("malformed record: {e}"))?;
            check_record(&sample)?;
            Ok(sample)
        })
        .collect())
}

/// Reject the set if any sample fails [`check_record`], listing every offender
pub fn validate_samples(samples: &[TrainingSample]) -> ClassifierResult<()> {
    let errors: Vec<RecordError> = samples
        .iter()
        .enumerate()
        .filter_map(|(index, s)| check_record(s).err().map(|reason| RecordError { index, reason }))
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(invalid_records(&errors))
    }
}

pub fn check_record(sample: &TrainingSample) -> Result<(), String> {
    if sample.prompt.trim().is_empty() {
        return Err("prompt is empty".to_string());
    }
    if !(0..=100).contains(&sample.vagueness_score) {
        return Err(format!(
            "vaguenessScore {} is outside [0, 100]",
            sample.vagueness_score
        ));
    }
    if sample.intent().is_none() {
        return Err(format!(
            "intentCategory '{}' is not one of build, fix, learn, improve, configure, unknown",
            sample.intent_category
        ));
    }
    if sample.reasoning.trim().is_empty() {
        return Err("reasoning is empty".to_string());
    }
    Ok(())
}

fn invalid_records(errors: &[RecordError]) -> ClassifierError {
    let listed: Vec<String> = errors.iter().map(ToString::to_string).collect();
    ClassifierError::Validation(format!(
        "{} invalid training record(s): {}",
        errors.len(),
        listed.join("; ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"[
        {"prompt":"make an app","vaguenessScore":90,"intentCategory":"build","missingElements":["stack"],"reasoning":"no detail"},
        {"prompt":"fix TypeError in src/a.ts line 3","vaguenessScore":10,"intentCategory":"fix","missingElements":[],"reasoning":"specific"},
        {"prompt":"explain closures","vaguenessScore":55,"intentCategory":"learn","missingElements":[],"reasoning":"broad topic"}
    ]"#;

    #[test]
    fn test_valid_corpus_loads() {
        let corpus = TrainingCorpus::from_json(VALID).unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.positives(50), 2);
    }

    #[test]
    fn test_strict_lists_every_bad_record() {
        let json = r#"[
            {"prompt":"","vaguenessScore":90,"intentCategory":"build","reasoning":"x"},
            {"prompt":"ok","vaguenessScore":50,"intentCategory":"fix","reasoning":"fine"},
            {"prompt":"p","vaguenessScore":101,"intentCategory":"fix","reasoning":"x"},
            {"prompt":"p","vaguenessScore":5,"intentCategory":"deploy","reasoning":"x"},
            {"prompt":"p","vaguenessScore":5,"intentCategory":"fix","reasoning":"  "}
        ]"#;
        let err = TrainingCorpus::from_json(json).unwrap_err().to_string();
        assert!(err.contains("4 invalid"), "{err}");
        for index in ["record 0", "record 2", "record 3", "record 4"] {
            assert!(err.contains(index), "{err}");
        }
        assert!(!err.contains("record 1:"));
    }

    #[test]
    fn test_lenient_drops_and_counts() {
        let json = r#"[
            {"prompt":"ok","vaguenessScore":50,"intentCategory":"fix","reasoning":"fine"},
            {"prompt":"p","vaguenessScore":-1,"intentCategory":"fix","reasoning":"x"}
        ]"#;
        let (corpus, dropped) = TrainingCorpus::from_json_lenient(json).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_lenient_survives_malformed_records() {
        let json = r#"[
            {"prompt":"ok","vaguenessScore":50,"intentCategory":"fix","reasoning":"fine"},
            {"prompt":"half","vaguenessScore":42.5,"intentCategory":"fix","reasoning":"x"},
            {"vaguenessScore":10,"intentCategory":"fix","reasoning":"no prompt"},
            {"prompt":"p","vaguenessScore":"high","intentCategory":"fix","reasoning":"x"},
            7
        ]"#;
        let (corpus, dropped) = TrainingCorpus::from_json_lenient(json).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(dropped, 4);
        assert_eq!(corpus.samples()[0].prompt, "ok");
    }

    #[test]
    fn test_strict_reports_malformed_record_index() {
        let json = r#"[
            {"prompt":"ok","vaguenessScore":50,"intentCategory":"fix","reasoning":"fine"},
            {"prompt":"half","vaguenessScore":42.5,"intentCategory":"fix","reasoning":"x"}
        ]"#;
        let err = TrainingCorpus::from_json(json).unwrap_err().to_string();
        assert!(err.contains("1 invalid"), "{err}");
        assert!(err.contains("record 1: malformed record"), "{err}");
    }

    #[test]
    fn test_validate_samples_lists_offenders() {
        let sample = |prompt: &str, score: i64, intent: &str, reasoning: &str| TrainingSample {
            prompt: prompt.to_string(),
            vagueness_score: score,
            intent_category: intent.to_string(),
            missing_elements: vec![],
            reasoning: reasoning.to_string(),
        };
        let samples = [
            sample("make something", 500, "deploy", ""),
            sample("", -40, "nonsense", ""),
            sample("fix src/a.rs line 3", 5, "fix", "ok"),
        ];
        let err = validate_samples(&samples).unwrap_err().to_string();
        assert!(err.contains("record 0") && err.contains("record 1"), "{err}");
        assert!(!err.contains("record 2"), "{err}");
        assert!(validate_samples(&samples[2..]).is_ok());
    }

    #[test]
    fn test_empty_corpus_is_validation_error() {
        assert!(matches!(
            TrainingCorpus::from_json("[]"),
            Err(ClassifierError::Validation(_))
        ));
        assert!(TrainingCorpus::from_json("{\"not\":\"array\"}").is_err());
    }

    #[test]
    fn test_split_is_deterministic() {
        let corpus = TrainingCorpus::from_json(VALID).unwrap();
        let (a_train, a_val) = corpus.split(0.34, 7);
        let (b_train, b_val) = corpus.split(0.34, 7);
        assert_eq!(a_train, b_train);
        assert_eq!(a_val, b_val);
        assert_eq!(a_train.len() + a_val.len(), 3);
        assert_eq!(a_val.len(), 1);
    }

    #[test]
    fn test_split_keeps_at_least_one_training_sample() {
        let corpus = TrainingCorpus::from_json(VALID).unwrap();
        let (train, val) = corpus.split(0.9, 1);
        assert!(!train.is_empty());
        assert_eq!(train.len() + val.len(), 3);

        let (train, val) = corpus.split(0.0, 1);
        assert_eq!(train.len(), 3);
        assert!(val.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        std::fs::write(&path, VALID).unwrap();
        assert_eq!(TrainingCorpus::load(&path).unwrap().len(), 3);
        assert!(matches!(
            TrainingCorpus::load(&dir.path().join("missing.json")),
            Err(ClassifierError::Io(_))
        ));
    }
}
