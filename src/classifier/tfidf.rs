//! TF-IDF feature extraction
//!
//! A fitted vectorizer is an immutable value: fitting builds a new one, and a
//! vectorizer is always paired with the classifier trained on its output.

use super::tokenizer::tokenize;
use super::{ClassifierError, ClassifierResult};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const VECTORIZER_VERSION: u32 = 1;

/// Dense feature vector, one slot per vocabulary term
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Serialized form: `{version, vocabulary, idfValues}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorizerSnapshot {
    pub version: u32,
    pub vocabulary: Vec<String>,
    pub idf_values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default)]
pub struct TfIdfVectorizer {
    /// Sorted, unique terms
    vocabulary: Vec<String>,
    /// term -> position in `vocabulary`
    index: FxHashMap<String, usize>,
    /// idf weight per vocabulary slot
    idf: Vec<f64>,
}

impl TfIdfVectorizer {
    /// Build a vocabulary and IDF table from a corpus.
    ///
    /// `idf(term) = ln(N / df(term)) + 1`. An empty corpus gives an empty
    /// vocabulary.
    pub fn fit<S: AsRef<str>>(corpus: &[S]) -> Self {
        if corpus.is_empty() {
            return Self::default();
        }

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for doc in corpus {
            let mut terms = tokenize(doc.as_ref());
            terms.sort_unstable();
            terms.dedup();
            for term in terms {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let n = corpus.len() as f64;
        let (vocabulary, idf): (Vec<String>, Vec<f64>) = document_frequency
            .into_iter()
            .map(|(term, df)| {
                let weight = (n / df as f64).ln() + 1.0;
                (term, weight)
            })
            .unzip();

        Self::from_parts(vocabulary, idf)
    }

    /// Fit on a corpus and transform the same corpus
    pub fn fit_transform<S: AsRef<str>>(corpus: &[S]) -> (Self, Vec<FeatureVector>) {
        let vectorizer = Self::fit(corpus);
        let features = corpus
            .iter()
            .map(|doc| vectorizer.transform(doc.as_ref()))
            .collect();
        (vectorizer, features)
    }

    fn from_parts(vocabulary: Vec<String>, idf: Vec<f64>) -> Self {
        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();
        Self {
            vocabulary,
            index,
            idf,
        }
    }

    /// Term frequency (count / token count) times idf, scattered by vocabulary index.
    ///
    /// Unseen terms contribute nothing; text with no known terms gives a zero
    /// vector of vocabulary length.
    pub fn transform(&self, text: &str) -> FeatureVector {
        let mut vector = FeatureVector::zeros(self.vocabulary.len());
        if self.vocabulary.is_empty() {
            return vector;
        }

        let tokens = tokenize(text);
        if tokens.is_empty() {
            return vector;
        }

        let mut counts: FxHashMap<usize, usize> = FxHashMap::default();
        for token in &tokens {
            if let Some(&i) = self.index.get(token) {
                *counts.entry(i).or_insert(0) += 1;
            }
        }

        let total = tokens.len() as f64;
        for (i, count) in counts {
            vector.values[i] = (count as f64 / total) * self.idf[i];
        }
        vector
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    /// IDF weight of a term, if it is in the vocabulary
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.index.get(term).map(|&i| self.idf[i])
    }

    pub fn to_snapshot(&self) -> VectorizerSnapshot {
        VectorizerSnapshot {
            version: VECTORIZER_VERSION,
            vocabulary: self.vocabulary.clone(),
            idf_values: self
                .vocabulary
                .iter()
                .cloned()
                .zip(self.idf.iter().copied())
                .collect(),
        }
    }

    /// Rebuild from a snapshot, rejecting anything inconsistent
    pub fn from_snapshot(snapshot: VectorizerSnapshot) -> ClassifierResult<Self> {
        if snapshot.version != VECTORIZER_VERSION {
            return Err(ClassifierError::Serialization(format!(
                "unsupported vectorizer version {} (expected {})",
                snapshot.version, VECTORIZER_VERSION
            )));
        }
        if snapshot.idf_values.len() != snapshot.vocabulary.len() {
            return Err(ClassifierError::Serialization(format!(
                "vocabulary has {} terms but {} idf values",
                snapshot.vocabulary.len(),
                snapshot.idf_values.len()
            )));
        }

        let mut idf = Vec::with_capacity(snapshot.vocabulary.len());
        for term in &snapshot.vocabulary {
            let weight = snapshot.idf_values.get(term).copied().ok_or_else(|| {
                ClassifierError::Serialization(format!("no idf value for term '{term}'"))
            })?;
            if !weight.is_finite() {
                return Err(ClassifierError::Serialization(format!(
                    "idf value for '{term}' is not finite"
                )));
            }
            idf.push(weight);
        }

        let vectorizer = Self::from_parts(snapshot.vocabulary, idf);
        if vectorizer.index.len() != vectorizer.vocabulary.len() {
            return Err(ClassifierError::Serialization(
                "vocabulary contains duplicate terms".to_string(),
            ));
        }
        Ok(vectorizer)
    }
}
