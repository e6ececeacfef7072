//! Core data models for Clarifier
//!
//! These models are shared by the heuristic scorer, the statistical
//! classifier and the hybrid engine.

use serde::{Deserialize, Serialize};

/// Kind of problem found in a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    VagueVerb,
    MissingContext,
    UnclearScope,
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueType::VagueVerb => write!(f, "VAGUE_VERB"),
            IssueType::MissingContext => write!(f, "MISSING_CONTEXT"),
            IssueType::UnclearScope => write!(f, "UNCLEAR_SCOPE"),
        }
    }
}

/// Severity of a heuristic issue
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueSeverity {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueSeverity::Low => write!(f, "LOW"),
            IssueSeverity::Medium => write!(f, "MEDIUM"),
            IssueSeverity::High => write!(f, "HIGH"),
        }
    }
}

/// A single explanation of why a prompt is vague
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: IssueSeverity,
    pub description: String,
    pub suggestion: String,
}

impl HeuristicIssue {
    pub fn new(
        issue_type: IssueType,
        severity: IssueSeverity,
        description: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            issue_type,
            severity,
            description: description.into(),
            suggestion: suggestion.into(),
        }
    }
}

/// Which scorer produced the final number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreSource {
    Rules,
    Ml,
    Llm,
    HybridFallback,
}

impl std::fmt::Display for ScoreSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreSource::Rules => write!(f, "rules"),
            ScoreSource::Ml => write!(f, "ml"),
            ScoreSource::Llm => write!(f, "llm"),
            ScoreSource::HybridFallback => write!(f, "hybrid-fallback"),
        }
    }
}

/// What the user is trying to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntentCategory {
    Build,
    Fix,
    Learn,
    Improve,
    Configure,
    #[default]
    Unknown,
}

impl IntentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentCategory::Build => "build",
            IntentCategory::Fix => "fix",
            IntentCategory::Learn => "learn",
            IntentCategory::Improve => "improve",
            IntentCategory::Configure => "configure",
            IntentCategory::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final output of every scoring path.
///
/// `score` is always in `[0, 100]` and `confidence` in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub score: u8,
    pub confidence: f64,
    pub is_vague: bool,
    pub source: ScoreSource,
    pub issues: Vec<HeuristicIssue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub intent: IntentCategory,
}

impl AnalysisResult {
    /// Check whether an issue of the given type was reported
    pub fn has_issue(&self, issue_type: IssueType) -> bool {
        self.issues.iter().any(|i| i.issue_type == issue_type)
    }
}

/// One labeled record from a training corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSample {
    pub prompt: String,
    pub vagueness_score: i64,
    pub intent_category: String,
    #[serde(default)]
    pub missing_elements: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
}

impl TrainingSample {
    /// Parse the intent field into the fixed enum, if it is one of the known values
    pub fn intent(&self) -> Option<IntentCategory> {
        match self.intent_category.as_str() {
            "build" => Some(IntentCategory::Build),
            "fix" => Some(IntentCategory::Fix),
            "learn" => Some(IntentCategory::Learn),
            "improve" => Some(IntentCategory::Improve),
            "configure" => Some(IntentCategory::Configure),
            "unknown" => Some(IntentCategory::Unknown),
            _ => None,
        }
    }

    /// Binary label used for classifier training
    pub fn label(&self, threshold: u8) -> u8 {
        u8::from(self.vagueness_score >= i64::from(threshold))
    }
}
