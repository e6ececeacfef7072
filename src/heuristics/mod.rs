//! Rule-based vagueness scoring
//!
//! Fixed weighted rules (vague verbs, learning verbs, missing context, broad
//! scope, very short prompts) produce a raw score that is then offset by a
//! specificity score. Cheap, deterministic and infallible: an empty prompt is
//! a defined result, not an error.

mod intent;
pub mod patterns;
mod specificity;

pub use intent::detect_intent;
pub use specificity::SpecificityScore;

use crate::classifier::tokenizer::fold_case;
use crate::models::{AnalysisResult, HeuristicIssue, IssueSeverity, IssueType, ScoreSource};

const VAGUE_VERB_POINTS: u32 = 30;
const LEARNING_VERB_POINTS: u32 = 25;
const MISSING_CONTEXT_POINTS: u32 = 35;
const BROAD_SCOPE_POINTS: u32 = 30;
const SHORT_PROMPT_POINTS: u32 = 20;

/// Prompts at or above this word count never count as missing context
const MISSING_CONTEXT_MAX_WORDS: usize = 20;
/// Broad terms in prompts shorter than this are always too broad
const BROAD_SCOPE_MIN_WORDS: usize = 5;
const SHORT_PROMPT_MAX_WORDS: usize = 2;

pub const DEFAULT_VAGUENESS_THRESHOLD: u8 = 30;
pub const DEFAULT_SPECIFICITY_MULTIPLIER: f64 = 1.0;

/// Which rules fired for a prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSignals {
    pub vague_verb: Option<String>,
    pub learning_verb: Option<String>,
    pub missing_context: bool,
    pub broad_term: Option<String>,
    pub short_prompt: bool,
    pub word_count: usize,
}

/// Full scoring trace, used by the engine for explanations
#[derive(Debug, Clone)]
pub struct HeuristicReport {
    pub signals: RuleSignals,
    /// Rule total before the specificity offset, clamped to `[0, 100]`
    pub raw_score: u32,
    pub specificity: SpecificityScore,
    pub result: AnalysisResult,
}

/// Deterministic rule-based scorer
#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    vagueness_threshold: u8,
    specificity_multiplier: f64,
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self {
            vagueness_threshold: DEFAULT_VAGUENESS_THRESHOLD,
            specificity_multiplier: DEFAULT_SPECIFICITY_MULTIPLIER,
        }
    }
}

impl HeuristicScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, vagueness_threshold: u8) -> Self {
        self.vagueness_threshold = vagueness_threshold.min(100);
        self
    }

    pub fn with_specificity_multiplier(mut self, multiplier: f64) -> Self {
        if multiplier.is_finite() && multiplier >= 0.0 {
            self.specificity_multiplier = multiplier;
        }
        self
    }

    pub fn vagueness_threshold(&self) -> u8 {
        self.vagueness_threshold
    }

    /// Score a prompt (source = `rules`)
    pub fn score(&self, prompt: &str) -> AnalysisResult {
        self.evaluate(prompt).result
    }

    /// Score a prompt and keep the intermediate signals
    pub fn evaluate(&self, prompt: &str) -> HeuristicReport {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return self.empty_report();
        }
        let folded = fold_case(trimmed);

        let signals = detect_signals(&folded);
        let mut raw: u32 = 0;
        let mut issues = Vec::new();

        if let Some(verb) = &signals.vague_verb {
            raw += VAGUE_VERB_POINTS;
            issues.push(HeuristicIssue::new(
                IssueType::VagueVerb,
                IssueSeverity::Medium,
                format!("\"{verb}\" does not say what should change or where"),
                "Name the exact behavior, file or component you want changed",
            ));
        }

        if signals.learning_verb.is_some() {
            raw += LEARNING_VERB_POINTS;
        }

        if signals.missing_context {
            raw += MISSING_CONTEXT_POINTS;
            issues.push(HeuristicIssue::new(
                IssueType::MissingContext,
                IssueSeverity::Medium,
                "No file, technology or technical subject is mentioned",
                "Mention the language, framework, file path or error you are dealing with",
            ));
        }

        if signals.broad_term.is_some() {
            raw += BROAD_SCOPE_POINTS;
        }

        if let Some(issue) = scope_issue(&signals) {
            issues.push(issue);
        }

        if signals.short_prompt {
            raw += SHORT_PROMPT_POINTS;
        }

        let raw_score = raw.min(100);
        let specificity = SpecificityScore::compute(&folded, signals.word_count);
        let offset = f64::from(specificity.total) * self.specificity_multiplier;
        let score = (f64::from(raw_score) - offset).round().clamp(0.0, 100.0) as u8;

        let reasoning = explain(&signals, raw_score, &specificity, score);
        let result = AnalysisResult {
            score,
            confidence: rule_confidence(score),
            is_vague: score >= self.vagueness_threshold,
            source: ScoreSource::Rules,
            issues,
            reasoning: Some(reasoning),
            intent: detect_intent(&folded),
        };

        HeuristicReport {
            signals,
            raw_score,
            specificity,
            result,
        }
    }

    fn empty_report(&self) -> HeuristicReport {
        HeuristicReport {
            signals: RuleSignals::default(),
            raw_score: 100,
            specificity: SpecificityScore::default(),
            result: AnalysisResult {
                score: 100,
                confidence: 1.0,
                is_vague: true,
                source: ScoreSource::Rules,
                issues: vec![HeuristicIssue::new(
                    IssueType::MissingContext,
                    IssueSeverity::High,
                    "The prompt is empty",
                    "Describe what you want to build, fix or learn",
                )],
                reasoning: Some("Empty prompt".to_string()),
                intent: Default::default(),
            },
        }
    }
}

/// Run every detection rule against a trimmed, non-empty prompt
fn detect_signals(prompt: &str) -> RuleSignals {
    let word_count = prompt.split_whitespace().count();
    let first_match = |re: &regex::Regex| re.find(prompt).map(|m| m.as_str().to_lowercase());

    let missing_context = word_count < MISSING_CONTEXT_MAX_WORDS
        && !patterns::any_match(patterns::context_patterns(), prompt);

    let broad_term = first_match(patterns::broad_term()).filter(|_| {
        word_count < BROAD_SCOPE_MIN_WORDS || !has_specific_details(prompt)
    });

    RuleSignals {
        vague_verb: first_match(patterns::vague_verb()),
        learning_verb: first_match(patterns::learning_verb()),
        missing_context,
        broad_term,
        short_prompt: word_count <= SHORT_PROMPT_MAX_WORDS,
        word_count,
    }
}

fn has_specific_details(prompt: &str) -> bool {
    prompt.contains('?') || patterns::any_match(patterns::detail_indicators(), prompt)
}

/// At most one UNCLEAR_SCOPE issue, recording every trigger
fn scope_issue(signals: &RuleSignals) -> Option<HeuristicIssue> {
    let description = match (&signals.learning_verb, &signals.broad_term) {
        (None, None) => return None,
        (Some(verb), None) => format!("\"{verb}\" asks for an explanation without a defined scope"),
        (None, Some(term)) => format!("\"{term}\" is too broad to act on without specific details"),
        (Some(verb), Some(term)) => format!(
            "\"{verb}\" asks for an explanation without a defined scope; \"{term}\" is too broad"
        ),
    };
    let suggestion = if signals.learning_verb.is_some() {
        "Say which concept, your current level and what you want to be able to do afterwards"
    } else {
        "Narrow the request to one feature, page, endpoint or table"
    };
    Some(HeuristicIssue::new(
        IssueType::UnclearScope,
        IssueSeverity::Medium,
        description,
        suggestion,
    ))
}

/// Rules are most certain near the extremes of the scale
fn rule_confidence(score: u8) -> f64 {
    (0.5 + (f64::from(score) - 50.0).abs() / 100.0).clamp(0.0, 1.0)
}

fn explain(signals: &RuleSignals, raw: u32, specificity: &SpecificityScore, score: u8) -> String {
    let mut fired = Vec::new();
    if signals.vague_verb.is_some() {
        fired.push("vague verb");
    }
    if signals.learning_verb.is_some() {
        fired.push("learning verb");
    }
    if signals.missing_context {
        fired.push("missing context");
    }
    if signals.broad_term.is_some() {
        fired.push("broad scope");
    }
    if signals.short_prompt {
        fired.push("very short prompt");
    }

    let rules = if fired.is_empty() {
        "no vagueness rules fired".to_string()
    } else {
        format!("rules fired: {}", fired.join(", "))
    };
    match specificity.dominant() {
        Some(source) => format!(
            "{rules} (raw {raw}); specificity {} mostly from {source}; final {score}",
            specificity.total
        ),
        None => format!("{rules} (raw {raw}); no specific detail found; final {score}"),
    }
}
