//! Rule-based intent detection

use crate::models::IntentCategory;
use regex::Regex;
use std::sync::OnceLock;

static INTENT_PATTERNS: OnceLock<Vec<(IntentCategory, Regex)>> = OnceLock::new();

/// Ordered by tie-break priority
fn intent_patterns() -> &'static [(IntentCategory, Regex)] {
    INTENT_PATTERNS.get_or_init(|| {
        let table = [
            (
                IntentCategory::Fix,
                r"(?i)\b(fix|debug|bug|bugs|broken|crash\w*|error|errors|fail\w*|not working|doesn't work|issue|exception)\b",
            ),
            (
                IntentCategory::Learn,
                r"(?i)\b(learn|teach|explain|understand|show me|tell me|what is|what are|how does|how do|why does|difference between)\b",
            ),
            (
                IntentCategory::Configure,
                r"(?i)\b(configure|config|setup|set up|install|deploy\w*|environment|settings|enable|disable|ci|pipeline)\b",
            ),
            (
                IntentCategory::Improve,
                r"(?i)\b(improve|refactor|optimi[sz]e|clean up|cleanup|speed up|faster|performance|simplify|better|modernize)\b",
            ),
            (
                IntentCategory::Build,
                r"(?i)\b(build|create|make|implement|add|write|generate|develop|scaffold|new)\b",
            ),
        ];
        table
            .into_iter()
            .map(|(intent, pattern)| (intent, Regex::new(pattern).expect("valid regex")))
            .collect()
    })
}

/// Pick the intent with the most distinct cue matches.
///
/// Ties go to the earlier category in the table; no cues means `Unknown`.
pub fn detect_intent(prompt: &str) -> IntentCategory {
    let mut best = (0usize, IntentCategory::Unknown);
    for (intent, pattern) in intent_patterns() {
        let mut cues: Vec<String> = pattern
            .find_iter(prompt)
            .map(|m| m.as_str().to_lowercase())
            .collect();
        cues.sort_unstable();
        cues.dedup();
        if cues.len() > best.0 {
            best = (cues.len(), *intent);
        }
    }
    best.1
}
