//! Specificity scoring
//!
//! Awards points for concrete detail. The total offsets the raw rule score so
//! a prompt with a vague verb but rich detail can still score low.

use super::patterns;
use rustc_hash::FxHashSet;
use serde::Serialize;

const TECHNICAL_TERM_POINTS: u32 = 5;
const TECHNICAL_TERM_MAX: u32 = 30;
const FILE_PATH_POINTS: u32 = 15;
const LINE_REFERENCE_POINTS: u32 = 10;
const FILE_REFERENCE_MAX: u32 = 25;
const HTTP_VERB_POINTS: u32 = 10;
const REQUIREMENT_POINTS: u32 = 5;
const REQUIREMENT_MAX: u32 = 20;
const LENGTH_MAX: u32 = 15;
const TOTAL_MAX: u32 = 100;

/// Per-category breakdown of specificity points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SpecificityScore {
    pub technical_terms: u32,
    pub file_references: u32,
    pub http_verbs: u32,
    pub requirements: u32,
    pub length: u32,
    pub total: u32,
}

impl SpecificityScore {
    /// Score a trimmed, non-empty prompt
    pub fn compute(prompt: &str, word_count: usize) -> Self {
        let lower = prompt.to_lowercase();

        let technical_terms =
            (distinct_matches(patterns::technical_term(), &lower) * TECHNICAL_TERM_POINTS)
                .min(TECHNICAL_TERM_MAX);

        let mut file_references = 0;
        if patterns::file_path().is_match(&lower) || patterns::file_name().is_match(&lower) {
            file_references += FILE_PATH_POINTS;
        }
        if patterns::line_reference().is_match(&lower) {
            file_references += LINE_REFERENCE_POINTS;
        }
        let file_references = file_references.min(FILE_REFERENCE_MAX);

        let http_verbs = if patterns::http_verb().is_match(&lower) {
            HTTP_VERB_POINTS
        } else {
            0
        };

        let requirements = (distinct_matches(patterns::requirement_phrase(), &lower)
            * REQUIREMENT_POINTS)
            .min(REQUIREMENT_MAX);

        let length = match word_count {
            n if n >= 40 => LENGTH_MAX,
            n if n >= 20 => 10,
            n if n >= 10 => 5,
            _ => 0,
        };

        let total =
            (technical_terms + file_references + http_verbs + requirements + length).min(TOTAL_MAX);

        Self {
            technical_terms,
            file_references,
            http_verbs,
            requirements,
            length,
            total,
        }
    }

    /// Name of the largest contributor, for explanations
    pub fn dominant(&self) -> Option<&'static str> {
        [
            (self.technical_terms, "technical terms"),
            (self.file_references, "file references"),
            (self.http_verbs, "HTTP verbs"),
            (self.requirements, "stated requirements"),
            (self.length, "length"),
        ]
        .into_iter()
        .filter(|(points, _)| *points > 0)
        .max_by_key(|(points, _)| *points)
        .map(|(_, name)| name)
    }
}

/// Count distinct matched terms so repeating one word doesn't inflate the score
fn distinct_matches(pattern: &regex::Regex, text: &str) -> u32 {
    let seen: FxHashSet<&str> = pattern
        .captures_iter(text)
        .filter_map(|c| c.iter().skip(1).flatten().next().or_else(|| c.get(0)))
        .map(|m| m.as_str().trim())
        .collect();
    seen.len() as u32
}
