//! Schema-validating parsers for judge replies
//!
//! A reply is free-form text that should contain one JSON object. Markdown
//! fences are stripped, the first well-formed `{...}` object is located and
//! parsed, required fields are type-checked, and every number is clamped
//! into range. Anything else is a [`JudgeError::Parse`].

use super::{JudgeError, JudgeResult};
use serde::Serialize;
use serde_json::{Map, Value};

/// A validated vagueness verdict
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedJudgeResponse {
    /// Clamped to `[0, 100]`
    pub vagueness_score: u8,
    pub reasoning: String,
    /// Clamped to `[0, 1]` when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_elements: Vec<String>,
}

/// A validated original-vs-refined comparison, every score in `[0, 100]`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonScores {
    pub overall_score: u8,
    pub specificity_gain: u8,
    pub actionability: u8,
    pub issue_coverage: u8,
    pub relevance: u8,
    pub reasoning: String,
}

/// Parse a vagueness verdict: requires `vaguenessScore` (number) and
/// `reasoning` (string).
pub fn parse_judge_response(text: &str) -> JudgeResult<ParsedJudgeResponse> {
    let object = extract_object(text)?;
    let vagueness_score = required_score(&object, "vaguenessScore")?;
    let reasoning = required_string(&object, "reasoning")?;

    let confidence = match object.get("confidence") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            v.as_f64()
                .ok_or_else(|| type_error("confidence", "a number"))?
                .clamp(0.0, 1.0),
        ),
    };

    let missing_elements = match object.get("missingElements") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    Ok(ParsedJudgeResponse {
        vagueness_score,
        reasoning,
        confidence,
        missing_elements,
    })
}

/// Parse a comparison verdict; all five scores and `reasoning` are required
pub fn parse_comparison(text: &str) -> JudgeResult<ComparisonScores> {
    let object = extract_object(text)?;
    Ok(ComparisonScores {
        overall_score: required_score(&object, "overallScore")?,
        specificity_gain: required_score(&object, "specificityGain")?,
        actionability: required_score(&object, "actionability")?,
        issue_coverage: required_score(&object, "issueCoverage")?,
        relevance: required_score(&object, "relevance")?,
        reasoning: required_string(&object, "reasoning")?,
    })
}

/// Remove markdown code fence lines (```json ... ```)
pub fn strip_code_fences(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Opening braces tried before a reply is rejected
const MAX_OBJECT_CANDIDATES: usize = 32;

/// Locate and parse the first well-formed JSON object in `text`.
///
/// Each `{` is tried in turn, up to [`MAX_OBJECT_CANDIDATES`]; a candidate
/// ends at its balancing `}` (braces inside string literals do not count) and
/// must parse as an object.
pub fn extract_object(text: &str) -> JudgeResult<Map<String, Value>> {
    let cleaned = strip_code_fences(text);
    if cleaned.trim().is_empty() {
        return Err(JudgeError::Parse("empty response".to_string()));
    }

    for (start, _) in cleaned.match_indices('{').take(MAX_OBJECT_CANDIDATES) {
        let Some(end) = balanced_end(&cleaned[start..]) else {
            continue;
        };
        if let Ok(Value::Object(map)) = serde_json::from_str(&cleaned[start..start + end]) {
            return Ok(map);
        }
    }
    Err(JudgeError::Parse(
        "no well-formed JSON object in response".to_string(),
    ))
}

/// Byte length of the balanced `{...}` at the start of `s`
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn required_score(object: &Map<String, Value>, field: &str) -> JudgeResult<u8> {
    let value = object
        .get(field)
        .ok_or_else(|| JudgeError::Parse(format!("missing required field '{field}'")))?;
    let number = value.as_f64().ok_or_else(|| type_error(field, "a number"))?;
    Ok(clamp_score(number))
}

fn required_string(object: &Map<String, Value>, field: &str) -> JudgeResult<String> {
    let value = object
        .get(field)
        .ok_or_else(|| JudgeError::Parse(format!("missing required field '{field}'")))?;
    value
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| type_error(field, "a string"))
}

fn type_error(field: &str, expected: &str) -> JudgeError {
    JudgeError::Parse(format!("field '{field}' must be {expected}"))
}

/// Round and clamp into `[0, 100]`
pub fn clamp_score(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}
