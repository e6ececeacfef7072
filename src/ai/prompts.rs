//! Rubric instructions sent to the external judge
//!
//! User text is sanitized before it is embedded so a prompt cannot rewrite
//! the rubric it is being judged against.

use regex::Regex;
use std::sync::OnceLock;

/// Longest prompt forwarded to the judge, in bytes
pub const MAX_PROMPT_BYTES: usize = 2000;

const VAGUENESS_RUBRIC: &str = "You rate how vague a request to a software assistant is.

Score from 0 to 100:
- 0-20: fully specific. Names the target (file, function, endpoint), the technology and the expected outcome.
- 21-50: mostly clear but missing one important detail.
- 51-80: the goal is recognizable but the scope, target or constraints are missing.
- 81-100: no actionable content (\"help\", \"make something\").

Reply with ONLY a JSON object, no prose:
{\"vaguenessScore\": <0-100>, \"reasoning\": \"<one or two sentences>\", \"confidence\": <0-1>, \"missingElements\": [\"<short phrase>\", ...]}";

const COMPARISON_RUBRIC: &str = "You compare an ORIGINAL request to a software assistant with a REFINED rewrite of it.

Score each criterion from 0 to 100:
- specificityGain: how much more concrete the refined request is.
- actionability: whether an engineer could start work from the refined request alone.
- issueCoverage: how many of the original's gaps the rewrite fills.
- relevance: whether the rewrite still asks for what the original wanted.
- overallScore: your overall judgment of the rewrite.

Reply with ONLY a JSON object, no prose:
{\"overallScore\": <0-100>, \"specificityGain\": <0-100>, \"actionability\": <0-100>, \"issueCoverage\": <0-100>, \"relevance\": <0-100>, \"reasoning\": \"<one or two sentences>\"}";

/// Instructions for a single-prompt vagueness verdict
pub fn vagueness_instructions() -> &'static str {
    VAGUENESS_RUBRIC
}

/// Instructions for an original-vs-refined comparison; the refined text is
/// embedded here, the original travels as the judged text.
pub fn comparison_instructions(refined: &str) -> String {
    format!(
        "{COMPARISON_RUBRIC}\n\nREFINED:\n<<<\n{}\n>>>",
        sanitize_text(refined)
    )
}

/// Wrap the judged prompt so the model sees where user text starts and ends
pub fn judged_text(original: &str) -> String {
    format!("ORIGINAL:\n<<<\n{}\n>>>", sanitize_text(original))
}

fn injection_patterns() -> &'static [Regex] {
    static INJECTION_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    INJECTION_PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)ignore\s+(all\s+)?(previous|prior|above)\s+(instructions?|rules?)")
                .expect("valid regex"),
            Regex::new(r"(?i)disregard\s+(all\s+)?(previous|prior|above)").expect("valid regex"),
            Regex::new(r"(?i)forget\s+(all\s+)?(previous|prior|above)").expect("valid regex"),
            Regex::new(r"(?i)system\s*:\s*").expect("valid regex"),
            Regex::new(r"(?i)<\s*/?\s*system\s*>").expect("valid regex"),
            Regex::new(r"(?i)assistant\s*:\s*").expect("valid regex"),
            Regex::new(r"(?i)human\s*:\s*").expect("valid regex"),
            Regex::new(r"(?i)(respond|reply|answer)\s+with\s+(a\s+)?(vagueness\s*)?score\s+(of\s+)?\d+")
                .expect("valid regex"),
            Regex::new(r"(?i)(output|reveal)\s+(your\s+)?(api\s*key|secret|password|credential)")
                .expect("valid regex"),
        ]
    })
}

/// Redact prompt-injection phrases, neutralize the `<<<`/`>>>` delimiters
/// and truncate very long text on a char boundary.
pub fn sanitize_text(text: &str) -> String {
    let mut result = text.replace("<<<", "<< <").replace(">>>", "> >>");
    for pattern in injection_patterns() {
        result = pattern.replace_all(&result, "[REDACTED]").into_owned();
    }

    if result.len() > MAX_PROMPT_BYTES {
        let mut cut = MAX_PROMPT_BYTES;
        while !result.is_char_boundary(cut) {
            cut -= 1;
        }
        result.truncate(cut);
        result.push_str("... [truncated]");
    }

    result
}
