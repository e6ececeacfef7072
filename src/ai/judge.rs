//! The external judge boundary

use super::client::LlmClient;
use super::parse::{parse_comparison, parse_judge_response, ComparisonScores, ParsedJudgeResponse};
use super::prompts::{comparison_instructions, judged_text, vagueness_instructions};
use super::{JudgeError, JudgeResult};
use tokio_util::sync::CancellationToken;

/// An out-of-process authority consulted when local scoring is unsure.
///
/// Given the text under judgment and the rubric, return one complete reply
/// or fail. Implementations should check `cancel` before doing expensive
/// work and return [`JudgeError::Cancelled`] once it fires. Retries, if any,
/// belong inside the implementation.
pub trait ExternalJudge: Send + Sync {
    fn evaluate(
        &self,
        original: &str,
        instructions: &str,
        cancel: &CancellationToken,
    ) -> JudgeResult<String>;

    /// Short label for logs
    fn name(&self) -> &str {
        "external"
    }
}

/// Judge backed by an LLM chat API
#[derive(Debug)]
pub struct LlmJudge {
    client: LlmClient,
}

impl LlmJudge {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &LlmClient {
        &self.client
    }
}

impl ExternalJudge for LlmJudge {
    fn evaluate(
        &self,
        original: &str,
        instructions: &str,
        cancel: &CancellationToken,
    ) -> JudgeResult<String> {
        if cancel.is_cancelled() {
            return Err(JudgeError::Cancelled);
        }
        let reply = self.client.complete(instructions, &judged_text(original))?;
        // The HTTP call cannot be interrupted; drop a reply that arrives late.
        if cancel.is_cancelled() {
            return Err(JudgeError::Cancelled);
        }
        Ok(reply)
    }

    fn name(&self) -> &str {
        self.client.model()
    }
}

/// Ask for a vagueness verdict and validate it
pub fn judge_vagueness(
    judge: &dyn ExternalJudge,
    prompt: &str,
    cancel: &CancellationToken,
) -> JudgeResult<ParsedJudgeResponse> {
    let reply = judge.evaluate(prompt, vagueness_instructions(), cancel)?;
    parse_judge_response(&reply)
}

/// Ask the judge to compare a refined prompt against its original
pub fn compare_prompts(
    judge: &dyn ExternalJudge,
    original: &str,
    refined: &str,
    cancel: &CancellationToken,
) -> JudgeResult<ComparisonScores> {
    let reply = judge.evaluate(original, &comparison_instructions(refined), cancel)?;
    parse_comparison(&reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(&'static str);

    impl ExternalJudge for Canned {
        fn evaluate(&self, _: &str, _: &str, cancel: &CancellationToken) -> JudgeResult<String> {
            if cancel.is_cancelled() {
                return Err(JudgeError::Cancelled);
            }
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_judge_vagueness_parses_reply() {
        let judge = Canned(r#"{"vaguenessScore": 64, "reasoning": "no file named"}"#);
        let verdict = judge_vagueness(&judge, "fix it", &CancellationToken::new()).unwrap();
        assert_eq!(verdict.vagueness_score, 64);
    }

    #[test]
    fn test_garbage_reply_is_parse_error() {
        let judge = Canned("I think it is quite vague.");
        assert!(matches!(
            judge_vagueness(&judge, "fix it", &CancellationToken::new()),
            Err(JudgeError::Parse(_))
        ));
    }

    #[test]
    fn test_cancelled_before_call() {
        let judge = Canned("{}");
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(
            judge_vagueness(&judge, "fix it", &cancel),
            Err(JudgeError::Cancelled)
        );
    }

    #[test]
    fn test_compare_prompts() {
        let judge = Canned(
            r#"{"overallScore": 80, "specificityGain": 75, "actionability": 90,
                "issueCoverage": 70, "relevance": 95, "reasoning": "adds target file"}"#,
        );
        let scores =
            compare_prompts(&judge, "fix it", "fix the null check in a.rs", &CancellationToken::new())
                .unwrap();
        assert_eq!(scores.actionability, 90);
    }
}
