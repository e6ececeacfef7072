//! Hybrid decision engine
//!
//! Routes each prompt through rules, the statistical model and, when the
//! model is unsure, an external judge:
//!
//! 1. No model installed → rules result (`rules`).
//! 2. Model confidence ≥ threshold → model result (`ml`).
//! 3. Otherwise ask the judge under a deadline and cancellation token.
//!    A valid verdict wins (`llm`, confidence 1.0); any judge failure falls
//!    back to the model result.
//!
//! Blended mode replaces every would-be model result with
//! `round(ML×0.7 + rules×0.3)` tagged `hybrid-fallback`. Heuristic issues are
//! always attached for explainability.

mod slot;

pub use slot::ModelSlot;

use crate::ai::{compare_prompts, judge_vagueness, ComparisonScores, ExternalJudge, JudgeError, JudgeResult, ParsedJudgeResponse};
use crate::classifier::{ClassifierError, ClassifierResult, StatisticalResult, StatisticalScorer};
use crate::heuristics::{HeuristicReport, HeuristicScorer, DEFAULT_SPECIFICITY_MULTIPLIER, DEFAULT_VAGUENESS_THRESHOLD};
use crate::models::{AnalysisResult, ScoreSource};
use crossbeam_channel::RecvTimeoutError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;
pub const DEFAULT_ML_WEIGHT: f64 = 0.7;
pub const DEFAULT_HEURISTIC_WEIGHT: f64 = 0.3;
pub const DEFAULT_JUDGE_TIMEOUT: Duration = Duration::from_secs(15);

/// How often the engine wakes to check cancellation while the judge runs
const JUDGE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Routing policy for a single call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisMode {
    /// Rules → model → judge, by confidence
    #[default]
    Auto,
    /// Like `Auto`, but model results are blended with the rules score
    Blended,
    HeuristicOnly,
    /// Model result whatever its confidence; never calls the judge
    MlOnly,
    /// Always consult the judge; fall back like `Auto` when it fails
    ForceJudge,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Auto => "auto",
            AnalysisMode::Blended => "blended",
            AnalysisMode::HeuristicOnly => "heuristic-only",
            AnalysisMode::MlOnly => "ml-only",
            AnalysisMode::ForceJudge => "force-judge",
        }
    }
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "auto" => Ok(AnalysisMode::Auto),
            "blended" | "hybrid" => Ok(AnalysisMode::Blended),
            "heuristic-only" | "heuristic" | "rules" => Ok(AnalysisMode::HeuristicOnly),
            "ml-only" | "ml" => Ok(AnalysisMode::MlOnly),
            "force-judge" | "judge" | "llm" => Ok(AnalysisMode::ForceJudge),
            other => Err(format!(
                "unknown mode '{other}' (expected auto, blended, heuristic-only, ml-only or force-judge)"
            )),
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a trained model is installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    NoModel,
    MlReady,
}

/// Engine tuning
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// `isVague = score >= vagueness_threshold`
    pub vagueness_threshold: u8,
    /// Minimum model confidence that skips the judge
    pub confidence_threshold: f64,
    pub ml_weight: f64,
    pub heuristic_weight: f64,
    pub specificity_multiplier: f64,
    pub judge_timeout: Duration,
    /// Mode used by [`HybridDecisionEngine::analyze`]
    pub mode: AnalysisMode,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            vagueness_threshold: DEFAULT_VAGUENESS_THRESHOLD,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            ml_weight: DEFAULT_ML_WEIGHT,
            heuristic_weight: DEFAULT_HEURISTIC_WEIGHT,
            specificity_multiplier: DEFAULT_SPECIFICITY_MULTIPLIER,
            judge_timeout: DEFAULT_JUDGE_TIMEOUT,
            mode: AnalysisMode::Auto,
        }
    }
}

impl EngineSettings {
    /// `round((ml×w_ml + rules×w_h) / (w_ml + w_h))`
    pub fn blend(&self, ml_score: u8, heuristic_score: u8) -> u8 {
        let total = self.ml_weight + self.heuristic_weight;
        let (wm, wh) = if total > 0.0 && total.is_finite() {
            (self.ml_weight / total, self.heuristic_weight / total)
        } else {
            (DEFAULT_ML_WEIGHT, DEFAULT_HEURISTIC_WEIGHT)
        };
        (f64::from(ml_score) * wm + f64::from(heuristic_score) * wh)
            .round()
            .clamp(0.0, 100.0) as u8
    }
}

/// Scoring service: rules plus a swappable model plus an optional judge.
///
/// Safe to share across threads; every method takes `&self`.
pub struct HybridDecisionEngine {
    heuristics: HeuristicScorer,
    model: ModelSlot,
    judge: Option<Arc<dyn ExternalJudge>>,
    settings: EngineSettings,
}

impl Default for HybridDecisionEngine {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl std::fmt::Debug for HybridDecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridDecisionEngine")
            .field("settings", &self.settings)
            .field("state", &self.state())
            .field("judge", &self.judge.as_ref().map(|j| j.name().to_string()))
            .finish()
    }
}

impl HybridDecisionEngine {
    pub fn new(settings: EngineSettings) -> Self {
        let heuristics = HeuristicScorer::new()
            .with_threshold(settings.vagueness_threshold)
            .with_specificity_multiplier(settings.specificity_multiplier);
        Self {
            heuristics,
            model: ModelSlot::empty(),
            judge: None,
            settings,
        }
    }

    pub fn with_judge(mut self, judge: Arc<dyn ExternalJudge>) -> Self {
        self.judge = Some(judge);
        self
    }

    pub fn with_model(self, model: StatisticalScorer) -> Self {
        self.install_model(model);
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn has_judge(&self) -> bool {
        self.judge.is_some()
    }

    pub fn state(&self) -> EngineState {
        if self.model.is_loaded() {
            EngineState::MlReady
        } else {
            EngineState::NoModel
        }
    }

    /// Atomically replace the active model; returns the new generation.
    ///
    /// Calls already in flight finish on the model they started with.
    pub fn install_model(&self, model: StatisticalScorer) -> u64 {
        if !model.is_trained() {
            tracing::warn!("Ignoring untrained model");
            return self.model.generation();
        }
        let vocabulary = model.vectorizer().vocabulary_size();
        let generation = self.model.install(model);
        tracing::info!(
            "Installed model generation {} ({} vocabulary terms)",
            generation,
            vocabulary
        );
        generation
    }

    /// Restore a model snapshot and install it. A corrupted snapshot is an
    /// error and leaves the current model in place.
    pub fn install_from_json(&self, json: &str) -> ClassifierResult<u64> {
        let model = StatisticalScorer::from_json(json)?;
        Ok(self.install_model(model))
    }

    pub fn load_model(&self, path: &Path) -> ClassifierResult<u64> {
        let model = StatisticalScorer::load(path)?;
        Ok(self.install_model(model))
    }

    pub fn clear_model(&self) {
        self.model.clear();
    }

    pub fn model_generation(&self) -> u64 {
        self.model.generation()
    }

    /// Score with the configured default mode. Never fails.
    pub fn analyze(&self, prompt: &str) -> AnalysisResult {
        self.analyze_with(prompt, self.settings.mode, &CancellationToken::new())
    }

    /// Score with an explicit mode and a caller-owned cancellation token.
    ///
    /// Cancelling only affects the judge step; it is treated like any other
    /// judge failure.
    pub fn analyze_with(
        &self,
        prompt: &str,
        mode: AnalysisMode,
        cancel: &CancellationToken,
    ) -> AnalysisResult {
        let report = self.heuristics.evaluate(prompt);
        if prompt.trim().is_empty() || mode == AnalysisMode::HeuristicOnly {
            return report.result;
        }

        let model = self.model.load();
        let ml = model
            .as_deref()
            .and_then(|m| match m.analyze(prompt, self.settings.vagueness_threshold) {
                Ok(r) => Some(r),
                Err(e) => {
                    tracing::warn!("Model scoring failed, using rules: {}", e);
                    None
                }
            });

        let blended = mode == AnalysisMode::Blended;

        match (mode, ml) {
            (AnalysisMode::ForceJudge, ml) => {
                tracing::debug!("Forcing judge");
                match self.consult_judge(prompt, cancel) {
                    Ok(verdict) => self.judge_result(&report, verdict),
                    Err(e) => {
                        tracing::warn!("Judge failed ({}), falling back", e);
                        match ml {
                            Some(r) => self.model_result(&report, &r, false),
                            None => report.result,
                        }
                    }
                }
            }
            (_, None) => {
                tracing::debug!("No model installed, using rules");
                report.result
            }
            (AnalysisMode::MlOnly, Some(r)) => self.model_result(&report, &r, false),
            (_, Some(r)) if r.confidence >= self.settings.confidence_threshold => {
                tracing::debug!("Model confident ({:.2}), skipping judge", r.confidence);
                self.model_result(&report, &r, blended)
            }
            (_, Some(r)) if self.judge.is_none() => {
                tracing::debug!("Model unsure ({:.2}) and no judge configured", r.confidence);
                self.model_result(&report, &r, blended)
            }
            (_, Some(r)) => {
                tracing::debug!("Model unsure ({:.2}), consulting judge", r.confidence);
                match self.consult_judge(prompt, cancel) {
                    Ok(verdict) => self.judge_result(&report, verdict),
                    Err(e) => {
                        tracing::warn!("Judge failed ({}), using model result", e);
                        self.model_result(&report, &r, blended)
                    }
                }
            }
        }
    }

    /// Rules only (source = `rules`)
    pub fn analyze_heuristic_only(&self, prompt: &str) -> AnalysisResult {
        self.heuristics.score(prompt)
    }

    /// Model only, never the judge. Fails with `NotTrained` when no model is
    /// installed.
    pub fn analyze_ml_only(&self, prompt: &str) -> ClassifierResult<AnalysisResult> {
        let report = self.heuristics.evaluate(prompt);
        if prompt.trim().is_empty() {
            return Ok(report.result);
        }
        let model = self.model.load().ok_or(ClassifierError::NotTrained)?;
        let r = model.analyze(prompt, self.settings.vagueness_threshold)?;
        Ok(self.model_result(&report, &r, false))
    }

    /// Have the judge rate a refined prompt against its original
    pub fn compare(
        &self,
        original: &str,
        refined: &str,
        cancel: &CancellationToken,
    ) -> JudgeResult<ComparisonScores> {
        let judge = self.require_judge()?;
        let (original, refined) = (original.to_string(), refined.to_string());
        run_with_deadline(judge, self.settings.judge_timeout, cancel, move |judge, token| {
            compare_prompts(judge, &original, &refined, token)
        })
    }

    fn model_result(&self, report: &HeuristicReport, r: &StatisticalResult, blended: bool) -> AnalysisResult {
        let (score, source, reasoning) = if blended {
            let score = self.settings.blend(r.score, report.result.score);
            (
                score,
                ScoreSource::HybridFallback,
                format!(
                    "Blended model score {} with rules score {} into {}",
                    r.score, report.result.score, score
                ),
            )
        } else {
            (
                r.score,
                ScoreSource::Ml,
                format!(
                    "Classifier estimates a {:.0}% chance this prompt is vague",
                    r.probability * 100.0
                ),
            )
        };
        AnalysisResult {
            score,
            confidence: r.confidence.clamp(0.0, 1.0),
            is_vague: score >= self.settings.vagueness_threshold,
            source,
            issues: report.result.issues.clone(),
            reasoning: Some(reasoning),
            intent: report.result.intent,
        }
    }

    fn judge_result(&self, report: &HeuristicReport, verdict: ParsedJudgeResponse) -> AnalysisResult {
        let reasoning = if verdict.reasoning.is_empty() {
            None
        } else {
            Some(verdict.reasoning)
        };
        AnalysisResult {
            score: verdict.vagueness_score,
            confidence: 1.0,
            is_vague: verdict.vagueness_score >= self.settings.vagueness_threshold,
            source: ScoreSource::Llm,
            issues: report.result.issues.clone(),
            reasoning,
            intent: report.result.intent,
        }
    }

    fn require_judge(&self) -> JudgeResult<Arc<dyn ExternalJudge>> {
        self.judge
            .clone()
            .ok_or_else(|| JudgeError::Unavailable("no judge configured".to_string()))
    }

    fn consult_judge(&self, prompt: &str, cancel: &CancellationToken) -> JudgeResult<ParsedJudgeResponse> {
        let judge = self.require_judge()?;
        let prompt = prompt.to_string();
        run_with_deadline(judge, self.settings.judge_timeout, cancel, move |judge, token| {
            judge_vagueness(judge, &prompt, token)
        })
    }
}

/// Run a judge call on a worker thread and wait for it, at most `timeout`.
///
/// On timeout or cancellation the worker's token is cancelled and the call
/// returns at once; a reply that arrives afterwards is dropped.
fn run_with_deadline<T, F>(
    judge: Arc<dyn ExternalJudge>,
    timeout: Duration,
    cancel: &CancellationToken,
    call: F,
) -> JudgeResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn ExternalJudge, &CancellationToken) -> JudgeResult<T> + Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(JudgeError::Cancelled);
    }

    let worker_token = cancel.child_token();
    let token = worker_token.clone();
    let (tx, rx) = crossbeam_channel::bounded(1);
    std::thread::Builder::new()
        .name("clarifier-judge".to_string())
        .spawn(move || {
            let outcome = call(judge.as_ref(), &token);
            // The engine may have stopped waiting
            let _ = tx.send(outcome);
        })
        .map_err(|e| JudgeError::Unavailable(format!("could not start judge worker: {e}")))?;

    // A timeout past the clock's range means no deadline
    let deadline = Instant::now().checked_add(timeout);
    loop {
        if cancel.is_cancelled() {
            worker_token.cancel();
            return Err(JudgeError::Cancelled);
        }
        let wait = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    worker_token.cancel();
                    return Err(JudgeError::Timeout(timeout));
                }
                (deadline - now).min(JUDGE_POLL_INTERVAL)
            }
            None => JUDGE_POLL_INTERVAL,
        };
        match rx.recv_timeout(wait) {
            Ok(outcome) => return outcome,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(JudgeError::Unavailable(
                    "judge worker exited without a reply".to_string(),
                ))
            }
        }
    }
}
