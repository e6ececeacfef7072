//! Scoring configuration (`clarifier.toml`)
//!
//! Lookup order:
//! 1. `clarifier.toml` in the working directory
//! 2. `<config_dir>/clarifier/config.toml`
//! 3. Built-in defaults
//!
//! A file that fails to parse is logged and skipped. Values out of range are
//! reset to their defaults with a warning, never rejected.
//!
//! # Example
//!
//! ```toml
//! [engine]
//! vagueness_threshold = 30
//! confidence_threshold = 0.6
//! mode = "auto"
//!
//! [training]
//! epochs = 300
//!
//! [judge]
//! enabled = true
//! backend = "anthropic"
//! timeout_secs = 10
//! ```

use crate::ai::{ClientConfig, LlmBackend};
use crate::classifier::TrainConfig;
use crate::engine::{
    AnalysisMode, EngineSettings, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_HEURISTIC_WEIGHT,
    DEFAULT_ML_WEIGHT,
};
use crate::heuristics::{DEFAULT_SPECIFICITY_MULTIPLIER, DEFAULT_VAGUENESS_THRESHOLD};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const PROJECT_CONFIG_FILE: &str = "clarifier.toml";
pub const MODEL_PATH_ENV: &str = "CLARIFIER_MODEL_PATH";
/// Upper bound on `judge.timeout_secs`
pub const MAX_JUDGE_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClarifierConfig {
    pub engine: EngineConfig,
    pub heuristics: HeuristicsConfig,
    pub training: TrainConfig,
    pub judge: JudgeConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub vagueness_threshold: u8,
    pub confidence_threshold: f64,
    pub ml_weight: f64,
    pub heuristic_weight: f64,
    pub mode: AnalysisMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vagueness_threshold: DEFAULT_VAGUENESS_THRESHOLD,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            ml_weight: DEFAULT_ML_WEIGHT,
            heuristic_weight: DEFAULT_HEURISTIC_WEIGHT,
            mode: AnalysisMode::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicsConfig {
    /// Scale applied to the specificity offset
    pub specificity_multiplier: f64,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            specificity_multiplier: DEFAULT_SPECIFICITY_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// Consult the judge in `auto`/`blended` mode when the model is unsure
    pub enabled: bool,
    pub backend: LlmBackend,
    pub model: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            enabled: false,
            backend: client.backend,
            model: None,
            timeout_secs: client.timeout.as_secs(),
            max_tokens: client.max_tokens,
            temperature: client.temperature,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Where `train` writes and `analyze` reads the model snapshot
    pub path: Option<PathBuf>,
}

impl ClarifierConfig {
    /// Reset out-of-range values to their defaults, warning for each
    pub fn validated(mut self) -> Self {
        let defaults = ClarifierConfig::default();

        let engine = &mut self.engine;
        if engine.vagueness_threshold > 100 {
            warn!(
                "engine.vagueness_threshold {} is outside [0, 100], using {}",
                engine.vagueness_threshold, defaults.engine.vagueness_threshold
            );
            engine.vagueness_threshold = defaults.engine.vagueness_threshold;
        }
        if !(0.0..=1.0).contains(&engine.confidence_threshold) {
            warn!(
                "engine.confidence_threshold {} is outside [0, 1], using {}",
                engine.confidence_threshold, defaults.engine.confidence_threshold
            );
            engine.confidence_threshold = defaults.engine.confidence_threshold;
        }
        let weights_ok = engine.ml_weight >= 0.0
            && engine.heuristic_weight >= 0.0
            && (engine.ml_weight + engine.heuristic_weight).is_finite()
            && engine.ml_weight + engine.heuristic_weight > 0.0;
        if !weights_ok {
            warn!(
                "engine weights ({}, {}) must be non-negative with a positive sum, using defaults",
                engine.ml_weight, engine.heuristic_weight
            );
            engine.ml_weight = defaults.engine.ml_weight;
            engine.heuristic_weight = defaults.engine.heuristic_weight;
        }

        let multiplier = self.heuristics.specificity_multiplier;
        if !(multiplier.is_finite() && multiplier >= 0.0) {
            warn!(
                "heuristics.specificity_multiplier {} must be a non-negative number, using {}",
                multiplier, defaults.heuristics.specificity_multiplier
            );
            self.heuristics.specificity_multiplier = defaults.heuristics.specificity_multiplier;
        }

        if let Err(e) = self.training.validate() {
            warn!("[training] rejected ({}), using defaults", e);
            self.training = defaults.training;
        }

        if self.judge.timeout_secs == 0 {
            warn!("judge.timeout_secs must be positive, using {}", defaults.judge.timeout_secs);
            self.judge.timeout_secs = defaults.judge.timeout_secs;
        } else if self.judge.timeout_secs > MAX_JUDGE_TIMEOUT_SECS {
            warn!(
                "judge.timeout_secs {} exceeds {}, clamping",
                self.judge.timeout_secs, MAX_JUDGE_TIMEOUT_SECS
            );
            self.judge.timeout_secs = MAX_JUDGE_TIMEOUT_SECS;
        }
        if !(0.0..=2.0).contains(&self.judge.temperature) {
            warn!("judge.temperature {} is outside [0, 2], using default", self.judge.temperature);
            self.judge.temperature = defaults.judge.temperature;
        }
        if self.judge.max_tokens == 0 {
            self.judge.max_tokens = defaults.judge.max_tokens;
        }

        self
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            vagueness_threshold: self.engine.vagueness_threshold,
            confidence_threshold: self.engine.confidence_threshold,
            ml_weight: self.engine.ml_weight,
            heuristic_weight: self.engine.heuristic_weight,
            specificity_multiplier: self.heuristics.specificity_multiplier,
            judge_timeout: Duration::from_secs(self.judge.timeout_secs),
            mode: self.engine.mode,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            backend: self.judge.backend,
            model: self.judge.model.clone(),
            max_tokens: self.judge.max_tokens,
            temperature: self.judge.temperature,
            timeout: Duration::from_secs(self.judge.timeout_secs),
        }
    }

    /// `CLARIFIER_MODEL_PATH`, then `[model] path`, then the data directory
    pub fn model_path(&self) -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(MODEL_PATH_ENV).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        self.model.path.clone().or_else(default_model_path)
    }
}

/// `<data_dir>/clarifier/model.json`
pub fn default_model_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("clarifier").join("model.json"))
}

/// `<config_dir>/clarifier/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("clarifier").join("config.toml"))
}

/// Load configuration for a working directory. Never fails.
pub fn load_config(dir: &Path) -> ClarifierConfig {
    let candidates = std::iter::once(dir.join(PROJECT_CONFIG_FILE)).chain(user_config_path());
    for path in candidates {
        if !path.exists() {
            continue;
        }
        match load_config_file(&path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                return config;
            }
            Err(e) => warn!("Failed to load {}: {:#}", path.display(), e),
        }
    }
    debug!("No config found, using defaults");
    ClarifierConfig::default()
}

/// Parse and validate one TOML file
pub fn load_config_file(path: &Path) -> Result<ClarifierConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ClarifierConfig =
        toml::from_str(&content).with_context(|| format!("Invalid TOML in {}", path.display()))?;
    Ok(config.validated())
}

const EXAMPLE_CONFIG: &str = r#"# Clarifier configuration

[engine]
# Scores at or above this are reported as vague (0-100)
vagueness_threshold = 30
# Model confidence needed to skip the judge (0-1)
confidence_threshold = 0.6
# Weights for blended mode
ml_weight = 0.7
heuristic_weight = 0.3
# auto | blended | heuristic-only | ml-only | force-judge
mode = "auto"

[heuristics]
specificity_multiplier = 1.0

[training]
learning_rate = 0.5
epochs = 200
regularization = 0.001
label_threshold = 50
seed = 42
val_split = 0.2

[judge]
enabled = false
# anthropic | openai | openrouter | ollama
backend = "anthropic"
# model = "claude-3-5-haiku-latest"
timeout_secs = 15
max_tokens = 512
temperature = 0.0

[model]
# path = "models/clarifier.json"
"#;

/// Write an example `clarifier.toml` into `dir` unless one exists.
///
/// Returns the path and whether a file was written.
pub fn init_project_config(dir: &Path) -> Result<(PathBuf, bool)> {
    let path = dir.join(PROJECT_CONFIG_FILE);
    if path.exists() {
        return Ok((path, false));
    }
    std::fs::write(&path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok((path, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_parses_to_defaults() {
        let config: ClarifierConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config, ClarifierConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config: ClarifierConfig = toml::from_str(
            r#"
[engine]
mode = "force-judge"
vagueness_threshold = 45

[judge]
enabled = true
backend = "openrouter"
"#,
        )
        .unwrap();
        assert_eq!(config.engine.mode, AnalysisMode::ForceJudge);
        assert_eq!(config.engine.confidence_threshold, DEFAULT_CONFIDENCE_THRESHOLD);
        assert_eq!(config.judge.backend, LlmBackend::OpenRouter);
        assert_eq!(config.engine_settings().vagueness_threshold, 45);
        assert_eq!(config.client_config().backend, LlmBackend::OpenRouter);
    }

    #[test]
    fn test_out_of_range_values_fall_back() {
        let config: ClarifierConfig = toml::from_str(
            r#"
[engine]
vagueness_threshold = 150
confidence_threshold = 1.5
ml_weight = -1.0

[heuristics]
specificity_multiplier = -2.0

[training]
epochs = 0

[judge]
timeout_secs = 0
"#,
        )
        .unwrap();
        let config = config.validated();
        let defaults = ClarifierConfig::default();
        assert_eq!(config.engine, defaults.engine);
        assert_eq!(config.heuristics, defaults.heuristics);
        assert_eq!(config.training, defaults.training);
        assert_eq!(config.judge.timeout_secs, 15);
    }

    #[test]
    fn test_huge_judge_timeout_is_clamped() {
        let config: ClarifierConfig =
            toml::from_str("[judge]\ntimeout_secs = 9223372036854775807\n").unwrap();
        let config = config.validated();
        assert_eq!(config.judge.timeout_secs, MAX_JUDGE_TIMEOUT_SECS);
        assert_eq!(
            config.engine_settings().judge_timeout,
            Duration::from_secs(MAX_JUDGE_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_load_prefers_project_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[engine]\nvagueness_threshold = 55\n",
        )
        .unwrap();
        assert_eq!(load_config(dir.path()).engine.vagueness_threshold, 55);
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_CONFIG_FILE);
        std::fs::write(&path, "[engine\nbroken").unwrap();
        assert!(load_config_file(&path).is_err());
    }

    #[test]
    fn test_init_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let (path, written) = init_project_config(dir.path()).unwrap();
        assert!(written);
        assert!(load_config_file(&path).is_ok());
        let (_, written) = init_project_config(dir.path()).unwrap();
        assert!(!written);
    }
}
