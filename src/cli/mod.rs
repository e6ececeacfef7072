//! CLI command definitions and handlers

mod analyze;
mod compare;
mod evaluate;
mod init;
mod train;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clarifier::ai::{ExternalJudge, LlmBackend, LlmClient, LlmJudge};
use clarifier::config::{load_config, load_config_file, ClarifierConfig, UserConfig};
use clarifier::engine::{AnalysisMode, HybridDecisionEngine};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Parse a 0-100 score threshold
fn parse_score(s: &str) -> Result<u8, String> {
    let n: u8 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n > 100 {
        Err("threshold cannot exceed 100".to_string())
    } else {
        Ok(n)
    }
}

/// Parse a fraction in [0, 0.9]
fn parse_split(s: &str) -> Result<f64, String> {
    let f: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if (0.0..=0.9).contains(&f) {
        Ok(f)
    } else {
        Err("validation split must be between 0 and 0.9".to_string())
    }
}

/// Clarifier - how vague is this request?
///
/// Scores prompts from 0 (fully specific) to 100 (fully vague) and explains why.
#[derive(Parser, Debug)]
#[command(name = "clarifier")]
#[command(
    version,
    about = "Score how vague a request is and explain why",
    long_about = "Clarifier scores a natural-language request from 0 (fully specific) to 100 \
(fully vague) using fast rules, a trainable TF-IDF classifier and, when the classifier \
is unsure, an optional LLM judge.",
    after_help = "\
Examples:
  clarifier analyze \"make something\"             Score one prompt
  clarifier analyze --batch prompts.txt -f json    Score a file, one prompt per line
  clarifier train corpus.json                      Train and save a model
  clarifier evaluate corpus.json                   Measure a saved model
  clarifier compare \"fix it\" \"fix the null check in auth.rs\"
  clarifier init                                   Write an example clarifier.toml"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Config file (default: ./clarifier.toml, then the user config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a prompt
    #[command(after_help = "\
Examples:
  clarifier analyze \"build a website\"
  echo \"fix it\" | clarifier analyze -
  clarifier analyze \"help\" --mode heuristic-only --format json
  clarifier analyze --batch prompts.txt --fail-on-vague")]
    Analyze {
        /// Prompt text ("-" or omitted reads stdin)
        prompt: Option<String>,

        /// Score every non-empty line of a file
        #[arg(long, conflicts_with = "prompt")]
        batch: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Routing mode (default: from config)
        #[arg(long, value_parser = parse_mode)]
        mode: Option<AnalysisMode>,

        /// Model snapshot to load (default: from config)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Never consult the external judge
        #[arg(long)]
        no_judge: bool,

        /// Exit with code 1 if any prompt is vague
        #[arg(long)]
        fail_on_vague: bool,
    },

    /// Train a model from a labeled JSON corpus
    Train {
        /// JSON array of training samples
        corpus: PathBuf,

        /// Where to write the model (default: from config)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        #[arg(long)]
        epochs: Option<usize>,

        #[arg(long)]
        learning_rate: Option<f64>,

        #[arg(long)]
        regularization: Option<f64>,

        /// Samples with vaguenessScore at or above this are labeled vague
        #[arg(long, value_parser = parse_score)]
        label_threshold: Option<u8>,

        /// Held-out fraction for validation
        #[arg(long, value_parser = parse_split)]
        val_split: Option<f64>,

        #[arg(long)]
        seed: Option<u64>,

        /// Drop invalid records instead of failing
        #[arg(long)]
        lenient: bool,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Measure a saved model against a labeled corpus
    Evaluate {
        corpus: PathBuf,

        #[arg(long)]
        model: Option<PathBuf>,

        /// Label/prediction threshold (default: training label threshold)
        #[arg(long, value_parser = parse_score)]
        threshold: Option<u8>,

        /// Drop invalid records instead of failing
        #[arg(long)]
        lenient: bool,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Ask the judge to rate a refined prompt against the original
    Compare {
        original: String,
        refined: String,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Write an example clarifier.toml in the current directory
    Init {
        /// Also create the user config with an [ai] credentials section
        #[arg(long)]
        user: bool,
    },
}

fn parse_mode(s: &str) -> Result<AnalysisMode, String> {
    s.parse()
}

pub fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            prompt,
            batch,
            format,
            mode,
            model,
            no_judge,
            fail_on_vague,
        } => {
            let mode = mode.unwrap_or(config.engine.mode);
            let engine = build_engine(&config, model.as_deref(), mode, !no_judge)?;
            analyze::run(
                &engine,
                mode,
                prompt.as_deref(),
                batch.as_deref(),
                &format,
                fail_on_vague,
            )
        }

        Commands::Train {
            corpus,
            output,
            epochs,
            learning_rate,
            regularization,
            label_threshold,
            val_split,
            seed,
            lenient,
            format,
        } => {
            let mut train_config = config.training.clone();
            if let Some(v) = epochs {
                train_config.epochs = v;
            }
            if let Some(v) = learning_rate {
                train_config.learning_rate = v;
            }
            if let Some(v) = regularization {
                train_config.regularization = v;
            }
            if let Some(v) = label_threshold {
                train_config.label_threshold = v;
            }
            if let Some(v) = val_split {
                train_config.val_split = v;
            }
            if let Some(v) = seed {
                train_config.seed = v;
            }
            let output = output
                .or_else(|| config.model_path())
                .context("Could not determine where to save the model; pass --output")?;
            train::run(&corpus, &output, &train_config, lenient, &format)
        }

        Commands::Evaluate {
            corpus,
            model,
            threshold,
            lenient,
            format,
        } => {
            let model = model
                .or_else(|| config.model_path())
                .context("No model path configured; pass --model")?;
            let threshold = threshold.unwrap_or(config.training.label_threshold);
            evaluate::run(&corpus, &model, threshold, lenient, &format)
        }

        Commands::Compare {
            original,
            refined,
            format,
        } => {
            let engine = build_engine(&config, None, AnalysisMode::ForceJudge, true)?;
            compare::run(&engine, &original, &refined, &format)
        }

        Commands::Init { user } => init::run(user),
    }
}

fn resolve_config(explicit: Option<&Path>) -> Result<ClarifierConfig> {
    match explicit {
        Some(path) => load_config_file(path),
        None => {
            let cwd = std::env::current_dir().context("Failed to read the working directory")?;
            Ok(load_config(&cwd))
        }
    }
}

/// Engine with the configured model and, when wanted, a judge
fn build_engine(
    config: &ClarifierConfig,
    model_override: Option<&Path>,
    mode: AnalysisMode,
    allow_judge: bool,
) -> Result<HybridDecisionEngine> {
    let mut engine = HybridDecisionEngine::new(config.engine_settings());

    let wants_judge = allow_judge && (config.judge.enabled || mode == AnalysisMode::ForceJudge);
    if wants_judge {
        if let Some(judge) = build_judge(config) {
            engine = engine.with_judge(judge);
        }
    }

    if mode == AnalysisMode::HeuristicOnly {
        return Ok(engine);
    }

    match model_override {
        Some(path) => {
            engine
                .load_model(path)
                .with_context(|| format!("Failed to load model from {}", path.display()))?;
        }
        None => {
            if let Some(path) = config.model_path().filter(|p| p.exists()) {
                engine
                    .load_model(&path)
                    .with_context(|| format!("Failed to load model from {}", path.display()))?;
            } else {
                tracing::debug!("No trained model found, scoring with rules");
            }
        }
    }
    Ok(engine)
}

fn build_judge(config: &ClarifierConfig) -> Option<Arc<dyn ExternalJudge>> {
    let user = UserConfig::load();
    let mut client_config = config.client_config();
    let backend = client_config.backend;

    let credential = match backend {
        LlmBackend::Ollama => {
            if client_config.model.is_none() {
                client_config.model = user.api_key(backend).map(str::to_string);
            }
            "ollama".to_string()
        }
        _ => match user.api_key(backend) {
            Some(key) => key.to_string(),
            None => {
                tracing::warn!(
                    "Judge disabled: {} not set. Get your key at {}",
                    backend.env_key(),
                    backend.signup_url()
                );
                return None;
            }
        },
    };

    let client = LlmClient::new(client_config, credential);
    tracing::debug!("Judge: {} ({})", backend, client.model());
    Some(Arc::new(LlmJudge::new(client)))
}
