//! Evaluate command - metrics for a saved model

use anyhow::{Context, Result};
use clarifier::classifier::{evaluate, StatisticalScorer, TrainingCorpus};
use console::style;
use std::path::Path;

pub fn run(corpus_path: &Path, model_path: &Path, threshold: u8, lenient: bool, format: &str) -> Result<()> {
    let scorer = StatisticalScorer::load(model_path)
        .with_context(|| format!("Failed to load model from {}", model_path.display()))?;
    let loaded = if lenient {
        TrainingCorpus::load_lenient(corpus_path).map(|(c, _)| c)
    } else {
        TrainingCorpus::load(corpus_path)
    };
    let corpus =
        loaded.with_context(|| format!("Failed to load corpus {}", corpus_path.display()))?;

    let metrics = evaluate(&scorer, corpus.samples(), threshold)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
        return Ok(());
    }

    println!(
        "\n{} Model trained {}\n",
        style("●").cyan(),
        style(scorer.trained_at().format("%Y-%m-%d %H:%M UTC")).dim()
    );
    super::train::print_metrics("Corpus", &metrics);
    println!(
        "  Confusion: tp={} fp={} tn={} fn={}",
        metrics.true_positives, metrics.false_positives, metrics.true_negatives, metrics.false_negatives
    );
    Ok(())
}
