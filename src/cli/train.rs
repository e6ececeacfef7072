//! Train command - fit and save a model

use anyhow::{Context, Result};
use clarifier::classifier::{self, Evaluation, TrainConfig, TrainingCorpus};
use console::style;
use std::path::Path;

pub fn run(
    corpus_path: &Path,
    output: &Path,
    config: &TrainConfig,
    lenient: bool,
    format: &str,
) -> Result<()> {
    let corpus = if lenient {
        let (corpus, dropped) = TrainingCorpus::load_lenient(corpus_path)
            .with_context(|| format!("Failed to load corpus {}", corpus_path.display()))?;
        if dropped > 0 {
            eprintln!(
                "{} dropped {} invalid record(s)",
                style("warning:").yellow().bold(),
                dropped
            );
        }
        corpus
    } else {
        TrainingCorpus::load(corpus_path)
            .with_context(|| format!("Failed to load corpus {}", corpus_path.display()))?
    };

    let report = classifier::train(&corpus, config).context("Training failed")?;
    report
        .scorer
        .save(output)
        .with_context(|| format!("Failed to save model to {}", output.display()))?;

    if format == "json" {
        let json = serde_json::json!({
            "model": output,
            "trainSamples": report.train_samples,
            "valSamples": report.val_samples,
            "vocabularySize": report.scorer.vectorizer().vocabulary_size(),
            "finalLoss": report.history.final_loss,
            "train": report.train_eval,
            "validation": report.val_eval,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("\n{} Trained vagueness model\n", style("✓").green().bold());
    println!(
        "  Samples: {} train, {} validation ({} labeled vague at >= {})",
        style(report.train_samples).cyan(),
        style(report.val_samples).cyan(),
        corpus.positives(config.label_threshold),
        config.label_threshold
    );
    println!(
        "  Vocabulary: {} terms",
        style(report.scorer.vectorizer().vocabulary_size()).cyan()
    );
    println!(
        "  Loss: {:.4} → {:.4} over {} epochs",
        report.history.losses.first().copied().unwrap_or(f64::NAN),
        report.history.final_loss,
        config.epochs
    );
    print_metrics("Train", &report.train_eval);
    if let Some(val) = &report.val_eval {
        print_metrics("Validation", val);
    }
    println!("\n  Saved to {}", style(output.display()).cyan());
    Ok(())
}

pub(super) fn print_metrics(label: &str, e: &Evaluation) {
    println!(
        "  {:<10} accuracy {:>5.1}%  precision {:>5.1}%  recall {:>5.1}%  f1 {:.3}  (n={})",
        label,
        e.accuracy * 100.0,
        e.precision * 100.0,
        e.recall * 100.0,
        e.f1,
        e.samples
    );
}
