//! Analyze command - score prompts

use anyhow::{Context, Result};
use clarifier::engine::{AnalysisMode, HybridDecisionEngine};
use clarifier::models::{AnalysisResult, IssueSeverity, ScoreSource};
use console::style;
use rayon::prelude::*;
use std::io::Read;
use std::path::Path;
use tokio_util::sync::CancellationToken;

pub fn run(
    engine: &HybridDecisionEngine,
    mode: AnalysisMode,
    prompt: Option<&str>,
    batch: Option<&Path>,
    format: &str,
    fail_on_vague: bool,
) -> Result<()> {
    let cancel = CancellationToken::new();

    let results: Vec<(String, AnalysisResult)> = match batch {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let prompts: Vec<&str> = content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect();
            prompts
                .par_iter()
                .map(|p| (p.to_string(), engine.analyze_with(p, mode, &cancel)))
                .collect()
        }
        None => {
            let text = match prompt {
                Some(p) if p != "-" => p.to_string(),
                _ => read_stdin()?,
            };
            let result = engine.analyze_with(&text, mode, &cancel);
            vec![(text, result)]
        }
    };

    match format {
        "json" => {
            let json = if batch.is_some() {
                let items: Vec<serde_json::Value> = results
                    .iter()
                    .map(|(p, r)| serde_json::json!({ "prompt": p, "result": r }))
                    .collect();
                serde_json::to_string_pretty(&items)?
            } else {
                serde_json::to_string_pretty(&results[0].1)?
            };
            println!("{json}");
        }
        _ => {
            for (prompt, result) in &results {
                print_text(prompt, result, batch.is_some());
            }
        }
    }

    if fail_on_vague && results.iter().any(|(_, r)| r.is_vague) {
        std::process::exit(1);
    }
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read prompt from stdin")?;
    Ok(text)
}

fn print_text(prompt: &str, result: &AnalysisResult, show_prompt: bool) {
    if show_prompt {
        println!("\n{}", style(prompt).bold());
    }

    let score = format!("{:>3}/100", result.score);
    let score = match result.score {
        0..=29 => style(score).green(),
        30..=64 => style(score).yellow(),
        _ => style(score).red(),
    };
    let verdict = if result.is_vague {
        style("vague").red().bold()
    } else {
        style("specific").green().bold()
    };

    println!(
        "  Vagueness {}  {}  {}",
        score.bold(),
        verdict,
        style(format!(
            "(source: {}, confidence: {:.0}%, intent: {})",
            result.source,
            result.confidence * 100.0,
            result.intent
        ))
        .dim()
    );

    if result.source == ScoreSource::HybridFallback {
        println!("  {}", style("Blended model and rules scores").dim());
    }

    for issue in &result.issues {
        let marker = match issue.severity {
            IssueSeverity::High => style("[HIGH]").red(),
            IssueSeverity::Medium => style("[MED]").yellow(),
            IssueSeverity::Low => style("[LOW]").dim(),
        };
        println!("  {} {}: {}", marker, style(issue.issue_type).cyan(), issue.description);
        println!("        {} {}", style("→").dim(), issue.suggestion);
    }

    if let Some(reasoning) = &result.reasoning {
        println!("  {}", style(reasoning).italic());
    }
}
