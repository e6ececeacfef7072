//! Compare command - judge a refined prompt against its original

use anyhow::{Context, Result};
use clarifier::engine::HybridDecisionEngine;
use console::style;
use tokio_util::sync::CancellationToken;

pub fn run(engine: &HybridDecisionEngine, original: &str, refined: &str, format: &str) -> Result<()> {
    if !engine.has_judge() {
        anyhow::bail!("compare needs a judge; set [judge] backend in clarifier.toml and its API key");
    }

    let scores = engine
        .compare(original, refined, &CancellationToken::new())
        .context("Judge comparison failed")?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&scores)?);
        return Ok(());
    }

    let before = engine.analyze_heuristic_only(original).score;
    let after = engine.analyze_heuristic_only(refined).score;

    println!("\n  Overall         {}", style(format!("{}/100", scores.overall_score)).bold());
    println!("  Specificity     {}", scores.specificity_gain);
    println!("  Actionability   {}", scores.actionability);
    println!("  Issue coverage  {}", scores.issue_coverage);
    println!("  Relevance       {}", scores.relevance);
    println!(
        "  Rules score     {} → {}",
        style(before).yellow(),
        style(after).green()
    );
    println!("\n  {}", style(&scores.reasoning).italic());
    Ok(())
}
