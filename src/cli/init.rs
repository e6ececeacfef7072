//! Init command - write example configuration

use anyhow::{Context, Result};
use clarifier::config::{init_project_config, UserConfig};
use console::style;

pub fn run(user: bool) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;

    let (path, written) = init_project_config(&cwd)?;
    if written {
        println!("{} Created {}", style("✓").green(), style(path.display()).cyan());
    } else {
        println!(
            "{} Already exists: {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    if user {
        let user_path = UserConfig::init_user_config()?;
        println!(
            "{} User config at {}",
            style("✓").green(),
            style(user_path.display()).cyan()
        );
    }

    println!(
        "\n  Next: {} or {}",
        style("clarifier analyze \"<prompt>\"").cyan(),
        style("clarifier train <corpus.json>").cyan()
    );
    Ok(())
}
