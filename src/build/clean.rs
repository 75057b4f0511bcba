//! Build artifact cleanup.

use anyhow::{Context, Result};
use colored::Colorize;

use std::fs;
use std::path::Path;

use crate::config::BuildConfig;

/// Remove build outputs. Missing directories are not errors.
pub fn clean(config: &BuildConfig) -> Result<()> {
    let mut cleaned = false;

    for dir in [
        config.build_dir.clone(),
        config.lib_output_dir(),
        config.tool_output_dir(),
    ] {
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("failed to remove {}", dir.display()))?;
            cleaned = true;
        }
    }

    // Legacy layout placed the project binary directly under bin/.
    if !config.project_name.is_empty() {
        let legacy = config.bin_dir.join(&config.project_name);
        if legacy.is_file() {
            fs::remove_file(&legacy)
                .with_context(|| format!("failed to remove {}", legacy.display()))?;
            cleaned = true;
        }
    }

    if Path::new("compile_commands.json").exists() {
        fs::remove_file("compile_commands.json").context("failed to remove compile commands")?;
        cleaned = true;
    }

    if cleaned {
        println!("{} Clean complete.", "✓".green());
    } else {
        println!("{} Nothing to clean", "!".yellow());
    }
    Ok(())
}
