//! External dependency handling.
//!
//! This is a collaborator around the core, not part of it: failures here are
//! warnings and the build carries on with whatever is available. Each
//! `[dependencies]` entry is materialized under the dependencies root (via a
//! git clone when a `url` is configured), its `build_cmds` run when a
//! declared artifact is missing, and its include directories and artifacts
//! are surfaced to the global configuration.

use std::path::Path;
use std::process::Command;

use anyhow::Result;
use colored::Colorize;
use git2::Repository;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{BuildConfig, DependencyConfig};

/// Fetch and build configured dependencies, registering their include
/// directories and artifacts on the global config.
pub fn prepare(config: &mut BuildConfig) -> Result<()> {
    if config.dependencies.is_empty() {
        return Ok(());
    }
    println!(
        "{} Checking {} dependencies...",
        "deps".blue(),
        config.dependencies.len()
    );

    let deps = config.dependencies.clone();
    for dep in &deps {
        let root = config.deps_dir.join(&dep.name);

        if !root.exists() {
            let Some(url) = &dep.url else {
                println!(
                    "{} dependency '{}' is missing and has no url, skipping",
                    "!".yellow(),
                    dep.name
                );
                continue;
            };
            if !fetch(&dep.name, url, &root) {
                continue;
            }
        } else if config.verbose {
            println!("   {} using cached: {}", "⚡".green(), dep.name);
        }

        if !dep.build_cmds.is_empty() && !artifacts_present(dep, &root) {
            if !run_build_cmds(dep, &root) {
                continue;
            }
        }

        for dir in &dep.include_dirs {
            let include = root.join(dir).display().to_string();
            if !config.include_dirs.contains(&include) {
                config.include_dirs.push(include);
            }
        }
        for artifact in &dep.extract {
            let path = root.join(artifact);
            if path.exists() {
                config.ldflags.push(path.display().to_string());
            } else {
                println!(
                    "{} dependency '{}' artifact not found: {}",
                    "!".yellow(),
                    dep.name,
                    path.display()
                );
            }
        }
    }
    Ok(())
}

fn fetch(name: &str, url: &str, root: &Path) -> bool {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Fetching {name}..."));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    match Repository::clone(url, root) {
        Ok(_) => {
            pb.finish_with_message(format!("{} Fetched {name}", "✓".green()));
            true
        }
        Err(e) => {
            pb.finish_with_message(format!("{} Failed {name}", "x".red()));
            println!("{} could not fetch '{url}': {e}", "!".yellow());
            false
        }
    }
}

fn artifacts_present(dep: &DependencyConfig, root: &Path) -> bool {
    !dep.extract.is_empty() && dep.extract.iter().all(|a| root.join(a).exists())
}

fn run_build_cmds(dep: &DependencyConfig, root: &Path) -> bool {
    for cmd in &dep.build_cmds {
        println!("   {} {cmd}", "run".magenta());
        let status = Command::new("sh")
            .args(["-c", cmd])
            .current_dir(root)
            .status();
        match status {
            Ok(s) if s.success() => {}
            _ => {
                println!("{} build command failed for '{}'", "x".red(), dep.name);
                return false;
            }
        }
    }
    true
}
