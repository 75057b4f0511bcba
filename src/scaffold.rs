//! Project scaffolding for `cf init`.

use std::fs;
use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use inquire::{Select, Text};

const PROJECT_FILE: &str = "cforge.ini";

const MAIN_CPP: &str = r#"#include <iostream>

int main() {
    std::cout << "Hello from cforge!" << std::endl;
    return 0;
}
"#;

/// Initialize a project in the current directory. Prompts for anything not
/// given on the command line; refuses to touch an existing project file.
pub fn init_project(name: Option<String>, toolchain: Option<String>) -> Result<()> {
    if Path::new(PROJECT_FILE).exists() {
        println!(
            "{} Project already initialized ({PROJECT_FILE} exists).",
            "x".red()
        );
        return Ok(());
    }

    let current_dir = std::env::current_dir()?;
    let dir_name = current_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "myapp".to_string());

    let name = match name {
        Some(n) => n,
        None => Text::new("Project name?").with_default(&dir_name).prompt()?,
    };
    let toolchain = match toolchain {
        Some(t) => t,
        None => Select::new("Toolchain?", vec!["gcc", "clang"])
            .prompt()?
            .to_string(),
    };

    fs::write(PROJECT_FILE, project_template(&name, &toolchain))?;

    if !Path::new("src").exists() {
        fs::create_dir("src")?;
        fs::write(Path::new("src").join("main.cpp"), MAIN_CPP)?;
    } else {
        println!(
            "{} 'src' directory exists, skipping main file creation.",
            "!".yellow()
        );
    }

    if !Path::new(".gitignore").exists() {
        fs::write(".gitignore", "/build\n/bin\n/compile_commands.json\n")?;
    }

    println!("{} Initialized cforge project '{}'.", "✓".green(), name.bold());
    println!("  Run {} to build it.", "cf build".white().bold());
    Ok(())
}

fn project_template(name: &str, toolchain: &str) -> String {
    format!(
        "\
# cforge project file
[global]
project_name = {name}
source_dir = src
toolchain = {toolchain}
parallel = true

[tools]
name = {name}
sources = src/main.cpp
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_carries_name_and_toolchain() {
        let text = project_template("demo", "clang");
        let (config, warnings) = crate::ini::parse_config(&text);
        assert_eq!(config.project_name, "demo");
        assert_eq!(config.toolchain, "clang");
        assert!(config.parallel);
        assert_eq!(config.tools.len(), 1);
        assert!(warnings.is_empty());
    }
}
