//! Developer environment script generation for `cf env`.

use std::fs;

use anyhow::Result;
use colored::Colorize;

use crate::config::BuildConfig;

const SCRIPT_NAME: &str = "env.sh";

/// Write a shell activation script exposing the project's binaries and
/// shared libraries. Source it with `. ./env.sh`.
pub fn write_env_script(config: &BuildConfig) -> Result<()> {
    fs::write(SCRIPT_NAME, render_script(config))?;
    println!("{} Wrote {SCRIPT_NAME} (source it with '. ./{SCRIPT_NAME}')", "✓".green());
    Ok(())
}

fn render_script(config: &BuildConfig) -> String {
    let bin = config.bin_dir.display().to_string();
    let tools = config.tool_output_dir().display().to_string();
    let libs = config.lib_output_dir().display().to_string();
    format!(
        "\
#!/bin/sh
# Generated by cforge. Source this file to use the project's artifacts.
export PATH=\"$PWD/{bin}:$PWD/{tools}:$PATH\"
export LD_LIBRARY_PATH=\"$PWD/{libs}:$LD_LIBRARY_PATH\"
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_exports_bin_and_lib_paths() {
        let script = render_script(&BuildConfig::default());
        assert!(script.contains("bin:$PWD/bin/tools"));
        assert!(script.contains("LD_LIBRARY_PATH=\"$PWD/bin/lib"));
    }
}
