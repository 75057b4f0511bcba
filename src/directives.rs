//! Build-directive extraction.
//!
//! A translation unit can declare its own build unit with comment lines of
//! the form `// build-directive: <type>(<value>)`. All directive lines in a
//! file accumulate into one [`BuildDirective`]; a file that never names a
//! unit contributes nothing.

use std::fs;
use std::path::Path;

use colored::Colorize;

use crate::config::BuildDirective;
use crate::errors::BuildError;
use crate::ini::{split_comma, split_space};
use crate::sources::find_sources;

pub const DIRECTIVE_PREFIX: &str = "// build-directive:";

/// Scan every source file under `source_root` for build directives.
pub fn parse_directives(source_root: &Path, verbose: bool) -> Result<Vec<BuildDirective>, BuildError> {
    let mut directives = Vec::new();
    for path in find_sources(source_root)? {
        if let Some(directive) = parse_file(&path, verbose) {
            directives.push(directive);
        }
    }
    Ok(directives)
}

/// Parse one file. Returns `None` when no `unit-name` directive was seen.
pub fn parse_file(path: &Path, verbose: bool) -> Option<BuildDirective> {
    let Ok(content) = fs::read_to_string(path) else {
        if verbose {
            println!("{} unreadable source skipped: {}", "!".yellow(), path.display());
        }
        return None;
    };

    let mut directive = BuildDirective::default();
    for line in content.lines() {
        let Some(rest) = line.trim().strip_prefix(DIRECTIVE_PREFIX) else {
            continue;
        };
        let rest = rest.trim();
        let Some((kind, value)) = split_call(rest) else {
            // Malformed directive line, e.g. a missing parenthesis.
            continue;
        };
        apply(&mut directive, kind, value, path, verbose);
    }

    if directive.unit_name.is_empty() {
        None
    } else {
        Some(directive)
    }
}

/// Split `<type>(<value>)` into its parts.
fn split_call(text: &str) -> Option<(&str, &str)> {
    let open = text.find('(')?;
    let close = text.rfind(')')?;
    if close < open {
        return None;
    }
    Some((text[..open].trim(), &text[open + 1..close]))
}

fn apply(directive: &mut BuildDirective, kind: &str, value: &str, path: &Path, verbose: bool) {
    match kind {
        "unit-name" => directive.unit_name = value.trim().to_string(),
        "depends-units" => directive.depends_units.extend(split_comma(value)),
        "link" => directive.link_libs.extend(split_comma(value)),
        "out" => directive.output_path = Some(value.trim().to_string()),
        "cflags" => directive.cflags.extend(split_space(value)),
        "ldflags" => directive.ldflags.extend(split_space(value)),
        "shared" => {
            if let Some(flag) = parse_flag(value) {
                directive.is_shared = flag;
            }
        }
        "static" => {
            if let Some(flag) = parse_flag(value) {
                directive.static_link = Some(flag);
            }
        }
        other => {
            if verbose {
                println!(
                    "{} unrecognized build-directive '{}' in {}",
                    "!".yellow(),
                    other,
                    path.display()
                );
            }
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_fixture(name: &str, content: &str) -> PathBuf {
        let path =
            std::env::temp_dir().join(format!("cforge_dir_{}_{}.cpp", name, std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn accumulates_all_directive_types_from_one_file() {
        let path = write_fixture(
            "full",
            "\
// build-directive: unit-name(tools/foo)
// build-directive: depends-units(lib/cli, core)
// build-directive: link(utils.so, pthread)
// build-directive: out(tools/foo)
// build-directive: cflags(-std=c++20 -Wshadow)
// build-directive: ldflags(-rdynamic)
// build-directive: shared(false)
// build-directive: static(true)
int main() { return 0; }
",
        );
        let d = parse_file(&path, false).unwrap();
        assert_eq!(d.unit_name, "tools/foo");
        assert_eq!(d.depends_units, vec!["lib/cli", "core"]);
        assert_eq!(d.link_libs, vec!["utils.so", "pthread"]);
        assert_eq!(d.output_path.as_deref(), Some("tools/foo"));
        assert_eq!(d.cflags, vec!["-std=c++20", "-Wshadow"]);
        assert_eq!(d.ldflags, vec!["-rdynamic"]);
        assert!(!d.is_shared);
        assert_eq!(d.static_link, Some(true));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn file_without_unit_name_is_discarded() {
        let path = write_fixture(
            "nameless",
            "// build-directive: link(pthread)\nint f() { return 1; }\n",
        );
        assert!(parse_file(&path, false).is_none());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn malformed_and_unknown_lines_are_skipped() {
        let path = write_fixture(
            "broken",
            "\
// build-directive: unit-name(app
// build-directive: unit-name(app)
// build-directive: banana(split)
//build-directive: not-a-directive(x)
",
        );
        let d = parse_file(&path, false).unwrap();
        assert_eq!(d.unit_name, "app");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn indented_directive_lines_are_recognized() {
        let path = write_fixture(
            "indent",
            "    // build-directive: unit-name(svc)\n    // build-directive: shared(true)\n",
        );
        let d = parse_file(&path, false).unwrap();
        assert_eq!(d.unit_name, "svc");
        assert!(d.is_shared);
        fs::remove_file(&path).ok();
    }
}
