//! Directive extraction over a real fixture tree, plus its interaction with
//! the planner.

use std::fs;
use std::path::PathBuf;

use cforge::config::BuildConfig;
use cforge::directives::parse_directives;
use cforge::graph::plan;
use cforge::ini::parse_config;

fn fixture_tree(name: &str) -> PathBuf {
    let root = std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".tmp_test_projects")
        .join(name);
    if root.exists() {
        fs::remove_dir_all(&root).ok();
    }
    fs::create_dir_all(root.join("src/tools")).expect("failed to create fixture tree");
    root
}

#[test]
fn directive_unit_resolves_configured_library() {
    let root = fixture_tree("directive_resolution");
    fs::write(
        root.join("src/tools/foo.cpp"),
        "\
// build-directive: unit-name(tools/foo)
// build-directive: depends-units(lib/cli)
// build-directive: out(tools/foo)
// build-directive: shared(false)
int main() { return 0; }
",
    )
    .unwrap();
    fs::write(root.join("src/cli.cpp"), "int cli() { return 1; }\n").unwrap();

    let text = "\
[shared_libs]
name = cli
sources = src/cli.cpp
";
    let (mut config, _) = parse_config(text);
    config.directives = parse_directives(&root.join("src"), false).unwrap();
    assert_eq!(config.directives.len(), 1);
    assert_eq!(config.directives[0].unit_name, "tools/foo");

    let graph = plan(&config).unwrap();
    let node = graph.node("directive:tools/foo").unwrap();
    assert_eq!(node.dependencies, vec!["shared:cli"]);
    assert!(graph.unresolved.is_empty());
    let pos = |id: &str| graph.order.iter().position(|x| x == id).unwrap();
    assert!(pos("shared:cli") < pos("directive:tools/foo"));

    fs::remove_dir_all(&root).ok();
}

#[test]
fn one_directive_per_file_many_files_accumulate() {
    let root = fixture_tree("directive_accumulation");
    fs::write(
        root.join("src/alpha.cpp"),
        "// build-directive: unit-name(alpha)\n// build-directive: shared(true)\n",
    )
    .unwrap();
    fs::write(
        root.join("src/beta.cpp"),
        "// build-directive: unit-name(beta)\n// build-directive: depends-units(alpha)\n",
    )
    .unwrap();
    fs::write(root.join("src/plain.cpp"), "int noop() { return 0; }\n").unwrap();

    let directives = parse_directives(&root.join("src"), false).unwrap();
    assert_eq!(directives.len(), 2);

    let config = BuildConfig {
        directives,
        ..Default::default()
    };
    let graph = plan(&config).unwrap();
    assert_eq!(graph.order, vec!["directive:alpha", "directive:beta"]);
    assert_eq!(
        graph.node("directive:beta").unwrap().dependencies,
        vec!["directive:alpha"]
    );

    fs::remove_dir_all(&root).ok();
}

#[test]
fn shared_directive_outputs_under_bin_lib() {
    let root = fixture_tree("directive_outputs");
    fs::write(
        root.join("src/netlib.cpp"),
        "// build-directive: unit-name(lib/netlib)\n// build-directive: shared(true)\n",
    )
    .unwrap();

    let directives = parse_directives(&root.join("src"), false).unwrap();
    let config = BuildConfig {
        directives,
        ..Default::default()
    };
    let graph = plan(&config).unwrap();
    let node = graph.node("directive:lib/netlib").unwrap();
    assert_eq!(node.output_path, PathBuf::from("bin/lib/netlib.so"));

    fs::remove_dir_all(&root).ok();
}
