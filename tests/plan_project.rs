//! Planner scenarios driven through the INI front end.
//!
//! These exercise the full load-and-plan pipeline (`parse_config` →
//! `plan`/`preview`) the way `cf plan` does, without touching a compiler.

use cforge::graph::{NodeKind, plan, preview};
use cforge::ini::parse_config;

#[test]
fn empty_project_plans_nothing() {
    let (config, warnings) = parse_config("[global]\nproject_name = empty\n");
    assert!(warnings.is_empty());
    let summary = preview(&config).unwrap();
    assert!(summary.nodes.is_empty());
    assert!(summary.order.is_empty());
    assert!(summary.unresolved.is_empty());
}

#[test]
fn linear_dependency_builds_library_first() {
    let text = "\
[global]
project_name = linear

[shared_libs]
name = core
sources = src/core.cpp

[tools]
name = app
sources = src/app.cpp
libraries = core
";
    let (config, _) = parse_config(text);
    let summary = preview(&config).unwrap();
    assert_eq!(summary.order, vec!["shared:core", "tool:app"]);
    assert!(summary.unresolved.is_empty());

    let app = summary.nodes.iter().find(|n| n.id == "tool:app").unwrap();
    assert_eq!(app.kind, NodeKind::Executable);
    assert_eq!(app.dependencies, vec!["shared:core"]);
    assert_eq!(app.raw_dependencies, vec!["core"]);
}

#[test]
fn diamond_respects_every_edge() {
    let text = "\
[shared_libs]
name = base
sources = src/base.cpp

[shared_libs]
name = utils
sources = src/utils.cpp

[shared_libs]
name = core
sources = src/core.cpp
libraries = base, utils

[tools]
name = app
sources = src/app.cpp
libraries = core
";
    let (config, _) = parse_config(text);
    let summary = preview(&config).unwrap();
    let pos = |id: &str| summary.order.iter().position(|x| x == id).unwrap();
    assert!(pos("shared:base") < pos("shared:core"));
    assert!(pos("shared:utils") < pos("shared:core"));
    assert!(pos("shared:core") < pos("tool:app"));

    // Every dependency appears before its dependent, for every node.
    for node in &summary.nodes {
        for dep in &node.dependencies {
            assert!(pos(dep) < pos(&node.id), "{dep} must precede {}", node.id);
        }
    }
}

#[test]
fn unresolved_dependency_is_reported_not_fatal() {
    let text = "\
[tools]
name = app
sources = src/app.cpp
libraries = nonexistent_lib
";
    let (config, _) = parse_config(text);
    let summary = preview(&config).unwrap();
    assert_eq!(
        summary.unresolved.get("tool:app").unwrap(),
        &vec!["nonexistent_lib".to_string()]
    );
    assert_eq!(summary.order, vec!["tool:app"]);
}

#[test]
fn preview_round_trips_identically() {
    let text = "\
[shared_libs]
name = core
sources = src/core.cpp

[tools]
name = app
sources = src/app.cpp
libraries = core, missing
";
    let (config, _) = parse_config(text);
    let first = preview(&config).unwrap();
    let second = preview(&config).unwrap();
    assert_eq!(first, second);

    let json = serde_json::to_string(&first).unwrap();
    assert!(json.contains("\"shared:core\""));
    assert!(json.contains("\"executable\""));
}

#[test]
fn graph_nodes_have_unique_ids() {
    let text = "\
[shared_libs]
name = core
sources = src/core.cpp

[tools]
name = core
sources = src/main.cpp
libraries = core
";
    let (config, _) = parse_config(text);
    // A tool and a library may share a human name; the typed ids differ.
    let graph = plan(&config).unwrap();
    let mut ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), graph.nodes.len());
    assert_eq!(
        graph.node("tool:core").unwrap().dependencies,
        vec!["shared:core"]
    );
}
