//! INI project file loader.
//!
//! The format is deliberately loose: section and key names are
//! case-insensitive, `#` starts a comment line, and values may be wrapped in
//! single or double quotes. One quirk is load-bearing and must not be
//! "fixed": every `[shared_libs]`, `[tools]`, or `[dependencies]` header
//! begins a *new* entry, so repeating a header declares another unit.
//!
//! Problems that do not prevent loading (unknown keys, bad booleans,
//! malformed lines) are collected as warning strings and reported by the
//! caller; only an unreadable file is an error.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{
    BuildConfig, DependencyConfig, SharedLibConfig, ToolConfig, merge_unique,
};
use crate::errors::BuildError;

const SHARED_KEYS: &[&str] = &[
    "name",
    "output_dir",
    "sources",
    "libraries",
    "include_dirs",
    "cflags",
    "ldflags",
    "debug",
    "optimize",
    "verbose",
];

const TOOL_KEYS: &[&str] = &[
    "name",
    "output_dir",
    "sources",
    "libraries",
    "include_dirs",
    "cflags",
    "ldflags",
    "debug",
    "optimize",
    "verbose",
    "static_link",
];

const DEP_KEYS: &[&str] = &["name", "url", "extract", "include_dirs", "build_cmds"];

#[derive(Debug, Default)]
struct RawUnit {
    entries: Vec<(String, String)>,
}

impl RawUnit {
    fn get(&self, key: &str) -> Option<&str> {
        // Last occurrence wins, as in ordinary INI reading.
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn warn_unknown(&self, known: &[&str], section: &str, warnings: &mut Vec<String>) {
        for (key, _) in &self.entries {
            if !known.contains(&key.as_str()) {
                warnings.push(format!("unknown key '{key}' in [{section}]"));
            }
        }
    }
}

enum Cursor {
    Global,
    Shared,
    Tool,
    Dependency,
    Unknown,
}

/// Read and parse the project file at `path`.
pub fn load_config(path: &Path) -> Result<(BuildConfig, Vec<String>), BuildError> {
    let text = fs::read_to_string(path).map_err(|e| {
        BuildError::Config(format!("cannot read project file '{}': {e}", path.display()))
    })?;
    Ok(parse_config(&text))
}

/// Parse project file text into a merged [`BuildConfig`] plus warnings.
pub fn parse_config(text: &str) -> (BuildConfig, Vec<String>) {
    let mut warnings = Vec::new();
    let mut global = RawUnit::default();
    let mut shared: Vec<RawUnit> = Vec::new();
    let mut tools: Vec<RawUnit> = Vec::new();
    let mut deps: Vec<RawUnit> = Vec::new();
    let mut cursor = Cursor::Global;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].trim().to_lowercase();
            cursor = match name.as_str() {
                "global" => Cursor::Global,
                "shared_libs" => {
                    shared.push(RawUnit::default());
                    Cursor::Shared
                }
                "tools" => {
                    tools.push(RawUnit::default());
                    Cursor::Tool
                }
                "dependencies" => {
                    deps.push(RawUnit::default());
                    Cursor::Dependency
                }
                other => {
                    warnings.push(format!("unknown section '[{other}]'"));
                    Cursor::Unknown
                }
            };
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            warnings.push(format!("ignoring malformed line '{line}'"));
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = unquote(value.trim()).to_string();
        let unit = match cursor {
            Cursor::Global => &mut global,
            Cursor::Shared => shared.last_mut().expect("cursor implies entry"),
            Cursor::Tool => tools.last_mut().expect("cursor implies entry"),
            Cursor::Dependency => deps.last_mut().expect("cursor implies entry"),
            Cursor::Unknown => continue,
        };
        unit.entries.push((key, value));
    }

    let mut config = BuildConfig::default();
    apply_global(&mut config, &global, &mut warnings);

    let shared_units: Vec<SharedLibConfig> = shared
        .iter()
        .enumerate()
        .map(|(i, raw)| build_shared(&config, raw, i, &mut warnings))
        .collect();
    let tool_units: Vec<ToolConfig> = tools
        .iter()
        .enumerate()
        .map(|(i, raw)| build_tool(&config, raw, i, &mut warnings))
        .collect();
    let dep_units: Vec<DependencyConfig> = deps
        .iter()
        .enumerate()
        .map(|(i, raw)| build_dependency(raw, i, &mut warnings))
        .collect();

    config.shared_libs = shared_units;
    config.tools = tool_units;
    config.dependencies = dep_units;
    (config, warnings)
}

fn apply_global(config: &mut BuildConfig, raw: &RawUnit, warnings: &mut Vec<String>) {
    for (key, value) in &raw.entries {
        match key.as_str() {
            "project_name" => config.project_name = value.clone(),
            "source_dir" => config.source_dir = PathBuf::from(value),
            "build_dir" => config.build_dir = PathBuf::from(value),
            "bin_dir" => config.bin_dir = PathBuf::from(value),
            "deps_dir" => config.deps_dir = PathBuf::from(value),
            "compiler" => config.compiler = Some(value.clone()),
            "toolchain" => config.toolchain = value.clone(),
            "include_dirs" => config.include_dirs = split_comma(value),
            "lib_search_paths" => config.lib_search_paths = split_comma(value),
            "libraries" => config.libraries = split_comma(value),
            "cflags" => config.cflags = split_space(value),
            "ldflags" => config.ldflags = split_space(value),
            "debug" => config.debug = decode_bool(value, config.debug, "debug", warnings),
            "optimize" => config.optimize = decode_bool(value, config.optimize, "optimize", warnings),
            "verbose" => config.verbose = decode_bool(value, config.verbose, "verbose", warnings),
            "parallel" => config.parallel = decode_bool(value, config.parallel, "parallel", warnings),
            "static_link" => {
                config.static_link = decode_bool(value, config.static_link, "static_link", warnings);
            }
            other => warnings.push(format!("unknown key '{other}' in [global]")),
        }
    }
}

fn build_shared(
    global: &BuildConfig,
    raw: &RawUnit,
    index: usize,
    warnings: &mut Vec<String>,
) -> SharedLibConfig {
    raw.warn_unknown(SHARED_KEYS, "shared_libs", warnings);
    SharedLibConfig {
        name: unit_name(raw, "lib", index),
        output_dir: raw
            .get("output_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| global.lib_output_dir()),
        sources: path_list(raw.get("sources")),
        libraries: raw.get("libraries").map(split_comma).unwrap_or_default(),
        include_dirs: inherit_list(&global.include_dirs, raw.get("include_dirs"), split_comma),
        cflags: inherit_list(&global.cflags, raw.get("cflags"), split_space),
        ldflags: inherit_list(&global.ldflags, raw.get("ldflags"), split_space),
        debug: inherit_bool(raw, "debug", global.debug, warnings),
        optimize: inherit_bool(raw, "optimize", global.optimize, warnings),
        verbose: inherit_bool(raw, "verbose", global.verbose, warnings),
    }
}

fn build_tool(
    global: &BuildConfig,
    raw: &RawUnit,
    index: usize,
    warnings: &mut Vec<String>,
) -> ToolConfig {
    raw.warn_unknown(TOOL_KEYS, "tools", warnings);
    ToolConfig {
        name: unit_name(raw, "tool", index),
        output_dir: raw
            .get("output_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| global.tool_output_dir()),
        sources: path_list(raw.get("sources")),
        libraries: raw.get("libraries").map(split_comma).unwrap_or_default(),
        include_dirs: inherit_list(&global.include_dirs, raw.get("include_dirs"), split_comma),
        cflags: inherit_list(&global.cflags, raw.get("cflags"), split_space),
        ldflags: inherit_list(&global.ldflags, raw.get("ldflags"), split_space),
        debug: inherit_bool(raw, "debug", global.debug, warnings),
        optimize: inherit_bool(raw, "optimize", global.optimize, warnings),
        verbose: inherit_bool(raw, "verbose", global.verbose, warnings),
        static_link: inherit_bool(raw, "static_link", global.static_link, warnings),
    }
}

fn build_dependency(raw: &RawUnit, index: usize, warnings: &mut Vec<String>) -> DependencyConfig {
    raw.warn_unknown(DEP_KEYS, "dependencies", warnings);
    DependencyConfig {
        name: unit_name(raw, "dep", index),
        url: raw.get("url").map(String::from),
        extract: raw.get("extract").map(split_comma).unwrap_or_default(),
        include_dirs: raw.get("include_dirs").map(split_comma).unwrap_or_default(),
        build_cmds: raw.get("build_cmds").map(split_semi).unwrap_or_default(),
    }
}

fn unit_name(raw: &RawUnit, prefix: &str, index: usize) -> String {
    match raw.get("name") {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{prefix}{index}"),
    }
}

fn path_list(raw: Option<&str>) -> Vec<PathBuf> {
    raw.map(|v| split_comma(v).into_iter().map(PathBuf::from).collect())
        .unwrap_or_default()
}

fn inherit_list(
    global: &[String],
    raw: Option<&str>,
    split: fn(&str) -> Vec<String>,
) -> Vec<String> {
    let mut merged = global.to_vec();
    if let Some(value) = raw {
        merge_unique(&mut merged, &split(value));
    }
    merged
}

fn inherit_bool(raw: &RawUnit, key: &str, global: bool, warnings: &mut Vec<String>) -> bool {
    match raw.get(key) {
        Some(value) => decode_bool(value, global, key, warnings),
        None => global,
    }
}

/// Decode a loose boolean; anything outside the two accepted sets keeps the
/// default and records a warning.
pub fn decode_bool(raw: &str, default: bool, key: &str, warnings: &mut Vec<String>) -> bool {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        other => {
            warnings.push(format!(
                "invalid boolean '{other}' for key '{key}', keeping default"
            ));
            default
        }
    }
}

pub fn split_comma(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

pub fn split_space(raw: &str) -> Vec<String> {
    raw.split([' ', '\t'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

pub fn split_semi(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}
