//! Project configuration model.
//!
//! A [`BuildConfig`] is assembled from three sources, in increasing
//! precedence: built-in defaults, the INI project file (see [`crate::ini`]),
//! and command-line overrides applied through [`apply_overrides`].

use std::path::{Path, PathBuf};

/// One `// build-directive:` declaration accumulated from a single source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildDirective {
    pub unit_name: String,
    pub depends_units: Vec<String>,
    pub link_libs: Vec<String>,
    pub output_path: Option<String>,
    pub cflags: Vec<String>,
    pub ldflags: Vec<String>,
    pub is_shared: bool,
    pub static_link: Option<bool>,
}

/// A shared library declared in the project file.
#[derive(Debug, Clone)]
pub struct SharedLibConfig {
    pub name: String,
    pub output_dir: PathBuf,
    pub sources: Vec<PathBuf>,
    pub libraries: Vec<String>,
    pub include_dirs: Vec<String>,
    pub cflags: Vec<String>,
    pub ldflags: Vec<String>,
    pub debug: bool,
    pub optimize: bool,
    pub verbose: bool,
}

/// An executable declared in the project file.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub name: String,
    pub output_dir: PathBuf,
    pub sources: Vec<PathBuf>,
    pub libraries: Vec<String>,
    pub include_dirs: Vec<String>,
    pub cflags: Vec<String>,
    pub ldflags: Vec<String>,
    pub debug: bool,
    pub optimize: bool,
    pub verbose: bool,
    pub static_link: bool,
}

/// An external dependency entry.
#[derive(Debug, Clone, Default)]
pub struct DependencyConfig {
    pub name: String,
    pub url: Option<String>,
    pub extract: Vec<String>,
    pub include_dirs: Vec<String>,
    pub build_cmds: Vec<String>,
}

/// Process-wide build configuration.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub project_name: String,
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub bin_dir: PathBuf,
    pub deps_dir: PathBuf,
    pub compiler: Option<String>,
    pub toolchain: String,
    pub include_dirs: Vec<String>,
    pub lib_search_paths: Vec<String>,
    pub libraries: Vec<String>,
    pub cflags: Vec<String>,
    pub ldflags: Vec<String>,
    pub debug: bool,
    pub optimize: bool,
    pub verbose: bool,
    pub parallel: bool,
    pub static_link: bool,
    pub shared_libs: Vec<SharedLibConfig>,
    pub tools: Vec<ToolConfig>,
    pub dependencies: Vec<DependencyConfig>,
    pub directives: Vec<BuildDirective>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            source_dir: PathBuf::from("src"),
            build_dir: PathBuf::from("build"),
            bin_dir: PathBuf::from("bin"),
            deps_dir: PathBuf::from("deps"),
            compiler: None,
            toolchain: String::new(),
            include_dirs: Vec::new(),
            lib_search_paths: Vec::new(),
            libraries: Vec::new(),
            cflags: Vec::new(),
            ldflags: Vec::new(),
            debug: false,
            optimize: false,
            verbose: false,
            parallel: false,
            static_link: false,
            shared_libs: Vec::new(),
            tools: Vec::new(),
            dependencies: Vec::new(),
            directives: Vec::new(),
        }
    }
}

impl BuildConfig {
    pub fn lib_output_dir(&self) -> PathBuf {
        self.bin_dir.join("lib")
    }

    pub fn tool_output_dir(&self) -> PathBuf {
        self.bin_dir.join("tools")
    }

    /// Append a shared library unit from a `--shared-lib NAME SOURCE` pair.
    pub fn add_shared_lib(&mut self, name: &str, source: &str) {
        self.shared_libs.push(SharedLibConfig {
            name: name.to_string(),
            output_dir: self.lib_output_dir(),
            sources: vec![PathBuf::from(source)],
            libraries: Vec::new(),
            include_dirs: self.include_dirs.clone(),
            cflags: self.cflags.clone(),
            ldflags: self.ldflags.clone(),
            debug: self.debug,
            optimize: self.optimize,
            verbose: self.verbose,
        });
    }

    /// Append an executable unit from a `--tool NAME SOURCE` pair.
    pub fn add_tool(&mut self, name: &str, source: &str) {
        self.tools.push(ToolConfig {
            name: name.to_string(),
            output_dir: self.tool_output_dir(),
            sources: vec![PathBuf::from(source)],
            libraries: Vec::new(),
            include_dirs: self.include_dirs.clone(),
            cflags: self.cflags.clone(),
            ldflags: self.ldflags.clone(),
            debug: self.debug,
            optimize: self.optimize,
            verbose: self.verbose,
            static_link: self.static_link,
        });
    }
}

/// Command-line overrides, applied after the INI file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub debug: bool,
    pub optimize: bool,
    pub verbose: bool,
    pub parallel: bool,
    pub compiler: Option<String>,
    pub toolchain: Option<String>,
    pub project_name: Option<String>,
    pub include_dirs: Vec<String>,
    pub lib_search_paths: Vec<String>,
    pub libraries: Vec<String>,
    pub shared_libs: Vec<(String, String)>,
    pub tools: Vec<(String, String)>,
    pub positionals: Vec<String>,
}

/// Apply CLI overrides with precedence CLI > INI > defaults.
///
/// `--debug` and `--optimize` are mutually exclusive: whichever is set
/// clears the other.
pub fn apply_overrides(config: &mut BuildConfig, cli: &CliOverrides) {
    if cli.debug {
        config.debug = true;
        config.optimize = false;
    }
    if cli.optimize {
        config.optimize = true;
        config.debug = false;
    }
    if cli.verbose {
        config.verbose = true;
    }
    if cli.parallel {
        config.parallel = true;
    }
    if let Some(compiler) = &cli.compiler {
        config.compiler = Some(compiler.clone());
    }
    if let Some(toolchain) = &cli.toolchain {
        config.toolchain = toolchain.clone();
    }

    merge_unique(&mut config.include_dirs, &cli.include_dirs);
    merge_unique(&mut config.lib_search_paths, &cli.lib_search_paths);
    merge_unique(&mut config.libraries, &cli.libraries);

    // The leading positional names the project, the rest become default tools.
    let mut positionals = cli.positionals.iter();
    if let Some(name) = positionals.next() {
        config.project_name = name.clone();
    }
    for source in positionals {
        config.add_tool(&file_stem(source), source);
    }
    if let Some(name) = &cli.project_name {
        config.project_name = name.clone();
    }

    for (name, source) in &cli.shared_libs {
        config.add_shared_lib(name, source);
    }
    for (name, source) in &cli.tools {
        config.add_tool(name, source);
    }
}

/// Append tokens from `extra` that are not already present, preserving
/// insertion order.
pub fn merge_unique(base: &mut Vec<String>, extra: &[String]) {
    for token in extra {
        if !base.contains(token) {
            base.push(token.clone());
        }
    }
}

fn file_stem(source: &str) -> String {
    Path::new(source)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| source.to_string())
}
