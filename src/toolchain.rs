//! Compiler command synthesis.
//!
//! A [`Toolchain`] turns a compile or link request into an argv vector; it
//! never touches the filesystem and never spawns anything. `gcc` and `clang`
//! share one GNU-style emitter parameterized by the compiler binary, which
//! is all the two families differ by here.

use std::path::{Path, PathBuf};

use crate::config::BuildConfig;
use crate::errors::BuildError;

/// One compile invocation.
pub struct CompileSpec<'a> {
    pub source: &'a Path,
    pub object: &'a Path,
    pub target_include_dirs: &'a [String],
    pub target_cflags: &'a [String],
    pub debug: bool,
    pub optimize: bool,
    /// Shared-library objects are compiled position independent.
    pub pic: bool,
}

/// One link invocation.
pub struct LinkSpec<'a> {
    pub objects: &'a [PathBuf],
    pub output: &'a Path,
    pub target_libraries: &'a [String],
    pub target_ldflags: &'a [String],
    pub debug: bool,
    pub static_link: bool,
}

pub trait Toolchain {
    fn compile_command(&self, config: &BuildConfig, spec: &CompileSpec) -> Vec<String>;
    fn shared_link_command(&self, config: &BuildConfig, spec: &LinkSpec) -> Vec<String>;
    fn tool_link_command(&self, config: &BuildConfig, spec: &LinkSpec) -> Vec<String>;
    fn description(&self) -> String;
}

/// Select the toolchain configured for this build.
///
/// The family name is case-insensitive and defaults to gcc; the compiler
/// binary defaults to `g++`/`clang++` per family when not set explicitly.
pub fn select(config: &BuildConfig) -> Result<Box<dyn Toolchain>, BuildError> {
    let family = config.toolchain.trim().to_lowercase();
    match family.as_str() {
        "" | "gcc" => Ok(Box::new(Gcc::new(compiler_binary(config, "g++")))),
        "clang" => Ok(Box::new(Clang::new(compiler_binary(config, "clang++")))),
        other => Err(BuildError::Config(format!(
            "unknown toolchain '{other}' (expected gcc or clang)"
        ))),
    }
}

fn compiler_binary(config: &BuildConfig, fallback: &str) -> String {
    config
        .compiler
        .clone()
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// File extension for shared libraries on this platform.
pub fn shared_extension() -> &'static str {
    if cfg!(target_os = "windows") { "dll" } else { "so" }
}

/// Normalize a library token: strip one leading `lib/` path component and a
/// trailing `.so`. `lib/net` and `utils.so` both reduce to their base name,
/// which is then linked as `-l:<base>.so` (or `.a` when static).
pub fn normalize_lib_token(token: &str) -> &str {
    let token = token.strip_prefix("lib/").unwrap_or(token);
    token.strip_suffix(".so").unwrap_or(token)
}

pub struct Gcc {
    emitter: GnuEmitter,
}

impl Gcc {
    pub fn new(compiler: String) -> Self {
        Self {
            emitter: GnuEmitter { compiler },
        }
    }
}

impl Toolchain for Gcc {
    fn compile_command(&self, config: &BuildConfig, spec: &CompileSpec) -> Vec<String> {
        self.emitter.compile(config, spec)
    }

    fn shared_link_command(&self, config: &BuildConfig, spec: &LinkSpec) -> Vec<String> {
        self.emitter.link(config, spec, true)
    }

    fn tool_link_command(&self, config: &BuildConfig, spec: &LinkSpec) -> Vec<String> {
        self.emitter.link(config, spec, false)
    }

    fn description(&self) -> String {
        format!("gcc ({})", self.emitter.compiler)
    }
}

pub struct Clang {
    emitter: GnuEmitter,
}

impl Clang {
    pub fn new(compiler: String) -> Self {
        Self {
            emitter: GnuEmitter { compiler },
        }
    }
}

impl Toolchain for Clang {
    fn compile_command(&self, config: &BuildConfig, spec: &CompileSpec) -> Vec<String> {
        self.emitter.compile(config, spec)
    }

    fn shared_link_command(&self, config: &BuildConfig, spec: &LinkSpec) -> Vec<String> {
        self.emitter.link(config, spec, true)
    }

    fn tool_link_command(&self, config: &BuildConfig, spec: &LinkSpec) -> Vec<String> {
        self.emitter.link(config, spec, false)
    }

    fn description(&self) -> String {
        format!("clang ({})", self.emitter.compiler)
    }
}

/// The shared GNU-style command emitter.
struct GnuEmitter {
    compiler: String,
}

impl GnuEmitter {
    fn compile(&self, config: &BuildConfig, spec: &CompileSpec) -> Vec<String> {
        let mut cmd = vec![self.compiler.clone(), "-c".to_string()];
        for dir in &config.include_dirs {
            cmd.push(format!("-I{dir}"));
        }
        for path in &config.lib_search_paths {
            cmd.push(format!("-L{path}"));
        }
        // Per-target lists inherit the global tokens; only emit the extras.
        for dir in spec.target_include_dirs.iter().filter(|d| !config.include_dirs.contains(d)) {
            cmd.push(format!("-I{dir}"));
        }
        if spec.debug {
            cmd.push("-g".to_string());
            cmd.push("-O0".to_string());
        } else if spec.optimize {
            cmd.push("-O3".to_string());
        } else {
            cmd.push("-O2".to_string());
        }
        if spec.pic {
            cmd.push("-fPIC".to_string());
        }
        cmd.push("-Wall".to_string());
        cmd.push("-Wextra".to_string());
        cmd.extend(config.cflags.iter().cloned());
        cmd.extend(
            spec.target_cflags
                .iter()
                .filter(|f| !config.cflags.contains(f))
                .cloned(),
        );
        cmd.push(spec.source.display().to_string());
        cmd.push("-o".to_string());
        cmd.push(spec.object.display().to_string());
        cmd
    }

    fn link(&self, config: &BuildConfig, spec: &LinkSpec, shared: bool) -> Vec<String> {
        let mut cmd = vec![self.compiler.clone()];
        if shared {
            cmd.push("-shared".to_string());
        }
        cmd.push(format!("-L{}", config.lib_output_dir().display()));
        for path in &config.lib_search_paths {
            cmd.push(format!("-L{path}"));
        }
        if !shared && spec.static_link {
            cmd.push("-static".to_string());
            cmd.push("-static-libgcc".to_string());
            cmd.push("-static-libstdc++".to_string());
        }
        if spec.debug {
            cmd.push("-g".to_string());
        }
        for object in spec.objects {
            cmd.push(object.display().to_string());
        }
        for lib in &config.libraries {
            cmd.push(format!("-l{lib}"));
        }
        let per_unit_ext = if !shared && spec.static_link { "a" } else { "so" };
        for lib in spec.target_libraries {
            cmd.push(format!("-l:{}.{per_unit_ext}", normalize_lib_token(lib)));
        }
        cmd.extend(config.ldflags.iter().cloned());
        cmd.extend(
            spec.target_ldflags
                .iter()
                .filter(|f| !config.ldflags.contains(f))
                .cloned(),
        );
        cmd.push("-o".to_string());
        cmd.push(spec.output.display().to_string());
        cmd
    }
}
