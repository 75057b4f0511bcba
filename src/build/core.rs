//! Build execution.
//!
//! The executor walks the planned graph in topological order and performs
//! all of the filesystem work: object directories, compiles (through the
//! worker pool), links, optional static archives, and the
//! `compile_commands.json` database.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use super::pool::{CompileTask, run_compile_tasks};
use super::staleness::needs_recompile;
use super::utils::{object_file_path, run_captured};
use crate::config::{BuildConfig, BuildDirective, SharedLibConfig, ToolConfig};
use crate::errors::BuildError;
use crate::graph::{Graph, NodeOrigin};
use crate::toolchain::{CompileSpec, LinkSpec, Toolchain};

/// Execute a planned graph.
pub fn execute(config: &BuildConfig, graph: &Graph, toolchain: &dyn Toolchain) -> Result<(), BuildError> {
    let start = Instant::now();

    fs::create_dir_all(&config.build_dir)?;
    fs::create_dir_all(&config.bin_dir)?;
    fs::create_dir_all(config.lib_output_dir())?;
    fs::create_dir_all(config.tool_output_dir())?;

    for (id, tokens) in &graph.unresolved {
        println!(
            "{} unresolved dependencies for {}: {}",
            "!".yellow(),
            id,
            tokens.join(", ")
        );
    }

    if config.verbose {
        println!("{} toolchain: {}", "i".blue(), toolchain.description());
    }

    let emit_archive = config.static_link || config.tools.iter().any(|t| t.static_link);
    let current_dir = std::env::current_dir()?.to_string_lossy().to_string();
    let mut compile_db: Vec<serde_json::Value> = Vec::new();

    for id in &graph.order {
        let node = graph.node(id).expect("order references a known node");
        match node.origin {
            NodeOrigin::ConfiguredShared(i) => {
                let lib = &config.shared_libs[i];
                let objects = compile_shared_lib(config, lib, toolchain, &current_dir, &mut compile_db)?;
                link_shared(config, toolchain, lib, &node.output_path, &objects, emit_archive)?;
            }
            NodeOrigin::ConfiguredTool(i) => {
                let tool = &config.tools[i];
                let objects = compile_tool(config, tool, toolchain, &current_dir, &mut compile_db)?;
                link_tool(config, toolchain, tool, &node.output_path, &objects)?;
            }
            NodeOrigin::Directive(i) => {
                let directive = &config.directives[i];
                build_directive_unit(
                    config,
                    directive,
                    &node.output_path,
                    toolchain,
                    emit_archive,
                    &current_dir,
                    &mut compile_db,
                )?;
            }
        }
    }

    fs::write(
        "compile_commands.json",
        serde_json::to_string_pretty(&compile_db).unwrap_or_default(),
    )?;

    println!(
        "{} Build completed successfully! ({:.2?})",
        "✓".green(),
        start.elapsed()
    );
    Ok(())
}

fn compile_shared_lib(
    config: &BuildConfig,
    lib: &SharedLibConfig,
    toolchain: &dyn Toolchain,
    current_dir: &str,
    compile_db: &mut Vec<serde_json::Value>,
) -> Result<Vec<PathBuf>, BuildError> {
    compile_sources(
        config,
        &lib.name,
        &lib.sources,
        UnitFlags {
            include_dirs: &lib.include_dirs,
            cflags: &lib.cflags,
            debug: lib.debug,
            optimize: lib.optimize,
            verbose: lib.verbose || config.verbose,
            pic: true,
        },
        toolchain,
        current_dir,
        compile_db,
    )
}

fn compile_tool(
    config: &BuildConfig,
    tool: &ToolConfig,
    toolchain: &dyn Toolchain,
    current_dir: &str,
    compile_db: &mut Vec<serde_json::Value>,
) -> Result<Vec<PathBuf>, BuildError> {
    compile_sources(
        config,
        &tool.name,
        &tool.sources,
        UnitFlags {
            include_dirs: &tool.include_dirs,
            cflags: &tool.cflags,
            debug: tool.debug,
            optimize: tool.optimize,
            verbose: tool.verbose || config.verbose,
            pic: false,
        },
        toolchain,
        current_dir,
        compile_db,
    )
}

struct UnitFlags<'a> {
    include_dirs: &'a [String],
    cflags: &'a [String],
    debug: bool,
    optimize: bool,
    verbose: bool,
    pic: bool,
}

/// Compile a unit's sources into `build/<unit>/`, skipping objects the
/// staleness oracle considers current. The returned object list follows the
/// unit's source order no matter how the pool schedules the work.
fn compile_sources(
    config: &BuildConfig,
    unit: &str,
    sources: &[PathBuf],
    flags: UnitFlags<'_>,
    toolchain: &dyn Toolchain,
    current_dir: &str,
    compile_db: &mut Vec<serde_json::Value>,
) -> Result<Vec<PathBuf>, BuildError> {
    let object_dir = config.build_dir.join(unit);
    fs::create_dir_all(&object_dir)?;

    let mut objects = Vec::with_capacity(sources.len());
    let mut tasks = Vec::new();
    for source in sources {
        let object = object_file_path(&object_dir, source);
        let spec = CompileSpec {
            source,
            object: &object,
            target_include_dirs: flags.include_dirs,
            target_cflags: flags.cflags,
            debug: flags.debug,
            optimize: flags.optimize,
            pic: flags.pic,
        };
        let command = toolchain.compile_command(config, &spec);
        compile_db.push(json!({
            "directory": current_dir,
            "command": command.join(" "),
            "file": source.display().to_string(),
        }));
        if needs_recompile(source, &object) {
            tasks.push(CompileTask {
                source: source.clone(),
                object: object.clone(),
                command,
            });
        } else if flags.verbose {
            println!("   {} up to date: {}", "⚡".green(), object.display());
        }
        objects.push(object);
    }

    if !tasks.is_empty() {
        let pb = ProgressBar::new(tasks.len() as u64);
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .progress_chars("#>-"),
        );
        pb.set_message(format!("Compiling {unit}"));
        let result = run_compile_tasks(&tasks, config.parallel, Some(&pb));
        pb.finish_and_clear();
        result?;
    }
    Ok(objects)
}

fn link_shared(
    config: &BuildConfig,
    toolchain: &dyn Toolchain,
    lib: &SharedLibConfig,
    output: &Path,
    objects: &[PathBuf],
    emit_archive: bool,
) -> Result<(), BuildError> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    if lib.verbose || config.verbose {
        println!("   {} linking {}", "link".cyan(), output.display());
    }
    let spec = LinkSpec {
        objects,
        output,
        target_libraries: &lib.libraries,
        target_ldflags: &lib.ldflags,
        debug: lib.debug,
        static_link: false,
    };
    let command = toolchain.shared_link_command(config, &spec);
    let result = run_captured(&command);
    if !result.success {
        return Err(BuildError::Link {
            target: output.display().to_string(),
            command: command.join(" "),
            output: result.output,
        });
    }
    if emit_archive {
        emit_static_archive(&lib.name, output, objects)?;
    }
    Ok(())
}

fn link_tool(
    config: &BuildConfig,
    toolchain: &dyn Toolchain,
    tool: &ToolConfig,
    output: &Path,
    objects: &[PathBuf],
) -> Result<(), BuildError> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    if tool.verbose || config.verbose {
        println!("   {} linking {}", "link".cyan(), output.display());
    }
    let spec = LinkSpec {
        objects,
        output,
        target_libraries: &tool.libraries,
        target_ldflags: &tool.ldflags,
        debug: tool.debug,
        static_link: tool.static_link,
    };
    let command = toolchain.tool_link_command(config, &spec);
    let result = run_captured(&command);
    if !result.success {
        return Err(BuildError::Link {
            target: output.display().to_string(),
            command: command.join(" "),
            output: result.output,
        });
    }
    Ok(())
}

/// Build one directive-declared unit: locate its translation unit under the
/// source root, compile it, and link per its kind.
fn build_directive_unit(
    config: &BuildConfig,
    directive: &BuildDirective,
    output: &Path,
    toolchain: &dyn Toolchain,
    emit_archive: bool,
    current_dir: &str,
    compile_db: &mut Vec<serde_json::Value>,
) -> Result<(), BuildError> {
    let Some(source) = locate_directive_source(&config.source_dir, &directive.unit_name) else {
        if config.verbose {
            println!(
                "{} no source found for unit '{}', skipping",
                "!".yellow(),
                directive.unit_name
            );
        }
        return Ok(());
    };

    let objects = compile_sources(
        config,
        &directive.unit_name,
        std::slice::from_ref(&source),
        UnitFlags {
            include_dirs: &[],
            cflags: &directive.cflags,
            debug: config.debug,
            optimize: config.optimize,
            verbose: config.verbose,
            pic: directive.is_shared,
        },
        toolchain,
        current_dir,
        compile_db,
    )?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    let spec = LinkSpec {
        objects: &objects,
        output,
        target_libraries: &directive.link_libs,
        target_ldflags: &directive.ldflags,
        debug: config.debug,
        static_link: directive.static_link.unwrap_or(config.static_link),
    };
    let command = if directive.is_shared {
        toolchain.shared_link_command(config, &spec)
    } else {
        toolchain.tool_link_command(config, &spec)
    };
    let result = run_captured(&command);
    if !result.success {
        return Err(BuildError::Link {
            target: output.display().to_string(),
            command: command.join(" "),
            output: result.output,
        });
    }
    if directive.is_shared && emit_archive {
        emit_static_archive(unit_basename(&directive.unit_name), output, &objects)?;
    }
    Ok(())
}

/// Also produce `<base>.a` next to a freshly linked shared library.
fn emit_static_archive(name: &str, shared_output: &Path, objects: &[PathBuf]) -> Result<(), BuildError> {
    let base = unit_basename(name);
    let archive = shared_output
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{base}.a"));
    let mut command = vec![
        "ar".to_string(),
        "rcs".to_string(),
        archive.display().to_string(),
    ];
    command.extend(objects.iter().map(|o| o.display().to_string()));
    let result = run_captured(&command);
    if !result.success {
        return Err(BuildError::Archive {
            target: archive.display().to_string(),
            command: command.join(" "),
            output: result.output,
        });
    }
    Ok(())
}

/// Find the translation unit backing a directive: `<unit>.{cpp,cc,cxx}`
/// first, then the unit's basename at the source root.
fn locate_directive_source(source_dir: &Path, unit_name: &str) -> Option<PathBuf> {
    let base = unit_basename(unit_name);
    for candidate in [unit_name, base] {
        for ext in ["cpp", "cc", "cxx"] {
            let path = source_dir.join(format!("{candidate}.{ext}"));
            if path.exists() {
                return Some(path);
            }
        }
    }
    None
}

fn unit_basename(unit_name: &str) -> &str {
    unit_name.rsplit('/').next().unwrap_or(unit_name)
}
