use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use anyhow::Result;
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::Colorize;

use cforge::config::{self, BuildConfig, CliOverrides};
use cforge::graph::{self, GraphSummary, NodeKind};
use cforge::{build, deps, devenv, directives, ini, scaffold, toolchain, ui};

#[derive(Parser)]
#[command(name = "cf")]
#[command(about = "A lightweight C++ build orchestrator", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
#[command(allow_external_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default)]
struct BuildFlags {
    /// Build with debug info (-g -O0)
    #[arg(short = 'd', long, overrides_with = "optimize")]
    debug: bool,
    /// Build optimized (-O3)
    #[arg(short = 'O', long, overrides_with = "debug")]
    optimize: bool,
    /// Show build commands and decisions
    #[arg(short, long)]
    verbose: bool,
    /// Compile with the bounded worker pool
    #[arg(short, long)]
    parallel: bool,
    /// Compiler binary override
    #[arg(short, long, value_name = "BIN")]
    compiler: Option<String>,
    /// Toolchain family (gcc or clang)
    #[arg(long, value_name = "FAMILY")]
    toolchain: Option<String>,
    /// Project name override
    #[arg(short, long, value_name = "NAME")]
    output: Option<String>,
    /// Extra global include directory
    #[arg(short = 'I', value_name = "DIR", action = ArgAction::Append)]
    include_dir: Vec<String>,
    /// Extra global library search path
    #[arg(short = 'L', value_name = "DIR", action = ArgAction::Append)]
    lib_search_path: Vec<String>,
    /// Extra global library to link
    #[arg(short = 'l', value_name = "LIB", action = ArgAction::Append)]
    library: Vec<String>,
    /// Project file path
    #[arg(long, value_name = "PATH", default_value = "cforge.ini")]
    config: PathBuf,
    /// Declare a shared library from the command line
    #[arg(long, num_args = 2, value_names = ["NAME", "SOURCE"], action = ArgAction::Append)]
    shared_lib: Vec<String>,
    /// Declare a tool from the command line
    #[arg(long, num_args = 2, value_names = ["NAME", "SOURCE"], action = ArgAction::Append)]
    tool: Vec<String>,
    /// Project name, then sources for additional default tools
    #[arg(value_name = "NAME")]
    names: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan and execute the build
    Build {
        #[command(flatten)]
        flags: BuildFlags,
    },
    /// Remove build and binary artifacts
    Clean {
        #[command(flatten)]
        flags: BuildFlags,
    },
    /// Print the planned build graph without executing
    Plan {
        #[command(flatten)]
        flags: BuildFlags,
        /// Emit the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build, then run the first executable target
    Run {
        #[command(flatten)]
        flags: BuildFlags,
        /// Arguments passed to the executable (after --)
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Initialize a new project in the current directory
    Init {
        /// Project name (defaults to interactive)
        name: Option<String>,
        /// Toolchain family (gcc or clang)
        #[arg(long)]
        toolchain: Option<String>,
    },
    /// Write a shell activation script for the project
    Env {
        #[command(flatten)]
        flags: BuildFlags,
    },
    /// Generate shell completion scripts
    Completion { shell: Shell },
    #[command(external_subcommand)]
    External(Vec<OsString>),
}

fn main() {
    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn dispatch(cli: Cli) -> Result<i32> {
    match cli.command {
        Some(Commands::Build { flags }) => {
            cmd_build(&flags)?;
            Ok(0)
        }
        Some(Commands::Clean { flags }) => {
            let (config, _) = load_project(&flags)?;
            build::clean(&config)?;
            Ok(0)
        }
        Some(Commands::Plan { flags, json }) => {
            cmd_plan(&flags, json)?;
            Ok(0)
        }
        Some(Commands::Run { flags, args }) => {
            cmd_run(&flags, &args)?;
            Ok(0)
        }
        Some(Commands::Init { name, toolchain }) => {
            scaffold::init_project(name, toolchain)?;
            Ok(0)
        }
        Some(Commands::Env { flags }) => {
            let (config, _) = load_project(&flags)?;
            devenv::write_env_script(&config)?;
            Ok(0)
        }
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(0)
        }
        Some(Commands::External(args)) => {
            let name = args
                .first()
                .map(|a| a.to_string_lossy().to_string())
                .unwrap_or_default();
            eprintln!("{} unknown command '{}'\n", "x".red(), name);
            Cli::command().print_help()?;
            Ok(1)
        }
        None => {
            Cli::command().print_help()?;
            Ok(0)
        }
    }
}

/// Assemble the effective configuration: INI file, then CLI overrides, then
/// the directive scan over the source tree.
fn load_project(flags: &BuildFlags) -> Result<(BuildConfig, Vec<String>)> {
    let (mut config, mut warnings) = if flags.config.exists() {
        ini::load_config(&flags.config)?
    } else {
        (BuildConfig::default(), Vec::new())
    };
    config::apply_overrides(&mut config, &to_overrides(flags));
    if config.source_dir.is_dir() {
        config.directives = directives::parse_directives(&config.source_dir, config.verbose)?;
    } else {
        warnings.push(format!(
            "source directory '{}' does not exist, skipping directive scan",
            config.source_dir.display()
        ));
    }
    Ok((config, warnings))
}

fn to_overrides(flags: &BuildFlags) -> CliOverrides {
    CliOverrides {
        debug: flags.debug,
        optimize: flags.optimize,
        verbose: flags.verbose,
        parallel: flags.parallel,
        compiler: flags.compiler.clone(),
        toolchain: flags.toolchain.clone(),
        project_name: flags.output.clone(),
        include_dirs: flags.include_dir.clone(),
        lib_search_paths: flags.lib_search_path.clone(),
        libraries: flags.library.clone(),
        shared_libs: pairs(&flags.shared_lib),
        tools: pairs(&flags.tool),
        positionals: flags.names.clone(),
    }
}

fn pairs(values: &[String]) -> Vec<(String, String)> {
    values
        .chunks(2)
        .filter(|chunk| chunk.len() == 2)
        .map(|chunk| (chunk[0].clone(), chunk[1].clone()))
        .collect()
}

fn print_warnings(config: &BuildConfig, warnings: &[String]) {
    if !config.verbose {
        return;
    }
    for warning in warnings {
        println!("{} {}", "warning:".yellow(), warning);
    }
}

fn cmd_build(flags: &BuildFlags) -> Result<()> {
    let (mut config, warnings) = load_project(flags)?;
    deps::prepare(&mut config)?;
    let graph = graph::plan(&config)?;
    print_warnings(&config, &warnings);
    let toolchain = toolchain::select(&config)?;
    build::execute(&config, &graph, toolchain.as_ref())?;
    Ok(())
}

fn cmd_plan(flags: &BuildFlags, json: bool) -> Result<()> {
    let (config, warnings) = load_project(flags)?;
    let summary = graph::preview(&config)?;
    print_warnings(&config, &warnings);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &GraphSummary) {
    if summary.nodes.is_empty() {
        println!("{} Nothing to build.", "!".yellow());
        return;
    }
    let mut table = ui::Table::new(&["Id", "Kind", "Depends on", "Output"]);
    for node in &summary.nodes {
        table.add_row(vec![
            node.id.clone(),
            node.kind.to_string(),
            node.dependencies.join(", "),
            node.output.clone(),
        ]);
    }
    table.print();
    println!("Build order: {}", summary.order.join(" -> "));
    if !summary.unresolved.is_empty() {
        println!("{} Unresolved dependencies:", "!".yellow());
        for (id, tokens) in &summary.unresolved {
            println!("  {id}: {}", tokens.join(", "));
        }
    }
}

fn cmd_run(flags: &BuildFlags, args: &[String]) -> Result<()> {
    let (mut config, warnings) = load_project(flags)?;
    deps::prepare(&mut config)?;
    let graph = graph::plan(&config)?;
    print_warnings(&config, &warnings);
    let toolchain = toolchain::select(&config)?;
    build::execute(&config, &graph, toolchain.as_ref())?;

    let target = graph
        .order
        .iter()
        .filter_map(|id| graph.node(id))
        .find(|n| n.kind == NodeKind::Executable);
    let Some(node) = target else {
        println!("{} No executable target to run.", "!".yellow());
        return Ok(());
    };

    println!("{} Running {}...\n", "▶".green(), node.output_path.display());
    let mut run_cmd = Command::new(&node.output_path);
    run_cmd.args(args);
    let _ = run_cmd.status();
    Ok(())
}
