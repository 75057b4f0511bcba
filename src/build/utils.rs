//! Small helpers shared by the build engine.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Where the object file for `source` lives inside `object_dir`.
///
/// Strips one leading `src/` (or `./src/`) component, then flattens to the
/// basename; nested source layouts share one flat object directory per unit.
pub fn object_file_path(object_dir: &Path, source: &Path) -> PathBuf {
    let trimmed = source
        .strip_prefix("./src")
        .or_else(|_| source.strip_prefix("src"))
        .unwrap_or(source);
    let stem = trimmed
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    object_dir.join(format!("{stem}.o"))
}

/// The result of a child process, with stdout and stderr merged.
pub struct CommandOutput {
    pub success: bool,
    pub output: String,
}

/// Run `command`, capturing all output. A spawn failure is reported the same
/// way as a failing command so callers produce one error shape.
pub fn run_captured(command: &[String]) -> CommandOutput {
    let mut cmd = Command::new(&command[0]);
    cmd.args(&command[1..]);
    match cmd.output() {
        Ok(out) => {
            let mut output = String::from_utf8_lossy(&out.stdout).to_string();
            output.push_str(&String::from_utf8_lossy(&out.stderr));
            CommandOutput {
                success: out.status.success(),
                output,
            }
        }
        Err(e) => CommandOutput {
            success: false,
            output: format!("failed to spawn '{}': {e}", command[0]),
        },
    }
}

/// Write the make-style dependency record next to `object`.
pub fn write_dep_record(object: &Path, source: &Path, includes: &[String]) -> io::Result<()> {
    let mut record = format!("{}: {}\n", object.display(), source.display());
    for include in includes {
        record.push('\t');
        record.push_str(include);
        record.push('\n');
    }
    fs::write(object.with_extension("d"), record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_path_strips_src_prefix_and_flattens() {
        let dir = Path::new("build/core");
        assert_eq!(
            object_file_path(dir, Path::new("src/core.cpp")),
            PathBuf::from("build/core/core.o")
        );
        assert_eq!(
            object_file_path(dir, Path::new("./src/net/socket.cc")),
            PathBuf::from("build/core/socket.o")
        );
        // A path merely containing "src" elsewhere is left alone.
        assert_eq!(
            object_file_path(dir, Path::new("vendor/src_like/thing.cxx")),
            PathBuf::from("build/core/thing.o")
        );
    }

    #[test]
    fn dep_record_uses_tab_indented_continuations() {
        let dir = std::env::temp_dir().join(format!("cforge_utils_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let object = dir.join("a.o");
        write_dep_record(
            &object,
            Path::new("src/a.cpp"),
            &["util.h".to_string(), "vector".to_string()],
        )
        .unwrap();
        let record = fs::read_to_string(dir.join("a.d")).unwrap();
        assert_eq!(
            record,
            format!("{}: src/a.cpp\n\tutil.h\n\tvector\n", object.display())
        );
        fs::remove_dir_all(&dir).ok();
    }

    #[cfg(unix)]
    #[test]
    fn run_captured_reports_spawn_failures_as_output() {
        let result = run_captured(&["cforge-no-such-binary".to_string()]);
        assert!(!result.success);
        assert!(result.output.contains("failed to spawn"));
    }
}
