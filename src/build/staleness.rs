//! Incremental rebuild decisions.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use crate::includes::extract_includes;

fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Decide whether `object` must be rebuilt from `source`.
///
/// A missing source still returns true so the compile step can surface a
/// proper error instead of silently skipping the unit. Includes that exist
/// are compared by mtime; a missing include with a directory component
/// forces a rebuild (it was moved or deleted), while a missing bare name is
/// assumed to be a system header and ignored.
pub fn needs_recompile(source: &Path, object: &Path) -> bool {
    if !source.exists() {
        return true;
    }
    let Some(object_time) = mtime(object) else {
        return true;
    };
    let Some(source_time) = mtime(source) else {
        return true;
    };
    if source_time > object_time {
        return true;
    }

    for include in extract_includes(source) {
        let path = Path::new(&include);
        match mtime(path) {
            Some(include_time) => {
                if include_time > object_time {
                    return true;
                }
            }
            None => {
                if include.contains('/') {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::path::PathBuf;
    use std::time::Duration;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("cforge_stale_{}_{}", name, std::process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn missing_object_or_source_forces_rebuild() {
        let dir = scratch_dir("missing");
        let source = dir.join("a.cpp");
        let object = dir.join("a.o");
        fs::write(&source, "int main() { return 0; }").unwrap();
        assert!(needs_recompile(&source, &object), "object missing");
        assert!(
            needs_recompile(&dir.join("nope.cpp"), &object),
            "source missing"
        );
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn fresh_object_with_no_newer_includes_is_clean() {
        let dir = scratch_dir("clean");
        let source = dir.join("a.cpp");
        let object = dir.join("a.o");
        fs::write(&source, "#include <vector>\nint main() { return 0; }").unwrap();
        fs::write(&object, "obj").unwrap();
        let now = SystemTime::now();
        set_mtime(&source, now - Duration::from_secs(60));
        set_mtime(&object, now);
        assert!(!needs_recompile(&source, &object));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn newer_source_or_include_forces_rebuild() {
        let dir = scratch_dir("newer");
        let source = dir.join("a.cpp");
        let object = dir.join("a.o");
        let header = dir.join("a.h");
        fs::write(&source, format!("#include \"{}\"\n", header.display())).unwrap();
        fs::write(&object, "obj").unwrap();
        fs::write(&header, "").unwrap();

        let now = SystemTime::now();
        set_mtime(&source, now);
        set_mtime(&object, now - Duration::from_secs(60));
        assert!(needs_recompile(&source, &object), "source newer than object");

        set_mtime(&source, now - Duration::from_secs(120));
        set_mtime(&header, now);
        assert!(needs_recompile(&source, &object), "include newer than object");

        set_mtime(&header, now - Duration::from_secs(120));
        assert!(!needs_recompile(&source, &object));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_bare_include_is_ignored_but_missing_path_is_not() {
        let dir = scratch_dir("bare");
        let object = dir.join("a.o");
        fs::write(&object, "obj").unwrap();
        let now = SystemTime::now();

        let bare = dir.join("bare.cpp");
        fs::write(&bare, "#include <iostream>\n#include \"missing_header.h\"\n").unwrap();
        set_mtime(&bare, now - Duration::from_secs(60));
        set_mtime(&object, now);
        assert!(!needs_recompile(&bare, &object));

        let pathy = dir.join("pathy.cpp");
        fs::write(&pathy, "#include \"gone/away.h\"\n").unwrap();
        set_mtime(&pathy, now - Duration::from_secs(60));
        set_mtime(&object, now);
        assert!(needs_recompile(&pathy, &object));
        fs::remove_dir_all(&dir).ok();
    }
}
