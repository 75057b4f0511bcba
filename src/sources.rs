//! Translation unit discovery.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::errors::BuildError;

const SOURCE_EXTENSIONS: &[&str] = &["cpp", "cc", "cxx"];

/// Recursively collect C++ translation units under `dir`.
///
/// The walk is sorted by file name so the returned order (and everything
/// derived from it, directives included) is stable across platforms.
pub fn find_sources(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    if !dir.is_dir() {
        return Err(BuildError::Config(format!(
            "source directory '{}' does not exist",
            dir.display()
        )));
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(ext) = path.extension()
            && SOURCE_EXTENSIONS.contains(&ext.to_string_lossy().as_ref())
        {
            sources.push(path.to_owned());
        }
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cforge_sources_{}_{}", name, std::process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn collects_cpp_cc_cxx_recursively() {
        let dir = scratch_dir("collect");
        fs::create_dir_all(dir.join("nested/.hidden")).unwrap();
        fs::write(dir.join("a.cpp"), "").unwrap();
        fs::write(dir.join("b.cc"), "").unwrap();
        fs::write(dir.join("nested/c.cxx"), "").unwrap();
        fs::write(dir.join("nested/.hidden/d.cpp"), "").unwrap();
        fs::write(dir.join("readme.md"), "").unwrap();
        fs::write(dir.join("header.h"), "").unwrap();

        let sources = find_sources(&dir).unwrap();
        let names: Vec<String> = sources
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.cpp", "b.cc", "d.cpp", "c.cxx"]);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_directory_yields_empty_list() {
        let dir = scratch_dir("empty");
        assert!(find_sources(&dir).unwrap().is_empty());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_directory_is_a_config_error() {
        let dir = std::env::temp_dir().join("cforge_sources_definitely_missing");
        let err = find_sources(&dir).unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
    }
}
