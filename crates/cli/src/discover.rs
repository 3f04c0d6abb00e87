//! Locating specification files and their compiled counterparts

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const SPEC_SUFFIXES: &[&str] = &[".aw.yml", ".aw.yaml", ".aw.json"];
const LOCK_SUFFIX: &str = ".lock.yml";

pub fn is_spec_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| SPEC_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)))
}

pub fn is_lock_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(LOCK_SUFFIX))
}

/// Expand directories into the matching files beneath them, sorted; plain
/// file arguments are kept as given
pub fn expand(paths: &[PathBuf], matches: fn(&Path) -> bool) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file() && matches(entry.path()))
                .map(|entry| entry.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    files
}

/// `triage.aw.yml` compiles to `triage.lock.yml` in the same directory, or in
/// `output_dir` when given
pub fn lock_path(spec: &Path, output_dir: Option<&Path>) -> PathBuf {
    let name = spec
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("workflow");
    let stem = SPEC_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .or_else(|| Path::new(name).file_stem().and_then(|s| s.to_str()))
        .unwrap_or(name);

    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| spec.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{stem}{LOCK_SUFFIX}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path() {
        assert_eq!(
            lock_path(Path::new(".github/workflows/triage.aw.yml"), None),
            PathBuf::from(".github/workflows/triage.lock.yml")
        );
        assert_eq!(
            lock_path(Path::new("specs/review.json"), Some(Path::new("out"))),
            PathBuf::from("out/review.lock.yml")
        );
    }

    #[test]
    fn test_expand_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("workflows");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("b.aw.yml"), "").unwrap();
        fs::write(dir.join("a.aw.json"), "").unwrap();
        fs::write(dir.join("a.lock.yml"), "").unwrap();
        fs::write(dir.join("notes.md"), "").unwrap();

        let specs = expand(&[dir.clone()], is_spec_file);
        assert_eq!(specs, vec![dir.join("a.aw.json"), dir.join("b.aw.yml")]);

        let locks = expand(&[dir.clone()], is_lock_file);
        assert_eq!(locks, vec![dir.join("a.lock.yml")]);
    }
}
