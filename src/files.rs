//! Template file discovery.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Recursively collects files under `root` whose names end with `suffix`.
///
/// Entries are visited in name order so runs are deterministic.
pub fn find_template_files(root: &Path, suffix: &str) -> io::Result<Vec<PathBuf>> {
    let mut results = Vec::new();
    walk(root, suffix, &mut results)?;
    Ok(results)
}

fn walk(dir: &Path, suffix: &str, results: &mut Vec<PathBuf>) -> io::Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<_>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            walk(&path, suffix, results)?;
        } else if path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(suffix))
        {
            results.push(path);
        }
    }
    Ok(())
}
