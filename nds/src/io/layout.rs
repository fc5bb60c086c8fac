//! Reorganizing generated partition files on the local filesystem.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;
use walkdir::WalkDir;

use crate::core::layout::partition_file_names;

/// Move every `<table>_<i>_<parallel>.dat` in `data_dir` into `data_dir/<table>/`.
///
/// Partitions that were not produced are skipped. Returns the number of files moved.
pub fn reorganize_partitions(data_dir: &Path, tables: &[String], parallel: u32) -> Result<usize> {
    let mut moved = 0;
    for table in tables {
        let table_dir = data_dir.join(table);
        fs::create_dir_all(&table_dir)
            .with_context(|| format!("create table dir {}", table_dir.display()))?;
        for name in partition_file_names(table, parallel) {
            let source = data_dir.join(&name);
            if !source.is_file() {
                continue;
            }
            let target = table_dir.join(&name);
            fs::rename(&source, &target)
                .with_context(|| format!("move {} to {}", source.display(), target.display()))?;
            moved += 1;
        }
        debug!(table = %table, "partitions moved");
    }
    Ok(moved)
}

/// Total size of each immediate subdirectory of `dir`, followed by `dir` itself.
pub fn directory_sizes(dir: &Path) -> Result<Vec<(String, u64)>> {
    let mut sizes = Vec::new();
    let mut entries: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("read {}", dir.display()))?
        .collect::<std::io::Result<_>>()
        .with_context(|| format!("read entry in {}", dir.display()))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        if entry.file_type().context("read file type")?.is_dir() {
            sizes.push((entry.path().display().to_string(), tree_size(&entry.path())?));
        }
    }
    sizes.push((dir.display().to_string(), tree_size(dir)?));
    Ok(sizes)
}

fn tree_size(dir: &Path) -> Result<u64> {
    let mut total = 0;
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("walk {}", dir.display()))?;
        if entry.file_type().is_file() {
            total += entry
                .metadata()
                .with_context(|| format!("stat {}", entry.path().display()))?
                .len();
        }
    }
    Ok(total)
}
