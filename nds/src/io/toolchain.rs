//! Checks and staging for the external generator toolchain.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::error::NdsError;
use crate::io::config::NdsConfig;
use crate::io::process::find_on_path;

/// Fail unless the generator jar and `dsdgen` have been built.
pub fn check_build(config: &NdsConfig) -> Result<()> {
    let missing: Vec<String> = [config.gen_jar.clone(), config.dsdgen()]
        .into_iter()
        .filter(|p| !p.exists())
        .map(|p| p.display().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(NdsError::PrerequisiteMissing(format!(
            "{} not found; build tpcds-gen first",
            missing.join(", ")
        ))
        .into());
    }
    Ok(())
}

/// Resolve `program` on `PATH` or fail with `PrerequisiteMissing`.
pub fn require_on_path(program: &str) -> Result<PathBuf> {
    find_on_path(program).ok_or_else(|| {
        NdsError::PrerequisiteMissing(format!("no `{program}` binary found on PATH")).into()
    })
}

/// Copy of the generator index file staged into a working directory.
///
/// The copy is removed on drop. A failed removal is logged and left behind.
/// When the working directory already holds the source file, nothing is
/// copied and nothing is removed.
#[derive(Debug)]
pub struct StagedIndex {
    path: PathBuf,
    staged: bool,
}

impl StagedIndex {
    pub fn stage(source: &Path, workdir: &Path) -> Result<Self> {
        let name = source
            .file_name()
            .with_context(|| format!("index path {} has no file name", source.display()))?;
        let path = workdir.join(name);

        let source_real = fs::canonicalize(source)
            .with_context(|| format!("resolve index {}", source.display()))?;
        let target_real = fs::canonicalize(workdir)
            .with_context(|| format!("resolve workdir {}", workdir.display()))?
            .join(name);
        if source_real == target_real {
            debug!(path = %path.display(), "index already in working directory");
            return Ok(Self {
                path,
                staged: false,
            });
        }

        fs::copy(source, &path).with_context(|| {
            format!("stage index {} into {}", source.display(), workdir.display())
        })?;
        debug!(path = %path.display(), "staged index file");
        Ok(Self { path, staged: true })
    }
}

impl Drop for StagedIndex {
    fn drop(&mut self) {
        if !self.staged {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(err = %e, path = %self.path.display(), "failed to remove staged index");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(root: &Path) -> NdsConfig {
        NdsConfig {
            tools_dir: root.join("tools"),
            gen_jar: root.join("gen.jar"),
            ..NdsConfig::default()
        }
    }

    #[test]
    fn check_build_reports_missing_artifacts() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = check_build(&config_in(temp.path())).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NdsError>(),
            Some(NdsError::PrerequisiteMissing(_))
        ));
        assert!(err.to_string().contains("gen.jar"));
        assert!(err.to_string().contains("dsdgen"));
    }

    #[test]
    fn check_build_passes_when_built() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = config_in(temp.path());
        fs::create_dir_all(&cfg.tools_dir).expect("tools dir");
        fs::write(cfg.dsdgen(), "").expect("dsdgen");
        fs::write(&cfg.gen_jar, "").expect("jar");
        check_build(&cfg).expect("built");
    }

    #[test]
    fn staged_index_is_removed_on_drop() {
        let temp = tempfile::tempdir().expect("tempdir");
        let source = temp.path().join("tpcds.idx");
        fs::write(&source, "idx").expect("write index");
        let workdir = temp.path().join("work");
        fs::create_dir_all(&workdir).expect("workdir");

        let staged = StagedIndex::stage(&source, &workdir).expect("stage");
        let staged_path = workdir.join("tpcds.idx");
        assert_eq!(fs::read_to_string(&staged_path).expect("read"), "idx");
        drop(staged);
        assert!(!staged_path.exists());
        assert!(source.exists());
    }

    #[test]
    fn staging_into_source_dir_keeps_index() {
        let temp = tempfile::tempdir().expect("tempdir");
        let source = temp.path().join("tpcds.idx");
        fs::write(&source, "index-bytes").expect("write index");

        let staged = StagedIndex::stage(&source, temp.path()).expect("stage");
        assert_eq!(fs::read_to_string(&source).expect("read"), "index-bytes");
        drop(staged);
        assert_eq!(fs::read_to_string(&source).expect("read"), "index-bytes");
    }

    #[test]
    fn staging_through_relative_workdir_is_detected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let tools = temp.path().join("tools");
        fs::create_dir_all(&tools).expect("tools");
        let source = tools.join("tpcds.idx");
        fs::write(&source, "index-bytes").expect("write index");

        let staged = StagedIndex::stage(&source, &tools.join("..").join("tools")).expect("stage");
        drop(staged);
        assert_eq!(fs::read_to_string(&source).expect("read"), "index-bytes");
    }

    #[test]
    fn require_on_path_rejects_unknown_binary() {
        let err = require_on_path("definitely-not-hadoop-nds").unwrap_err();
        assert!(err.to_string().contains("definitely-not-hadoop-nds"));
    }
}
