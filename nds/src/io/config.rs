//! Driver configuration stored in `nds.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::layout::TPCDS_TABLES;
use crate::error::NdsError;

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "nds.toml";

/// Driver configuration (TOML).
///
/// Locates the generator toolchain and the engine-side scripts. Missing fields
/// default to the layout produced by building `tpcds-gen`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NdsConfig {
    /// Directory holding `dsdgen`, `dsqgen` and the index file.
    pub tools_dir: PathBuf,

    /// MapReduce jar used for HDFS generation.
    pub gen_jar: PathBuf,

    /// Index file that `dsqgen` expects in its working directory.
    pub index_file: String,

    /// Engine script executed for each query stream.
    pub power_script: PathBuf,

    /// Engine script executed for CSV conversion.
    pub convert_script: PathBuf,

    /// SQL dialect passed to `dsqgen`.
    pub dialect: String,

    /// Tables reorganized into per-table directories after local generation.
    pub tables: Vec<String>,
}

impl Default for NdsConfig {
    fn default() -> Self {
        Self {
            tools_dir: PathBuf::from("tpcds-gen/target/tools"),
            gen_jar: PathBuf::from("tpcds-gen/target/tpcds-gen-1.0-SNAPSHOT.jar"),
            index_file: "tpcds.idx".to_string(),
            power_script: PathBuf::from("power_run.py"),
            convert_script: PathBuf::from("ds_convert.py"),
            dialect: "spark".to_string(),
            tables: TPCDS_TABLES.iter().map(|t| (*t).to_string()).collect(),
        }
    }
}

impl NdsConfig {
    pub fn validate(&self) -> Result<(), NdsError> {
        let invalid = |field: &str| NdsError::Configuration(format!("{field} must be non-empty"));
        if self.tools_dir.as_os_str().is_empty() {
            return Err(invalid("tools_dir"));
        }
        if self.gen_jar.as_os_str().is_empty() {
            return Err(invalid("gen_jar"));
        }
        if self.index_file.trim().is_empty() {
            return Err(invalid("index_file"));
        }
        if self.power_script.as_os_str().is_empty() {
            return Err(invalid("power_script"));
        }
        if self.convert_script.as_os_str().is_empty() {
            return Err(invalid("convert_script"));
        }
        if self.dialect.trim().is_empty() {
            return Err(invalid("dialect"));
        }
        if self.tables.is_empty() || self.tables.iter().any(|t| t.trim().is_empty()) {
            return Err(invalid("tables"));
        }
        Ok(())
    }

    /// Path of the `dsdgen` binary.
    pub fn dsdgen(&self) -> PathBuf {
        self.tools_dir.join("dsdgen")
    }

    /// Path of the `dsqgen` binary.
    pub fn dsqgen(&self) -> PathBuf {
        self.tools_dir.join("dsqgen")
    }

    pub fn index_path(&self) -> PathBuf {
        self.tools_dir.join(&self.index_file)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `NdsConfig::default()`.
pub fn load_config(path: &Path) -> Result<NdsConfig> {
    if !path.exists() {
        let cfg = NdsConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: NdsConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
