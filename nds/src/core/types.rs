//! Core data types shared by the submitter and coordinator.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

use serde::{Deserialize, Serialize};

use crate::error::NdsError;

/// Engine submission template: the user-authored preamble that run-specific
/// arguments are appended to.
///
/// Stored as TOML so the invocation is an argument list rather than shell text:
///
/// ```toml
/// program = "spark-submit"
/// args = ["--master", "yarn", "--conf", "spark.executor.memory=8G"]
///
/// [env]
/// SPARK_HOME = "/opt/spark"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SubmitTemplate {
    /// Executable to launch (looked up on `PATH` when not a path).
    pub program: String,
    /// Arguments placed before the script and the appended flags.
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables for the child.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Working directory for the child. Inherits the caller's when unset.
    #[serde(default)]
    pub workdir: Option<PathBuf>,
}

impl SubmitTemplate {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            workdir: None,
        }
    }

    pub fn validate(&self) -> Result<(), NdsError> {
        if self.program.trim().is_empty() {
            return Err(NdsError::Configuration(
                "submit template `program` must be non-empty".to_string(),
            ));
        }
        if let Some(key) = self.env.keys().find(|k| k.is_empty() || k.contains('=')) {
            return Err(NdsError::Configuration(format!(
                "submit template env key {key:?} is invalid"
            )));
        }
        Ok(())
    }
}

/// Everything needed to run exactly one query stream against the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub template: SubmitTemplate,
    pub input_prefix: String,
    /// Omitted from the command line when `None` or empty.
    pub output_prefix: Option<String>,
    pub output_format: Option<String>,
    pub query_stream: PathBuf,
    /// Combined stdout/stderr of the engine run is appended here.
    pub run_log: PathBuf,
    /// Passed to the engine, which writes per-query timings to it.
    pub time_log: PathBuf,
}

impl RunConfig {
    /// Copy of `self` bound to another stream and its own log files.
    pub fn for_stream(&self, query_stream: PathBuf, run_log: PathBuf, time_log: PathBuf) -> Self {
        Self {
            query_stream,
            run_log,
            time_log,
            ..self.clone()
        }
    }
}

/// Exit status of an external process, reduced to what the driver inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobExit {
    /// `None` when the child was terminated by a signal.
    pub code: Option<i32>,
}

impl JobExit {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for JobExit {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for JobExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// Lifecycle of one stream job. There is no transition back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}
