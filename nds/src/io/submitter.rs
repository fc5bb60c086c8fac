//! Submitter abstraction for single-stream engine runs.
//!
//! The [`Submitter`] trait decouples run coordination from the engine backend
//! (a submission template plus an engine script). Tests use scripted
//! submitters that return predetermined exit codes without spawning processes.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::core::flags::{ConvertOptions, convert_flags, run_flags};
use crate::core::types::{JobExit, RunConfig, SubmitTemplate};
use crate::io::process::{describe, run_command, run_command_tee};

/// Runs exactly one query stream and reports its exit status.
///
/// A non-zero exit is returned, not raised. `Err` is reserved for failures to
/// run at all (unreadable template, spawn error).
pub trait Submitter {
    fn submit(&self, config: &RunConfig) -> Result<JobExit>;

    /// Called on the coordinating thread just before a stream's job starts,
    /// in launch order.
    fn on_launch(&self, _config: &RunConfig) {}
}

/// Submitter that executes the template program with the engine script.
#[derive(Debug, Clone)]
pub struct EngineSubmitter {
    /// Script handed to the template program for each stream.
    pub script: PathBuf,
}

impl EngineSubmitter {
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl Submitter for EngineSubmitter {
    #[instrument(skip_all, fields(stream = %config.query_stream.display()))]
    fn submit(&self, config: &RunConfig) -> Result<JobExit> {
        let cmd = template_command(&config.template, &self.script, run_flags(config));
        info!(
            run_log = %config.run_log.display(),
            time_log = %config.time_log.display(),
            "submitting query stream"
        );
        let exit = run_command_tee(cmd, &config.run_log)
            .with_context(|| format!("submit stream {}", config.query_stream.display()))?;
        if !exit.success() {
            warn!(exit_code = ?exit.code, "query stream failed");
        }
        Ok(exit)
    }
}

/// Build `program [template args] script [flags]` with the template's env and workdir.
pub fn template_command(template: &SubmitTemplate, script: &Path, flags: Vec<OsString>) -> Command {
    let mut cmd = Command::new(&template.program);
    cmd.args(&template.args).arg(script).args(flags);
    cmd.envs(&template.env);
    if let Some(workdir) = &template.workdir {
        cmd.current_dir(workdir);
    }
    cmd
}

/// Submit the CSV to columnar conversion job; output goes to the console.
#[instrument(skip_all, fields(script = %script.display()))]
pub fn submit_convert(
    template: &SubmitTemplate,
    script: &Path,
    options: &ConvertOptions,
) -> Result<(String, JobExit)> {
    let cmd = template_command(template, script, convert_flags(options));
    let command = describe(&cmd);
    let exit = run_command(cmd).context("submit conversion")?;
    Ok((command, exit))
}
